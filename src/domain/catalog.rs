//! Category tree rules: at most three levels, parents must exist, no cycles.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_CATEGORY_DEPTH: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("parent category {0} does not exist")]
    UnknownParent(Uuid),

    #[error("categories cannot be nested more than {MAX_CATEGORY_DEPTH} levels deep")]
    TooDeep,

    #[error("a category cannot be moved under itself or one of its descendants")]
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

/// Parent links of every category, keyed by id.
pub type ParentMap = HashMap<Uuid, Option<Uuid>>;

pub fn parent_map(categories: &[CategoryRef]) -> ParentMap {
    categories.iter().map(|c| (c.id, c.parent_id)).collect()
}

/// Level of a category, 1 for a root.
pub fn depth(id: Uuid, parents: &ParentMap) -> Result<usize, CategoryError> {
    let mut level = 1;
    let mut current = id;
    while let Some(parent) = parents.get(&current).copied().flatten() {
        level += 1;
        if level > parents.len() + 1 {
            return Err(CategoryError::Cycle);
        }
        current = parent;
    }
    Ok(level)
}

/// Number of levels in the subtree rooted at `id`, 1 for a leaf.
pub fn subtree_height(id: Uuid, parents: &ParentMap) -> usize {
    fn height(id: Uuid, children: &HashMap<Uuid, Vec<Uuid>>, budget: usize) -> usize {
        if budget == 0 {
            return 1;
        }
        1 + children
            .get(&id)
            .map(|kids| {
                kids.iter()
                    .map(|kid| height(*kid, children, budget - 1))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
    height(id, &children_index(parents), parents.len())
}

/// Checks that `category` (None when creating) can sit under `new_parent`.
pub fn check_placement(
    category: Option<Uuid>,
    new_parent: Option<Uuid>,
    parents: &ParentMap,
) -> Result<(), CategoryError> {
    let Some(parent) = new_parent else {
        let height = category.map_or(1, |id| subtree_height(id, parents));
        return if height > MAX_CATEGORY_DEPTH {
            Err(CategoryError::TooDeep)
        } else {
            Ok(())
        };
    };

    if !parents.contains_key(&parent) {
        return Err(CategoryError::UnknownParent(parent));
    }

    if let Some(id) = category {
        let mut current = Some(parent);
        let mut steps = 0;
        while let Some(ancestor) = current {
            if ancestor == id {
                return Err(CategoryError::Cycle);
            }
            steps += 1;
            if steps > parents.len() {
                return Err(CategoryError::Cycle);
            }
            current = parents.get(&ancestor).copied().flatten();
        }
    }

    let height = category.map_or(1, |id| subtree_height(id, parents));
    if depth(parent, parents)? + height > MAX_CATEGORY_DEPTH {
        return Err(CategoryError::TooDeep);
    }
    Ok(())
}

/// `root` and every category below it.
pub fn descendants(root: Uuid, parents: &ParentMap) -> Vec<Uuid> {
    let children = children_index(parents);
    let mut found = vec![root];
    let mut cursor = 0;
    while cursor < found.len() {
        if let Some(kids) = children.get(&found[cursor]) {
            for kid in kids {
                if !found.contains(kid) {
                    found.push(*kid);
                }
            }
        }
        cursor += 1;
    }
    found
}

pub fn build_tree(categories: &[CategoryRef]) -> Vec<CategoryNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<&CategoryRef>> = HashMap::new();
    for category in categories {
        by_parent.entry(category.parent_id).or_default().push(category);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn attach(
        parent: Option<Uuid>,
        by_parent: &HashMap<Option<Uuid>, Vec<&CategoryRef>>,
        level: usize,
    ) -> Vec<CategoryNode> {
        if level > MAX_CATEGORY_DEPTH {
            return Vec::new();
        }
        by_parent
            .get(&parent)
            .map(|siblings| {
                siblings
                    .iter()
                    .map(|c| CategoryNode {
                        id: c.id,
                        name: c.name.clone(),
                        parent_id: c.parent_id,
                        children: attach(Some(c.id), by_parent, level + 1),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    attach(None, &by_parent, 1)
}

fn children_index(parents: &ParentMap) -> HashMap<Uuid, Vec<Uuid>> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (id, parent) in parents {
        if let Some(parent) = parent {
            children.entry(*parent).or_default().push(*id);
        }
    }
    children
}
