use grocery_drive_api::domain::catalog::{
    CategoryError, CategoryRef, ParentMap, build_tree, check_placement, depth, descendants,
    parent_map, subtree_height,
};
use uuid::Uuid;

struct Tree {
    food: Uuid,
    fruit: Uuid,
    citrus: Uuid,
    dairy: Uuid,
    refs: Vec<CategoryRef>,
}

impl Tree {
    fn parents(&self) -> ParentMap {
        parent_map(&self.refs)
    }
}

// food > fruit > citrus, dairy at the root.
fn tree() -> Tree {
    let food = Uuid::new_v4();
    let fruit = Uuid::new_v4();
    let citrus = Uuid::new_v4();
    let dairy = Uuid::new_v4();
    let node = |id, name: &str, parent_id| CategoryRef {
        id,
        name: name.to_string(),
        parent_id,
    };
    Tree {
        food,
        fruit,
        citrus,
        dairy,
        refs: vec![
            node(citrus, "Citrus", Some(fruit)),
            node(food, "Food", None),
            node(dairy, "Dairy", None),
            node(fruit, "Fruit", Some(food)),
        ],
    }
}

#[test]
fn depth_and_height() {
    let t = tree();
    let parents = t.parents();
    assert_eq!(depth(t.food, &parents), Ok(1));
    assert_eq!(depth(t.citrus, &parents), Ok(3));
    assert_eq!(subtree_height(t.food, &parents), 3);
    assert_eq!(subtree_height(t.citrus, &parents), 1);
}

#[test]
fn new_categories_respect_the_depth_limit() {
    let t = tree();
    let parents = t.parents();
    assert_eq!(check_placement(None, None, &parents), Ok(()));
    assert_eq!(check_placement(None, Some(t.fruit), &parents), Ok(()));
    assert_eq!(
        check_placement(None, Some(t.citrus), &parents),
        Err(CategoryError::TooDeep)
    );
}

#[test]
fn unknown_parents_are_rejected() {
    let t = tree();
    let ghost = Uuid::new_v4();
    assert_eq!(
        check_placement(None, Some(ghost), &t.parents()),
        Err(CategoryError::UnknownParent(ghost))
    );
}

#[test]
fn moves_cannot_create_cycles() {
    let t = tree();
    let parents = t.parents();
    assert_eq!(
        check_placement(Some(t.food), Some(t.citrus), &parents),
        Err(CategoryError::Cycle)
    );
    assert_eq!(
        check_placement(Some(t.fruit), Some(t.fruit), &parents),
        Err(CategoryError::Cycle)
    );
}

#[test]
fn moved_subtrees_count_towards_depth() {
    let t = tree();
    let parents = t.parents();
    // fruit carries citrus: under dairy that makes three levels.
    assert_eq!(check_placement(Some(t.fruit), Some(t.dairy), &parents), Ok(()));
    // food carries two levels below it.
    assert_eq!(
        check_placement(Some(t.food), Some(t.dairy), &parents),
        Err(CategoryError::TooDeep)
    );
    assert_eq!(check_placement(Some(t.citrus), None, &parents), Ok(()));
}

#[test]
fn descendants_include_the_root() {
    let t = tree();
    let mut found = descendants(t.food, &t.parents());
    found.sort();
    let mut expected = vec![t.food, t.fruit, t.citrus];
    expected.sort();
    assert_eq!(found, expected);
    assert_eq!(descendants(t.dairy, &t.parents()), vec![t.dairy]);
}

#[test]
fn tree_is_nested_and_sorted_by_name() {
    let t = tree();
    let roots = build_tree(&t.refs);
    let names: Vec<_> = roots.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Dairy", "Food"]);

    let food = &roots[1];
    assert_eq!(food.children.len(), 1);
    assert_eq!(food.children[0].id, t.fruit);
    assert_eq!(food.children[0].children[0].id, t.citrus);
    assert!(food.children[0].children[0].children.is_empty());
}
