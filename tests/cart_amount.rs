use std::collections::HashMap;

use grocery_drive_api::domain::cart::{
    CartError, CartLineItem, LineProduct, add_line, compute_amount, pack_price, remove_line,
    set_quantity, summarize, validate_lines,
};
use uuid::Uuid;

fn product(name: &str, price: i64, stock: i32) -> LineProduct {
    LineProduct {
        name: name.to_string(),
        unit: "piece".to_string(),
        price,
        stock,
    }
}

#[test]
fn line_amount_uses_the_pack_price() {
    // 3.00 per unit, packs of 5, two packs.
    let id = Uuid::new_v4();
    let catalog = HashMap::from([(id, product("Eggs", 300, 5))]);
    let items = vec![CartLineItem {
        product_id: id,
        quantity: 2,
    }];
    assert_eq!(pack_price(300, 5), 1500);
    assert_eq!(compute_amount(&items, &catalog), 3000);
}

#[test]
fn amount_follows_live_prices() {
    let id = Uuid::new_v4();
    let items = vec![CartLineItem {
        product_id: id,
        quantity: 3,
    }];
    let before = HashMap::from([(id, product("Bread", 120, 1))]);
    let after = HashMap::from([(id, product("Bread", 150, 1))]);
    assert_eq!(compute_amount(&items, &before), 360);
    assert_eq!(compute_amount(&items, &after), 450);
}

#[test]
fn deleted_products_are_reported_and_priced_at_zero() {
    let kept = Uuid::new_v4();
    let gone = Uuid::new_v4();
    let catalog = HashMap::from([(kept, product("Milk", 105, 6))]);
    let items = vec![
        CartLineItem {
            product_id: gone,
            quantity: 4,
        },
        CartLineItem {
            product_id: kept,
            quantity: 1,
        },
    ];

    let summary = summarize(&items, &catalog);
    assert_eq!(summary.total, 630);
    assert_eq!(summary.missing_products, vec![gone]);
    assert_eq!(summary.lines.len(), 1);
    assert_eq!(summary.lines[0].name, "Milk");
    assert_eq!(summary.lines[0].pack_price, 630);
    assert_eq!(summary.lines[0].line_total, 630);
}

#[test]
fn adding_twice_merges_the_line() {
    let id = Uuid::new_v4();
    let mut items = Vec::new();
    add_line(&mut items, id, 2).unwrap();
    add_line(&mut items, id, 3).unwrap();
    assert_eq!(
        items,
        vec![CartLineItem {
            product_id: id,
            quantity: 5
        }]
    );
}

#[test]
fn zero_quantities_are_rejected() {
    let id = Uuid::new_v4();
    let mut items = Vec::new();
    assert_eq!(add_line(&mut items, id, 0), Err(CartError::InvalidQuantity));
    add_line(&mut items, id, 1).unwrap();
    assert_eq!(
        set_quantity(&mut items, id, 0),
        Err(CartError::InvalidQuantity)
    );
}

#[test]
fn update_replaces_and_remove_drops_the_line() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut items = Vec::new();
    add_line(&mut items, a, 1).unwrap();
    add_line(&mut items, b, 1).unwrap();

    set_quantity(&mut items, a, 7).unwrap();
    assert_eq!(items[0].quantity, 7);

    remove_line(&mut items, a).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, b);

    assert_eq!(remove_line(&mut items, a), Err(CartError::NotInCart(a)));
    assert_eq!(set_quantity(&mut items, a, 2), Err(CartError::NotInCart(a)));
}

#[test]
fn overflowing_quantities_are_refused() {
    let id = Uuid::new_v4();
    let mut items = Vec::new();
    add_line(&mut items, id, u32::MAX).unwrap();
    assert_eq!(add_line(&mut items, id, 1), Err(CartError::QuantityOverflow(id)));
}

#[test]
fn stored_lines_must_be_unique_and_positive() {
    let id = Uuid::new_v4();
    let duplicate = vec![
        CartLineItem {
            product_id: id,
            quantity: 1,
        },
        CartLineItem {
            product_id: id,
            quantity: 2,
        },
    ];
    assert_eq!(validate_lines(&duplicate), Err(CartError::DuplicateLine(id)));

    let empty_line = vec![CartLineItem {
        product_id: id,
        quantity: 0,
    }];
    assert_eq!(validate_lines(&empty_line), Err(CartError::InvalidQuantity));
    assert_eq!(validate_lines(&[]), Ok(()));
}

#[test]
fn line_items_reject_unknown_fields() {
    let id = Uuid::new_v4();
    let ok = format!(r#"{{"product_id":"{id}","quantity":2}}"#);
    let line: CartLineItem = serde_json::from_str(&ok).unwrap();
    assert_eq!(line.quantity, 2);

    let extra = format!(r#"{{"product_id":"{id}","quantity":2,"price":10}}"#);
    assert!(serde_json::from_str::<CartLineItem>(&extra).is_err());

    let negative = format!(r#"{{"product_id":"{id}","quantity":-1}}"#);
    assert!(serde_json::from_str::<CartLineItem>(&negative).is_err());
}
