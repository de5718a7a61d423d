//! Purpose: Static demo product catalog for the storefront.
//! Exports: `Product`, `demo_products`, `find_product`.
//! Role: Stand-in inventory; the cart only ever references products by id.

use crate::core::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
}

pub fn demo_products() -> Vec<Product> {
    vec![
        Product {
            id: "p1".to_string(),
            title: "My First Book".to_string(),
            price: 6.0,
            description: "The first book I ever wrote".to_string(),
        },
        Product {
            id: "p2".to_string(),
            title: "My Second Book".to_string(),
            price: 5.0,
            description: "The second book I ever wrote".to_string(),
        },
        Product {
            id: "p3".to_string(),
            title: "My Third Book".to_string(),
            price: 12.99,
            description: "A longer one, with pictures".to_string(),
        },
    ]
}

pub fn find_product(id: &str) -> Result<Product, Error> {
    demo_products()
        .into_iter()
        .find(|product| product.id == id)
        .ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("unknown product")
                .with_item(id)
                .with_hint("List available products with `cartlite shop`.")
        })
}
