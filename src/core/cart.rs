//! Purpose: Cart state and its pure reducers.
//! Exports: `CartItem`, `CartState`, `CartDocument`, `add_item`, `remove_item`.
//! Role: The only mutation path for cart data; callers replace state wholesale.
//! Invariants: `total_price == price * quantity` for every item.
//! Invariants: `total_quantity` equals the sum of item quantities.
//! Invariants: Item ids are unique within `items`; order is append order.

use crate::core::catalog::Product;
use crate::core::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub total_price: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub total_quantity: u64,
}

/// Wire shape of the remote cart document. Both fields are optional: the
/// endpoint stores whatever was last PUT, and a fresh store has neither.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDocument {
    #[serde(default)]
    pub items: Option<Vec<CartItem>>,
    #[serde(default)]
    pub total_quantity: Option<u64>,
}

impl CartDocument {
    /// Parses a fetched JSON value. A `null` document (the original backend
    /// returned `null` for a never-written node) reads as the empty document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("invalid cart document json")
                .with_source(err)
        })
    }
}

impl CartState {
    /// Wholesale overwrite from a fetched document. Missing `items` is the
    /// empty sequence; missing `totalQuantity` is 0.
    pub fn from_document(doc: CartDocument) -> Self {
        Self {
            items: doc.items.unwrap_or_default(),
            total_quantity: doc.total_quantity.unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Adds one unit of `product`. An id already in the cart gains a unit and its
/// unit price; a new id is appended with quantity 1.
pub fn add_item(state: &CartState, product: &Product) -> CartState {
    let mut next = state.clone();
    next.total_quantity += 1;
    match next.items.iter_mut().find(|item| item.id == product.id) {
        Some(existing) => {
            existing.quantity += 1;
            existing.total_price += product.price;
        }
        None => next.items.push(CartItem {
            id: product.id.clone(),
            name: product.title.clone(),
            price: product.price,
            quantity: 1,
            total_price: product.price,
        }),
    }
    next
}

/// Removes one unit of `id`. The last unit deletes the entry; otherwise the
/// quantity drops by one and the unit price comes off the item total.
pub fn remove_item(state: &CartState, id: &str) -> Result<CartState, Error> {
    let Some(position) = state.items.iter().position(|item| item.id == id) else {
        return Err(Error::new(ErrorKind::NotFound)
            .with_message("item is not in the cart")
            .with_item(id));
    };
    let mut next = state.clone();
    next.total_quantity -= 1;
    if next.items[position].quantity == 1 {
        next.items.remove(position);
    } else {
        let existing = &mut next.items[position];
        existing.quantity -= 1;
        existing.total_price -= existing.price;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::{CartDocument, CartState, add_item, remove_item};
    use crate::core::catalog::Product;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    fn book(id: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            title: format!("Book {id}"),
            price,
            description: String::new(),
        }
    }

    #[test]
    fn add_item_appends_new_entry_with_quantity_one() {
        let cart = add_item(&CartState::default(), &book("a1", 4.99));
        assert_eq!(cart.total_quantity, 1);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 1);
        assert_eq!(cart.items[0].total_price, 4.99);
    }

    #[test]
    fn add_item_twice_accumulates_quantity_and_total() {
        let product = book("a1", 4.99);
        let cart = add_item(&CartState::default(), &product);
        let cart = add_item(&cart, &product);
        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.items[0].total_price, 9.98);
    }

    #[test]
    fn total_quantity_counts_adds_across_distinct_items() {
        let mut cart = CartState::default();
        for id in ["a1", "a2", "a1", "a3", "a2", "a1"] {
            cart = add_item(&cart, &book(id, 3.50));
        }
        assert_eq!(cart.total_quantity, 6);
        for item in &cart.items {
            assert_eq!(item.total_price, item.price * f64::from(item.quantity));
        }
    }

    #[test]
    fn remove_last_unit_deletes_the_entry() {
        let cart = add_item(&CartState::default(), &book("a1", 4.99));
        let cart = remove_item(&cart, "a1").expect("remove");
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_quantity, 0);
    }

    #[test]
    fn remove_one_of_several_units_decrements() {
        let product = book("a1", 4.99);
        let cart = add_item(&CartState::default(), &product);
        let cart = add_item(&cart, &product);
        let cart = remove_item(&cart, "a1").expect("remove");
        assert_eq!(cart.total_quantity, 1);
        assert_eq!(cart.items[0].quantity, 1);
        assert_eq!(cart.items[0].total_price, 4.99);
    }

    #[test]
    fn remove_then_readd_restores_item_total() {
        let product = book("a1", 4.99);
        let before = add_item(&CartState::default(), &product);
        let emptied = remove_item(&before, "a1").expect("remove");
        let after = add_item(&emptied, &product);
        assert_eq!(after.items[0].total_price, before.items[0].total_price);
    }

    #[test]
    fn remove_absent_id_is_not_found() {
        let err = remove_item(&CartState::default(), "ghost").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.item(), Some("ghost"));
    }

    #[test]
    fn reducers_do_not_mutate_their_input() {
        let product = book("a1", 4.99);
        let original = add_item(&CartState::default(), &product);
        let _ = add_item(&original, &product);
        let _ = remove_item(&original, "a1").expect("remove");
        assert_eq!(original.total_quantity, 1);
        assert_eq!(original.items[0].quantity, 1);
    }

    #[test]
    fn empty_document_normalizes_to_empty_cart() {
        let doc = CartDocument::from_value(json!({})).expect("doc");
        let cart = CartState::from_document(doc);
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_quantity, 0);
    }

    #[test]
    fn null_document_normalizes_to_empty_cart() {
        let doc = CartDocument::from_value(serde_json::Value::Null).expect("doc");
        let cart = CartState::from_document(doc);
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_quantity, 0);
    }

    #[test]
    fn document_roundtrips_camel_case_fields() {
        let product = book("a1", 4.99);
        let cart = add_item(&CartState::default(), &product);
        let value = serde_json::to_value(&cart).expect("serialize");
        assert_eq!(value["totalQuantity"], json!(1));
        assert_eq!(value["items"][0]["totalPrice"], json!(4.99));
        let doc = CartDocument::from_value(value).expect("doc");
        assert_eq!(CartState::from_document(doc), cart);
    }
}
