//! Purpose: Compose the stores, sync controller, and transport into one session.
//! Exports: `Storefront`.
//! Role: The application wiring; every user-facing operation goes through here.
//! Invariants: Reducer calls are synchronous; state is replaced, never mutated.
//! Invariants: Every successful mutation after load triggers exactly one send.

use crate::api::sync::{CartTransport, SyncController, fetch_cart_data, send_cart_data};
use crate::core::cart::{CartState, add_item, remove_item};
use crate::core::catalog::Product;
use crate::core::error::Error;
use crate::core::ui::{Notification, UiState, toggle_cart_visible};

pub struct Storefront<T> {
    cart: CartState,
    ui: UiState,
    sync: SyncController,
    transport: T,
}

impl<T: CartTransport> Storefront<T> {
    pub fn new(transport: T) -> Self {
        Self {
            cart: CartState::default(),
            ui: UiState::default(),
            sync: SyncController::new(),
            transport,
        }
    }

    /// Fetches the remote document once and replaces the cart with it.
    pub fn load(&mut self) {
        let (cart, ui) = fetch_cart_data(&mut self.sync, &self.ui, &self.transport);
        self.cart = cart;
        self.ui = ui;
    }

    pub fn add_to_cart(&mut self, product: &Product) {
        self.cart = add_item(&self.cart, product);
        self.ui = send_cart_data(&mut self.sync, &self.cart, &self.ui, &self.transport);
    }

    pub fn remove_from_cart(&mut self, id: &str) -> Result<(), Error> {
        self.cart = remove_item(&self.cart, id)?;
        self.ui = send_cart_data(&mut self.sync, &self.cart, &self.ui, &self.transport);
        Ok(())
    }

    pub fn toggle_cart(&mut self) {
        self.ui = toggle_cart_visible(&self.ui);
    }

    pub fn cart(&self) -> &CartState {
        &self.cart
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.ui.notification.as_ref()
    }
}
