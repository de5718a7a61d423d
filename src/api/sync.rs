//! Purpose: Cart synchronization with the remote document endpoint.
//! Exports: `CartTransport`, `SyncController`, `SyncEffect`, `send_cart_data`, `fetch_cart_data`.
//! Role: Plans sends as data, executes them against a transport capability,
//! and drives the notification slot through pending/success/error.
//! Invariants: Each attempt runs Idle -> Sending -> (Success | Error) -> Idle.
//! Invariants: The first observed cart (or any completed load) never sends.
//! Invariants: Failures surface only through the notification; nothing retries.

use crate::core::cart::{CartDocument, CartState};
use crate::core::error::Error;
use crate::core::ui::{Notification, NotificationStatus, UiState, show_notification};

/// Capability handed to the sync flow; the production implementation is
/// `RemoteClient`, tests substitute an in-memory double.
pub trait CartTransport {
    fn fetch_cart(&self) -> Result<CartDocument, Error>;
    fn put_cart(&self, cart: &CartState) -> Result<(), Error>;
}

/// A planned side effect, carried as data so planning stays pure.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEffect {
    PutCart(CartState),
}

/// Owns the has-loaded flag that used to be a module-global in the original
/// app. One controller per storefront session.
#[derive(Debug, Default)]
pub struct SyncController {
    has_loaded: bool,
}

impl SyncController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_loaded(&self) -> bool {
        self.has_loaded
    }

    /// Pure planning step for a cart change. The first call before any load
    /// consumes the initial observation and plans nothing; afterwards every
    /// change plans a full-document send with the pending notification
    /// already applied.
    pub fn plan_send(&mut self, cart: &CartState, ui: &UiState) -> (UiState, Vec<SyncEffect>) {
        if !self.has_loaded {
            self.has_loaded = true;
            return (ui.clone(), Vec::new());
        }
        let ui = show_notification(ui, sending_notification());
        (ui, vec![SyncEffect::PutCart(cart.clone())])
    }

    /// Marks the load attempt as completed, whatever its outcome.
    fn note_loaded(&mut self) {
        self.has_loaded = true;
    }
}

/// Runs one planned effect against the transport.
pub fn run_effect(effect: &SyncEffect, transport: &dyn CartTransport) -> Result<(), Error> {
    match effect {
        SyncEffect::PutCart(cart) => transport.put_cart(cart),
    }
}

/// Sends the cart after a change: plan, execute, then apply the outcome
/// notification. A skipped plan (initial observation) returns the UI state
/// untouched.
pub fn send_cart_data(
    controller: &mut SyncController,
    cart: &CartState,
    ui: &UiState,
    transport: &dyn CartTransport,
) -> UiState {
    let (mut ui, effects) = controller.plan_send(cart, ui);
    for effect in &effects {
        ui = match run_effect(effect, transport) {
            Ok(()) => show_notification(&ui, sent_notification()),
            Err(_) => show_notification(&ui, send_error_notification()),
        };
    }
    ui
}

/// One-time load of the remote document. Success replaces the cart with the
/// normalized document; failure keeps the default empty cart and surfaces the
/// fetch error. Either way the load attempt counts as completed, so the
/// replacement itself never triggers a send.
pub fn fetch_cart_data(
    controller: &mut SyncController,
    ui: &UiState,
    transport: &dyn CartTransport,
) -> (CartState, UiState) {
    let outcome = transport.fetch_cart();
    controller.note_loaded();
    match outcome {
        Ok(doc) => (CartState::from_document(doc), ui.clone()),
        Err(_) => (
            CartState::default(),
            show_notification(ui, fetch_error_notification()),
        ),
    }
}

fn sending_notification() -> Notification {
    Notification::new(
        NotificationStatus::Pending,
        "Sending...",
        "Sending cart data!",
    )
}

fn sent_notification() -> Notification {
    Notification::new(
        NotificationStatus::Success,
        "Success!",
        "Sent cart data successfully!",
    )
}

fn send_error_notification() -> Notification {
    Notification::new(
        NotificationStatus::Error,
        "Error!",
        "Sending cart data failed.",
    )
}

fn fetch_error_notification() -> Notification {
    Notification::new(
        NotificationStatus::Error,
        "Error!",
        "Fetching cart data failed.",
    )
}
