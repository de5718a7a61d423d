//! Purpose: Define the stable public Rust API boundary for cartlite.
//! Exports: Cart/UI state, the sync flow, and the remote client.
//! Role: Public, additive-only surface; the CLI and tests go through here.

mod remote;
mod session;
mod sync;

pub use crate::core::cart::{CartDocument, CartItem, CartState, add_item, remove_item};
pub use crate::core::catalog::{Product, demo_products, find_product};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::ui::{
    Notification, NotificationStatus, UiState, show_notification, toggle_cart_visible,
};
pub use remote::RemoteClient;
pub use session::Storefront;
pub use sync::{
    CartTransport, SyncController, SyncEffect, fetch_cart_data, run_effect, send_cart_data,
};
