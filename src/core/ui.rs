//! Purpose: UI state for the storefront shell.
//! Exports: `UiState`, `Notification`, `NotificationStatus`, pure reducers.
//! Role: Tracks cart-panel visibility and the single notification slot.
//! Invariants: One notification at a time; a new one overwrites the old.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub status: NotificationStatus,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(
        status: NotificationStatus,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiState {
    pub cart_is_visible: bool,
    pub notification: Option<Notification>,
}

pub fn toggle_cart_visible(state: &UiState) -> UiState {
    UiState {
        cart_is_visible: !state.cart_is_visible,
        notification: state.notification.clone(),
    }
}

pub fn show_notification(state: &UiState, notification: Notification) -> UiState {
    UiState {
        cart_is_visible: state.cart_is_visible,
        notification: Some(notification),
    }
}
