//! Change notification between independently mounted views.
//!
//! The store publishes on a [`SyncBus`] after every mutation; a
//! [`HistoryView`] reacts by re-reading the whole collection.

pub mod history_view;
pub mod sync_bus;

pub use history_view::HistoryView;
pub use sync_bus::{Subscription, SyncBus, HISTORY_UPDATE_EVENT};
