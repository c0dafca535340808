//! Notification Module
//!
//! Operator alert delivery.

pub mod desktop;

pub use desktop::{DesktopNotifier, NullNotifier, APP_NAME};
