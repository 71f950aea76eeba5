//! View layer: user-triggerable actions and the state they render.

pub mod controller;
pub mod state;

pub use controller::ViewController;
pub use state::{Notification, NotificationLevel, SessionStatus, ViewState};
