//! Outbound delivery of rendered notifications.
//!
//! Currently a single channel: an HTTP webhook that receives one JSON
//! document per notification.

pub mod webhook;

pub use webhook::WebhookNotifier;
