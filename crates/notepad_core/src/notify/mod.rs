//! Mutation notifications for observers of resource paths.

pub mod hub;

pub use hub::{ChangeObserver, NotificationHub, SubscriptionId};
