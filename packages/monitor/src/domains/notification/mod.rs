//! Notification domain - delivers suspicious findings to a webhook

pub mod slack;

pub use slack::{build_message, SlackNotifier, WebhookBlock, WebhookMessage};
