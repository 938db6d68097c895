//! Best-effort "new order" notifications.
//!
//! Publishing happens after the order is committed and the response is built;
//! a failure here is logged and never turns a created order into an error.

pub mod amqp;
pub mod consumer;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use amqp::AmqpNotifier;

const MESSAGE_PREFIX: &str = "New order created: ";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Consume error: {0}")]
    Consume(String),
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify(&self, order_id: i64) -> Result<(), NotifyError>;
}

/// Plain-text payload carried on the queue.
pub fn new_order_message(order_id: i64) -> String {
    format!("{MESSAGE_PREFIX}{order_id}")
}

/// Inverse of [`new_order_message`]; `None` for anything else.
pub fn parse_new_order_message(payload: &str) -> Option<i64> {
    payload.strip_prefix(MESSAGE_PREFIX)?.trim().parse().ok()
}

/// Publish in the background. The caller has already answered the request, so
/// a failure can only be logged.
pub fn notify_in_background(notifier: Arc<dyn OrderNotifier>, order_id: i64) {
    actix_web::rt::spawn(async move {
        if let Err(e) = notifier.notify(order_id).await {
            log::error!("Failed to publish notification for order {}: {}", order_id, e);
        }
    });
}

/// Used when no broker is configured: the notification only reaches the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn notify(&self, order_id: i64) -> Result<(), NotifyError> {
        log::info!("{}", new_order_message(order_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_format() {
        assert_eq!(new_order_message(261017090001), "New order created: 261017090001");
    }

    #[test]
    fn parses_own_messages_only() {
        assert_eq!(
            parse_new_order_message("New order created: 261017090001"),
            Some(261017090001)
        );
        assert_eq!(parse_new_order_message("New order created: abc"), None);
        assert_eq!(parse_new_order_message("hello"), None);
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        assert!(LogNotifier.notify(1).await.is_ok());
    }
}
