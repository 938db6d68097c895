use deadpool_lapin::Pool;
use futures::StreamExt;
use lapin::{options::BasicConsumeOptions, types::FieldTable};

use super::amqp::{declare_queue, open_channel};
use super::{parse_new_order_message, NotifyError};

const CONSUMER_TAG: &str = "order-service-new-orders";

/// Out-of-band worker for new-order messages.
///
/// Messages are auto-acknowledged on delivery, so a crash while handling one
/// drops it. Returns when the broker closes the stream.
pub async fn run_consumer(pool: Pool, queue: String) -> Result<(), NotifyError> {
    let channel = open_channel(&pool).await?;
    declare_queue(&channel, &queue).await?;

    let mut consumer = channel
        .basic_consume(
            &queue,
            CONSUMER_TAG,
            BasicConsumeOptions {
                no_ack: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| NotifyError::Consume(format!("Failed to start consumer: {}", e)))?;

    log::info!("Consuming new-order messages from queue '{}'", queue);

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                handle_message(&delivery.data);
            }
            Err(e) => {
                log::error!("Consumer delivery error: {}", e);
                return Err(NotifyError::Consume(e.to_string()));
            }
        }
    }

    log::info!("Consumer stream for queue '{}' ended", queue);
    Ok(())
}

/// Returns the order id when the payload is a new-order message.
pub fn handle_message(data: &[u8]) -> Option<i64> {
    let body = String::from_utf8_lossy(data);
    match parse_new_order_message(&body) {
        Some(order_id) => {
            log::info!("Received new order message for order {}", order_id);
            Some(order_id)
        }
        None => {
            log::warn!("Ignoring unrecognised message: {}", body);
            None
        }
    }
}
