use async_trait::async_trait;
use deadpool_lapin::{Manager, Pool, PoolError};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, ConnectionProperties,
};

use super::{new_order_message, NotifyError, OrderNotifier};

/// Publishes to a durable queue through the default exchange.
///
/// Connections come from a pool created once at startup; each publish opens
/// and closes its own channel.
pub struct AmqpNotifier {
    pool: Pool,
    queue: String,
}

impl AmqpNotifier {
    pub async fn connect(url: &str, queue: impl Into<String>) -> Result<Self, NotifyError> {
        let manager = Manager::new(url.to_string(), ConnectionProperties::default());
        let pool = Pool::builder(manager)
            .max_size(4)
            .build()
            .map_err(|e| NotifyError::Connection(format!("Failed to create pool: {}", e)))?;

        let notifier = Self {
            pool,
            queue: queue.into(),
        };

        // Verify the broker is reachable and the queue exists before serving.
        let channel = notifier.channel().await?;
        declare_queue(&channel, &notifier.queue).await?;
        let _ = channel.close(200, "OK").await;

        log::info!("Connected to AMQP, publishing to queue '{}'", notifier.queue);
        Ok(notifier)
    }

    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    async fn channel(&self) -> Result<Channel, NotifyError> {
        open_channel(&self.pool).await
    }
}

pub(crate) async fn open_channel(pool: &Pool) -> Result<Channel, NotifyError> {
    let conn = pool.get().await.map_err(|e: PoolError| {
        NotifyError::Connection(format!("Failed to get connection from pool: {}", e))
    })?;

    conn.create_channel()
        .await
        .map_err(|e| NotifyError::Connection(format!("Failed to create channel: {}", e)))
}

pub(crate) async fn declare_queue(channel: &Channel, queue: &str) -> Result<(), NotifyError> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| NotifyError::Connection(format!("Failed to declare queue: {}", e)))?;
    Ok(())
}

#[async_trait]
impl OrderNotifier for AmqpNotifier {
    async fn notify(&self, order_id: i64) -> Result<(), NotifyError> {
        let channel = self.channel().await?;
        let payload = new_order_message(order_id);

        let result = channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload.as_bytes(),
                BasicProperties::default().with_content_type("text/plain".into()),
            )
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()));

        let result = match result {
            Ok(confirm) => confirm
                .await
                .map(|_| ())
                .map_err(|e| NotifyError::Publish(e.to_string())),
            Err(e) => Err(e),
        };

        let _ = channel.close(200, "OK").await;

        if result.is_ok() {
            log::debug!("Published '{}' to queue '{}'", payload, self.queue);
        }
        result
    }
}
