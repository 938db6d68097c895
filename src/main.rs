use std::sync::Arc;

use dotenvy::dotenv;
use order_service::application::order_service::OrderService;
use order_service::auth::JwtVerifier;
use order_service::config::Config;
use order_service::domain::order_id::OrderIdGenerator;
use order_service::infrastructure::{
    DieselCustomerDirectory, DieselOrderLineStore, DieselServiceCatalog,
};
use order_service::notifications::consumer::run_consumer;
use order_service::notifications::{AmqpNotifier, LogNotifier, OrderNotifier};
use order_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    run_migrations(&pool)?;

    let notifier: Arc<dyn OrderNotifier> = match &config.amqp_url {
        Some(url) => {
            let amqp = AmqpNotifier::connect(url, config.order_queue.clone()).await?;
            let (consumer_pool, queue) = (amqp.pool(), amqp.queue().to_string());
            actix_web::rt::spawn(async move {
                if let Err(e) = run_consumer(consumer_pool, queue).await {
                    log::error!("New-order consumer stopped: {}", e);
                }
            });
            Arc::new(amqp)
        }
        None => {
            log::warn!("AMQP_URL not set, new-order notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let orders = OrderService::new(
        Arc::new(DieselOrderLineStore::new(pool.clone())),
        Arc::new(DieselServiceCatalog::new(pool.clone())),
        Arc::new(DieselCustomerDirectory::new(pool)),
        Arc::new(OrderIdGenerator::new()),
    );

    let state = AppState {
        orders,
        verifier: Arc::new(JwtVerifier::new(&config.jwt_secret)),
        notifier,
    };

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
