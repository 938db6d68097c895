pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod notifications;
pub mod openapi;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use auth::JwtVerifier;
use errors::AppError;
use notifications::OrderNotifier;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Everything the handlers need, shared by all workers.
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub verifier: Arc<JwtVerifier>,
    pub notifier: Arc<dyn OrderNotifier>,
}

impl AppState {
    fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.orders.clone()))
            .app_data(web::Data::from(Arc::clone(&self.verifier)))
            .app_data(web::Data::from(Arc::clone(&self.notifier)));
    }
}

/// Order routes plus request-body and query error handling. Static segments
/// are registered before `/{order_id}` so they are matched first.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        state.register(cfg);
        cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        }))
        .service(
            web::scope("/orders")
                .route("", web::post().to(handlers::orders::create_order))
                .route("", web::get().to(handlers::orders::list_orders))
                .route("/all", web::get().to(handlers::orders::list_all_orders))
                .route("/status", web::put().to(handlers::orders::update_order_status))
                .route("/delivery", web::put().to(handlers::orders::update_order_delivery))
                .route("/{order_id}", web::get().to(handlers::orders::get_order))
                .route("/{order_id}", web::delete().to(handlers::orders::delete_order))
                .route("/{order_id}/lines", web::get().to(handlers::orders::get_order_lines)),
        )
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        );
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure(state.clone()))
    })
    .bind((host.to_string(), port))?
    .run())
}
