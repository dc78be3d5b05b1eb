use actix_web::dev::Server;
use actix_web::{error, http::StatusCode, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::routes::{
    handle_create_subscription, handle_get_license, handle_list_licenses,
    handle_list_licenses_by_email, handle_list_subscribers, handle_submit_license, health_check,
    message_response,
};

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server listening on {}", listener.local_addr()?);

        let server = run(listener, db_pool)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(listener: TcpListener, db_pool: PgPool) -> Result<Server, std::io::Error> {
    // The pool is the only state shared between requests
    let db_pool = web::Data::new(db_pool);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .route("/submit-license", web::post().to(handle_submit_license))
                    .route("/licenses", web::get().to(handle_list_licenses))
                    // Registered before "/licenses/{id}" so "email" is never taken as an id
                    .route(
                        "/licenses/email/{email}",
                        web::get().to(handle_list_licenses_by_email),
                    )
                    .route("/licenses/{id}", web::get().to(handle_get_license))
                    .route("/subscribers", web::get().to(handle_list_subscribers))
                    .route("/subscribe", web::post().to(handle_create_subscription)),
            )
            .app_data(json_config())
            .app_data(db_pool.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}

/// Malformed JSON bodies are answered with the same `{"message": ...}` shape as every other error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = message_response(StatusCode::BAD_REQUEST, &err.to_string());

        error::InternalError::from_response(err, response).into()
    })
}
