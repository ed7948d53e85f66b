use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use tracing::info;

use tasksphere::api;
use tasksphere::api::error::ApiError;
use tasksphere::config::Config;
use tasksphere::repository;
use tasksphere::service::TodoService;
use tasksphere::telemetry;

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

#[get("/health")]
async fn healthcheck() -> impl Responder {
    let response = Response {
        message: "Everything is working fine".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::not_found(&req))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing(env!("CARGO_PKG_NAME"))?;
    let config = Config::from_env()?;

    let store = repository::connect(&config.storage).await?;
    let app_data = web::Data::new(TodoService::new(store));

    info!(host = %config.host, port = config.port, "Starting server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(api::api::config)
            .service(healthcheck)
            .default_service(web::route().to(not_found))
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
