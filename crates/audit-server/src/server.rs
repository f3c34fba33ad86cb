use actix_cors::Cors;
use actix_web::{error, web, App, HttpRequest, HttpServer};
use audit_core::PipelineError;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handlers;
use crate::state::AppState;

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = web::Data::new(AppState::from_config(&config).await?);

    log::info!("Listening on http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .route("/health", web::get().to(handlers::health::handler))
            .route("/process", web::post().to(handlers::process::handler))
            .service(
                web::scope("/projects")
                    .route("", web::post().to(handlers::projects::create))
                    .route("", web::get().to(handlers::projects::list))
                    .route("/{project_id}", web::get().to(handlers::projects::detail))
                    .route(
                        "/{project_id}/steps/{step}",
                        web::post().to(handlers::steps::run),
                    )
                    .route(
                        "/{project_id}/steps/{step}",
                        web::get().to(handlers::steps::latest),
                    )
                    .route(
                        "/{project_id}/contexts/{step}",
                        web::get().to(handlers::steps::context),
                    ),
            ),
    );
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::new(
        PipelineError::InvalidInput(format!("malformed JSON body: {}", err)),
        false,
    )
    .into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::new(
        PipelineError::InvalidInput(format!("malformed path: {}", err)),
        false,
    )
    .into()
}
