use actix_web::{web, HttpResponse};
use audit_core::StepContext;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

/// Stateless step request; earlier outputs travel in `context` as
/// `step{N}_results`.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub step: u32,
    #[serde(default)]
    pub context: StepContext,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub response: String,
}

pub async fn handler(
    state: web::Data<AppState>,
    request: web::Json<ProcessRequest>,
) -> Result<HttpResponse> {
    let ProcessRequest { step, context } = request.into_inner();
    let run = state
        .pipeline
        .process_step(step, context)
        .await
        .map_err(|e| state.error(e))?;

    Ok(HttpResponse::Ok().json(ProcessResponse {
        response: run.response,
    }))
}
