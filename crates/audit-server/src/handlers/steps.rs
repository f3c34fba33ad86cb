use actix_web::{web, HttpResponse};
use audit_core::{PipelineError, StepContext};
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RunStepRequest {
    #[serde(default)]
    pub context: StepContext,
}

pub async fn run(
    state: web::Data<AppState>,
    path: web::Path<(i64, u32)>,
    request: web::Json<RunStepRequest>,
) -> Result<HttpResponse> {
    let (project_id, step) = path.into_inner();
    let run = state
        .pipeline
        .run_step(project_id, step, request.into_inner().context)
        .await
        .map_err(|e| state.error(e))?;

    Ok(HttpResponse::Ok().json(run))
}

pub async fn latest(
    state: web::Data<AppState>,
    path: web::Path<(i64, u32)>,
) -> Result<HttpResponse> {
    let (project_id, step) = path.into_inner();
    let project = state
        .pipeline
        .project(project_id)
        .await
        .map_err(|e| state.error(e))?;

    match state
        .pipeline
        .store()
        .get_step(project.id, step)
        .await
        .map_err(|e| state.error(e))?
    {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(state.error(PipelineError::NotFound(format!(
            "step {} for project {}",
            step, project.id
        )))),
    }
}

pub async fn context(
    state: web::Data<AppState>,
    path: web::Path<(i64, u32)>,
) -> Result<HttpResponse> {
    let (project_id, step) = path.into_inner();
    let project = state
        .pipeline
        .project(project_id)
        .await
        .map_err(|e| state.error(e))?;

    match state
        .pipeline
        .store()
        .get_context(project.id, step)
        .await
        .map_err(|e| state.error(e))?
    {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(state.error(PipelineError::NotFound(format!(
            "context for step {} of project {}",
            step, project.id
        )))),
    }
}
