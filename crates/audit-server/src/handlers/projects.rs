use actix_web::{web, HttpResponse};
use audit_core::{Project, StepRecord, WebsiteSummary};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub website_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub steps: Vec<StepRecord>,
    pub website_summary: Option<WebsiteSummary>,
}

pub async fn create(
    state: web::Data<AppState>,
    request: web::Json<CreateProjectRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let project = state
        .pipeline
        .create_project(request.name, request.website_url)
        .await
        .map_err(|e| state.error(e))?;

    Ok(HttpResponse::Created().json(project))
}

pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse> {
    let projects = state
        .pipeline
        .store()
        .list_projects()
        .await
        .map_err(|e| state.error(e))?;

    Ok(HttpResponse::Ok().json(projects))
}

pub async fn detail(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let project_id = path.into_inner();
    let project = state
        .pipeline
        .project(project_id)
        .await
        .map_err(|e| state.error(e))?;

    let store = state.pipeline.store();
    let steps = store
        .list_steps(project.id)
        .await
        .map_err(|e| state.error(e))?;
    let website_summary = store
        .get_website_summary(project.id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(HttpResponse::Ok().json(ProjectDetail {
        project,
        steps,
        website_summary,
    }))
}
