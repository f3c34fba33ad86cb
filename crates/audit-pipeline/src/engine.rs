//! Step pipeline engine.
//!
//! One invocation is a straight sequence: fetch website signals (step 1),
//! enrich the context, render the prompt, call the completion service and,
//! for project runs, persist the outcome in a single transaction. Runs for
//! the same project are not serialized here; concurrent runs append their
//! own step rows and the last summary write wins.

use std::sync::Arc;

use audit_core::{
    enrich_context, extract_website_summary, is_known_step, render_prompt, step_title,
    EnrichmentSources, NewProject, PipelineError, Project, Result, StepContext, StepHistory,
    SYSTEM_PROMPT,
};
use audit_llm::CompletionService;
use audit_store::{AuditStore, NewStepRun};
use serde::Serialize;

use crate::fetcher::{extract_signals, WebFetcher};

/// Context key holding the site to audit in stateless step 1 requests.
pub const WEBSITE_KEY: &str = "website";

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRun {
    pub step: u32,
    pub title: String,
    pub response: String,
    pub context: StepContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_summary: Option<String>,
    #[serde(skip)]
    pub prompt: String,
}

pub struct StepPipeline {
    store: Arc<dyn AuditStore>,
    completions: Arc<dyn CompletionService>,
    fetcher: Arc<dyn WebFetcher>,
}

impl StepPipeline {
    pub fn new(
        store: Arc<dyn AuditStore>,
        completions: Arc<dyn CompletionService>,
        fetcher: Arc<dyn WebFetcher>,
    ) -> Self {
        Self {
            store,
            completions,
            fetcher,
        }
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    pub async fn create_project(
        &self,
        name: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Result<Project> {
        let project = NewProject::new(name, website_url)?;
        let project = self.store.create_project(project).await?;
        log::info!(
            "[project {}] Created project '{}' for {}",
            project.id,
            project.name,
            project.website_url
        );
        Ok(project)
    }

    pub async fn project(&self, project_id: i64) -> Result<Project> {
        self.store
            .get_project(project_id)
            .await?
            .ok_or_else(|| PipelineError::project_not_found(project_id))
    }

    /// Run `step` for a stored project, reading history from earlier runs and
    /// persisting the outcome.
    ///
    /// Caller-supplied `step{N}_results` keys only fill steps that were never
    /// persisted. Nothing is written when any stage fails.
    pub async fn run_step(
        &self,
        project_id: i64,
        step: u32,
        mut partial: StepContext,
    ) -> Result<StepRun> {
        let title = known_step_title(step)?;
        let project = self.project(project_id).await?;
        log::info!("[project {}] Running step {} ({})", project.id, step, title);

        let mut history: StepHistory = self
            .store
            .list_steps(project.id)
            .await?
            .into_iter()
            .map(|record| (record.step_number, record.content))
            .collect();
        history.fill_gaps_from(StepHistory::from_context(&partial));

        let website_summary = if step == 2 {
            Some(
                self.store
                    .get_website_summary(project.id)
                    .await?
                    .map(|summary| summary.content)
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        let signals = if step == 1 {
            partial.insert(WEBSITE_KEY, project.website_url.clone());
            Some(self.website_signals(&project.website_url).await?)
        } else {
            None
        };

        let mut sources = EnrichmentSources::new(&history);
        if let Some(summary) = website_summary.as_deref() {
            sources = sources.with_website_summary(summary);
        }
        if let Some(signals) = signals.as_ref() {
            sources = sources.with_signals(signals);
        }
        let context = enrich_context(step, partial, &sources);

        let (prompt, response) = self.dispatch(step, &context).await?;

        let extracted_summary = if step == 1 {
            let summary = extract_website_summary(&response);
            if summary.is_none() {
                log::warn!(
                    "[project {}] Website audit response has no summary section",
                    project.id
                );
            }
            summary
        } else {
            None
        };

        let recorded = self
            .store
            .record_step_run(NewStepRun {
                project_id: project.id,
                step_number: step,
                title: title.to_string(),
                content: response.clone(),
                website_summary: extracted_summary.clone(),
                context: context.clone(),
            })
            .await?;
        log::info!(
            "[project {}] Stored step {} as record {}",
            project.id,
            step,
            recorded.step.id
        );

        Ok(StepRun {
            step,
            title: title.to_string(),
            response,
            context,
            website_summary: extracted_summary,
            prompt,
        })
    }

    /// Run `step` without persistence; earlier outputs come from the request
    /// as `step{N}_results` and step 1 reads the site from `website`.
    pub async fn process_step(&self, step: u32, partial: StepContext) -> Result<StepRun> {
        let title = known_step_title(step)?;
        log::info!("Processing step {} ({}) with {} context keys", step, title, partial.len());

        let history = StepHistory::from_context(&partial);

        let signals = if step == 1 {
            let url = partial
                .get_str(WEBSITE_KEY)
                .map(str::to_string)
                .ok_or_else(|| PipelineError::MissingFields {
                    step,
                    fields: vec![WEBSITE_KEY.to_string()],
                })?;
            Some(self.website_signals(&url).await?)
        } else {
            None
        };

        let mut sources = EnrichmentSources::new(&history);
        if let Some(signals) = signals.as_ref() {
            sources = sources.with_signals(signals);
        }
        let context = enrich_context(step, partial, &sources);

        let (prompt, response) = self.dispatch(step, &context).await?;

        Ok(StepRun {
            step,
            title: title.to_string(),
            response,
            context,
            website_summary: None,
            prompt,
        })
    }

    async fn website_signals(&self, url: &str) -> Result<StepContext> {
        let report = extract_signals(self.fetcher.as_ref(), url).await;
        if let Some(error) = report.error() {
            return Err(PipelineError::Fetch {
                url: url.to_string(),
                message: error.to_string(),
            });
        }
        Ok(report.into_context())
    }

    async fn dispatch(&self, step: u32, context: &StepContext) -> Result<(String, String)> {
        let prompt = render_prompt(step, context)?;
        log::debug!("Generated prompt for step {}: {}", step, prompt);

        log::info!("Sending step {} prompt to completion service", step);
        let response = self
            .completions
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(PipelineError::completion)?;
        log::info!(
            "Received step {} response: {}...",
            step,
            response.chars().take(100).collect::<String>()
        );

        Ok((prompt, response))
    }
}

fn known_step_title(step: u32) -> Result<&'static str> {
    if !is_known_step(step) {
        return Err(PipelineError::InvalidStep(step));
    }
    step_title(step).ok_or(PipelineError::InvalidStep(step))
}
