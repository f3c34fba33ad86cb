use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::StepContext;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub website_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub website_url: String,
}

impl NewProject {
    pub fn new(name: impl Into<String>, website_url: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        let website_url = website_url.into().trim().to_string();

        if name.is_empty() {
            return Err(PipelineError::InvalidInput(
                "project name must not be empty".to_string(),
            ));
        }
        if !(website_url.starts_with("http://") || website_url.starts_with("https://")) {
            return Err(PipelineError::InvalidInput(format!(
                "website url '{}' must start with http:// or https://",
                website_url
            )));
        }

        Ok(Self { name, website_url })
    }
}

/// One execution of a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: i64,
    pub project_id: i64,
    pub step_number: u32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteSummary {
    pub id: i64,
    pub project_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enriched context a step was rendered with, kept for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: i64,
    pub project_id: i64,
    pub step_number: u32,
    pub content: StepContext,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_trims_input() {
        let project = NewProject::new("  Acme ", " https://acme.test ").unwrap();
        assert_eq!(project.name, "Acme");
        assert_eq!(project.website_url, "https://acme.test");
    }

    #[test]
    fn new_project_rejects_blank_name_and_bad_url() {
        assert!(matches!(
            NewProject::new("   ", "https://acme.test"),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            NewProject::new("Acme", "acme.test"),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
