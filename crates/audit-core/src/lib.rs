pub mod context;
pub mod enrichment;
pub mod error;
pub mod signals;
pub mod summary;
pub mod templates;
pub mod types;

pub use context::StepContext;
pub use enrichment::{enrich_context, results_key, EnrichmentSources, StepHistory};
pub use error::{ErrorKind, PipelineError, Result};
pub use signals::{SignalReport, WebsiteSignals};
pub use summary::extract_website_summary;
pub use templates::{
    is_known_step, render_prompt, step_title, template_for, PromptTemplate, FIRST_STEP, LAST_STEP,
    SYSTEM_PROMPT,
};
pub use types::{ContextRecord, NewProject, Project, StepRecord, WebsiteSummary};
