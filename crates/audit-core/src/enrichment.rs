//! Step-dependent context enrichment.
//!
//! Enrichment is pure: it only combines the caller's context with the step
//! history and the optional website data handed in by the engine. Absent
//! history entries are treated as empty text and never fail a step.

use std::collections::BTreeMap;

use crate::context::StepContext;
use crate::templates::LAST_STEP;

pub const PREVIOUS_STEPS_KEY: &str = "previous_steps";
pub const AUDIT_RESULTS_KEY: &str = "audit_results";
pub const KEYWORD_RESEARCH_KEY: &str = "keyword_research";
pub const WEBSITE_SUMMARY_KEY: &str = "website_summary";

/// Context key carrying a caller-supplied output for `step`.
pub fn results_key(step: u32) -> String {
    format!("step{}_results", step)
}

/// Outputs of earlier steps, keyed by step number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepHistory {
    outputs: BTreeMap<u32, String>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History carried in a request as `step{N}_results` keys.
    pub fn from_context(context: &StepContext) -> Self {
        (1..=LAST_STEP)
            .filter_map(|step| {
                context
                    .get_str(&results_key(step))
                    .map(|content| (step, content.to_string()))
            })
            .collect()
    }

    /// Record `content` for `step`, replacing any earlier output.
    pub fn insert(&mut self, step: u32, content: impl Into<String>) {
        self.outputs.insert(step, content.into());
    }

    pub fn get(&self, step: u32) -> Option<&str> {
        self.outputs.get(&step).map(String::as_str)
    }

    pub fn content_or_empty(&self, step: u32) -> &str {
        self.get(step).unwrap_or_default()
    }

    /// Take entries from `other` only for steps this history lacks.
    pub fn fill_gaps_from(&mut self, other: StepHistory) {
        for (step, content) in other.outputs {
            self.outputs.entry(step).or_insert(content);
        }
    }

    /// Newline-joined outputs of steps `1..step`, empty text for gaps.
    pub fn previous_steps(&self, step: u32) -> String {
        (1..step)
            .map(|earlier| self.content_or_empty(earlier))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl FromIterator<(u32, String)> for StepHistory {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        Self {
            outputs: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichmentSources<'a> {
    pub history: Option<&'a StepHistory>,
    /// Set by the persistence-backed pipeline; injected on step 2.
    pub website_summary: Option<&'a str>,
    /// Website signals merged into the context on step 1.
    pub signals: Option<&'a StepContext>,
}

impl<'a> EnrichmentSources<'a> {
    pub fn new(history: &'a StepHistory) -> Self {
        Self {
            history: Some(history),
            ..Self::default()
        }
    }

    pub fn with_website_summary(mut self, summary: &'a str) -> Self {
        self.website_summary = Some(summary);
        self
    }

    pub fn with_signals(mut self, signals: &'a StepContext) -> Self {
        self.signals = Some(signals);
        self
    }
}

pub fn enrich_context(
    step: u32,
    mut context: StepContext,
    sources: &EnrichmentSources<'_>,
) -> StepContext {
    let empty = StepHistory::new();
    let history = sources.history.unwrap_or(&empty);

    match step {
        1 => {
            if let Some(signals) = sources.signals {
                context.extend(signals.clone());
            }
        }
        2 => {
            if let Some(summary) = sources.website_summary {
                context.insert(WEBSITE_SUMMARY_KEY, summary);
            }
            context.insert(AUDIT_RESULTS_KEY, history.content_or_empty(1));
        }
        5 => {
            context.insert(KEYWORD_RESEARCH_KEY, history.content_or_empty(4));
        }
        _ => {}
    }

    context.insert(PREVIOUS_STEPS_KEY, history.previous_steps(step));
    context
}
