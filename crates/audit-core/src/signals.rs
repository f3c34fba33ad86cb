use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::context::StepContext;

pub const NO_TITLE: &str = "No title found";
pub const NO_META_DESCRIPTION: &str = "No meta description found";
pub const GOOGLE_ANALYTICS_FOUND: &str = "Google Analytics tag found";
pub const GOOGLE_ANALYTICS_MISSING: &str = "No Google Analytics tag found";
pub const FACEBOOK_PIXEL_FOUND: &str = "Facebook Pixel found";
pub const FACEBOOK_PIXEL_MISSING: &str = "No Facebook Pixel found";

const GOOGLE_ANALYTICS_SNIPPET: &str = "google-analytics.com";
const FACEBOOK_PIXEL_SNIPPET: &str = "connect.facebook.net";
const MARKUP_EXCERPT_CHARS: usize = 5000;

static TITLE: Lazy<Selector> = Lazy::new(|| parse_selector("title"));
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| parse_selector(r#"meta[name="description"]"#));
static H1: Lazy<Selector> = Lazy::new(|| parse_selector("h1"));
static H2: Lazy<Selector> = Lazy::new(|| parse_selector("h2"));

fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// On-page SEO and tracking signals read from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteSignals {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub has_google_analytics: bool,
    pub has_facebook_pixel: bool,
    pub full_html: String,
}

impl WebsiteSignals {
    pub fn from_markup(url: &str, markup: &str) -> Self {
        let document = Html::parse_document(markup);

        let title = document
            .select(&TITLE)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let meta_description = document
            .select(&META_DESCRIPTION)
            .next()
            .and_then(|element| element.value().attr("content"))
            .map(str::to_string)
            .unwrap_or_else(|| NO_META_DESCRIPTION.to_string());

        Self {
            url: url.to_string(),
            title,
            meta_description,
            h1_tags: heading_texts(&document, &H1),
            h2_tags: heading_texts(&document, &H2),
            has_google_analytics: markup.contains(GOOGLE_ANALYTICS_SNIPPET),
            has_facebook_pixel: markup.contains(FACEBOOK_PIXEL_SNIPPET),
            full_html: markup.chars().take(MARKUP_EXCERPT_CHARS).collect(),
        }
    }

    pub fn ga_tag(&self) -> &'static str {
        if self.has_google_analytics {
            GOOGLE_ANALYTICS_FOUND
        } else {
            GOOGLE_ANALYTICS_MISSING
        }
    }

    pub fn fb_pixel(&self) -> &'static str {
        if self.has_facebook_pixel {
            FACEBOOK_PIXEL_FOUND
        } else {
            FACEBOOK_PIXEL_MISSING
        }
    }

    /// Context keys consumed by the website audit template.
    pub fn into_context(self) -> StepContext {
        let ga_tag = self.ga_tag();
        let fb_pixel = self.fb_pixel();

        let mut context = StepContext::new();
        context.insert("url", self.url);
        context.insert("title", self.title);
        context.insert("meta_description", self.meta_description);
        context.insert("h1_tags", self.h1_tags);
        context.insert("h2_tags", self.h2_tags);
        context.insert("ga_tag", ga_tag);
        context.insert("fb_pixel", fb_pixel);
        context.insert("full_html", self.full_html);
        context
    }
}

fn heading_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect()
}

/// Outcome of a signal extraction: either the signals or an `{error}` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalReport {
    Signals(WebsiteSignals),
    Error { error: String },
}

impl SignalReport {
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Signals(_) => None,
            Self::Error { error } => Some(error),
        }
    }

    pub fn into_context(self) -> StepContext {
        match self {
            Self::Signals(signals) => signals.into_context(),
            Self::Error { error } => {
                let mut context = StepContext::new();
                context.insert("error", error);
                context
            }
        }
    }
}
