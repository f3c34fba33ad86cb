//! Prompt templates for the ten pipeline steps.
//!
//! Templates use `{name}` placeholders filled from the step context; `{{` and
//! `}}` produce literal braces. Each template declares the fields it needs so
//! a render can fail with the exact list of missing keys.

use crate::context::StepContext;
use crate::error::{PipelineError, Result};

pub const FIRST_STEP: u32 = 1;
pub const LAST_STEP: u32 = 10;

pub const SYSTEM_PROMPT: &str = "You are a marketing strategy AI assistant with expertise in website auditing, optimization, and keyword research.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub step: u32,
    pub title: &'static str,
    pub body: &'static str,
    pub required_fields: &'static [&'static str],
}

const WEBSITE_AUDIT: &str = r#"Perform an audit on the following website, focusing on:
1. On-page SEO opportunities
2. Tracking tag installation (GA and FB tags)
3. Overall UI/UX opportunities
4. CRO opportunities

Here's the website data:
URL: {url}
Title: {title}
Meta Description: {meta_description}
H1 Tags: {h1_tags}
H2 Tags: {h2_tags}
Google Analytics: {ga_tag}
Facebook Pixel: {fb_pixel}

Additional HTML content:
{full_html}

Please provide a detailed analysis and specific recommendations for improvement in each area.

Format your response as follows:
1. Website Summary: [a short summary of what the business offers and who it serves]
2. SEO Audit: [findings and recommendations]
3. Tracking Tags: [findings and recommendations]
4. UI/UX: [findings and recommendations]
5. CRO: [findings and recommendations]"#;

const CLIENT_AVATARS: &str = "Based on the following audit results, make intelligent guesses on the target client avatar(s) for this business. Give a detailed avatar including demographics, psychographics, pain points, fears, ideal outcomes as it pertains to this business for each of the target avatars. Audit results: {audit_results}";

const VALUE_PROPOSITIONS: &str = "Create a list of unique value propositions for the business based on the following information. These value props should be incredibly niche-focused and should be formatted as either: 1. 'We help {{market}} do {{thing}} without {{pain point}}.' 2. '{{service or product}} for {{descriptor}} {{client avatar}}.' 3. 'We help {{avatar}} do {{thing}} so they can {{ideal outcome}}.' Information: {previous_steps}";

const KEYWORD_RESEARCH: &str = r#"Perform keyword research based on the context from previous steps. Focus on determining:
1. Main target keyword with a monthly search volume greater than 500, keyword difficulty below 21 and more than 40 related keywords
2. Results should include the target keyword, the search volume, keyword difficulty and a list of related keywords to help rank for that target keyword.

Previous context:
{previous_steps}

Format your response as follows:
Target Keyword: [keyword]
Search Volume: [volume]
Keyword Difficulty: [difficulty]
Related Keywords: [keyword1], [keyword2], [keyword3], ..."#;

const CONTENT_PLAN: &str = r#"Create a detailed content marketing plan based on a hub and spoke or content silo/cluster approach using the target keyword and related keywords from the previous step. The entire content plan should be based on ranking for the target keyword.

Keyword research results:
{keyword_research}

Previous context:
{previous_steps}"#;

const LEAD_MAGNETS: &str = "Based on context from all previous steps, create a list of lead magnets and free tool marketing options to reach our target avatar with the highest purchase intent. Context: {previous_steps}";

const EMAIL_PLAN: &str = "Create a detailed email marketing plan that includes a nurture sequence, sales sequence and ongoing content via email to keep the mailing list warm. Use the following context: {previous_steps}";

const AWARENESS_CONTENT: &str = "Create a plan for content and emails that address all other stages of awareness. Use the following context: {previous_steps}";

const MASTER_PLAN: &str = "Create a point-by-point report detailing the entire plan that includes everything from the above steps. This plan should break all learnings down into multiple projects that can be completed separately from each other. The projects should be ordered by lowest-effort, highest return to highest-effort, lowest return so we're focusing on knocking out the easy but impactful projects early, then building out the longer term, high-value projects over time. Context: {previous_steps}";

const INCOME_STREAMS: &str = "Give me a list of ideas for other income streams this business could create related to everything we've discussed so far. Each income stream should include a summary of the business, how it would be monetized and any further details necessary to determine if it's something the company wants to pursue. These income streams should include (but not be limited to) online courses, digital downloads, productized services, paid content (newsletters, etc.), monetized directories, memberships and SaaS opportunities. Context: {previous_steps}";

static TEMPLATES: [PromptTemplate; 10] = [
    PromptTemplate {
        step: 1,
        title: "Website Audit",
        body: WEBSITE_AUDIT,
        required_fields: &[
            "url",
            "title",
            "meta_description",
            "h1_tags",
            "h2_tags",
            "ga_tag",
            "fb_pixel",
            "full_html",
        ],
    },
    PromptTemplate {
        step: 2,
        title: "Client Avatars",
        body: CLIENT_AVATARS,
        required_fields: &["audit_results"],
    },
    PromptTemplate {
        step: 3,
        title: "Value Propositions",
        body: VALUE_PROPOSITIONS,
        required_fields: &["previous_steps"],
    },
    PromptTemplate {
        step: 4,
        title: "Keyword Research",
        body: KEYWORD_RESEARCH,
        required_fields: &["previous_steps"],
    },
    PromptTemplate {
        step: 5,
        title: "Content Plan",
        body: CONTENT_PLAN,
        required_fields: &["keyword_research", "previous_steps"],
    },
    PromptTemplate {
        step: 6,
        title: "Lead Magnets",
        body: LEAD_MAGNETS,
        required_fields: &["previous_steps"],
    },
    PromptTemplate {
        step: 7,
        title: "Email Marketing Plan",
        body: EMAIL_PLAN,
        required_fields: &["previous_steps"],
    },
    PromptTemplate {
        step: 8,
        title: "Awareness Content",
        body: AWARENESS_CONTENT,
        required_fields: &["previous_steps"],
    },
    PromptTemplate {
        step: 9,
        title: "Master Plan",
        body: MASTER_PLAN,
        required_fields: &["previous_steps"],
    },
    PromptTemplate {
        step: 10,
        title: "Income Streams",
        body: INCOME_STREAMS,
        required_fields: &["previous_steps"],
    },
];

pub fn template_for(step: u32) -> Option<&'static PromptTemplate> {
    TEMPLATES.iter().find(|template| template.step == step)
}

pub fn step_title(step: u32) -> Option<&'static str> {
    template_for(step).map(|template| template.title)
}

pub fn is_known_step(step: u32) -> bool {
    (FIRST_STEP..=LAST_STEP).contains(&step)
}

/// Render the prompt for `step`.
///
/// A step without a template renders to an empty string; callers that must
/// reject unknown steps check [`is_known_step`] first.
pub fn render_prompt(step: u32, context: &StepContext) -> Result<String> {
    match template_for(step) {
        Some(template) => template.render(context),
        None => Ok(String::new()),
    }
}

impl PromptTemplate {
    pub fn missing_fields(&self, context: &StepContext) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|field| !context.contains(field))
            .map(|field| field.to_string())
            .collect()
    }

    pub fn render(&self, context: &StepContext) -> Result<String> {
        let missing = self.missing_fields(context);
        if !missing.is_empty() {
            return Err(PipelineError::MissingFields {
                step: self.step,
                fields: missing,
            });
        }

        substitute(self.body, context).map_err(|fields| PipelineError::MissingFields {
            step: self.step,
            fields,
        })
    }
}

/// Names of every `{placeholder}` in `body`, in order of appearance.
pub fn placeholders(body: &str) -> Vec<String> {
    let mut names = Vec::new();
    scan(body, |segment| {
        if let Segment::Placeholder(name) = segment {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }
    });
    names
}

fn substitute(body: &str, context: &StepContext) -> std::result::Result<String, Vec<String>> {
    let mut rendered = String::with_capacity(body.len());
    let mut missing = Vec::new();

    scan(body, |segment| match segment {
        Segment::Literal(text) => rendered.push_str(text),
        Segment::Brace(brace) => rendered.push(brace),
        Segment::Placeholder(name) => match context.render_value(name) {
            Some(value) => rendered.push_str(&value),
            None => {
                if !missing.iter().any(|existing: &String| existing == name) {
                    missing.push(name.to_string());
                }
            }
        },
    });

    if missing.is_empty() {
        Ok(rendered)
    } else {
        Err(missing)
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

fn scan<'a>(body: &'a str, mut visit: impl FnMut(Segment<'a>)) {
    let bytes = body.as_bytes();
    let mut literal_start = 0;
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'{' | b'}' if bytes.get(index + 1) == Some(&bytes[index]) => {
                visit(Segment::Literal(&body[literal_start..index]));
                visit(Segment::Brace(bytes[index] as char));
                index += 2;
                literal_start = index;
            }
            b'{' => match body[index + 1..].find('}') {
                Some(offset) if is_placeholder_name(&body[index + 1..index + 1 + offset]) => {
                    visit(Segment::Literal(&body[literal_start..index]));
                    visit(Segment::Placeholder(&body[index + 1..index + 1 + offset]));
                    index += offset + 2;
                    literal_start = index;
                }
                _ => index += 1,
            },
            _ => index += 1,
        }
    }

    visit(Segment::Literal(&body[literal_start..]));
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
