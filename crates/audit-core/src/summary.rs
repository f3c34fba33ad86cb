pub const SUMMARY_START_MARKER: &str = "Website Summary:";
pub const SUMMARY_END_MARKER: &str = "2. SEO Audit:";

/// Pull the website summary section out of a website audit response.
///
/// The text between the two markers is returned trimmed. Returns `None` when
/// either marker is absent or the section is blank.
pub fn extract_website_summary(response: &str) -> Option<String> {
    let start = response.find(SUMMARY_START_MARKER)? + SUMMARY_START_MARKER.len();
    let section = &response[start..];
    let end = section.find(SUMMARY_END_MARKER)?;

    let summary = section[..end].trim();
    if summary.is_empty() {
        None
    } else {
        Some(summary.to_string())
    }
}
