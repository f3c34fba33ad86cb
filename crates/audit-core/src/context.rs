use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value record used to render a step prompt.
///
/// Values stay as JSON so callers can pass lists (H1/H2 tags) as well as
/// plain text. Rendering turns every value into text, see [`StepContext::render_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepContext(Map<String, Value>);

impl StepContext {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merge `other` into this record, overwriting keys present in both.
    pub fn extend(&mut self, other: StepContext) {
        self.0.extend(other.0);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text substituted for `key` in a template: strings verbatim, `null` as
    /// empty text, anything else as compact JSON.
    pub fn render_value(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|value| match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for StepContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StepContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_value_formats_each_json_kind() {
        let context: StepContext = [
            ("text", json!("plain")),
            ("missing", Value::Null),
            ("tags", json!(["Welcome", "About"])),
            ("count", json!(3)),
        ]
        .into_iter()
        .collect();

        assert_eq!(context.render_value("text").as_deref(), Some("plain"));
        assert_eq!(context.render_value("missing").as_deref(), Some(""));
        assert_eq!(
            context.render_value("tags").as_deref(),
            Some(r#"["Welcome","About"]"#)
        );
        assert_eq!(context.render_value("count").as_deref(), Some("3"));
        assert_eq!(context.render_value("absent"), None);
    }

    #[test]
    fn extend_overwrites_existing_keys() {
        let mut context = StepContext::new();
        context.insert("title", "caller title");
        context.insert("website", "https://example.com");

        let mut signals = StepContext::new();
        signals.insert("title", "page title");
        context.extend(signals);

        assert_eq!(context.get_str("title"), Some("page title"));
        assert_eq!(context.get_str("website"), Some("https://example.com"));
    }

    #[test]
    fn deserializes_from_plain_json_object() {
        let context: StepContext =
            serde_json::from_value(json!({"website": "https://acme.test"})).unwrap();
        assert_eq!(context.get_str("website"), Some("https://acme.test"));
        assert_eq!(context.len(), 1);
    }
}
