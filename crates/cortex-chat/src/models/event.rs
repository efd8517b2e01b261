use serde::Deserialize;
use serde_json::Value;

use super::fragment::Fragment;

/// The JSON payload of one event from the agent stream. Any well-formed JSON decodes;
/// fields with unexpected shapes fall back to empty values instead of failing the event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct StreamEvent {
    pub delta: Option<Delta>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub content: Vec<ContentItem>,
}

/// One entry of `delta.content`
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(String),
    ToolUse(ToolUse),
    ToolResults(ToolResults),
    Unknown(Option<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolUse {
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResults {
    pub tool_use_id: Option<String>,
    pub content: Vec<ToolResultContent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResultContent {
    pub kind: Option<String>,
    pub json: Option<ToolResultJson>,
}

/// Structured output of the analyst tool. Missing or null fields read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResultJson {
    pub text: String,
    pub sql: String,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Strings are taken as is, null or absent is empty, anything else is rendered as JSON.
fn text_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn list_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

impl From<Value> for StreamEvent {
    fn from(value: Value) -> Self {
        let delta = value.get("delta").filter(|d| d.is_object()).map(|delta| Delta {
            content: list_field(delta, "content")
                .iter()
                .map(ContentItem::from)
                .collect(),
        });
        StreamEvent { delta }
    }
}

impl From<&Value> for ContentItem {
    fn from(item: &Value) -> Self {
        let kind = item.get("type").and_then(Value::as_str);
        match (kind, item.get("tool_results")) {
            (Some("text"), _) => ContentItem::Text(text_field(item, "text")),
            (Some("tool_use"), _) => ContentItem::ToolUse(
                item.get("tool_use")
                    .cloned()
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default(),
            ),
            // Results are recognised by their payload, whatever the entry is tagged as
            (_, Some(results)) if results.is_object() => {
                ContentItem::ToolResults(ToolResults::from(results))
            }
            (kind, _) => ContentItem::Unknown(kind.map(str::to_string)),
        }
    }
}

impl From<&Value> for ToolResults {
    fn from(results: &Value) -> Self {
        ToolResults {
            tool_use_id: str_field(results, "tool_use_id"),
            content: list_field(results, "content")
                .iter()
                .map(|entry| ToolResultContent {
                    kind: str_field(entry, "type"),
                    json: entry
                        .get("json")
                        .filter(|json| json.is_object())
                        .map(|json| ToolResultJson {
                            text: text_field(json, "text"),
                            sql: text_field(json, "sql"),
                        }),
                })
                .collect(),
        }
    }
}

impl StreamEvent {
    pub fn parse(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// The fragments this event contributes to the answer. Shapes other than a text
    /// entry or a tool use followed by a JSON tool result contribute nothing.
    pub fn fragments(&self) -> Vec<Fragment> {
        let content = match &self.delta {
            Some(delta) => &delta.content,
            None => return Vec::new(),
        };

        match content.first() {
            Some(ContentItem::Text(text)) => vec![Fragment::Text(text.clone())],
            Some(ContentItem::ToolUse(_)) => match content.get(1) {
                Some(ContentItem::ToolResults(results)) => results
                    .content
                    .first()
                    .and_then(|result| result.json.as_ref())
                    .map(|json| {
                        vec![
                            Fragment::Text(json.text.clone()),
                            Fragment::Sql(json.sql.clone()),
                        ]
                    })
                    .unwrap_or_default(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}
