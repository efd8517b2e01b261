use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{AGENT_MODEL, SEARCH_SERVICE, SEMANTIC_MODEL};
use crate::models::message::Role;

pub const ANALYST_TOOL_NAME: &str = "analyst1";
pub const SEARCH_TOOL_NAME: &str = "search1";

/// The body of a `agent:run` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub model: String,
    pub messages: Vec<AgentMessage>,
    pub tools: Vec<ToolDeclaration>,
    pub tool_resources: BTreeMap<String, ToolResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: Role,
    pub content: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub tool_spec: ToolSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    CortexAnalystTextToSql,
    CortexSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResource {
    Analyst {
        semantic_model_file: String,
    },
    Search {
        name: String,
        max_results: u32,
    },
}

impl ToolDeclaration {
    fn new(kind: ToolKind, name: &str) -> Self {
        Self {
            tool_spec: ToolSpec {
                kind,
                name: name.to_string(),
            },
        }
    }
}

impl AgentRequest {
    /// Build the request for a single user question: text-to-SQL against the semantic
    /// model, plus the search service bounded by `limit` results.
    pub fn new(query: &str, limit: u32) -> Self {
        let mut tool_resources = BTreeMap::new();
        tool_resources.insert(
            ANALYST_TOOL_NAME.to_string(),
            ToolResource::Analyst {
                semantic_model_file: SEMANTIC_MODEL.to_string(),
            },
        );
        tool_resources.insert(
            SEARCH_TOOL_NAME.to_string(),
            ToolResource::Search {
                name: SEARCH_SERVICE.to_string(),
                max_results: limit,
            },
        );

        Self {
            model: AGENT_MODEL.to_string(),
            messages: vec![AgentMessage {
                role: Role::User,
                content: vec![MessagePart::Text {
                    text: query.to_string(),
                }],
            }],
            tools: vec![
                ToolDeclaration::new(ToolKind::CortexAnalystTextToSql, ANALYST_TOOL_NAME),
                ToolDeclaration::new(ToolKind::CortexSearch, SEARCH_TOOL_NAME),
            ],
            tool_resources,
        }
    }
}
