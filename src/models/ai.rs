use serde::{Deserialize, Serialize};

use super::{Nivel, de};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub nivel: Nivel,
    /// Latest dashboard data the assistant can ground its answer on.
    pub context: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, alias = "answer", alias = "reply", deserialize_with = "de::text")]
    pub response: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default, alias = "titulo", deserialize_with = "de::text")]
    pub title: String,
    #[serde(default, alias = "descripcion", alias = "text", deserialize_with = "de::text")]
    pub description: String,
    #[serde(default, alias = "type", alias = "tipo", deserialize_with = "de::opt_text")]
    pub kind: Option<String>,
    #[serde(default, alias = "prioridad", deserialize_with = "de::opt_text")]
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InsightsResponse {
    List(Vec<Insight>),
    Wrapped {
        insights: Vec<Insight>,
    },
}

impl InsightsResponse {
    pub fn into_insights(self) -> Vec<Insight> {
        match self {
            InsightsResponse::List(items) => items,
            InsightsResponse::Wrapped { insights } => insights,
        }
    }
}
