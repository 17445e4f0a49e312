use serde::{Deserialize, Serialize};

use super::de;

/// One disqualification reason with its lead counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoUtilReason {
    #[serde(default, deserialize_with = "de::text")]
    pub subcategoria: String,
    #[serde(default, deserialize_with = "de::count")]
    pub leads: u64,
    /// Computed server side; not re-validated here.
    #[serde(default, deserialize_with = "de::ratio")]
    pub porcentaje: f64,
    #[serde(default, deserialize_with = "de::count")]
    pub leads_7d: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub leads_14d: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NoUtilResponse {
    Reasons(Vec<NoUtilReason>),
    Wrapped {
        #[serde(alias = "reasons", alias = "data")]
        no_util: Vec<NoUtilReason>,
    },
}

impl NoUtilResponse {
    pub fn into_reasons(self) -> Vec<NoUtilReason> {
        match self {
            NoUtilResponse::Reasons(reasons) => reasons,
            NoUtilResponse::Wrapped { no_util } => no_util,
        }
    }
}
