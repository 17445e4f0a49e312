use serde::{Deserialize, Serialize};

use super::de;

/// Per-program admissions row with period-over-period variances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmisionRow {
    #[serde(default, deserialize_with = "de::text")]
    pub programa: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nivel: Option<String>,
    #[serde(default, deserialize_with = "de::count")]
    pub solicitados: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub admitidos: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub pagados: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub meta: u64,
    #[serde(default, deserialize_with = "de::signed")]
    pub var_solicitados: Option<i64>,
    #[serde(default, deserialize_with = "de::signed")]
    pub var_admitidos: Option<i64>,
    #[serde(default, deserialize_with = "de::signed")]
    pub var_pagados: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AdmisionesResponse {
    Rows(Vec<AdmisionRow>),
    Wrapped {
        #[serde(alias = "programas")]
        admisiones: Vec<AdmisionRow>,
    },
}

impl AdmisionesResponse {
    pub fn into_rows(self) -> Vec<AdmisionRow> {
        match self {
            AdmisionesResponse::Rows(rows) => rows,
            AdmisionesResponse::Wrapped { admisiones } => admisiones,
        }
    }
}
