use serde::{Deserialize, Serialize};

use super::de;

/// Per-program pipeline state row from the `estados` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEstado {
    #[serde(default, deserialize_with = "de::text")]
    pub programa: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nivel: Option<String>,
    #[serde(default, deserialize_with = "de::count")]
    pub leads: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub en_gestion: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub no_util: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub op_venta: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub proceso_pago: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub solicitados: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub admitidos: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub pagados: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub meta: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstadosResponse {
    /// Absent when the backend has nothing to break down.
    #[serde(default)]
    pub estados_by_programa: Option<Vec<ProgramEstado>>,
}
