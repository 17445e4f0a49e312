use serde::{Deserialize, Serialize};

use super::de;

/// Campaign-wide counts for one `nivel` filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    #[serde(default, deserialize_with = "de::count")]
    pub total_leads: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub en_gestion: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub op_venta: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub proceso_pago: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub pagados: u64,
    /// Goal for paid enrollments; independent of the observed counts.
    #[serde(default, deserialize_with = "de::count")]
    pub metas: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub matriculados: u64,
}
