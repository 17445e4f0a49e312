pub mod admisiones;
pub mod ai;
pub mod estados;
pub mod funnel;
pub mod kpi;
pub mod leads;
pub mod login;
pub mod no_util;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use admisiones::{AdmisionRow, AdmisionesResponse};
pub use estados::{EstadosResponse, ProgramEstado};
pub use funnel::{FunnelResponse, FunnelStage};
pub use kpi::KpiSnapshot;
pub use leads::{Lead, LeadPage};
pub use no_util::{NoUtilReason, NoUtilResponse};

/// Academic level filter accepted by every dashboard endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Nivel {
    #[default]
    #[serde(alias = "todos")]
    Todos,
    #[serde(alias = "grado")]
    Grado,
    #[serde(alias = "posgrado")]
    Posgrado,
}

impl Nivel {
    pub const ALL: [Nivel; 3] = [Nivel::Todos, Nivel::Grado, Nivel::Posgrado];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nivel::Todos => "TODOS",
            Nivel::Grado => "GRADO",
            Nivel::Posgrado => "POSGRADO",
        }
    }
}

impl fmt::Display for Nivel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown nivel '{0}', expected TODOS, GRADO or POSGRADO")]
pub struct ParseNivelError(String);

impl FromStr for Nivel {
    type Err = ParseNivelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODOS" => Ok(Nivel::Todos),
            "GRADO" => Ok(Nivel::Grado),
            "POSGRADO" => Ok(Nivel::Posgrado),
            _ => Err(ParseNivelError(s.to_string())),
        }
    }
}

/// Lenient field decoders. The backend is loose about numeric types
/// (ints, floats, numeric strings, nulls), so every count goes through here.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Non-negative count; missing, null, negative or garbage reads as 0.
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(raw.as_ref().map(count_from_value).unwrap_or(0))
    }

    pub fn count_from_value(v: &Value) -> u64 {
        let as_float = match v {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    return u;
                }
                n.as_f64()
            }
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        as_float
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.round() as u64)
            .unwrap_or(0)
    }

    /// Signed value that may be absent.
    pub fn signed<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(match raw {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
            _ => None,
        })
    }

    pub fn ratio<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        let value = match raw {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.filter(|f| f.is_finite()).unwrap_or(0.0))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(match raw {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nivel_parses_case_insensitively() {
        assert_eq!("grado".parse::<Nivel>().unwrap(), Nivel::Grado);
        assert_eq!(" POSGRADO ".parse::<Nivel>().unwrap(), Nivel::Posgrado);
        assert!("doctorado".parse::<Nivel>().is_err());
    }

    #[test]
    fn nivel_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Nivel::Todos).unwrap(), json!("TODOS"));
        let parsed: Nivel = serde_json::from_value(json!("posgrado")).unwrap();
        assert_eq!(parsed, Nivel::Posgrado);
    }

    #[test]
    fn counts_are_lenient() {
        assert_eq!(de::count_from_value(&json!(12)), 12);
        assert_eq!(de::count_from_value(&json!(12.6)), 13);
        assert_eq!(de::count_from_value(&json!("40")), 40);
        assert_eq!(de::count_from_value(&json!(-3)), 0);
        assert_eq!(de::count_from_value(&json!(null)), 0);
        assert_eq!(de::count_from_value(&json!("n/a")), 0);
    }
}
