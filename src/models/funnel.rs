use serde::{Deserialize, Serialize};

use super::de;

pub const TOTAL_LEADS_STAGE: &str = "Total Leads";
pub const OP_VENTA_STAGE: &str = "Oportunidad de Venta";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    #[serde(default, deserialize_with = "de::text")]
    pub stage: String,
    #[serde(default, deserialize_with = "de::count")]
    pub value: u64,
    /// Share of the first stage as sent by the backend, not clamped.
    #[serde(default, deserialize_with = "de::ratio")]
    pub percent: f64,
}

impl FunnelStage {
    /// Percent clamped to [0, 100] for bar widths and labels.
    pub fn display_percent(&self) -> f64 {
        if self.percent.is_finite() {
            self.percent.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// The funnel endpoint answers either with a bare list or wrapped in `funnel`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FunnelResponse {
    Stages(Vec<FunnelStage>),
    Wrapped {
        funnel: Vec<FunnelStage>,
    },
}

impl FunnelResponse {
    pub fn into_stages(self) -> Vec<FunnelStage> {
        match self {
            FunnelResponse::Stages(stages) => stages,
            FunnelResponse::Wrapped { funnel } => funnel,
        }
    }
}

/// Value of the stage with exactly this label.
pub fn stage_value(stages: &[FunnelStage], label: &str) -> Option<u64> {
    stages.iter().find(|s| s.stage == label).map(|s| s.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_and_wrapped_lists() {
        let bare: FunnelResponse =
            serde_json::from_value(json!([{ "stage": "Total Leads", "value": 10, "percent": 100 }]))
                .unwrap();
        assert_eq!(bare.into_stages().len(), 1);

        let wrapped: FunnelResponse = serde_json::from_value(json!({
            "funnel": [
                { "stage": "Total Leads", "value": 10, "percent": 100 },
                { "stage": "Pagados", "value": 2, "percent": 20.0 }
            ]
        }))
        .unwrap();
        let stages = wrapped.into_stages();
        assert_eq!(stages[1].stage, "Pagados");
        assert_eq!(stage_value(&stages, TOTAL_LEADS_STAGE), Some(10));
    }

    #[test]
    fn display_percent_is_clamped() {
        let stage = FunnelStage {
            stage: "Pagados".into(),
            value: 5,
            percent: 140.0,
        };
        assert_eq!(stage.display_percent(), 100.0);
        assert_eq!(stage.percent, 140.0);

        let negative = FunnelStage {
            percent: -2.5,
            ..stage
        };
        assert_eq!(negative.display_percent(), 0.0);
    }
}
