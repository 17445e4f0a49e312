use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::models::{AdmisionRow, FunnelStage, KpiSnapshot, Nivel, ProgramEstado};

/// Latest dashboard data seen by one session, handed to the assistant as
/// grounding. Each `record_*` call overwrites its slot; there is no history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsContext {
    pub nivel: Nivel,
    pub kpis: Option<KpiSnapshot>,
    pub funnel: Option<Vec<FunnelStage>>,
    pub admisiones: Option<Vec<AdmisionRow>>,
    pub estados: Option<Vec<ProgramEstado>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AnalyticsContext {
    fn touch(&mut self, nivel: Nivel) {
        self.nivel = nivel;
        self.updated_at = Some(Utc::now());
    }

    pub fn record_kpis(&mut self, nivel: Nivel, kpis: &KpiSnapshot) {
        self.touch(nivel);
        self.kpis = Some(kpis.clone());
    }

    pub fn record_funnel(&mut self, nivel: Nivel, funnel: &[FunnelStage]) {
        self.touch(nivel);
        self.funnel = Some(funnel.to_vec());
    }

    pub fn record_admisiones(&mut self, nivel: Nivel, rows: &[AdmisionRow]) {
        self.touch(nivel);
        self.admisiones = Some(rows.to_vec());
    }

    pub fn record_estados(&mut self, nivel: Nivel, rows: &[ProgramEstado]) {
        self.touch(nivel);
        self.estados = Some(rows.to_vec());
    }

    pub fn is_empty(&self) -> bool {
        self.kpis.is_none()
            && self.funnel.is_none()
            && self.admisiones.is_none()
            && self.estados.is_none()
    }

    /// Payload sent along with a chat message. Only the slots that were
    /// fetched are included.
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({ "nivel": self.nivel });
        if let Some(obj) = payload.as_object_mut() {
            if let Some(kpis) = &self.kpis {
                obj.insert("kpis".into(), json!(kpis));
            }
            if let Some(funnel) = &self.funnel {
                obj.insert("funnel".into(), json!(funnel));
            }
            if let Some(admisiones) = &self.admisiones {
                obj.insert("admisiones".into(), json!(admisiones));
            }
            if let Some(estados) = &self.estados {
                obj.insert("estados".into(), json!(estados));
            }
        }
        payload
    }
}
