// Page-level loaders: fan out the backend calls for a view, apply the
// backfills and collect per-section failures so a view can render whatever
// did arrive.

use serde::Serialize;

use crate::client::{self, DashboardApi};
use crate::context::AnalyticsContext;
use crate::error::AppError;
use crate::metrics::{self, format_count, format_pct};
use crate::models::ai::{ChatReply, ChatRequest, Insight};
use crate::models::{AdmisionRow, FunnelStage, KpiSnapshot, Nivel, ProgramEstado};
use crate::reconcile::{self, Backfill};
use crate::rollup::{self, AdmisionTotals, ProgramTotals};

#[derive(Debug, Clone, Serialize)]
pub struct SectionError {
    pub section: &'static str,
    pub message: String,
}

/// Keep a section's data, or record why it is missing. An expired session
/// is not a section failure and aborts the whole view.
fn section<T>(
    name: &'static str,
    result: Result<T, AppError>,
    errors: &mut Vec<SectionError>,
) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::warn!("Section '{name}' failed to load: {e}");
            errors.push(SectionError {
                section: name,
                message: e.to_string(),
            });
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub nivel: Nivel,
    pub kpis: Option<KpiSnapshot>,
    pub funnel: Option<Vec<FunnelStage>>,
    pub admisiones: Option<Vec<AdmisionRow>>,
    pub insights: Option<Vec<Insight>>,
    pub avance: f64,
    pub conversion: f64,
    pub errors: Vec<SectionError>,
}

impl Overview {
    pub fn record_into(&self, ctx: &mut AnalyticsContext) {
        if let Some(kpis) = &self.kpis {
            ctx.record_kpis(self.nivel, kpis);
        }
        if let Some(funnel) = &self.funnel {
            ctx.record_funnel(self.nivel, funnel);
        }
        if let Some(rows) = &self.admisiones {
            ctx.record_admisiones(self.nivel, rows);
        }
    }
}

pub async fn load_kpis(api: &dyn DashboardApi, nivel: Nivel) -> Result<KpiSnapshot, AppError> {
    let mut kpis = client::kpis(api, nivel).await?;
    reconcile::backfill_kpi_op_venta(api, nivel, &mut kpis).await?;
    Ok(kpis)
}

pub async fn load_funnel(
    api: &dyn DashboardApi,
    nivel: Nivel,
) -> Result<Vec<FunnelStage>, AppError> {
    let mut stages = client::funnel(api, nivel).await?;
    if reconcile::backfill_funnel_op_venta(api, nivel, &mut stages).await? == Backfill::Failed {
        tracing::debug!("Funnel rendered without op_venta backfill");
    }
    Ok(stages)
}

/// KPI cards, funnel, admissions summary and insights, fetched concurrently.
pub async fn load_overview(api: &dyn DashboardApi, nivel: Nivel) -> Result<Overview, AppError> {
    let (kpis, funnel, admisiones, insights) = tokio::join!(
        load_kpis(api, nivel),
        load_funnel(api, nivel),
        client::admisiones(api, nivel),
        client::insights(api, nivel),
    );

    let mut errors = Vec::new();
    let kpis = section("kpis", kpis, &mut errors)?;
    let funnel = section("funnel", funnel, &mut errors)?;
    let admisiones = section("admisiones", admisiones, &mut errors)?;
    let insights = section("insights", insights, &mut errors)?;

    let (avance, conversion) = kpis
        .as_ref()
        .map(|k| {
            (
                metrics::avance(k.pagados, k.metas),
                metrics::conversion(k.pagados, k.total_leads),
            )
        })
        .unwrap_or((0.0, 0.0));

    Ok(Overview {
        nivel,
        kpis,
        funnel,
        admisiones,
        insights,
        avance,
        conversion,
        errors,
    })
}

/// Per-program admissions and estados tables with their totals.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramsView {
    pub nivel: Nivel,
    pub admisiones: Option<Vec<AdmisionRow>>,
    pub admision_totals: Option<AdmisionTotals>,
    pub estados: Option<Vec<ProgramEstado>>,
    pub estado_totals: Option<ProgramTotals>,
    pub errors: Vec<SectionError>,
}

impl ProgramsView {
    pub fn record_into(&self, ctx: &mut AnalyticsContext) {
        if let Some(rows) = &self.admisiones {
            ctx.record_admisiones(self.nivel, rows);
        }
        if let Some(rows) = &self.estados {
            ctx.record_estados(self.nivel, rows);
        }
    }
}

pub async fn load_programs(api: &dyn DashboardApi, nivel: Nivel) -> Result<ProgramsView, AppError> {
    let (admisiones, estados) =
        tokio::join!(client::admisiones(api, nivel), client::estados(api, nivel));

    let mut errors = Vec::new();
    let admisiones = section("admisiones", admisiones, &mut errors)?;
    let estados = section("estados", estados, &mut errors)?
        .map(|resp| resp.estados_by_programa.unwrap_or_default());

    Ok(ProgramsView {
        nivel,
        admision_totals: admisiones.as_deref().map(rollup::admision_totals),
        estado_totals: estados.as_deref().map(rollup::rollup),
        admisiones,
        estados,
        errors,
    })
}

/// Ask the assistant, grounding it on the data the session last loaded.
pub async fn ask_assistant(
    api: &dyn DashboardApi,
    ctx: &AnalyticsContext,
    message: &str,
) -> Result<ChatReply, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    if ctx.is_empty() {
        tracing::debug!("Assistant asked before any dashboard data was loaded");
    }
    let request = ChatRequest {
        message: message.to_string(),
        nivel: ctx.nivel,
        context: ctx.to_payload(),
    };
    client::chat(api, &request).await
}

/// One headline card on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub detail: String,
}

pub fn kpi_cards(kpis: &KpiSnapshot) -> Vec<KpiCard> {
    let share = |n: u64| format!("{} del total", format_pct(metrics::pct(n, kpis.total_leads)));
    vec![
        KpiCard {
            label: "Total Leads",
            value: format_count(kpis.total_leads),
            detail: String::new(),
        },
        KpiCard {
            label: "En Gestión",
            value: format_count(kpis.en_gestion),
            detail: share(kpis.en_gestion),
        },
        KpiCard {
            label: "Oportunidad de Venta",
            value: format_count(kpis.op_venta),
            detail: share(kpis.op_venta),
        },
        KpiCard {
            label: "Proceso de Pago",
            value: format_count(kpis.proceso_pago),
            detail: share(kpis.proceso_pago),
        },
        KpiCard {
            label: "Pagados",
            value: format_count(kpis.pagados),
            detail: format!(
                "Conversión {}",
                format_pct(metrics::conversion(kpis.pagados, kpis.total_leads))
            ),
        },
        KpiCard {
            label: "Meta",
            value: format_count(kpis.metas),
            detail: format!(
                "Avance {}",
                format_pct(metrics::avance(kpis.pagados, kpis.metas))
            ),
        },
        KpiCard {
            label: "Matriculados",
            value: format_count(kpis.matriculados),
            detail: String::new(),
        },
    ]
}
