// Backfill for headline metrics the backend sometimes sends as zero.
//
// The KPI and funnel endpoints may omit `op_venta`; the `estados` endpoint
// carries the same figure per program, so the total can be rebuilt from it.
// This is a compatibility shim: it is best effort, and only an expired
// session fails the caller.

use std::future::Future;

use crate::client::{self, DashboardApi};
use crate::error::AppError;
use crate::models::funnel::{OP_VENTA_STAGE, TOTAL_LEADS_STAGE, stage_value};
use crate::models::{FunnelStage, KpiSnapshot, Nivel};
use crate::rollup;

/// What happened to the target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backfill {
    /// Field already non-zero; secondary source not consulted.
    Present,
    /// Accessor found no field to reconcile; secondary source not consulted.
    NoTarget,
    /// Field replaced with the derived value.
    Applied(u64),
    /// Secondary source answered without data to derive from.
    Unavailable,
    /// Secondary source failed; original value kept.
    Failed,
}

/// Replace a zero field with a value derived from a secondary source.
///
/// `field` locates the value inside `target`; `derive` is only awaited when
/// that value exists and is zero. Errors from `derive` are logged and leave
/// the target untouched, except `Unauthorized`, which is returned.
pub async fn reconcile_if_zero<T, A, F, Fut>(
    target: &mut T,
    field: A,
    derive: F,
) -> Result<Backfill, AppError>
where
    T: ?Sized,
    A: Fn(&mut T) -> Option<&mut u64>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<u64>, AppError>>,
{
    match field(target) {
        None => return Ok(Backfill::NoTarget),
        Some(value) if *value != 0 => return Ok(Backfill::Present),
        Some(_) => {}
    }

    match derive().await {
        Ok(Some(derived)) => {
            if let Some(slot) = field(target) {
                *slot = derived;
            }
            Ok(Backfill::Applied(derived))
        }
        Ok(None) => Ok(Backfill::Unavailable),
        Err(AppError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::warn!("Backfill skipped, secondary fetch failed: {e}");
            Ok(Backfill::Failed)
        }
    }
}

/// Sum of `op_venta` across programs, if the estados endpoint has rows.
pub async fn op_venta_from_estados(
    api: &dyn DashboardApi,
    nivel: Nivel,
) -> Result<Option<u64>, AppError> {
    let estados = client::estados(api, nivel).await?;
    Ok(estados
        .estados_by_programa
        .map(|rows| rollup::rollup(&rows).op_venta))
}

pub async fn backfill_kpi_op_venta(
    api: &dyn DashboardApi,
    nivel: Nivel,
    kpis: &mut KpiSnapshot,
) -> Result<Backfill, AppError> {
    let outcome = reconcile_if_zero(
        kpis,
        |k| Some(&mut k.op_venta),
        || op_venta_from_estados(api, nivel),
    )
    .await?;
    if let Backfill::Applied(value) = outcome {
        tracing::debug!("KPI op_venta backfilled from estados: {value}");
    }
    Ok(outcome)
}

/// Backfill the "Oportunidad de Venta" stage and recompute its percent
/// against "Total Leads".
pub async fn backfill_funnel_op_venta(
    api: &dyn DashboardApi,
    nivel: Nivel,
    stages: &mut [FunnelStage],
) -> Result<Backfill, AppError> {
    let outcome = reconcile_if_zero(
        stages,
        |s| {
            s.iter_mut()
                .find(|stage| stage.stage == OP_VENTA_STAGE)
                .map(|stage| &mut stage.value)
        },
        || op_venta_from_estados(api, nivel),
    )
    .await?;

    if let Backfill::Applied(value) = outcome {
        let total = match stage_value(stages, TOTAL_LEADS_STAGE) {
            Some(total) if total > 0 => total,
            _ => 1,
        };
        let percent = round2(value as f64 / total as f64 * 100.0);
        if let Some(stage) = stages.iter_mut().find(|s| s.stage == OP_VENTA_STAGE) {
            stage.percent = percent;
        }
        tracing::debug!("Funnel op_venta backfilled from estados: {value} ({percent}%)");
    }
    Ok(outcome)
}

/// Two-decimal rounding, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
