// Display rows for the templates. Every number is formatted here so the
// templates only print strings.

use crate::dashboard::SectionError;
use crate::metrics::{self, Trend, format_count, format_pct, format_signed};
use crate::models::ai::Insight;
use crate::models::{AdmisionRow, FunnelStage, Lead, Nivel, NoUtilReason, ProgramEstado};
use crate::rollup::{AdmisionTotals, ProgramTotals};

pub struct NivelOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Navigation bar and level selector shared by all pages.
pub struct PageChrome {
    pub username: String,
    pub nivel: &'static str,
    pub niveles: Vec<NivelOption>,
    pub active: &'static str,
}

impl PageChrome {
    pub fn new(username: &str, nivel: Nivel, active: &'static str) -> Self {
        PageChrome {
            username: username.to_string(),
            nivel: nivel.as_str(),
            niveles: Nivel::ALL
                .iter()
                .map(|n| NivelOption {
                    value: n.as_str(),
                    selected: *n == nivel,
                })
                .collect(),
            active,
        }
    }
}

pub struct ErrorLine {
    pub section: &'static str,
    pub message: String,
}

impl From<&SectionError> for ErrorLine {
    fn from(e: &SectionError) -> Self {
        ErrorLine {
            section: e.section,
            message: e.message.clone(),
        }
    }
}

pub struct FunnelBar {
    pub stage: String,
    pub value: String,
    pub percent: String,
    /// CSS width, dot decimal.
    pub width: String,
}

impl From<&FunnelStage> for FunnelBar {
    fn from(stage: &FunnelStage) -> Self {
        FunnelBar {
            stage: stage.stage.clone(),
            value: format_count(stage.value),
            percent: format_pct(stage.percent),
            width: format!("{:.2}", stage.display_percent()),
        }
    }
}

pub struct VarCell {
    pub value: String,
    pub indicator: &'static str,
    pub class: &'static str,
}

impl VarCell {
    fn new(value: Option<i64>) -> Self {
        let trend = Trend::classify(value);
        VarCell {
            value: format_signed(value.unwrap_or(0)),
            indicator: trend.indicator(),
            class: trend.css_class(),
        }
    }
}

pub struct AdmisionLine {
    pub programa: String,
    pub solicitados: String,
    pub admitidos: String,
    pub pagados: String,
    pub meta: String,
    pub avance: String,
    pub var_solicitados: VarCell,
    pub var_admitidos: VarCell,
    pub var_pagados: VarCell,
}

impl From<&AdmisionRow> for AdmisionLine {
    fn from(row: &AdmisionRow) -> Self {
        AdmisionLine {
            programa: row.programa.clone(),
            solicitados: format_count(row.solicitados),
            admitidos: format_count(row.admitidos),
            pagados: format_count(row.pagados),
            meta: format_count(row.meta),
            avance: format_pct(metrics::avance(row.pagados, row.meta)),
            var_solicitados: VarCell::new(row.var_solicitados),
            var_admitidos: VarCell::new(row.var_admitidos),
            var_pagados: VarCell::new(row.var_pagados),
        }
    }
}

impl From<&AdmisionTotals> for AdmisionLine {
    fn from(t: &AdmisionTotals) -> Self {
        AdmisionLine {
            programa: "Total".to_string(),
            solicitados: format_count(t.solicitados),
            admitidos: format_count(t.admitidos),
            pagados: format_count(t.pagados),
            meta: format_count(t.meta),
            avance: format_pct(metrics::avance(t.pagados, t.meta)),
            var_solicitados: VarCell::new(None),
            var_admitidos: VarCell::new(None),
            var_pagados: VarCell::new(None),
        }
    }
}

pub struct EstadoLine {
    pub programa: String,
    pub leads: String,
    pub en_gestion: String,
    pub no_util: String,
    pub op_venta: String,
    pub proceso_pago: String,
    pub pagados: String,
    pub meta: String,
    pub avance: String,
}

impl From<&ProgramEstado> for EstadoLine {
    fn from(row: &ProgramEstado) -> Self {
        EstadoLine {
            programa: row.programa.clone(),
            leads: format_count(row.leads),
            en_gestion: format_count(row.en_gestion),
            no_util: format_count(row.no_util),
            op_venta: format_count(row.op_venta),
            proceso_pago: format_count(row.proceso_pago),
            pagados: format_count(row.pagados),
            meta: format_count(row.meta),
            avance: format_pct(metrics::avance(row.pagados, row.meta)),
        }
    }
}

impl From<&ProgramTotals> for EstadoLine {
    fn from(t: &ProgramTotals) -> Self {
        EstadoLine {
            programa: "Total".to_string(),
            leads: format_count(t.leads),
            en_gestion: format_count(t.en_gestion),
            no_util: format_count(t.no_util),
            op_venta: format_count(t.op_venta),
            proceso_pago: format_count(t.proceso_pago),
            pagados: format_count(t.pagados),
            meta: format_count(t.meta),
            avance: format_pct(metrics::avance(t.pagados, t.meta)),
        }
    }
}

pub struct NoUtilLine {
    pub subcategoria: String,
    pub leads: String,
    pub porcentaje: String,
    pub leads_7d: String,
    pub leads_14d: String,
}

impl From<&NoUtilReason> for NoUtilLine {
    fn from(r: &NoUtilReason) -> Self {
        NoUtilLine {
            subcategoria: r.subcategoria.clone(),
            leads: format_count(r.leads),
            porcentaje: format_pct(r.porcentaje),
            leads_7d: format_count(r.leads_7d),
            leads_14d: format_count(r.leads_14d),
        }
    }
}

pub struct LeadLine {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub programa: String,
    pub nivel: String,
    pub estado: String,
    pub subcategoria: String,
    pub fecha: String,
}

impl From<&Lead> for LeadLine {
    fn from(l: &Lead) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "—".to_string());
        LeadLine {
            nombre: text(&l.nombre),
            email: text(&l.email),
            telefono: text(&l.telefono),
            programa: text(&l.programa),
            nivel: text(&l.nivel),
            estado: text(&l.estado),
            subcategoria: text(&l.subcategoria),
            fecha: text(&l.fecha_creacion),
        }
    }
}

pub struct InsightLine {
    pub title: String,
    pub description: String,
    pub tag: String,
}

impl From<&Insight> for InsightLine {
    fn from(i: &Insight) -> Self {
        InsightLine {
            title: i.title.clone(),
            description: i.description.clone(),
            tag: i
                .kind
                .clone()
                .or_else(|| i.priority.clone())
                .unwrap_or_default(),
        }
    }
}
