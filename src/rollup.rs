use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::models::{AdmisionRow, KpiSnapshot, ProgramEstado};

/// Campaign totals over per-program estado rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgramTotals {
    pub leads: u64,
    pub en_gestion: u64,
    pub no_util: u64,
    pub op_venta: u64,
    pub proceso_pago: u64,
    pub solicitados: u64,
    pub admitidos: u64,
    pub pagados: u64,
    pub meta: u64,
}

impl AddAssign<&ProgramEstado> for ProgramTotals {
    fn add_assign(&mut self, row: &ProgramEstado) {
        self.leads = self.leads.saturating_add(row.leads);
        self.en_gestion = self.en_gestion.saturating_add(row.en_gestion);
        self.no_util = self.no_util.saturating_add(row.no_util);
        self.op_venta = self.op_venta.saturating_add(row.op_venta);
        self.proceso_pago = self.proceso_pago.saturating_add(row.proceso_pago);
        self.solicitados = self.solicitados.saturating_add(row.solicitados);
        self.admitidos = self.admitidos.saturating_add(row.admitidos);
        self.pagados = self.pagados.saturating_add(row.pagados);
        self.meta = self.meta.saturating_add(row.meta);
    }
}

impl Add for ProgramTotals {
    type Output = ProgramTotals;

    fn add(self, other: ProgramTotals) -> ProgramTotals {
        ProgramTotals {
            leads: self.leads.saturating_add(other.leads),
            en_gestion: self.en_gestion.saturating_add(other.en_gestion),
            no_util: self.no_util.saturating_add(other.no_util),
            op_venta: self.op_venta.saturating_add(other.op_venta),
            proceso_pago: self.proceso_pago.saturating_add(other.proceso_pago),
            solicitados: self.solicitados.saturating_add(other.solicitados),
            admitidos: self.admitidos.saturating_add(other.admitidos),
            pagados: self.pagados.saturating_add(other.pagados),
            meta: self.meta.saturating_add(other.meta),
        }
    }
}

impl<'a> Sum<&'a ProgramEstado> for ProgramTotals {
    fn sum<I: Iterator<Item = &'a ProgramEstado>>(iter: I) -> Self {
        iter.fold(ProgramTotals::default(), |mut acc, row| {
            acc += row;
            acc
        })
    }
}

impl ProgramTotals {
    /// Campaign-wide snapshot built from the program totals. `matriculados`
    /// has no per-program source and stays at zero.
    pub fn to_kpis(&self) -> KpiSnapshot {
        KpiSnapshot {
            total_leads: self.leads,
            en_gestion: self.en_gestion,
            op_venta: self.op_venta,
            proceso_pago: self.proceso_pago,
            pagados: self.pagados,
            metas: self.meta,
            matriculados: 0,
        }
    }
}

pub fn rollup(rows: &[ProgramEstado]) -> ProgramTotals {
    rows.iter().sum()
}

/// Totals row of the admissions table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdmisionTotals {
    pub solicitados: u64,
    pub admitidos: u64,
    pub pagados: u64,
    pub meta: u64,
}

pub fn admision_totals(rows: &[AdmisionRow]) -> AdmisionTotals {
    rows.iter().fold(AdmisionTotals::default(), |acc, row| AdmisionTotals {
        solicitados: acc.solicitados.saturating_add(row.solicitados),
        admitidos: acc.admitidos.saturating_add(row.admitidos),
        pagados: acc.pagados.saturating_add(row.pagados),
        meta: acc.meta.saturating_add(row.meta),
    })
}
