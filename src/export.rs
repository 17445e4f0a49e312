use std::borrow::Cow;
use std::fmt::Write;

use crate::models::{Lead, NoUtilReason};

/// Quote a field when it contains a separator, quote or line break.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render a header row followed by data rows.
pub fn to_csv<R: AsRef<[String]>>(headers: &[&str], rows: impl IntoIterator<Item = R>) -> String {
    let mut out = String::new();
    let header: Vec<_> = headers.iter().map(|h| escape(h)).collect();
    let _ = writeln!(out, "{}", header.join(","));
    for row in rows {
        let fields: Vec<_> = row.as_ref().iter().map(|f| escape(f)).collect();
        let _ = writeln!(out, "{}", fields.join(","));
    }
    out
}

pub fn no_util_csv(reasons: &[NoUtilReason]) -> String {
    to_csv(
        &["subcategoria", "leads", "porcentaje", "leads_7d", "leads_14d"],
        reasons.iter().map(|r| {
            vec![
                r.subcategoria.clone(),
                r.leads.to_string(),
                format!("{:.2}", r.porcentaje),
                r.leads_7d.to_string(),
                r.leads_14d.to_string(),
            ]
        }),
    )
}

pub fn leads_csv(leads: &[Lead]) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    to_csv(
        &[
            "id",
            "nombre",
            "email",
            "telefono",
            "programa",
            "nivel",
            "estado",
            "subcategoria",
            "fecha_creacion",
        ],
        leads.iter().map(|l| {
            vec![
                text(&l.id),
                text(&l.nombre),
                text(&l.email),
                text(&l.telefono),
                text(&l.programa),
                text(&l.nivel),
                text(&l.estado),
                text(&l.subcategoria),
                text(&l.fecha_creacion),
            ]
        }),
    )
}
