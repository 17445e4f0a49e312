pub mod api;
pub mod ui;

use serde::Deserialize;

use crate::models::Nivel;

/// `?nivel=` filter shared by every view.
#[derive(Debug, Default, Deserialize)]
pub struct NivelQuery {
    pub nivel: Option<Nivel>,
}

impl NivelQuery {
    pub fn nivel(&self) -> Nivel {
        self.nivel.unwrap_or_default()
    }
}
