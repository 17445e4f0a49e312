use serde::{Deserialize, Serialize};

use super::de;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub programa: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub nivel: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub estado: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub subcategoria: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub fecha_creacion: Option<String>,
}

/// One page of the lead explorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadPage {
    #[serde(default, alias = "leads", alias = "data")]
    pub items: Vec<Lead>,
    #[serde(default, deserialize_with = "de::count")]
    pub total: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub page: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub page_size: u64,
}

impl LeadPage {
    /// Number of pages, at least 1 so an empty result still renders a pager.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(self.page_size).max(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadFilters {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

impl LeadFilters {
    pub const DEFAULT_PAGE_SIZE: u64 = 50;
    pub const MAX_PAGE_SIZE: u64 = 200;

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_pages_rounds_up() {
        let page = LeadPage {
            total: 101,
            page_size: 50,
            ..Default::default()
        };
        assert_eq!(page.total_pages(), 3);
        assert_eq!(LeadPage::default().total_pages(), 1);
    }

    #[test]
    fn numeric_ids_become_text() {
        let page: LeadPage = serde_json::from_value(json!({
            "leads": [{ "id": 42, "nombre": "Ana" }],
            "total": 1
        }))
        .unwrap();
        assert_eq!(page.items[0].id.as_deref(), Some("42"));
    }

    #[test]
    fn filters_are_bounded() {
        let filters = LeadFilters {
            page: Some(0),
            page_size: Some(10_000),
            search: Some("   ".into()),
        };
        assert_eq!(filters.page(), 1);
        assert_eq!(filters.page_size(), LeadFilters::MAX_PAGE_SIZE);
        assert_eq!(filters.search(), None);
    }
}
