use serde::{Deserialize, Serialize};

/// One-based pagination: page 1 has offset 0.
///
/// Non-positive values are clamped rather than rejected; the stores
/// never see a zero or negative limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_items_per_page")]
    pub items_per_page: i64,
    #[serde(default = "default_page_number")]
    pub page_number: i64,
}

fn default_items_per_page() -> i64 {
    20
}

fn default_page_number() -> i64 {
    1
}

impl PaginationParams {
    pub fn new(items_per_page: i64, page_number: i64) -> Self {
        Self {
            items_per_page,
            page_number,
        }
    }

    pub fn offset(&self) -> i64 {
        self.limit() * (self.page_number.max(1) - 1)
    }

    pub fn limit(&self) -> i64 {
        self.items_per_page.clamp(1, 100)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            page_number: default_page_number(),
        }
    }
}
