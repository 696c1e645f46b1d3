use serde::{Deserialize, Serialize};

use crate::types::pagination::PaginationParams;

/// Envelope returned by every paginated search operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults<T: Serialize> {
    pub results: Vec<T>,
    pub pagination: SearchPagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPagination {
    pub total_items: i64,
    pub items_per_page: i64,
    pub page_number: i64,
}

impl SearchPagination {
    pub fn from_params(params: &PaginationParams, total_items: i64) -> Self {
        Self {
            total_items,
            items_per_page: params.limit(),
            page_number: params.page_number.max(1),
        }
    }
}

impl<T: Serialize> SearchResults<T> {
    pub fn new(results: Vec<T>, params: &PaginationParams, total_items: i64) -> Self {
        Self {
            results,
            pagination: SearchPagination::from_params(params, total_items),
        }
    }
}
