use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gather_shared::errors::{AppError, AppResult};
use gather_shared::types::PaginationParams;

/// The fixed set of comparison operators the stores support. Anything
/// else a caller sends collapses to equality at the deserialization
/// boundary; this is deliberately not a general predicate language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[serde(rename = "=")]
    #[default]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    ILike,
}

/// Generic filtered-search descriptor compiled against one table.
///
/// `filter_by` names a column in the store's supported set; columns a
/// store does not recognize are rejected with a validation error.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchDescriptor {
    #[serde(default)]
    pub filter_by: Option<String>,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub pagination: PaginationParams,
}

impl SearchDescriptor {
    pub fn unfiltered(pagination: PaginationParams) -> Self {
        Self {
            filter_by: None,
            operator: FilterOperator::Eq,
            query: None,
            pagination,
        }
    }

    pub fn filtered(
        filter_by: impl Into<String>,
        operator: FilterOperator,
        query: impl Into<String>,
        pagination: PaginationParams,
    ) -> Self {
        Self {
            filter_by: Some(filter_by.into()),
            operator,
            query: Some(query.into()),
            pagination,
        }
    }

    /// A filter applies only when both the column and the value are present.
    pub fn active_filter(&self) -> Option<(&str, FilterOperator, &str)> {
        match (self.filter_by.as_deref(), self.query.as_deref()) {
            (Some(column), Some(value)) => Some((column, self.operator, value)),
            _ => None,
        }
    }
}

/// `ilike` filters are substring matches: wrap the value in wildcards.
/// Every other operator binds the value verbatim.
pub fn ilike_pattern(value: &str) -> String {
    format!("%{value}%")
}

pub fn parse_uuid(column: &str, value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::Validation(format!("filter on '{column}' expects a uuid")))
}

pub fn parse_bool(column: &str, value: &str) -> AppResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "filter on '{column}' expects 'true' or 'false'"
        ))),
    }
}

pub fn unsupported_filter(table: &str, column: &str) -> AppError {
    AppError::Validation(format!("'{column}' is not a filterable column of {table}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilike_wraps_value_in_wildcards() {
        assert_eq!(ilike_pattern("test"), "%test%");
        assert_eq!(ilike_pattern(""), "%%");
    }

    #[test]
    fn filter_requires_both_column_and_value() {
        let no_value = SearchDescriptor {
            filter_by: Some("message".into()),
            operator: FilterOperator::ILike,
            query: None,
            pagination: PaginationParams::default(),
        };
        assert!(no_value.active_filter().is_none());

        let complete = SearchDescriptor::filtered(
            "message",
            FilterOperator::ILike,
            "hello",
            PaginationParams::default(),
        );
        assert_eq!(
            complete.active_filter(),
            Some(("message", FilterOperator::ILike, "hello"))
        );
    }

    #[test]
    fn uuid_and_bool_values_are_validated() {
        assert!(parse_uuid("from_user_id", "not-a-uuid").is_err());
        assert!(parse_uuid("from_user_id", "686800b1-8383-42cb-bbf2-7e9e460a7f76").is_ok());
        assert_eq!(parse_bool("is_unread", "true").unwrap(), true);
        assert!(parse_bool("is_unread", "yes").is_err());
    }
}
