use diesel::pg::Pg;
use diesel::prelude::*;

use gather_shared::clients::db::DbConnections;
use gather_shared::errors::AppResult;

use crate::models::Category;
use crate::query::{ilike_pattern, unsupported_filter, FilterOperator, SearchDescriptor};
use crate::schema::categories::{self, dsl};
use crate::stores::read_conn;

type BoxedQuery<'a> = categories::BoxedQuery<'a, Pg>;

/// Reference data; this layer never writes categories.
#[derive(Clone)]
pub struct CategoriesStore {
    db: DbConnections,
}

impl CategoriesStore {
    pub fn new(db: DbConnections) -> Self {
        Self { db }
    }

    pub fn count_categories(&self, descriptor: &SearchDescriptor) -> AppResult<i64> {
        let mut conn = read_conn(&self.db)?;
        let query = apply_filter(categories::table.into_boxed(), descriptor)?;
        Ok(query.count().get_result(&mut conn)?)
    }

    pub fn search_categories(&self, descriptor: &SearchDescriptor) -> AppResult<Vec<Category>> {
        let mut conn = read_conn(&self.db)?;
        let query = build_search_query(descriptor)?;
        Ok(query.load(&mut conn)?)
    }
}

fn apply_filter<'a>(
    mut query: BoxedQuery<'a>,
    descriptor: &SearchDescriptor,
) -> AppResult<BoxedQuery<'a>> {
    let Some((column, operator, value)) = descriptor.active_filter() else {
        return Ok(query);
    };

    query = match (column, operator) {
        ("tag", FilterOperator::Eq) => query.filter(dsl::tag.eq(value.to_string())),
        ("tag", FilterOperator::NotEq) => query.filter(dsl::tag.ne(value.to_string())),
        ("name", FilterOperator::ILike) => query.filter(dsl::name.ilike(ilike_pattern(value))),
        ("name", FilterOperator::Eq) => query.filter(dsl::name.eq(value.to_string())),
        _ => return Err(unsupported_filter("categories", column)),
    };

    Ok(query)
}

fn build_search_query(descriptor: &SearchDescriptor) -> AppResult<BoxedQuery<'static>> {
    let query = apply_filter(categories::table.into_boxed(), descriptor)?;
    Ok(query
        .order((dsl::updated_at.desc(), dsl::tag.desc()))
        .limit(descriptor.pagination.limit())
        .offset(descriptor.pagination.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gather_shared::types::PaginationParams;

    fn sql_of(query: BoxedQuery<'_>) -> String {
        diesel::debug_query::<Pg, _>(&query).to_string()
    }

    #[test]
    fn name_filter_uses_case_insensitive_substring_match() {
        let descriptor = SearchDescriptor::filtered(
            "name",
            FilterOperator::ILike,
            "tech",
            PaginationParams::new(10, 1),
        );
        let sql = sql_of(build_search_query(&descriptor).unwrap());
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("%tech%"));
    }

    #[test]
    fn ordering_has_a_deterministic_tie_break() {
        let descriptor = SearchDescriptor::unfiltered(PaginationParams::new(10, 1));
        let sql = sql_of(build_search_query(&descriptor).unwrap());
        assert!(sql.contains("ORDER BY \"categories\".\"updated_at\" DESC, \"categories\".\"tag\" DESC"));
    }
}
