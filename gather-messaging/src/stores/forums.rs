use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use uuid::Uuid;

use gather_shared::clients::db::DbConnections;
use gather_shared::errors::AppResult;

use crate::models::{Forum, ForumChanges, ForumTitle, NewForum};
use crate::query::{
    ilike_pattern, parse_bool, parse_uuid, unsupported_filter, FilterOperator, SearchDescriptor,
};
use crate::schema::forums::{self, dsl};
use crate::stores::forum_categories::ForumCategoriesStore;
use crate::stores::{read_conn, write_conn, MutationOutcome};

type BoxedQuery<'a> = forums::BoxedQuery<'a, Pg>;
type BoxedCondition = Box<dyn BoxableExpression<forums::table, Pg, SqlType = Bool>>;

/// Conditions for direct forum lookups. `author_id` is always present;
/// the optional fields narrow the match.
#[derive(Debug, Clone)]
pub struct ForumConditions {
    pub author_id: Uuid,
    pub title: Option<Vec<String>>,
    pub subtitle: Option<Vec<String>>,
}

impl ForumConditions {
    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id,
            title: None,
            subtitle: None,
        }
    }
}

/// Pre-resolved search scope for `search_forums`. `forum_ids` wins over
/// `category_forum_ids` when both are present.
#[derive(Debug, Clone, Default)]
pub struct ForumSearchScope {
    pub invited_forum_ids: Option<Vec<Uuid>>,
    pub forum_ids: Option<Vec<Uuid>>,
    pub category_forum_ids: Option<Vec<Uuid>>,
}

#[derive(Clone)]
pub struct ForumsStore {
    db: DbConnections,
}

impl ForumsStore {
    pub fn new(db: DbConnections) -> Self {
        Self { db }
    }

    /// Total rows matching the same scope as `search_forums`, for the
    /// pagination envelope.
    pub fn count_forums(
        &self,
        descriptor: &SearchDescriptor,
        scope: &ForumSearchScope,
    ) -> AppResult<i64> {
        let mut conn = read_conn(&self.db)?;
        let query = build_filter_query(descriptor, scope)?;
        Ok(query.count().get_result(&mut conn)?)
    }

    /// Reads through the write pool so a forum is visible to its
    /// creator immediately after the insert commits.
    pub fn get_forum(&self, forum_id: Uuid) -> AppResult<Option<Forum>> {
        let mut conn = write_conn(&self.db)?;
        Ok(forums::table
            .find(forum_id)
            .first::<Forum>(&mut conn)
            .optional()?)
    }

    /// Direct lookups with optional OR-extension, used by the duplicate
    /// title/subtitle pre-check. Archived forums are excluded unless
    /// the caller asks for them.
    pub fn get_forums(
        &self,
        conditions: &ForumConditions,
        or_conditions: Option<&ForumConditions>,
        exclude_archived: bool,
    ) -> AppResult<Vec<Forum>> {
        let mut conn = write_conn(&self.db)?;
        let query = build_lookup_query(conditions, or_conditions, exclude_archived);
        Ok(query.load(&mut conn)?)
    }

    /// id + title projection for resolving forum references in bulk.
    pub fn find_forums(&self, forum_ids: &[Uuid]) -> AppResult<Vec<ForumTitle>> {
        let mut conn = read_conn(&self.db)?;
        Ok(forums::table
            .filter(dsl::id.eq_any(forum_ids.to_vec()))
            .select((dsl::id, dsl::title))
            .load::<ForumTitle>(&mut conn)?)
    }

    pub fn search_forums(
        &self,
        descriptor: &SearchDescriptor,
        scope: &ForumSearchScope,
    ) -> AppResult<Vec<Forum>> {
        let mut conn = read_conn(&self.db)?;
        let query = build_search_query(descriptor, scope)?;
        Ok(query.load(&mut conn)?)
    }

    /// Resolve category tags to forum ids ahead of the main query.
    /// Two queries by intent: the join table is expected to shard
    /// separately from the forums table.
    pub fn resolve_category_scope(
        &self,
        categories: &ForumCategoriesStore,
        category_tags: Option<&[String]>,
    ) -> AppResult<Option<Vec<Uuid>>> {
        match category_tags {
            Some(tags) if !tags.is_empty() => {
                Ok(Some(categories.find_forum_ids_by_tags(tags)?))
            }
            _ => Ok(None),
        }
    }

    pub fn create_forum(&self, params: NewForum) -> AppResult<Forum> {
        let mut conn = write_conn(&self.db)?;
        let forum = diesel::insert_into(forums::table)
            .values(&params)
            .get_result::<Forum>(&mut conn)?;

        tracing::info!(
            forum_id = %forum.id,
            author_id = %forum.author_id,
            is_public = forum.is_public,
            "forum created"
        );
        Ok(forum)
    }

    /// Existence-then-ownership check before the update, so callers can
    /// tell a missing forum from someone else's forum.
    pub fn update_forum(
        &self,
        forum_id: Uuid,
        author_id: Uuid,
        changes: &ForumChanges,
    ) -> AppResult<MutationOutcome<Forum>> {
        let mut conn = write_conn(&self.db)?;

        let Some(existing) = forums::table
            .find(forum_id)
            .first::<Forum>(&mut conn)
            .optional()?
        else {
            return Ok(MutationOutcome::NotFound);
        };
        if existing.author_id != author_id {
            return Ok(MutationOutcome::Forbidden);
        }

        let updated = diesel::update(forums::table.find(forum_id))
            .set((changes, dsl::updated_at.eq(diesel::dsl::now)))
            .get_result::<Forum>(&mut conn)?;
        Ok(MutationOutcome::Applied(updated))
    }

    /// Bump `updated_at` only; used to mark a forum as recently active.
    pub fn touch_forum(&self, forum_id: Uuid) -> AppResult<()> {
        let mut conn = write_conn(&self.db)?;
        diesel::update(forums::table.find(forum_id))
            .set(dsl::updated_at.eq(diesel::dsl::now))
            .execute(&mut conn)?;
        Ok(())
    }

    /// Soft delete: sets `archived_at`, never removes the row.
    pub fn archive_forum(
        &self,
        forum_id: Uuid,
        author_id: Uuid,
    ) -> AppResult<MutationOutcome<Forum>> {
        let mut conn = write_conn(&self.db)?;

        let Some(existing) = forums::table
            .find(forum_id)
            .first::<Forum>(&mut conn)
            .optional()?
        else {
            return Ok(MutationOutcome::NotFound);
        };
        if existing.author_id != author_id {
            return Ok(MutationOutcome::Forbidden);
        }

        let archived = diesel::update(forums::table.find(forum_id))
            .set((
                dsl::archived_at.eq(Some(chrono::Utc::now())),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .get_result::<Forum>(&mut conn)?;

        tracing::info!(forum_id = %forum_id, "forum archived");
        Ok(MutationOutcome::Applied(archived))
    }

    /// Hard delete. Only the explicit purge path and saga compensation
    /// call this; everything else archives.
    pub fn delete_forum(&self, forum_id: Uuid) -> AppResult<usize> {
        let mut conn = write_conn(&self.db)?;
        let deleted = diesel::delete(forums::table.find(forum_id)).execute(&mut conn)?;
        tracing::info!(forum_id = %forum_id, deleted, "forum deleted");
        Ok(deleted)
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
        ("author_id", FilterOperator::Eq) => {
            query.filter(dsl::author_id.eq(parse_uuid(column, value)?))
        }
        ("author_id", FilterOperator::NotEq) => {
            query.filter(dsl::author_id.ne(parse_uuid(column, value)?))
        }
        ("is_public", FilterOperator::Eq) => {
            query.filter(dsl::is_public.eq(parse_bool(column, value)?))
        }
        ("description", FilterOperator::ILike) => {
            query.filter(dsl::description.ilike(ilike_pattern(value)))
        }
        ("description", FilterOperator::Eq) => {
            query.filter(dsl::description.eq(value.to_string()))
        }
        _ => return Err(unsupported_filter("forums", column)),
    };

    Ok(query)
}

fn conditions_expression(conditions: &ForumConditions) -> BoxedCondition {
    let mut expression: BoxedCondition = Box::new(dsl::author_id.eq(conditions.author_id));
    if let Some(title) = &conditions.title {
        expression = Box::new(expression.and(dsl::title.eq(title.clone())));
    }
    if let Some(subtitle) = &conditions.subtitle {
        expression = Box::new(expression.and(dsl::subtitle.eq(subtitle.clone())));
    }
    expression
}

fn build_lookup_query(
    conditions: &ForumConditions,
    or_conditions: Option<&ForumConditions>,
    exclude_archived: bool,
) -> BoxedQuery<'static> {
    let mut query = forums::table.into_boxed();

    match or_conditions {
        Some(other) => {
            query = query.filter(conditions_expression(conditions).or(conditions_expression(other)))
        }
        None => query = query.filter(conditions_expression(conditions)),
    }

    if exclude_archived {
        query = query.filter(dsl::archived_at.is_null());
    }

    query.order((dsl::updated_at.desc(), dsl::id.desc()))
}

/// The search union: public forums OR forums the caller was invited
/// to, active only, optionally narrowed to explicit ids or to the
/// forums carrying requested category tags.
fn build_filter_query(
    descriptor: &SearchDescriptor,
    scope: &ForumSearchScope,
) -> AppResult<BoxedQuery<'static>> {
    let mut query = forums::table
        .into_boxed()
        .filter(dsl::archived_at.is_null());

    match &scope.invited_forum_ids {
        Some(invited) => {
            query = query.filter(dsl::is_public.eq(true).or(dsl::id.eq_any(invited.clone())))
        }
        None => query = query.filter(dsl::is_public.eq(true)),
    }

    if let Some(forum_ids) = &scope.forum_ids {
        query = query.filter(dsl::id.eq_any(forum_ids.clone()));
    } else if let Some(category_forum_ids) = &scope.category_forum_ids {
        query = query.filter(dsl::id.eq_any(category_forum_ids.clone()));
    }

    apply_filter(query, descriptor)
}

fn build_search_query(
    descriptor: &SearchDescriptor,
    scope: &ForumSearchScope,
) -> AppResult<BoxedQuery<'static>> {
    let query = build_filter_query(descriptor, scope)?;
    Ok(query
        .order((dsl::updated_at.desc(), dsl::id.desc()))
        .limit(descriptor.pagination.limit())
        .offset(descriptor.pagination.offset()))
}
