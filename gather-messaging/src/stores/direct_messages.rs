use std::collections::HashSet;

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Uuid as SqlUuid};
use uuid::Uuid;

use gather_shared::clients::db::DbConnections;
use gather_shared::errors::{AppError, AppResult, ErrorCode};
use gather_shared::types::PaginationParams;

use crate::models::{DirectMessage, NewDirectMessage};
use crate::query::{
    ilike_pattern, parse_bool, parse_uuid, unsupported_filter, FilterOperator, SearchDescriptor,
};
use crate::schema::direct_messages::{self, dsl};
use crate::stores::{read_conn, write_conn};

type BoxedQuery<'a> = direct_messages::BoxedQuery<'a, Pg>;

/// One conversation per unordered user pair: the most recent message
/// between two users, regardless of direction. Duplicates can only
/// arise from identical timestamps within a pair; they are dropped
/// after the fetch so the invariant holds unconditionally.
const LATEST_DMS_SQL: &str = "\
SELECT * FROM direct_messages \
WHERE (least(from_user_id, to_user_id), greatest(from_user_id, to_user_id), updated_at) IN ( \
    SELECT least(from_user_id, to_user_id), \
           greatest(from_user_id, to_user_id), \
           max(updated_at) \
    FROM direct_messages \
    WHERE from_user_id = $1 OR to_user_id = $2 \
    GROUP BY 1, 2 \
    ORDER BY 3 DESC \
    LIMIT $3 OFFSET $4 \
) \
ORDER BY updated_at DESC, id DESC";

#[derive(Clone)]
pub struct DirectMessagesStore {
    db: DbConnections,
}

impl DirectMessagesStore {
    pub fn new(db: DbConnections) -> Self {
        Self { db }
    }

    /// Total rows matching the same scope as `search_direct_messages`,
    /// for the pagination envelope.
    pub fn count_direct_messages(
        &self,
        user_id: Uuid,
        descriptor: &SearchDescriptor,
        should_check_reverse: bool,
    ) -> AppResult<i64> {
        let mut conn = read_conn(&self.db)?;
        let query = build_filter_query(user_id, descriptor, should_check_reverse)?;
        Ok(query.count().get_result(&mut conn)?)
    }

    /// Messages addressed to `user_id`, optionally extended with the
    /// symmetric case so a conversation is found regardless of who
    /// initiated it.
    pub fn search_direct_messages(
        &self,
        user_id: Uuid,
        descriptor: &SearchDescriptor,
        should_check_reverse: bool,
    ) -> AppResult<Vec<DirectMessage>> {
        let mut conn = read_conn(&self.db)?;
        let query = build_search_query(user_id, descriptor, should_check_reverse)?;
        Ok(query.load(&mut conn)?)
    }

    /// The conversation aggregator: at most one row per distinct
    /// partner, ordered by recency, paginated over the grouped set.
    pub fn search_latest_dms(
        &self,
        user_id: Uuid,
        pagination: &PaginationParams,
    ) -> AppResult<Vec<DirectMessage>> {
        let mut conn = read_conn(&self.db)?;
        let rows: Vec<DirectMessage> = diesel::sql_query(LATEST_DMS_SQL)
            .bind::<SqlUuid, _>(user_id)
            .bind::<SqlUuid, _>(user_id)
            .bind::<BigInt, _>(pagination.limit())
            .bind::<BigInt, _>(pagination.offset())
            .load(&mut conn)?;

        Ok(dedupe_by_pair(rows))
    }

    pub fn create_direct_message(&self, params: NewDirectMessage) -> AppResult<DirectMessage> {
        let mut conn = write_conn(&self.db)?;
        let message = diesel::insert_into(direct_messages::table)
            .values(&params)
            .get_result::<DirectMessage>(&mut conn)?;

        tracing::info!(
            message_id = %message.id,
            from_user_id = %message.from_user_id,
            to_user_id = %message.to_user_id,
            "direct message created"
        );
        Ok(message)
    }

    /// The only mutation this layer performs on a direct message.
    pub fn update_direct_message(&self, id: Uuid, is_unread: bool) -> AppResult<DirectMessage> {
        let mut conn = write_conn(&self.db)?;
        diesel::update(direct_messages::table.find(id))
            .set((
                dsl::is_unread.eq(is_unread),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .get_result::<DirectMessage>(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "direct message not found"))
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
        ("from_user_id", FilterOperator::Eq) => {
            query.filter(dsl::from_user_id.eq(parse_uuid(column, value)?))
        }
        ("from_user_id", FilterOperator::NotEq) => {
            query.filter(dsl::from_user_id.ne(parse_uuid(column, value)?))
        }
        ("to_user_id", FilterOperator::Eq) => {
            query.filter(dsl::to_user_id.eq(parse_uuid(column, value)?))
        }
        ("to_user_id", FilterOperator::NotEq) => {
            query.filter(dsl::to_user_id.ne(parse_uuid(column, value)?))
        }
        ("is_unread", FilterOperator::Eq) => {
            query.filter(dsl::is_unread.eq(parse_bool(column, value)?))
        }
        ("message", FilterOperator::ILike) => {
            query.filter(dsl::message.ilike(ilike_pattern(value)))
        }
        ("message", FilterOperator::Eq) => query.filter(dsl::message.eq(value.to_string())),
        _ => return Err(unsupported_filter("direct_messages", column)),
    };

    Ok(query)
}

fn build_filter_query(
    user_id: Uuid,
    descriptor: &SearchDescriptor,
    should_check_reverse: bool,
) -> AppResult<BoxedQuery<'static>> {
    let mut query = direct_messages::table.into_boxed();

    let reverse_applies = should_check_reverse
        && matches!(
            descriptor.active_filter(),
            Some(("from_user_id", FilterOperator::Eq, _))
        );

    if reverse_applies {
        // Both directions of one conversation.
        let (_, _, value) = descriptor.active_filter().expect("checked above");
        let other = parse_uuid("from_user_id", value)?;
        query = query.filter(
            dsl::to_user_id
                .eq(user_id)
                .and(dsl::from_user_id.eq(other))
                .or(dsl::from_user_id.eq(user_id).and(dsl::to_user_id.eq(other))),
        );
    } else {
        query = query.filter(dsl::to_user_id.eq(user_id));
        query = apply_filter(query, descriptor)?;
    }

    Ok(query)
}

fn build_search_query(
    user_id: Uuid,
    descriptor: &SearchDescriptor,
    should_check_reverse: bool,
) -> AppResult<BoxedQuery<'static>> {
    let query = build_filter_query(user_id, descriptor, should_check_reverse)?;
    Ok(query
        .order((dsl::updated_at.desc(), dsl::id.desc()))
        .limit(descriptor.pagination.limit())
        .offset(descriptor.pagination.offset()))
}

/// Canonical pair key: direction-independent conversation identity.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn dedupe_by_pair(rows: Vec<DirectMessage>) -> Vec<DirectMessage> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|m| seen.insert(canonical_pair(m.from_user_id, m.to_user_id)))
        .collect()
}
