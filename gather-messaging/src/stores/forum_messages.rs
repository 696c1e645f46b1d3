use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use gather_shared::clients::db::DbConnections;
use gather_shared::errors::AppResult;

use crate::models::{ForumMessage, NewForumMessage};
use crate::query::{
    ilike_pattern, parse_bool, parse_uuid, unsupported_filter, FilterOperator, SearchDescriptor,
};
use crate::schema::forum_messages::{self, dsl};
use crate::stores::{read_conn, write_conn};

type BoxedQuery<'a> = forum_messages::BoxedQuery<'a, Pg>;

#[derive(Clone)]
pub struct ForumMessagesStore {
    db: DbConnections,
}

impl ForumMessagesStore {
    pub fn new(db: DbConnections) -> Self {
        Self { db }
    }

    /// Total rows matching the same scope as `search_forum_messages`,
    /// for the pagination envelope.
    pub fn count_forum_messages(
        &self,
        forum_id: Uuid,
        descriptor: &SearchDescriptor,
        include_announcements: bool,
    ) -> AppResult<i64> {
        let mut conn = read_conn(&self.db)?;
        let query = build_filter_query(forum_id, descriptor, include_announcements)?;
        Ok(query.count().get_result(&mut conn)?)
    }

    /// Every query is scoped to a single forum. Announcement-flagged
    /// rows are excluded unless the caller opts in or filters on
    /// `is_announcement` explicitly.
    pub fn search_forum_messages(
        &self,
        forum_id: Uuid,
        descriptor: &SearchDescriptor,
        include_announcements: bool,
    ) -> AppResult<Vec<ForumMessage>> {
        let mut conn = read_conn(&self.db)?;
        let query = build_search_query(forum_id, descriptor, include_announcements)?;
        Ok(query.load(&mut conn)?)
    }

    pub fn create_forum_message(&self, params: NewForumMessage) -> AppResult<ForumMessage> {
        let mut conn = write_conn(&self.db)?;
        let message = diesel::insert_into(forum_messages::table)
            .values(&params)
            .get_result::<ForumMessage>(&mut conn)?;

        tracing::info!(
            message_id = %message.id,
            forum_id = %message.forum_id,
            is_announcement = message.is_announcement,
            "forum message created"
        );
        Ok(message)
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
        ("is_announcement", FilterOperator::Eq) => {
            query.filter(dsl::is_announcement.eq(parse_bool(column, value)?))
        }
        ("message", FilterOperator::ILike) => {
            query.filter(dsl::message.ilike(ilike_pattern(value)))
        }
        ("message", FilterOperator::Eq) => query.filter(dsl::message.eq(value.to_string())),
        _ => return Err(unsupported_filter("forum_messages", column)),
    };

    Ok(query)
}

fn build_filter_query(
    forum_id: Uuid,
    descriptor: &SearchDescriptor,
    include_announcements: bool,
) -> AppResult<BoxedQuery<'static>> {
    let mut query = forum_messages::table
        .into_boxed()
        .filter(dsl::forum_id.eq(forum_id));

    let filters_announcements = matches!(descriptor.active_filter(), Some(("is_announcement", _, _)));
    if !include_announcements && !filters_announcements {
        query = query.filter(dsl::is_announcement.eq(false));
    }

    apply_filter(query, descriptor)
}

fn build_search_query(
    forum_id: Uuid,
    descriptor: &SearchDescriptor,
    include_announcements: bool,
) -> AppResult<BoxedQuery<'static>> {
    let query = build_filter_query(forum_id, descriptor, include_announcements)?;
    Ok(query
        .order((dsl::created_at.desc(), dsl::id.desc()))
        .limit(descriptor.pagination.limit())
        .offset(descriptor.pagination.offset()))
}
