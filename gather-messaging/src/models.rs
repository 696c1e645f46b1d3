use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{categories, direct_messages, forum_categories, forum_messages, forums};

// --- DirectMessage ---

/// Shared by reference between two users; mutated only to flip `is_unread`.
#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = direct_messages)]
pub struct DirectMessage {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: String,
    pub is_unread: bool,
    pub locale: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DirectMessage {
    /// The conversation partner of `user_id` in this message, regardless
    /// of which side sent it.
    pub fn partner_of(&self, user_id: Uuid) -> Uuid {
        if self.from_user_id == user_id {
            self.to_user_id
        } else {
            self.from_user_id
        }
    }
}

#[derive(Debug, Insertable, Deserialize)]
#[diesel(table_name = direct_messages)]
pub struct NewDirectMessage {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: String,
    pub is_unread: bool,
    pub locale: String,
}

// --- ForumMessage ---

/// Owned by exactly one forum; immutable after creation.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = forum_messages)]
pub struct ForumMessage {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub from_user_id: Uuid,
    pub message: String,
    pub is_announcement: bool,
    pub from_user_locale: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Deserialize)]
#[diesel(table_name = forum_messages)]
pub struct NewForumMessage {
    pub forum_id: Uuid,
    pub from_user_id: Uuid,
    pub message: String,
    pub is_announcement: bool,
    pub from_user_locale: String,
}

// --- Forum ---

/// `archived_at == None` means the forum is active and visible.
/// Archiving is a soft delete; hard deletes happen only through an
/// explicit purge (saga compensation included).
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = forums)]
pub struct Forum {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_locale: String,
    pub administrator_ids: Vec<Uuid>,
    pub title: Vec<String>,
    pub subtitle: Vec<String>,
    pub description: String,
    pub hashtags: Vec<String>,
    pub integration_ids: Vec<String>,
    pub invitees: Vec<Uuid>,
    pub icon_group: String,
    pub icon_id: String,
    pub icon_color: String,
    pub max_comments_per_min: i32,
    pub does_expire: bool,
    pub is_public: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Forum {
    pub fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = forums)]
pub struct NewForum {
    pub author_id: Uuid,
    pub author_locale: String,
    pub administrator_ids: Vec<Uuid>,
    pub title: Vec<String>,
    pub subtitle: Vec<String>,
    pub description: String,
    pub hashtags: Vec<String>,
    pub integration_ids: Vec<String>,
    pub invitees: Vec<Uuid>,
    pub icon_group: String,
    pub icon_id: String,
    pub icon_color: String,
    pub max_comments_per_min: i32,
    pub does_expire: bool,
    pub is_public: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Default, AsChangeset, Deserialize)]
#[diesel(table_name = forums)]
pub struct ForumChanges {
    pub administrator_ids: Option<Vec<Uuid>>,
    pub title: Option<Vec<String>>,
    pub subtitle: Option<Vec<String>>,
    pub description: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub integration_ids: Option<Vec<String>>,
    pub invitees: Option<Vec<Uuid>>,
    pub icon_group: Option<String>,
    pub icon_id: Option<String>,
    pub icon_color: Option<String>,
    pub max_comments_per_min: Option<i32>,
    pub does_expire: Option<bool>,
    pub is_public: Option<bool>,
}

/// Lightweight projection for lookups by id list.
#[derive(Debug, Queryable, Serialize, Clone)]
pub struct ForumTitle {
    pub id: Uuid,
    pub title: Vec<String>,
}

// --- ForumCategory ---

/// Join row between a forum and a category tag; written together with
/// its forum and never updated independently.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = forum_categories)]
pub struct ForumCategory {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub category_tag: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = forum_categories)]
pub struct NewForumCategory {
    pub forum_id: Uuid,
    pub category_tag: String,
}

// --- Category ---

/// Reference data; read-only from this layer's perspective.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = categories)]
#[diesel(primary_key(tag))]
pub struct Category {
    pub tag: String,
    pub name: String,
    pub icon_group: String,
    pub icon_id: String,
    pub icon_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
