use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use gather_shared::errors::{AppError, AppResult, ErrorCode};
use gather_shared::types::SearchResults;

use crate::clients::{
    AccessPolicy, EventPayload, GroupMembershipApi, UserDirectory, UserSummary,
};
use crate::models::{Forum, ForumChanges, ForumTitle};
use crate::query::SearchDescriptor;
use crate::saga::{ActivityBundle, CreateForumParams, CreatedForum, ForumCreationSaga};
use crate::services::direct_messages::index_users;
use crate::stores::forums::{ForumSearchScope, ForumsStore};
use crate::stores::{ForumCategoriesStore, MutationOutcome};

/// A forum row enriched for listing: author profile and member count.
/// Both degrade to their empty value when a collaborator is down.
#[derive(Debug, Serialize)]
pub struct ForumSearchResult {
    pub forum: Forum,
    pub author: Option<UserSummary>,
    pub member_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ForumDetails {
    pub forum: Forum,
    pub category_tags: Vec<String>,
}

pub struct ForumsService {
    forums: ForumsStore,
    forum_categories: ForumCategoriesStore,
    users: Arc<dyn UserDirectory>,
    groups: Arc<dyn GroupMembershipApi>,
    saga: ForumCreationSaga,
}

impl ForumsService {
    pub fn new(
        forums: ForumsStore,
        forum_categories: ForumCategoriesStore,
        users: Arc<dyn UserDirectory>,
        groups: Arc<dyn GroupMembershipApi>,
        saga: ForumCreationSaga,
    ) -> Self {
        Self {
            forums,
            forum_categories,
            users,
            groups,
            saga,
        }
    }

    /// Public forums plus the caller's invited ones, optionally scoped
    /// to explicit ids or category tags, enriched with author profiles
    /// and member counts in one batched call each.
    pub async fn search_forums(
        &self,
        requesting_user_id: Uuid,
        descriptor: &SearchDescriptor,
        category_tags: Option<&[String]>,
        forum_ids: Option<Vec<Uuid>>,
    ) -> AppResult<SearchResults<ForumSearchResult>> {
        let invited_forum_ids = match self.groups.get_user_groups(requesting_user_id).await {
            Ok(memberships) => Some(memberships.into_iter().map(|m| m.group_id).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "invited-forum scope skipped");
                None
            }
        };

        let category_forum_ids = self
            .forums
            .resolve_category_scope(&self.forum_categories, category_tags)?;

        let scope = ForumSearchScope {
            invited_forum_ids,
            forum_ids,
            category_forum_ids,
        };

        let rows = self.forums.search_forums(descriptor, &scope)?;
        let total = self.forums.count_forums(descriptor, &scope)?;

        let forum_ids: Vec<Uuid> = rows.iter().map(|f| f.id).collect();
        let author_ids: Vec<Uuid> = rows.iter().map(|f| f.author_id).collect();

        let authors = match self.users.find_users(&author_ids).await {
            Ok(users) => index_users(users),
            Err(e) => {
                tracing::warn!(error = %e, "author enrichment skipped");
                HashMap::new()
            }
        };
        let member_counts = match self.groups.count_members(&forum_ids).await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::warn!(error = %e, "member counts skipped");
                HashMap::new()
            }
        };

        let results = rows
            .into_iter()
            .map(|forum| {
                let author = authors.get(&forum.author_id).cloned();
                let member_count = member_counts.get(&forum.id).copied().unwrap_or(0);
                ForumSearchResult {
                    forum,
                    author,
                    member_count,
                }
            })
            .collect();

        Ok(SearchResults::new(results, &descriptor.pagination, total))
    }

    /// Fetching a forum marks it recently active.
    pub fn get_forum(&self, forum_id: Uuid) -> AppResult<ForumDetails> {
        let forum = self
            .forums
            .get_forum(forum_id)?
            .ok_or_else(|| AppError::new(ErrorCode::ForumNotFound, "forum not found"))?;

        self.forums.touch_forum(forum_id)?;
        let category_tags = self.forum_categories.tags_for_forum(forum_id)?;
        Ok(ForumDetails {
            forum,
            category_tags,
        })
    }

    pub fn find_forums(&self, forum_ids: &[Uuid]) -> AppResult<Vec<ForumTitle>> {
        self.forums.find_forums(forum_ids)
    }

    pub fn update_forum(
        &self,
        forum_id: Uuid,
        author_id: Uuid,
        changes: &ForumChanges,
    ) -> AppResult<Forum> {
        unwrap_outcome(self.forums.update_forum(forum_id, author_id, changes)?)
    }

    pub fn archive_forum(&self, forum_id: Uuid, author_id: Uuid) -> AppResult<Forum> {
        unwrap_outcome(self.forums.archive_forum(forum_id, author_id)?)
    }

    pub async fn create_forum(&self, params: CreateForumParams) -> AppResult<CreatedForum> {
        self.saga.create_forum(params).await
    }

    /// Activities additionally require the create-groups policy.
    pub async fn create_activity(
        &self,
        params: CreateForumParams,
        event: EventPayload,
    ) -> AppResult<ActivityBundle> {
        let allowed = self
            .users
            .is_authorized(AccessPolicy::CreateGroups, params.author_id)
            .await?;
        if !allowed {
            return Err(AppError::forbidden("user may not create activities"));
        }

        self.saga.create_activity(params, event).await
    }
}

fn unwrap_outcome(outcome: MutationOutcome<Forum>) -> AppResult<Forum> {
    match outcome {
        MutationOutcome::Applied(forum) => Ok(forum),
        MutationOutcome::NotFound => {
            Err(AppError::new(ErrorCode::ForumNotFound, "forum not found"))
        }
        MutationOutcome::Forbidden => Err(AppError::forbidden("forum belongs to another user")),
    }
}
