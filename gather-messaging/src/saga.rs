use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use gather_shared::errors::{AppError, AppResult, ErrorCode};

use crate::clients::{
    Event, EventCalendarApi, EventPayload, GroupMembershipApi, GroupMembershipRecord, GroupRole,
    MembershipStatus,
};
use crate::content_safety::ContentSafetyFilter;
use crate::models::{Forum, ForumCategory, NewForum};
use crate::stores::{ForumCategoriesStore, ForumsStore};
use crate::stores::forums::ForumConditions;

/// Lifecycle of one forum-creation run. Every run walks forward through
/// the happy-path states in order; a failure after the forum row exists
/// moves through the compensation states instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Pending,
    ForumInserted,
    CategoriesWritten,
    MembershipRegistered,
    EventCreated,
    Committed,
    Failed,
    Compensating,
    Compensated,
}

impl SagaState {
    /// Legal forward edges. `EventCreated` is skipped for plain forums;
    /// compensation is only reachable once a forum row exists.
    pub fn can_transition_to(self, next: SagaState) -> bool {
        use SagaState::*;
        matches!(
            (self, next),
            (Pending, ForumInserted)
                | (Pending, Failed)
                | (ForumInserted, CategoriesWritten)
                | (ForumInserted, Failed)
                | (CategoriesWritten, MembershipRegistered)
                | (CategoriesWritten, Failed)
                | (MembershipRegistered, EventCreated)
                | (MembershipRegistered, Committed)
                | (MembershipRegistered, Failed)
                | (EventCreated, Committed)
                | (EventCreated, Failed)
                | (Failed, Compensating)
                | (Compensating, Compensated)
        )
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::ForumInserted => "forum_inserted",
            Self::CategoriesWritten => "categories_written",
            Self::MembershipRegistered => "membership_registered",
            Self::EventCreated => "event_created",
            Self::Committed => "committed",
            Self::Failed => "failed",
            Self::Compensating => "compensating",
            Self::Compensated => "compensated",
        };
        f.write_str(name)
    }
}

/// The database side of the saga, behind a trait so runs can be
/// exercised without a live database.
pub trait ForumWriter: Send + Sync {
    fn find_duplicates(
        &self,
        author_id: Uuid,
        title: &[String],
        subtitle: &[String],
    ) -> AppResult<Vec<Forum>>;
    fn insert_forum(&self, forum: NewForum) -> AppResult<Forum>;
    fn insert_categories(
        &self,
        forum_id: Uuid,
        category_tags: &[String],
    ) -> AppResult<Vec<ForumCategory>>;
    fn delete_forum(&self, forum_id: Uuid) -> AppResult<usize>;
}

/// Production writer backed by the forums and forum-categories stores.
#[derive(Clone)]
pub struct StoreForumWriter {
    forums: ForumsStore,
    forum_categories: ForumCategoriesStore,
}

impl StoreForumWriter {
    pub fn new(forums: ForumsStore, forum_categories: ForumCategoriesStore) -> Self {
        Self {
            forums,
            forum_categories,
        }
    }
}

impl ForumWriter for StoreForumWriter {
    /// A duplicate is another active forum by the same author with the
    /// same title OR the same subtitle.
    fn find_duplicates(
        &self,
        author_id: Uuid,
        title: &[String],
        subtitle: &[String],
    ) -> AppResult<Vec<Forum>> {
        let title_side = ForumConditions {
            author_id,
            title: Some(title.to_vec()),
            subtitle: None,
        };
        let subtitle_side = ForumConditions {
            author_id,
            title: None,
            subtitle: Some(subtitle.to_vec()),
        };
        self.forums.get_forums(&title_side, Some(&subtitle_side), true)
    }

    fn insert_forum(&self, forum: NewForum) -> AppResult<Forum> {
        self.forums.create_forum(forum)
    }

    fn insert_categories(
        &self,
        forum_id: Uuid,
        category_tags: &[String],
    ) -> AppResult<Vec<ForumCategory>> {
        self.forum_categories
            .create_forum_categories(forum_id, category_tags)
    }

    fn delete_forum(&self, forum_id: Uuid) -> AppResult<usize> {
        self.forums.delete_forum(forum_id)
    }
}

fn default_max_comments_per_min() -> i32 {
    50
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateForumParams {
    pub author_id: Uuid,
    pub author_locale: String,
    #[serde(default)]
    pub administrator_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "a forum needs at least one title"))]
    pub title: Vec<String>,
    #[serde(default)]
    pub subtitle: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub integration_ids: Vec<String>,
    #[serde(default)]
    pub invitees: Vec<Uuid>,
    #[serde(default)]
    pub icon_group: String,
    #[serde(default)]
    pub icon_id: String,
    #[serde(default)]
    pub icon_color: String,
    #[serde(default = "default_max_comments_per_min")]
    #[validate(range(min = 1, max = 600))]
    pub max_comments_per_min: i32,
    #[serde(default = "default_true")]
    pub does_expire: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub category_tags: Vec<String>,
}

impl CreateForumParams {
    fn free_text(&self) -> Vec<&str> {
        self.title
            .iter()
            .chain(self.subtitle.iter())
            .chain(self.hashtags.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.description.as_str()))
            .collect()
    }

    fn into_new_forum(self) -> (NewForum, Vec<String>) {
        let category_tags = self.category_tags;
        let forum = NewForum {
            author_id: self.author_id,
            author_locale: self.author_locale,
            administrator_ids: self.administrator_ids,
            title: self.title,
            subtitle: self.subtitle,
            description: self.description,
            hashtags: self.hashtags,
            integration_ids: self.integration_ids,
            invitees: self.invitees,
            icon_group: self.icon_group,
            icon_id: self.icon_id,
            icon_color: self.icon_color,
            max_comments_per_min: self.max_comments_per_min,
            does_expire: self.does_expire,
            is_public: self.is_public,
        };
        (forum, category_tags)
    }
}

#[derive(Debug, Clone)]
pub struct CreatedForum {
    pub forum: Forum,
    pub categories: Vec<ForumCategory>,
    pub memberships: Vec<GroupMembershipRecord>,
}

/// An activity is a forum plus a calendar event. `user_groups` carries
/// the memberships registered for the creator and invitees.
#[derive(Debug, Clone)]
pub struct ActivityBundle {
    pub forum: Forum,
    pub event: Event,
    pub user_groups: Vec<GroupMembershipRecord>,
}

/// Orchestrates forum creation across the local database and the
/// group-membership and event-calendar collaborators. Local writes
/// happen first; the only compensated step is event creation, which
/// rolls the forum row back when the calendar rejects it.
pub struct ForumCreationSaga {
    writer: Arc<dyn ForumWriter>,
    groups: Arc<dyn GroupMembershipApi>,
    events: Arc<dyn EventCalendarApi>,
    safety: ContentSafetyFilter,
}

impl ForumCreationSaga {
    pub fn new(
        writer: Arc<dyn ForumWriter>,
        groups: Arc<dyn GroupMembershipApi>,
        events: Arc<dyn EventCalendarApi>,
        safety: ContentSafetyFilter,
    ) -> Self {
        Self {
            writer,
            groups,
            events,
            safety,
        }
    }

    fn transition(&self, run_id: Uuid, state: &mut SagaState, next: SagaState) {
        debug_assert!(state.can_transition_to(next), "{state} -> {next}");
        tracing::info!(run_id = %run_id, from = %state, to = %next, "forum saga transition");
        *state = next;
    }

    /// Author and co-administrators join as approved admins; invitees
    /// join as pending members. Anyone already an admin is not
    /// registered a second time.
    async fn register_memberships(&self, forum: &Forum) -> AppResult<Vec<GroupMembershipRecord>> {
        let mut admin_ids = vec![forum.author_id];
        for id in &forum.administrator_ids {
            if !admin_ids.contains(id) {
                admin_ids.push(*id);
            }
        }

        let registration_error = |e: AppError| {
            AppError::with_details(
                ErrorCode::GroupRegistrationFailed,
                format!("group registration failed: {e}"),
                serde_json::json!({ "forumId": forum.id }),
            )
        };

        let mut memberships = self
            .groups
            .register_group(
                forum.id,
                GroupRole::Admin,
                MembershipStatus::Approved,
                &admin_ids,
            )
            .await
            .map_err(registration_error)?;

        let invitee_ids: Vec<Uuid> = forum
            .invitees
            .iter()
            .filter(|id| !admin_ids.contains(id))
            .copied()
            .collect();
        if !invitee_ids.is_empty() {
            let invited = self
                .groups
                .register_group(
                    forum.id,
                    GroupRole::Member,
                    MembershipStatus::Pending,
                    &invitee_ids,
                )
                .await
                .map_err(registration_error)?;
            memberships.extend(invited);
        }

        Ok(memberships)
    }

    /// Create a plain forum: moderation gate, duplicate pre-check,
    /// forum + category writes, then group registration.
    pub async fn create_forum(&self, params: CreateForumParams) -> AppResult<CreatedForum> {
        let run_id = Uuid::new_v4();
        let mut state = SagaState::Pending;

        params
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.safety.is_text_unsafe(&params.free_text()) {
            self.transition(run_id, &mut state, SagaState::Failed);
            return Err(AppError::new(
                ErrorCode::UnsafeContent,
                "forum text contains blocked terms",
            ));
        }

        let duplicates =
            self.writer
                .find_duplicates(params.author_id, &params.title, &params.subtitle)?;
        if !duplicates.is_empty() {
            self.transition(run_id, &mut state, SagaState::Failed);
            return Err(AppError::with_details(
                ErrorCode::DuplicateForum,
                "an active forum with this title or subtitle already exists",
                serde_json::json!({ "forumId": duplicates[0].id }),
            ));
        }

        let (new_forum, category_tags) = params.into_new_forum();

        let forum = self.writer.insert_forum(new_forum)?;
        self.transition(run_id, &mut state, SagaState::ForumInserted);

        // Category rows live in a separate table and are not written in
        // the forum's transaction. A failure here leaves the forum in
        // place; the caller sees the error and can retry the tags.
        let categories = self
            .writer
            .insert_categories(forum.id, &category_tags)
            .map_err(|e| {
                tracing::warn!(
                    run_id = %run_id,
                    forum_id = %forum.id,
                    error = %e,
                    "category write failed after forum insert"
                );
                e
            })?;
        self.transition(run_id, &mut state, SagaState::CategoriesWritten);

        let memberships = self.register_memberships(&forum).await?;
        self.transition(run_id, &mut state, SagaState::MembershipRegistered);

        self.transition(run_id, &mut state, SagaState::Committed);
        Ok(CreatedForum {
            forum,
            categories,
            memberships,
        })
    }

    /// Create an activity: a forum plus a calendar event. When the
    /// calendar rejects the event the forum row is rolled back so no
    /// orphaned activity forum survives.
    pub async fn create_activity(
        &self,
        params: CreateForumParams,
        event: EventPayload,
    ) -> AppResult<ActivityBundle> {
        let run_id = Uuid::new_v4();
        let mut state = SagaState::Pending;

        params
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let event_text = [event.title.as_str(), event.description.as_str()];
        if self.safety.is_text_unsafe(&params.free_text())
            || self.safety.is_text_unsafe(&event_text)
        {
            self.transition(run_id, &mut state, SagaState::Failed);
            return Err(AppError::new(
                ErrorCode::UnsafeContent,
                "activity text contains blocked terms",
            ));
        }

        let duplicates =
            self.writer
                .find_duplicates(params.author_id, &params.title, &params.subtitle)?;
        if !duplicates.is_empty() {
            self.transition(run_id, &mut state, SagaState::Failed);
            return Err(AppError::with_details(
                ErrorCode::DuplicateForum,
                "an active forum with this title or subtitle already exists",
                serde_json::json!({ "forumId": duplicates[0].id }),
            ));
        }

        let (new_forum, category_tags) = params.into_new_forum();

        let forum = self.writer.insert_forum(new_forum)?;
        self.transition(run_id, &mut state, SagaState::ForumInserted);

        self.writer.insert_categories(forum.id, &category_tags)?;
        self.transition(run_id, &mut state, SagaState::CategoriesWritten);

        let user_groups = self.register_memberships(&forum).await?;
        self.transition(run_id, &mut state, SagaState::MembershipRegistered);

        let created_event = match self.events.create_event(forum.id, &event).await {
            Ok(created) => created,
            Err(cause) => {
                self.transition(run_id, &mut state, SagaState::Failed);
                self.transition(run_id, &mut state, SagaState::Compensating);

                match self.writer.delete_forum(forum.id) {
                    Ok(_) => {
                        self.transition(run_id, &mut state, SagaState::Compensated);
                    }
                    Err(delete_err) => {
                        tracing::error!(
                            run_id = %run_id,
                            forum_id = %forum.id,
                            code = ErrorCode::CompensationFailed.code(),
                            error = %delete_err,
                            "could not roll back forum after event failure"
                        );
                    }
                }

                return Err(AppError::with_details(
                    ErrorCode::EventCreationFailed,
                    format!("event creation failed: {cause}"),
                    serde_json::json!({ "forumId": forum.id }),
                ));
            }
        };
        self.transition(run_id, &mut state, SagaState::EventCreated);

        self.transition(run_id, &mut state, SagaState::Committed);
        Ok(ActivityBundle {
            forum,
            event: created_event,
            user_groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn forum_with(id: Uuid, author_id: Uuid) -> Forum {
        Forum {
            id,
            author_id,
            author_locale: "en-us".into(),
            administrator_ids: vec![author_id],
            title: vec!["General".into()],
            subtitle: vec!["Chat".into()],
            description: "a place to talk".into(),
            hashtags: vec![],
            integration_ids: vec![],
            invitees: vec![],
            icon_group: "font-awesome-5".into(),
            icon_id: "comments".into(),
            icon_color: "#ffffff".into(),
            max_comments_per_min: 50,
            does_expire: true,
            is_public: true,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn params(author_id: Uuid) -> CreateForumParams {
        CreateForumParams {
            author_id,
            author_locale: "en-us".into(),
            administrator_ids: vec![author_id],
            title: vec!["General".into()],
            subtitle: vec!["Chat".into()],
            description: "a place to talk".into(),
            hashtags: vec![],
            integration_ids: vec![],
            invitees: vec![Uuid::from_u128(99)],
            icon_group: "font-awesome-5".into(),
            icon_id: "comments".into(),
            icon_color: "#ffffff".into(),
            max_comments_per_min: 50,
            does_expire: true,
            is_public: true,
            category_tags: vec!["music".into()],
        }
    }

    fn event_payload() -> EventPayload {
        EventPayload {
            title: "Kickoff".into(),
            description: "first meetup".into(),
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            is_public: true,
        }
    }

    #[derive(Default)]
    struct MockWriter {
        duplicates: Mutex<Vec<Forum>>,
        fail_categories: AtomicBool,
        fail_delete: AtomicBool,
        inserted: Mutex<Vec<Uuid>>,
        deleted: Mutex<Vec<Uuid>>,
    }

    impl ForumWriter for MockWriter {
        fn find_duplicates(
            &self,
            _author_id: Uuid,
            _title: &[String],
            _subtitle: &[String],
        ) -> AppResult<Vec<Forum>> {
            Ok(self.duplicates.lock().unwrap().clone())
        }

        fn insert_forum(&self, forum: NewForum) -> AppResult<Forum> {
            let id = Uuid::from_u128(42);
            self.inserted.lock().unwrap().push(id);
            Ok(Forum {
                id,
                author_id: forum.author_id,
                author_locale: forum.author_locale,
                administrator_ids: forum.administrator_ids,
                title: forum.title,
                subtitle: forum.subtitle,
                description: forum.description,
                hashtags: forum.hashtags,
                integration_ids: forum.integration_ids,
                invitees: forum.invitees,
                icon_group: forum.icon_group,
                icon_id: forum.icon_id,
                icon_color: forum.icon_color,
                max_comments_per_min: forum.max_comments_per_min,
                does_expire: forum.does_expire,
                is_public: forum.is_public,
                archived_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }

        fn insert_categories(
            &self,
            forum_id: Uuid,
            category_tags: &[String],
        ) -> AppResult<Vec<ForumCategory>> {
            if self.fail_categories.load(Ordering::SeqCst) {
                return Err(AppError::internal("category insert failed"));
            }
            Ok(category_tags
                .iter()
                .map(|tag| ForumCategory {
                    id: Uuid::new_v4(),
                    forum_id,
                    category_tag: tag.clone(),
                    created_at: Utc::now(),
                })
                .collect())
        }

        fn delete_forum(&self, forum_id: Uuid) -> AppResult<usize> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(AppError::internal("delete failed"));
            }
            self.deleted.lock().unwrap().push(forum_id);
            Ok(1)
        }
    }

    #[derive(Default)]
    struct MockGroups {
        fail: AtomicBool,
        registered: Mutex<Vec<(Uuid, GroupRole, MembershipStatus, Vec<Uuid>)>>,
    }

    #[async_trait]
    impl GroupMembershipApi for MockGroups {
        async fn register_group(
            &self,
            group_id: Uuid,
            role: GroupRole,
            status: MembershipStatus,
            member_ids: &[Uuid],
        ) -> AppResult<Vec<GroupMembershipRecord>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::external("groups down"));
            }
            self.registered
                .lock()
                .unwrap()
                .push((group_id, role, status, member_ids.to_vec()));
            Ok(member_ids
                .iter()
                .map(|user_id| GroupMembershipRecord {
                    group_id,
                    user_id: *user_id,
                    role,
                    status,
                })
                .collect())
        }

        async fn get_user_groups(&self, _user_id: Uuid) -> AppResult<Vec<GroupMembershipRecord>> {
            Ok(Vec::new())
        }

        async fn count_members(&self, _group_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>> {
            Ok(HashMap::new())
        }
    }

    #[derive(Default)]
    struct MockEvents {
        fail: AtomicBool,
        created: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl EventCalendarApi for MockEvents {
        async fn create_event(&self, group_id: Uuid, payload: &EventPayload) -> AppResult<Event> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::external("calendar down"));
            }
            self.created.lock().unwrap().push(group_id);
            Ok(Event {
                id: Uuid::new_v4(),
                group_id,
                title: payload.title.clone(),
                description: payload.description.clone(),
                starts_at: payload.starts_at,
                ends_at: payload.ends_at,
                is_public: payload.is_public,
            })
        }
    }

    fn saga(
        writer: Arc<MockWriter>,
        groups: Arc<MockGroups>,
        events: Arc<MockEvents>,
    ) -> ForumCreationSaga {
        ForumCreationSaga::new(writer, groups, events, ContentSafetyFilter::new(&[]))
    }

    #[test]
    fn state_machine_rejects_illegal_jumps() {
        assert!(SagaState::Pending.can_transition_to(SagaState::ForumInserted));
        assert!(SagaState::Failed.can_transition_to(SagaState::Compensating));
        assert!(SagaState::Compensating.can_transition_to(SagaState::Compensated));

        assert!(!SagaState::Pending.can_transition_to(SagaState::Committed));
        assert!(!SagaState::Committed.can_transition_to(SagaState::Pending));
        assert!(!SagaState::Compensated.can_transition_to(SagaState::Compensating));
    }

    #[tokio::test]
    async fn creates_forum_with_admin_and_invitee_memberships() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer.clone(), groups.clone(), events);

        let author = Uuid::from_u128(1);
        let created = saga.create_forum(params(author)).await.unwrap();

        assert_eq!(created.forum.author_id, author);
        assert_eq!(created.categories.len(), 1);
        assert_eq!(created.memberships.len(), 2);

        let registered = groups.registered.lock().unwrap();
        assert_eq!(registered.len(), 2);
        let (_, role, status, members) = &registered[0];
        assert_eq!(*role, GroupRole::Admin);
        assert_eq!(*status, MembershipStatus::Approved);
        assert_eq!(*members, vec![author]);
        let (_, role, status, members) = &registered[1];
        assert_eq!(*role, GroupRole::Member);
        assert_eq!(*status, MembershipStatus::Pending);
        assert_eq!(*members, vec![Uuid::from_u128(99)]);
    }

    #[tokio::test]
    async fn co_administrators_join_as_admins_and_invitees_do_not() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer, groups.clone(), events);

        let author = Uuid::from_u128(1);
        let co_admin = Uuid::from_u128(2);
        let mut p = params(author);
        p.administrator_ids = vec![author, co_admin];
        p.invitees = vec![Uuid::from_u128(99), co_admin];
        saga.create_forum(p).await.unwrap();

        let registered = groups.registered.lock().unwrap();
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0].1, GroupRole::Admin);
        assert_eq!(registered[0].3, vec![author, co_admin]);
        // an invitee who is already an admin is not registered twice
        assert_eq!(registered[1].1, GroupRole::Member);
        assert_eq!(registered[1].3, vec![Uuid::from_u128(99)]);
    }

    #[tokio::test]
    async fn unsafe_text_aborts_before_any_write() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer.clone(), groups, events);

        let mut p = params(Uuid::from_u128(1));
        p.description = "this is shit".into();
        let err = saga.create_forum(p).await.unwrap_err();

        assert_eq!(err.error_code(), Some(ErrorCode::UnsafeContent));
        assert!(writer.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_title_or_subtitle_aborts_before_insert() {
        let writer = Arc::new(MockWriter::default());
        let author = Uuid::from_u128(1);
        writer
            .duplicates
            .lock()
            .unwrap()
            .push(forum_with(Uuid::from_u128(7), author));
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer.clone(), groups, events);

        let err = saga.create_forum(params(author)).await.unwrap_err();

        assert_eq!(err.error_code(), Some(ErrorCode::DuplicateForum));
        assert!(writer.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_failure_leaves_the_forum_row_in_place() {
        let writer = Arc::new(MockWriter::default());
        writer.fail_categories.store(true, Ordering::SeqCst);
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer.clone(), groups.clone(), events);

        let err = saga.create_forum(params(Uuid::from_u128(1))).await.unwrap_err();

        assert!(err.error_code().is_some() || matches!(err, AppError::Internal(_)));
        assert_eq!(writer.inserted.lock().unwrap().len(), 1);
        assert!(writer.deleted.lock().unwrap().is_empty());
        assert!(groups.registered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_registration_failure_is_tagged() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        groups.fail.store(true, Ordering::SeqCst);
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer, groups, events);

        let err = saga.create_forum(params(Uuid::from_u128(1))).await.unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorCode::GroupRegistrationFailed));
    }

    #[tokio::test]
    async fn activity_bundles_forum_event_and_memberships() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer, groups, events.clone());

        let bundle = saga
            .create_activity(params(Uuid::from_u128(1)), event_payload())
            .await
            .unwrap();

        assert_eq!(bundle.event.group_id, bundle.forum.id);
        assert_eq!(bundle.user_groups.len(), 2);
        assert_eq!(events.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn event_failure_rolls_the_forum_back() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        events.fail.store(true, Ordering::SeqCst);
        let saga = saga(writer.clone(), groups, events);

        let err = saga
            .create_activity(params(Uuid::from_u128(1)), event_payload())
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), Some(ErrorCode::EventCreationFailed));
        assert_eq!(*writer.deleted.lock().unwrap(), vec![Uuid::from_u128(42)]);
    }

    #[tokio::test]
    async fn failed_rollback_still_reports_the_event_error() {
        let writer = Arc::new(MockWriter::default());
        writer.fail_delete.store(true, Ordering::SeqCst);
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        events.fail.store(true, Ordering::SeqCst);
        let saga = saga(writer.clone(), groups, events);

        let err = saga
            .create_activity(params(Uuid::from_u128(1)), event_payload())
            .await
            .unwrap_err();

        // the caller sees the event failure; the stuck forum is logged
        assert_eq!(err.error_code(), Some(ErrorCode::EventCreationFailed));
        assert!(writer.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsafe_event_text_aborts_activity_creation() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer.clone(), groups, events);

        let mut payload = event_payload();
        payload.description = "send nudes".into();
        let err = saga
            .create_activity(params(Uuid::from_u128(1)), payload)
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), Some(ErrorCode::UnsafeContent));
        assert!(writer.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_title_fails_validation() {
        let writer = Arc::new(MockWriter::default());
        let groups = Arc::new(MockGroups::default());
        let events = Arc::new(MockEvents::default());
        let saga = saga(writer, groups, events);

        let mut p = params(Uuid::from_u128(1));
        p.title = vec![];
        let err = saga.create_forum(p).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
