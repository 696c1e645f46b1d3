//! Data-access layer for direct messages, forums, and forum
//! categories. HTTP routing and authentication live in the consuming
//! services; this crate owns the stores, the search compiler, the
//! moderation gate, and the forum-creation saga.

pub mod clients;
pub mod config;
pub mod content_safety;
pub mod models;
pub mod query;
pub mod saga;
pub mod schema;
pub mod services;
pub mod stores;

use std::sync::Arc;

use gather_shared::clients::db::DbConnections;

use crate::clients::{build_http_client, HttpEventCalendar, HttpGroupMembership, HttpUserDirectory};
use crate::config::AppConfig;
use crate::content_safety::ContentSafetyFilter;
use crate::saga::{ForumCreationSaga, StoreForumWriter};
use crate::services::{
    CategoriesService, DirectMessagesService, ForumMessagesService, ForumsService,
};
use crate::stores::{
    CategoriesStore, DirectMessagesStore, ForumCategoriesStore, ForumMessagesStore, ForumsStore,
};

/// Fully wired service graph. Built once at startup and shared.
pub struct AppContext {
    pub direct_messages: DirectMessagesService,
    pub forum_messages: ForumMessagesService,
    pub forums: ForumsService,
    pub categories: CategoriesService,
}

impl AppContext {
    pub fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let db = DbConnections::new(
            &config.read_database_url,
            &config.write_database_url,
            config.pool_max_size,
        )?;

        let http = build_http_client(config.request_timeout_secs);
        let users = Arc::new(HttpUserDirectory::new(
            http.clone(),
            config.users_service_url.clone(),
        ));
        let groups = Arc::new(HttpGroupMembership::new(
            http.clone(),
            config.groups_service_url.clone(),
        ));
        let events = Arc::new(HttpEventCalendar::new(
            http,
            config.events_service_url.clone(),
        ));

        let forums_store = ForumsStore::new(db.clone());
        let forum_categories_store = ForumCategoriesStore::new(db.clone());
        let safety = ContentSafetyFilter::new(&config.extra_blocked_terms);
        let saga = ForumCreationSaga::new(
            Arc::new(StoreForumWriter::new(
                forums_store.clone(),
                forum_categories_store.clone(),
            )),
            groups.clone(),
            events,
            safety,
        );

        Ok(Self {
            direct_messages: DirectMessagesService::new(
                DirectMessagesStore::new(db.clone()),
                users.clone(),
            ),
            forum_messages: ForumMessagesService::new(ForumMessagesStore::new(db.clone())),
            forums: ForumsService::new(
                forums_store,
                forum_categories_store,
                users,
                groups,
                saga,
            ),
            categories: CategoriesService::new(CategoriesStore::new(db)),
        })
    }
}
