use uuid::Uuid;

use gather_shared::errors::AppResult;
use gather_shared::types::SearchResults;

use crate::models::{ForumMessage, NewForumMessage};
use crate::query::SearchDescriptor;
use crate::stores::ForumMessagesStore;

pub struct ForumMessagesService {
    store: ForumMessagesStore,
}

impl ForumMessagesService {
    pub fn new(store: ForumMessagesStore) -> Self {
        Self { store }
    }

    pub fn search_forum_messages(
        &self,
        forum_id: Uuid,
        descriptor: &SearchDescriptor,
        include_announcements: bool,
    ) -> AppResult<SearchResults<ForumMessage>> {
        let rows =
            self.store
                .search_forum_messages(forum_id, descriptor, include_announcements)?;
        let total =
            self.store
                .count_forum_messages(forum_id, descriptor, include_announcements)?;
        Ok(SearchResults::new(rows, &descriptor.pagination, total))
    }

    pub fn create_forum_message(&self, params: NewForumMessage) -> AppResult<ForumMessage> {
        self.store.create_forum_message(params)
    }
}
