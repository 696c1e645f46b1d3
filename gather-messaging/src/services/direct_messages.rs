use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use gather_shared::errors::AppResult;
use gather_shared::types::{PaginationParams, SearchResults};

use crate::clients::{UserDirectory, UserSummary};
use crate::models::{DirectMessage, NewDirectMessage};
use crate::query::SearchDescriptor;
use crate::stores::DirectMessagesStore;

/// A conversation's most recent message, enriched with the partner's
/// profile. `partner` is `None` when the user directory is unavailable
/// or no longer knows the user.
#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub message: DirectMessage,
    pub partner: Option<UserSummary>,
}

pub struct DirectMessagesService {
    store: DirectMessagesStore,
    users: Arc<dyn UserDirectory>,
}

impl DirectMessagesService {
    pub fn new(store: DirectMessagesStore, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    pub fn search_direct_messages(
        &self,
        user_id: Uuid,
        descriptor: &SearchDescriptor,
        should_check_reverse: bool,
    ) -> AppResult<SearchResults<DirectMessage>> {
        let rows = self
            .store
            .search_direct_messages(user_id, descriptor, should_check_reverse)?;
        let total = self
            .store
            .count_direct_messages(user_id, descriptor, should_check_reverse)?;
        Ok(SearchResults::new(rows, &descriptor.pagination, total))
    }

    /// One preview per conversation partner, newest first. Enrichment
    /// is a single batched directory call; a directory outage degrades
    /// to previews without partner profiles rather than an error.
    pub async fn search_latest_conversations(
        &self,
        user_id: Uuid,
        pagination: &PaginationParams,
    ) -> AppResult<Vec<ConversationPreview>> {
        let messages = self.store.search_latest_dms(user_id, pagination)?;

        let partner_ids: Vec<Uuid> = messages.iter().map(|m| m.partner_of(user_id)).collect();
        let users_by_id = match self.users.find_users(&partner_ids).await {
            Ok(users) => index_users(users),
            Err(e) => {
                tracing::warn!(error = %e, "partner enrichment skipped");
                HashMap::new()
            }
        };

        Ok(assemble_previews(messages, user_id, &users_by_id))
    }

    pub fn create_direct_message(&self, params: NewDirectMessage) -> AppResult<DirectMessage> {
        self.store.create_direct_message(params)
    }

    pub fn mark_read(&self, message_id: Uuid) -> AppResult<DirectMessage> {
        self.store.update_direct_message(message_id, false)
    }
}

pub(crate) fn index_users(users: Vec<UserSummary>) -> HashMap<Uuid, UserSummary> {
    users.into_iter().map(|u| (u.id, u)).collect()
}

fn assemble_previews(
    messages: Vec<DirectMessage>,
    user_id: Uuid,
    users_by_id: &HashMap<Uuid, UserSummary>,
) -> Vec<ConversationPreview> {
    messages
        .into_iter()
        .map(|message| {
            let partner = users_by_id.get(&message.partner_of(user_id)).cloned();
            ConversationPreview { message, partner }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn message(id: u128, from: Uuid, to: Uuid) -> DirectMessage {
        DirectMessage {
            id: uuid(id),
            from_user_id: from,
            to_user_id: to,
            message: "hi".into(),
            is_unread: true,
            locale: "en-us".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn summary(id: Uuid, name: &str) -> UserSummary {
        UserSummary {
            id,
            user_name: name.into(),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn previews_pair_each_message_with_the_partner_profile() {
        let me = uuid(1);
        let alice = uuid(2);
        let bob = uuid(3);
        let users = index_users(vec![summary(alice, "alice"), summary(bob, "bob")]);

        // one sent, one received
        let previews = assemble_previews(
            vec![message(10, alice, me), message(11, me, bob)],
            me,
            &users,
        );

        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].partner.as_ref().unwrap().user_name, "alice");
        assert_eq!(previews[1].partner.as_ref().unwrap().user_name, "bob");
    }

    #[test]
    fn unknown_partners_degrade_to_none() {
        let me = uuid(1);
        let previews = assemble_previews(vec![message(10, uuid(2), me)], me, &HashMap::new());
        assert_eq!(previews.len(), 1);
        assert!(previews[0].partner.is_none());
    }
}
