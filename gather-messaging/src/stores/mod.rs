use gather_shared::clients::db::{DbConn, DbConnections};
use gather_shared::errors::{AppError, AppResult};

pub mod categories;
pub mod direct_messages;
pub mod forum_categories;
pub mod forum_messages;
pub mod forums;

pub use categories::CategoriesStore;
pub use direct_messages::DirectMessagesStore;
pub use forum_categories::ForumCategoriesStore;
pub use forum_messages::ForumMessagesStore;
pub use forums::ForumsStore;

/// Result of an ownership-checked mutation. A mismatched author is
/// reported as `Forbidden` rather than an empty update, so callers can
/// distinguish "not yours" from "does not exist".
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Applied(T),
    NotFound,
    Forbidden,
}

impl<T> MutationOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            _ => None,
        }
    }
}

pub(crate) fn read_conn(db: &DbConnections) -> AppResult<DbConn> {
    db.read.get().map_err(|e| AppError::Internal(e.into()))
}

pub(crate) fn write_conn(db: &DbConnections) -> AppResult<DbConn> {
    db.write.get().map_err(|e| AppError::Internal(e.into()))
}
