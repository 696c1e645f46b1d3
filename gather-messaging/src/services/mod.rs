pub mod categories;
pub mod direct_messages;
pub mod forum_messages;
pub mod forums;

pub use categories::CategoriesService;
pub use direct_messages::{ConversationPreview, DirectMessagesService};
pub use forum_messages::ForumMessagesService;
pub use forums::{ForumDetails, ForumSearchResult, ForumsService};
