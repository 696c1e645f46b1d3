use std::time::Duration;

pub mod events;
pub mod groups;
pub mod users;

pub use events::{Event, EventCalendarApi, EventPayload, HttpEventCalendar};
pub use groups::{
    GroupMembershipApi, GroupMembershipRecord, GroupRole, HttpGroupMembership, MembershipStatus,
};
pub use users::{AccessPolicy, HttpUserDirectory, UserDirectory, UserSummary};

/// One shared client for all collaborators. Every call carries a
/// bounded timeout so a hung collaborator cannot stall a saga forever.
pub fn build_http_client(request_timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(request_timeout_secs))
        .build()
        .unwrap_or_default()
}
