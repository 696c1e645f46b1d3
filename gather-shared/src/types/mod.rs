pub mod api;
pub mod pagination;
pub mod search;

pub use api::*;
pub use pagination::*;
pub use search::*;
