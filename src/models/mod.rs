pub mod reminder;
pub mod user;

pub use reminder::Reminder;
pub use user::{UserRecord, UserResponse};
