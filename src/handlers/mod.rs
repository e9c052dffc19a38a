pub mod auth;
pub mod reminders;
