pub mod attachments;
pub mod documents;
pub mod users;
