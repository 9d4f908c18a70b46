pub mod admin;
pub mod chat;
