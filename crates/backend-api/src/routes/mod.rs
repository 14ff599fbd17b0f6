pub mod admin;
pub mod answers;
pub mod articles;
pub mod auth;
pub mod catalog;
pub mod chats;
pub mod health;
pub mod notifications;
pub mod questions;
pub mod stats;
pub mod users;
pub mod words;
