//! Row types shared by the repositories and the HTTP layer

pub mod article;
pub mod audit;
pub mod catalog;
pub mod chat;
pub mod notification;
pub mod question;
pub mod stats;
pub mod usage;
pub mod user;
pub mod word;
