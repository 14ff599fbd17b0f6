pub mod admin;
pub mod chat;
pub mod community;
pub mod error;
pub mod gamification;
pub mod matchmaking;
pub mod quota;
pub mod stats;
pub mod study;

#[cfg(test)]
pub mod test_utils;

pub use error::*;
