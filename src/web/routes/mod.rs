pub mod auth;
pub mod events;
pub mod participants;
pub mod profile;
