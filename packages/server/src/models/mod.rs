pub mod auth;
pub mod duel;
pub mod question;
pub mod shared;
pub mod submission;
