pub mod duel;
pub mod duel_participant;
pub mod question;
pub mod submission;
pub mod user;
