pub mod hash;
pub mod invite;
pub mod jwt;
