pub mod admin;
pub mod kits;
pub mod players;
