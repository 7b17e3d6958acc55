//! Shared building blocks for the kitforge workspace.
//!
//! Pure types and functions with no I/O: the kit data model, player
//! identifiers, the claim rate limiter and the post-wipe cooldown schedule.

pub mod duration;
pub mod error;
pub mod kit;
pub mod rate_limit;
pub mod types;
pub mod wipe;
