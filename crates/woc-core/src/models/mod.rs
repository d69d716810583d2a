//! Data models for Winter of Code entities.
//!
//! - `HallOfFame`, `Podium`, `LeaderboardEntry`: per-language top contributors
//! - `TeamRoster`, `TeamMember`: organising team listing
//! - `LoginRequest`, `LoginResponse`, `GithubRedirect`: account endpoints

pub mod account;
pub mod hof;
pub mod team;

pub use account::{GithubRedirect, LoginRequest, LoginResponse};
pub use hof::{HallOfFame, LeaderboardEntry, Podium, LANGUAGE_POPULARITY_ORDER};
pub use team::{TeamMember, TeamRoster};
