use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display order for the hall of fame. Languages missing from this list
/// are not shown.
pub const LANGUAGE_POPULARITY_ORDER: [&str; 10] = [
    "python",
    "javascript",
    "cpp",
    "java",
    "flutter",
    "go",
    "rust",
    "kotlin",
    "zig",
    "haskell",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LeaderboardEntry {
    pub github_username: String,
    /// Sent as a string by the backend
    pub pull_request_merged: String,
}

impl LeaderboardEntry {
    pub fn merged_count(&self) -> Option<u32> {
        self.pull_request_merged.trim().parse().ok()
    }

    pub fn profile_url(&self) -> String {
        format!("https://github.com/{}", self.github_username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Podium {
    pub first_place: LeaderboardEntry,
    pub second_place: LeaderboardEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct HallOfFame {
    #[serde(default)]
    pub leaderboards: BTreeMap<String, Podium>,
}

impl HallOfFame {
    /// Languages with a podium, in display order
    pub fn ordered_languages(&self) -> Vec<&'static str> {
        LANGUAGE_POPULARITY_ORDER
            .iter()
            .copied()
            .filter(|lang| self.leaderboards.contains_key(*lang))
            .collect()
    }

    /// Podiums in display order
    pub fn podiums(&self) -> impl Iterator<Item = (&'static str, &Podium)> + '_ {
        self.ordered_languages()
            .into_iter()
            .filter_map(move |lang| self.leaderboards.get(lang).map(|p| (lang, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.leaderboards.is_empty()
    }
}
