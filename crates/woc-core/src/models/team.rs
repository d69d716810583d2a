use serde::{Deserialize, Serialize};

use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeamMember {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub designation: String,
}

impl TeamMember {
    pub fn profile_url(&self) -> String {
        format!("https://github.com/{}", self.username)
    }

    pub fn has_any_tag(&self, selected: &[String]) -> bool {
        selected.is_empty() || self.tags.iter().any(|t| selected.contains(t))
    }
}

/// Contents of `team.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeamRoster {
    #[serde(default)]
    pub team: Vec<TeamMember>,
}

impl TeamRoster {
    /// Every tag used by any member, sorted and deduplicated
    pub fn unique_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .team
            .iter()
            .flat_map(|m| m.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Members carrying at least one of `selected`; an empty selection keeps everyone
    pub fn filter_by_tags(&self, selected: &[String]) -> Vec<&TeamMember> {
        self.team.iter().filter(|m| m.has_any_tag(selected)).collect()
    }

    /// A shuffled copy of the roster; `self` is left in order
    pub fn shuffled(&self) -> Vec<TeamMember> {
        let mut members = self.team.clone();
        members.shuffle(&mut rand::thread_rng());
        members
    }
}
