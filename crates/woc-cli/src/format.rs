//! Plain-text rendering for command output.

use chrono::{DateTime, Utc};
use woc_core::auth::SessionData;
use woc_core::models::{HallOfFame, TeamMember};

/// Width of the username column in tables
const NAME_WIDTH: usize = 24;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %d, %Y %H:%M UTC").to_string()
}

pub fn render_session(session: &SessionData) -> String {
    let github = if session.has_linked_github() {
        session.github_username.as_str()
    } else {
        "not linked (run `woc link`)"
    };
    format!(
        "Signed in as {}\n  Email:   {}\n  GitHub:  {}\n  Bounty:  {}\n  Since:   {}",
        session.display_name(),
        session.email,
        github,
        session.bounty,
        format_date(&session.created_at),
    )
}

pub fn render_hall_of_fame(hof: &HallOfFame) -> String {
    let mut lines = vec!["Hall of Fame".to_string()];
    if hof.ordered_languages().is_empty() {
        lines.push("  No leaderboard data yet.".to_string());
        return lines.join("\n");
    }

    for (language, podium) in hof.podiums() {
        lines.push(String::new());
        lines.push(format!("  {}", language));
        for (place, entry) in [("1st", &podium.first_place), ("2nd", &podium.second_place)] {
            lines.push(format!(
                "    {} {:<width$} {} merged",
                place,
                truncate_string(&entry.github_username, NAME_WIDTH),
                entry.pull_request_merged,
                width = NAME_WIDTH,
            ));
        }
    }
    lines.join("\n")
}

pub fn render_team(members: &[&TeamMember], tags: &[String]) -> String {
    let mut lines = Vec::new();
    for member in members {
        let designation = if member.designation.is_empty() {
            String::new()
        } else {
            format!(" - {}", member.designation)
        };
        lines.push(format!(
            "{:<width$} {}{}",
            truncate_string(&member.name, NAME_WIDTH),
            member.profile_url(),
            designation,
            width = NAME_WIDTH,
        ));
    }
    if lines.is_empty() {
        lines.push("No team members match.".to_string());
    }
    if !tags.is_empty() {
        lines.push(String::new());
        lines.push(format!("Tags: {}", tags.join(", ")));
    }
    lines.join("\n")
}
