//! Human-readable id generation.
//!
//! Issue ids encode the kind, the title's first letter, a wall-clock
//! segment, and a random salt (`TASK-F-40233-07`); project ids encode the
//! name's initials (`PRJ-TT-482`). Ids are only *probably* unique; the
//! store's duplicate-id rejection is the actual guarantee, and creation
//! can be retried.

use chrono::Utc;
use rand::Rng;

use crate::model::issue::Kind;

/// Generate an issue id from its kind and title.
#[must_use]
pub fn issue_id(kind: Kind, title: &str) -> String {
    let prefix: String = kind
        .as_str()
        .chars()
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();
    let initial = title
        .chars()
        .find(char::is_ascii_alphabetic)
        .map_or('X', |c| c.to_ascii_uppercase());
    let time_segment = Utc::now().timestamp_millis().rem_euclid(100_000);
    let salt = rand::thread_rng().gen_range(0..100u32);
    format!("{prefix}-{initial}-{time_segment:05}-{salt:02}")
}

/// Generate a project id from the project name's initials.
#[must_use]
pub fn project_id(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_ascii_alphanumeric()))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let initials = if initials.is_empty() {
        "X".to_owned()
    } else {
        initials
    };
    let salt = rand::thread_rng().gen_range(0..1000u32);
    format!("PRJ-{initials}-{salt}")
}

#[cfg(test)]
mod tests {
    use super::{issue_id, project_id};
    use crate::model::issue::Kind;

    #[test]
    fn issue_id_encodes_kind_and_title() {
        let id = issue_id(Kind::Task, "fix retry loop");
        assert!(id.starts_with("TASK-F-"), "unexpected id: {id}");
        assert_eq!(id.split('-').count(), 4);
    }

    #[test]
    fn subtask_prefix_is_truncated() {
        let id = issue_id(Kind::Subtask, "polish");
        assert!(id.starts_with("SUBT-P-"), "unexpected id: {id}");
    }

    #[test]
    fn non_alphabetic_titles_fall_back() {
        let id = issue_id(Kind::Bug, "#123");
        assert!(id.starts_with("BUG-X-"), "unexpected id: {id}");
    }

    #[test]
    fn project_id_collects_initials() {
        let id = project_id("Tempo Tracker & Friends");
        assert!(id.starts_with("PRJ-TTF-"), "unexpected id: {id}");
    }

    #[test]
    fn empty_project_name_falls_back() {
        let id = project_id("&& --");
        assert!(id.starts_with("PRJ-X-"), "unexpected id: {id}");
    }
}
