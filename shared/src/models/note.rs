//! Note models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserSummary;
use crate::validation::double_option;

/// A note written by a user, optionally attached to a paper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<UserSummary>,
    pub paper_id: Option<i64>,
    pub collector_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a note
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNoteInput {
    #[validate(length(min = 1, max = 128))]
    pub title: String,
    #[validate(length(max = 65536))]
    pub content: String,
    pub paper_id: Option<i64>,
}

/// Input for a partial note update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNoteInput {
    #[validate(length(min = 1, max = 128))]
    pub title: Option<String>,
    #[validate(length(max = 65536))]
    pub content: Option<String>,
    /// Absent keeps the current paper, `null` detaches the note
    #[serde(default, deserialize_with = "double_option")]
    pub paper_id: Option<Option<i64>>,
}

/// Query filters for listing notes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteFilter {
    /// Only notes written by this user
    pub user: Option<i64>,
    /// Only notes collected by this user
    pub collected_by: Option<i64>,
    /// Only notes attached to this paper
    pub paper: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Result of toggling a note's collection status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectStatus {
    pub status: String,
    pub collected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_title_bounds() {
        let ok = CreateNoteInput {
            title: "Reading notes".to_string(),
            content: String::new(),
            paper_id: None,
        };
        assert!(ok.validate().is_ok());

        let empty = CreateNoteInput {
            title: String::new(),
            ..ok.clone()
        };
        assert!(empty.validate().is_err());

        let long = CreateNoteInput {
            title: "x".repeat(129),
            ..ok
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_update_paper_id_absent_null_or_set() {
        let absent: UpdateNoteInput =
            serde_json::from_value(serde_json::json!({"title": "t"})).unwrap();
        assert_eq!(absent.paper_id, None);

        let detach: UpdateNoteInput =
            serde_json::from_value(serde_json::json!({"paper_id": null})).unwrap();
        assert_eq!(detach.paper_id, Some(None));

        let attach: UpdateNoteInput =
            serde_json::from_value(serde_json::json!({"paper_id": 7})).unwrap();
        assert_eq!(attach.paper_id, Some(Some(7)));
    }

    #[test]
    fn test_filter_from_query_string_shape() {
        let filter: NoteFilter =
            serde_json::from_value(serde_json::json!({"user": 3, "page": 2})).unwrap();
        assert_eq!(filter.user, Some(3));
        assert_eq!(filter.collected_by, None);
        assert_eq!(filter.page, Some(2));
    }
}
