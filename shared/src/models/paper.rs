//! Paper models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An uploaded paper and the metadata of its stored file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub authors: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub uploader_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields of a paper upload form. Every field is optional here; the
/// create path checks that a title is present.
#[derive(Debug, Clone, Default, Validate)]
pub struct PaperFields {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 1024))]
    pub authors: Option<String>,
    #[validate(length(max = 16384))]
    pub abstract_text: Option<String>,
}

/// File part of a paper upload form
#[derive(Debug, Clone)]
pub struct PaperUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Query filters for listing papers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaperFilter {
    /// Only papers uploaded by this user
    pub user: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abstract_wire_name() {
        let paper = Paper {
            id: 7,
            title: "On Things".to_string(),
            authors: Some("A. Author".to_string()),
            abstract_text: Some("We study things.".to_string()),
            uploader_id: 1,
            file_name: "things.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 3,
            file_digest: "0".repeat(64),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["abstract"], "We study things.");
        assert!(json.get("abstract_text").is_none());
    }

    #[test]
    fn test_paper_fields_validation() {
        assert!(PaperFields::default().validate().is_ok());
        let fields = PaperFields {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(fields.validate().is_err());
    }
}
