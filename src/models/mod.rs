use serde::{Deserialize, Serialize};

/// Authenticated account, as returned by the auth endpoints and cached in
/// localStorage for the session lifetime.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct User {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

/// A note record. `id` and the timestamps are absent before the backend has
/// assigned them (create request bodies reuse this type).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Note {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Note {
    pub fn draft(title: &str, content: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            content: content.to_string(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// A directed edge between two existing notes. Never updated in place; the
/// backend is the sole authority on uniqueness (duplicates come back as 409).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NoteLink {
    pub id: i64,
    pub source_note_id: i64,
    pub target_note_id: i64,
    pub created_at: String,
}

/// File classification. Assigned authoritatively by the backend from the MIME
/// type; the client-side sniff in `util` is advisory only.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "title_case")]
pub(crate) enum FileCategory {
    Document,
    Image,
    Video,
    Audio,
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileRecord {
    pub id: i64,
    pub file_name: String,
    pub original_file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub file_url: String,
    pub category: FileCategory,
    pub upload_date: String,
}

/// Profile record with aggregate counts, as served by `GET /profile`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub member_since: String,
    pub total_notes: u64,
    pub total_files: u64,
    pub total_board_links: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_contract_deserialize_camel_case() {
        let json = r#"{
            "id": 7,
            "title": "Groceries",
            "content": "milk",
            "createdAt": "2025-01-01T10:00:00",
            "updatedAt": "2025-01-02T10:00:00"
        }"#;
        let n: Note = serde_json::from_str(json).expect("note should parse");
        assert_eq!(n.id, Some(7));
        assert_eq!(n.created_at.as_deref(), Some("2025-01-01T10:00:00"));
    }

    #[test]
    fn note_draft_omits_server_assigned_fields() {
        let v = serde_json::to_value(Note::draft("t", "c")).expect("should serialize");
        assert!(v.get("id").is_none());
        assert!(v.get("createdAt").is_none());
        assert_eq!(v["title"], "t");
    }

    #[test]
    fn note_link_contract_deserialize() {
        let json = r#"{"id":3,"sourceNoteId":1,"targetNoteId":2,"createdAt":"2025-01-01T00:00:00"}"#;
        let l: NoteLink = serde_json::from_str(json).expect("link should parse");
        assert_eq!((l.source_note_id, l.target_note_id), (1, 2));
    }

    #[test]
    fn file_record_category_uppercase_wire_format() {
        let json = r#"{
            "id": 1,
            "fileName": "a-1.png",
            "originalFileName": "a.png",
            "fileType": "image/png",
            "fileSize": 2048,
            "fileUrl": "/api/files/download/1",
            "category": "IMAGE",
            "uploadDate": "2025-01-01T00:00:00"
        }"#;
        let f: FileRecord = serde_json::from_str(json).expect("file record should parse");
        assert_eq!(f.category, FileCategory::Image);
        assert_eq!(f.category.to_string(), "Image");
    }

    #[test]
    fn profile_optional_fields_default_to_none() {
        let json = r#"{
            "id": 1,
            "userId": 1,
            "username": "u",
            "email": "u@example.com",
            "fullName": "U Ser",
            "memberSince": "2024-06-01T00:00:00",
            "totalNotes": 4,
            "totalFiles": 0,
            "totalBoardLinks": 2
        }"#;
        let p: Profile = serde_json::from_str(json).expect("profile should parse");
        assert!(p.bio.is_none());
        assert_eq!(p.total_board_links, 2);
    }
}
