//! Shared types for the drive-notes service and its HTTP clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =====================================================
// Domain Types
// =====================================================

/// A note file as listed by the remote store.
///
/// Serialized in the remote's camelCase shape so `GET /api/notes` can hand
/// out the listing unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: DateTime<Utc>,
}

/// A note held in a local edit buffer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenNote {
    pub id: String,
    pub name: String,
    pub content: String,
    pub is_dirty: bool,
}

/// Pin/archive/category membership, keyed by note name.
///
/// The name lists keep insertion order; edits never insert a name twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterConfig {
    #[serde(default)]
    pub pinned: Vec<String>,
    #[serde(default)]
    pub archived: Vec<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl MasterConfig {
    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.iter().any(|n| n == name)
    }

    pub fn is_archived(&self, name: &str) -> bool {
        self.archived.iter().any(|n| n == name)
    }

    /// Categories the note belongs to, in category order
    pub fn categories_of(&self, name: &str) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, members)| members.iter().any(|n| n == name))
            .map(|(category, _)| category.as_str())
            .collect()
    }
}

// =====================================================
// Raw note routes
// =====================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// `{"success": true}` marker returned by the raw mutation routes
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// `{"error": "..."}` body returned by the raw routes on failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =====================================================
// Workspace Request Types
// =====================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteExtension {
    #[default]
    Txt,
    Md,
}

impl NoteExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteExtension::Txt => "txt",
            NoteExtension::Md => "md",
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NewNoteRequest {
    #[serde(default)]
    pub extension: NoteExtension,
}

/// Edit an open buffer. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BufferEditRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Move a note into a category, or out of every category when `None`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MoveCategoryRequest {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "name")]
    Name,
    #[default]
    #[serde(rename = "modifiedTime")]
    ModifiedTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string of `GET /api/workspace/view`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ViewParams {
    /// `pinned`, `archived`, a category name, or absent for all notes
    #[serde(default)]
    pub selection: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<SortBy>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

// =====================================================
// Workspace Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Result of a pin/archive toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResult {
    pub name: String,
    /// Membership after the toggle
    pub active: bool,
}

/// Everything the workspace currently holds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub notes: Vec<Note>,
    pub open_notes: Vec<OpenNote>,
    pub active_note_id: Option<String>,
    pub config: MasterConfig,
}
