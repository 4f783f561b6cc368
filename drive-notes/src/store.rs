//! Note storage seam: the remote file store the service reads and writes.

use async_trait::async_trait;
use chrono::Utc;
use drive_notes_types::Note;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Remote file storage for notes. Every failure comes back as a message.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List note files, most recently modified first
    async fn list_notes(&self) -> Result<Vec<Note>, String>;

    /// Read the full content of a note
    async fn read_content(&self, id: &str) -> Result<String, String>;

    /// Create a note with initial content
    async fn create_note(&self, name: &str, content: &str) -> Result<Note, String>;

    /// Replace the content of a note
    async fn update_content(&self, id: &str, content: &str) -> Result<(), String>;

    /// Change the name of a note
    async fn rename_note(&self, id: &str, name: &str) -> Result<(), String>;

    async fn delete_note(&self, id: &str) -> Result<(), String>;
}

struct StoredNote {
    note: Note,
    content: String,
}

/// In-process store, used with `DRIVE_NOTES_STORAGE=memory` and in tests.
#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<HashMap<String, StoredNote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_note<T>(&self, id: &str, f: impl FnOnce(&mut StoredNote) -> T) -> Result<T, String> {
        let mut notes = self.notes.lock();
        notes
            .get_mut(id)
            .map(f)
            .ok_or_else(|| format!("File not found: {}", id))
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list_notes(&self) -> Result<Vec<Note>, String> {
        let notes = self.notes.lock();
        let mut list: Vec<Note> = notes.values().map(|s| s.note.clone()).collect();
        list.sort_by(|a, b| b.modified_time.cmp(&a.modified_time).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn read_content(&self, id: &str) -> Result<String, String> {
        self.with_note(id, |stored| stored.content.clone())
    }

    async fn create_note(&self, name: &str, content: &str) -> Result<Note, String> {
        let note = Note {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            modified_time: Utc::now(),
        };
        self.notes.lock().insert(
            note.id.clone(),
            StoredNote {
                note: note.clone(),
                content: content.to_string(),
            },
        );
        Ok(note)
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<(), String> {
        self.with_note(id, |stored| {
            stored.content = content.to_string();
            stored.note.modified_time = Utc::now();
        })
    }

    async fn rename_note(&self, id: &str, name: &str) -> Result<(), String> {
        self.with_note(id, |stored| {
            stored.note.name = name.to_string();
            stored.note.modified_time = Utc::now();
        })
    }

    async fn delete_note(&self, id: &str) -> Result<(), String> {
        self.notes
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| format!("File not found: {}", id))
    }
}
