//! Workspace state: notes, open buffers, the active note and the decoded master config.
//!
//! All changes go through [`Workspace::apply`], which performs no I/O. The
//! controller turns remote results into [`WorkspaceEvent`]s; results of
//! fetches carry a [`Ticket`] and are dropped when a newer fetch of the same
//! resource has been issued since.

use crate::master_config::MASTER_NOTE_NAME;
use chrono::{DateTime, Utc};
use drive_notes_types::{MasterConfig, Note, OpenNote, WorkspaceSnapshot};
use std::collections::HashMap;

/// A remote resource whose fetch results feed the workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    NoteList,
    NoteContent(String),
}

/// Correlates a fetch result with the request that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    resource: Resource,
    seq: u64,
}

#[derive(Debug, Default, Clone)]
struct RequestTracker {
    next: u64,
    latest: HashMap<Resource, u64>,
}

impl RequestTracker {
    fn issue(&mut self, resource: Resource) -> Ticket {
        self.next += 1;
        self.latest.insert(resource.clone(), self.next);
        Ticket {
            resource,
            seq: self.next,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.get(&ticket.resource) == Some(&ticket.seq)
    }
}

#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    /// Fresh remote listing. The master note is split off, not listed.
    NotesLoaded { ticket: Ticket, notes: Vec<Note> },
    /// Decoded master file content
    MasterConfigLoaded {
        ticket: Ticket,
        master_id: String,
        config: MasterConfig,
    },
    MasterNoteCreated { master_id: String },
    /// Content fetched for a note that was not open yet
    NoteOpened { ticket: Ticket, id: String, content: String },
    NoteActivated { id: String },
    BufferEdited {
        id: String,
        content: Option<String>,
        name: Option<String>,
    },
    NoteClosed { id: String },
    NoteCreated { note: Note },
    NoteRenamed { id: String, name: String },
    /// The buffer is clean again only if it still holds the saved content
    NoteSaved {
        id: String,
        name: String,
        content: String,
        modified_time: DateTime<Utc>,
    },
    NoteDeleted { id: String },
    ConfigChanged(MasterConfig),
}

#[derive(Debug, Default, Clone)]
pub struct Workspace {
    notes: Vec<Note>,
    open_notes: Vec<OpenNote>,
    active_note_id: Option<String>,
    config: MasterConfig,
    master_note_id: Option<String>,
    requests: RequestTracker,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn open_notes(&self) -> &[OpenNote] {
        &self.open_notes
    }

    pub fn open_note(&self, id: &str) -> Option<&OpenNote> {
        self.open_notes.iter().find(|n| n.id == id)
    }

    pub fn active_note_id(&self) -> Option<&str> {
        self.active_note_id.as_deref()
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    pub fn master_note_id(&self) -> Option<&str> {
        self.master_note_id.as_deref()
    }

    /// Issue a ticket for a fetch about to start. Supersedes earlier tickets
    /// for the same resource.
    pub fn begin(&mut self, resource: Resource) -> Ticket {
        self.requests.issue(resource)
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            notes: self.notes.clone(),
            open_notes: self.open_notes.clone(),
            active_note_id: self.active_note_id.clone(),
            config: self.config.clone(),
        }
    }

    /// Apply one event. Returns `false` when the event was a stale fetch
    /// result and was discarded.
    pub fn apply(&mut self, event: WorkspaceEvent) -> bool {
        match event {
            WorkspaceEvent::NotesLoaded { ticket, notes } => {
                if !self.requests.is_current(&ticket) {
                    return false;
                }
                let (master, regular): (Vec<Note>, Vec<Note>) =
                    notes.into_iter().partition(|n| n.name == MASTER_NOTE_NAME);
                self.master_note_id = master.into_iter().next().map(|m| m.id);
                self.notes = regular;
            }
            WorkspaceEvent::MasterConfigLoaded {
                ticket,
                master_id,
                config,
            } => {
                if !self.requests.is_current(&ticket) {
                    return false;
                }
                self.master_note_id = Some(master_id);
                self.config = config;
            }
            WorkspaceEvent::MasterNoteCreated { master_id } => {
                self.master_note_id = Some(master_id);
            }
            WorkspaceEvent::NoteOpened { ticket, id, content } => {
                if !self.requests.is_current(&ticket) {
                    return false;
                }
                if self.open_note(&id).is_none() {
                    let name = self
                        .note(&id)
                        .map(|n| n.name.clone())
                        .unwrap_or_else(|| "Untitled".to_string());
                    self.open_notes.push(OpenNote {
                        id: id.clone(),
                        name,
                        content,
                        is_dirty: false,
                    });
                }
                self.active_note_id = Some(id);
            }
            WorkspaceEvent::NoteActivated { id } => {
                if self.open_note(&id).is_some() {
                    self.active_note_id = Some(id);
                }
            }
            WorkspaceEvent::BufferEdited { id, content, name } => {
                if let Some(buffer) = self.open_notes.iter_mut().find(|n| n.id == id) {
                    if let Some(content) = content {
                        buffer.content = content;
                        buffer.is_dirty = true;
                    }
                    if let Some(name) = name {
                        if name != buffer.name {
                            buffer.name = name;
                            buffer.is_dirty = true;
                        }
                    }
                }
            }
            WorkspaceEvent::NoteClosed { id } => {
                self.open_notes.retain(|n| n.id != id);
                if self.active_note_id.as_deref() == Some(id.as_str()) {
                    self.active_note_id = self.open_notes.last().map(|n| n.id.clone());
                }
            }
            WorkspaceEvent::NoteCreated { note } => {
                self.open_notes.push(OpenNote {
                    id: note.id.clone(),
                    name: note.name.clone(),
                    content: String::new(),
                    is_dirty: false,
                });
                self.active_note_id = Some(note.id.clone());
                self.notes.insert(0, note);
            }
            WorkspaceEvent::NoteRenamed { id, name } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
                    note.name = name.clone();
                }
                if let Some(buffer) = self.open_notes.iter_mut().find(|n| n.id == id) {
                    buffer.name = name;
                }
            }
            WorkspaceEvent::NoteSaved {
                id,
                name,
                content,
                modified_time,
            } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
                    note.name = name.clone();
                    note.modified_time = modified_time;
                }
                if let Some(buffer) = self.open_notes.iter_mut().find(|n| n.id == id) {
                    buffer.name = name;
                    if buffer.content == content {
                        buffer.is_dirty = false;
                    }
                }
            }
            WorkspaceEvent::NoteDeleted { id } => {
                self.notes.retain(|n| n.id != id);
                self.open_notes.retain(|n| n.id != id);
                if self.active_note_id.as_deref() == Some(id.as_str()) {
                    self.active_note_id = None;
                }
            }
            WorkspaceEvent::ConfigChanged(config) => {
                // Master reads still in flight predate this edit
                if let Some(master_id) = &self.master_note_id {
                    self.requests.issue(Resource::NoteContent(master_id.clone()));
                }
                self.config = config;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, name: &str) -> Note {
        Note {
            id: id.to_string(),
            name: name.to_string(),
            modified_time: Utc::now(),
        }
    }

    fn loaded(notes: Vec<Note>) -> Workspace {
        let mut ws = Workspace::new();
        let ticket = ws.begin(Resource::NoteList);
        assert!(ws.apply(WorkspaceEvent::NotesLoaded { ticket, notes }));
        ws
    }

    fn open(ws: &mut Workspace, id: &str, content: &str) {
        let ticket = ws.begin(Resource::NoteContent(id.to_string()));
        assert!(ws.apply(WorkspaceEvent::NoteOpened {
            ticket,
            id: id.to_string(),
            content: content.to_string(),
        }));
    }

    #[test]
    fn test_notes_loaded_splits_master() {
        let ws = loaded(vec![note("1", "a.txt"), note("m", MASTER_NOTE_NAME)]);
        assert_eq!(ws.notes().len(), 1);
        assert_eq!(ws.master_note_id(), Some("m"));
    }

    #[test]
    fn test_stale_note_list_is_discarded() {
        let mut ws = Workspace::new();
        let first = ws.begin(Resource::NoteList);
        let second = ws.begin(Resource::NoteList);

        assert!(ws.apply(WorkspaceEvent::NotesLoaded {
            ticket: second,
            notes: vec![note("2", "new.txt")],
        }));
        assert!(!ws.apply(WorkspaceEvent::NotesLoaded {
            ticket: first,
            notes: vec![note("1", "old.txt")],
        }));
        assert_eq!(ws.notes()[0].name, "new.txt");
    }

    #[test]
    fn test_tickets_are_per_resource() {
        let mut ws = loaded(vec![note("1", "a.txt"), note("2", "b.txt")]);
        let content_a = ws.begin(Resource::NoteContent("1".into()));
        // A fetch of a different note does not supersede note 1
        let _content_b = ws.begin(Resource::NoteContent("2".into()));
        assert!(ws.apply(WorkspaceEvent::NoteOpened {
            ticket: content_a,
            id: "1".into(),
            content: "A".into(),
        }));
    }

    #[test]
    fn test_open_uses_listed_name_and_activates() {
        let mut ws = loaded(vec![note("1", "a.txt")]);
        open(&mut ws, "1", "hello");
        let buffer = ws.open_note("1").unwrap();
        assert_eq!(buffer.name, "a.txt");
        assert_eq!(buffer.content, "hello");
        assert!(!buffer.is_dirty);
        assert_eq!(ws.active_note_id(), Some("1"));
    }

    #[test]
    fn test_reopen_keeps_dirty_buffer() {
        let mut ws = loaded(vec![note("1", "a.txt")]);
        open(&mut ws, "1", "hello");
        ws.apply(WorkspaceEvent::BufferEdited {
            id: "1".into(),
            content: Some("edited".into()),
            name: None,
        });
        open(&mut ws, "1", "remote");
        assert_eq!(ws.open_notes().len(), 1);
        assert_eq!(ws.open_note("1").unwrap().content, "edited");
    }

    #[test]
    fn test_edit_marks_dirty_and_save_clears() {
        let mut ws = loaded(vec![note("1", "a.txt")]);
        open(&mut ws, "1", "");
        ws.apply(WorkspaceEvent::BufferEdited {
            id: "1".into(),
            content: None,
            name: Some("a.txt".into()),
        });
        assert!(!ws.open_note("1").unwrap().is_dirty);

        ws.apply(WorkspaceEvent::BufferEdited {
            id: "1".into(),
            content: Some("text".into()),
            name: Some("b.txt".into()),
        });
        assert!(ws.open_note("1").unwrap().is_dirty);

        let saved_at = Utc::now();
        ws.apply(WorkspaceEvent::NoteSaved {
            id: "1".into(),
            name: "b.txt".into(),
            content: "text".into(),
            modified_time: saved_at,
        });
        let buffer = ws.open_note("1").unwrap();
        assert!(!buffer.is_dirty);
        assert_eq!(ws.note("1").unwrap().name, "b.txt");
        assert_eq!(ws.note("1").unwrap().modified_time, saved_at);
    }

    #[test]
    fn test_save_keeps_dirty_when_edited_meanwhile() {
        let mut ws = loaded(vec![note("1", "a.txt")]);
        open(&mut ws, "1", "");
        ws.apply(WorkspaceEvent::BufferEdited {
            id: "1".into(),
            content: Some("newer".into()),
            name: None,
        });
        ws.apply(WorkspaceEvent::NoteSaved {
            id: "1".into(),
            name: "a.txt".into(),
            content: "older".into(),
            modified_time: Utc::now(),
        });
        assert!(ws.open_note("1").unwrap().is_dirty);
    }

    #[test]
    fn test_master_id_follows_listing() {
        let mut ws = loaded(vec![note("m", MASTER_NOTE_NAME)]);
        assert_eq!(ws.master_note_id(), Some("m"));
        let ticket = ws.begin(Resource::NoteList);
        ws.apply(WorkspaceEvent::NotesLoaded { ticket, notes: vec![] });
        assert_eq!(ws.master_note_id(), None);
    }

    #[test]
    fn test_local_config_change_supersedes_master_read() {
        let mut ws = loaded(vec![note("m", MASTER_NOTE_NAME), note("1", "a.txt")]);
        let read = ws.begin(Resource::NoteContent("m".into()));

        let mut edited = MasterConfig::default();
        edited.pinned.push("a.txt".into());
        ws.apply(WorkspaceEvent::ConfigChanged(edited.clone()));

        assert!(!ws.apply(WorkspaceEvent::MasterConfigLoaded {
            ticket: read,
            master_id: "m".into(),
            config: MasterConfig::default(),
        }));
        assert_eq!(ws.config(), &edited);

        let fresh = ws.begin(Resource::NoteContent("m".into()));
        assert!(ws.apply(WorkspaceEvent::MasterConfigLoaded {
            ticket: fresh,
            master_id: "m".into(),
            config: MasterConfig::default(),
        }));
        assert!(ws.config().pinned.is_empty());
    }

    #[test]
    fn test_closing_active_activates_last_remaining() {
        let mut ws = loaded(vec![note("1", "a"), note("2", "b"), note("3", "c")]);
        open(&mut ws, "1", "");
        open(&mut ws, "2", "");
        open(&mut ws, "3", "");
        ws.apply(WorkspaceEvent::NoteActivated { id: "1".into() });

        ws.apply(WorkspaceEvent::NoteClosed { id: "1".into() });
        assert_eq!(ws.active_note_id(), Some("3"));

        ws.apply(WorkspaceEvent::NoteClosed { id: "2".into() });
        assert_eq!(ws.active_note_id(), Some("3"));

        ws.apply(WorkspaceEvent::NoteClosed { id: "3".into() });
        assert_eq!(ws.active_note_id(), None);
        assert!(ws.open_notes().is_empty());
    }

    #[test]
    fn test_activate_requires_open_buffer() {
        let mut ws = loaded(vec![note("1", "a")]);
        ws.apply(WorkspaceEvent::NoteActivated { id: "1".into() });
        assert_eq!(ws.active_note_id(), None);
    }

    #[test]
    fn test_created_note_is_listed_first_and_opened() {
        let mut ws = loaded(vec![note("1", "a")]);
        ws.apply(WorkspaceEvent::NoteCreated { note: note("2", "b") });
        assert_eq!(ws.notes()[0].id, "2");
        assert_eq!(ws.active_note_id(), Some("2"));
        assert_eq!(ws.open_note("2").unwrap().content, "");
    }

    #[test]
    fn test_rename_updates_list_and_buffer() {
        let mut ws = loaded(vec![note("1", "a")]);
        open(&mut ws, "1", "");
        ws.apply(WorkspaceEvent::NoteRenamed {
            id: "1".into(),
            name: "z".into(),
        });
        assert_eq!(ws.note("1").unwrap().name, "z");
        assert_eq!(ws.open_note("1").unwrap().name, "z");
    }

    #[test]
    fn test_delete_clears_active() {
        let mut ws = loaded(vec![note("1", "a"), note("2", "b")]);
        open(&mut ws, "1", "");
        ws.apply(WorkspaceEvent::NoteDeleted { id: "1".into() });
        assert!(ws.note("1").is_none());
        assert!(ws.open_note("1").is_none());
        assert_eq!(ws.active_note_id(), None);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut ws = loaded(vec![note("1", "a")]);
        let mut config = MasterConfig::default();
        config.pinned.push("a".into());
        ws.apply(WorkspaceEvent::ConfigChanged(config.clone()));
        open(&mut ws, "1", "body");

        let snap = ws.snapshot();
        assert_eq!(snap.notes.len(), 1);
        assert_eq!(snap.open_notes.len(), 1);
        assert_eq!(snap.active_note_id.as_deref(), Some("1"));
        assert_eq!(snap.config, config);
    }
}
