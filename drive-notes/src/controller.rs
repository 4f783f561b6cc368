//! Controller: drives the note store and feeds results into the workspace.
//!
//! Local state is updated optimistically: config edits land in the workspace
//! before the master file is written, and a failed write is reported but not
//! rolled back. The next refresh brings local state back in line with Drive.

use crate::master_config::{self, MASTER_NOTE_NAME};
use crate::store::NoteStore;
use crate::view::{self, ViewQuery};
use crate::workspace::{Resource, Workspace, WorkspaceEvent};
use chrono::{DateTime, Local, Utc};
use drive_notes_types::{
    MasterConfig, Note, NoteExtension, OpenNote, ToggleResult, WorkspaceSnapshot,
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// Rejected input
    #[error("{0}")]
    Invalid(String),
    /// No such note (or no such open buffer)
    #[error("{0}")]
    NotFound(String),
    /// The result arrived after a newer request for the same resource
    #[error("{0}")]
    Stale(String),
    /// The note store failed
    #[error("{0}")]
    Remote(String),
}

/// Log a store failure and wrap it with context
fn remote(context: &'static str) -> impl FnOnce(String) -> ControllerError {
    move |e| {
        log::error!("[WORKSPACE] {}: {}", context, e);
        ControllerError::Remote(format!("{}: {}", context, e))
    }
}

fn not_found(id: &str) -> ControllerError {
    ControllerError::NotFound(format!("Note not found: {}", id))
}

pub struct Controller {
    store: Arc<dyn NoteStore>,
    state: Mutex<Workspace>,
}

impl Controller {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            state: Mutex::new(Workspace::new()),
        }
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.state.lock().snapshot()
    }

    pub fn config(&self) -> MasterConfig {
        self.state.lock().config().clone()
    }

    /// Filtered and sorted notes for display
    pub fn view(&self, query: &ViewQuery) -> Vec<Note> {
        let state = self.state.lock();
        view::visible_notes(state.notes(), state.config(), query)
    }

    /// Re-fetch the note list and the master config, creating the master
    /// file when Drive has none.
    pub async fn refresh(&self) -> Result<(), ControllerError> {
        let ticket = self.state.lock().begin(Resource::NoteList);
        let notes = self
            .store
            .list_notes()
            .await
            .map_err(remote("Failed to fetch notes"))?;

        let master = {
            let mut state = self.state.lock();
            if !state.apply(WorkspaceEvent::NotesLoaded { ticket, notes }) {
                log::warn!("[WORKSPACE] Discarded stale note listing");
                return Ok(());
            }
            let master_id = state.master_note_id().map(str::to_string);
            master_id.map(|id| (state.begin(Resource::NoteContent(id.clone())), id))
        };

        match master {
            Some((ticket, master_id)) => {
                let content = self
                    .store
                    .read_content(&master_id)
                    .await
                    .map_err(remote("Failed to read master config"))?;
                let config = master_config::decode(&content);

                let mut state = self.state.lock();
                if !state.apply(WorkspaceEvent::MasterConfigLoaded {
                    ticket,
                    master_id,
                    config,
                }) {
                    log::warn!("[WORKSPACE] Discarded master config read superseded by a local edit");
                    return Ok(());
                }
                log::info!(
                    "[WORKSPACE] Loaded {} notes, {} categories",
                    state.notes().len(),
                    state.config().categories.len()
                );
            }
            None => self.create_master_note().await?,
        }
        Ok(())
    }

    async fn create_master_note(&self) -> Result<(), ControllerError> {
        let content = master_config::encode(self.state.lock().config());
        let master = self
            .store
            .create_note(MASTER_NOTE_NAME, &content)
            .await
            .map_err(remote("Could not create master note"))?;

        log::info!("[WORKSPACE] Created master config file {}", master.id);
        self.state
            .lock()
            .apply(WorkspaceEvent::MasterNoteCreated { master_id: master.id });
        Ok(())
    }

    /// Apply `edit` to a copy of the config, publish it locally, then write
    /// it to the master file.
    async fn update_config<T>(
        &self,
        edit: impl FnOnce(&mut MasterConfig) -> Result<T, ControllerError>,
    ) -> Result<T, ControllerError> {
        let (master_id, config, out) = {
            let mut state = self.state.lock();
            let master_id = state
                .master_note_id()
                .ok_or_else(|| {
                    ControllerError::Remote("Master config is not loaded; refresh first".to_string())
                })?
                .to_string();
            let mut config = state.config().clone();
            let out = edit(&mut config)?;
            state.apply(WorkspaceEvent::ConfigChanged(config.clone()));
            (master_id, config, out)
        };

        self.store
            .update_content(&master_id, &master_config::encode(&config))
            .await
            .map_err(remote("Failed to save master config"))?;
        Ok(out)
    }

    /// Point every config reference at the note's new name
    async fn propagate_rename(&self, old: &str, new: &str) -> Result<(), ControllerError> {
        let referenced = {
            let state = self.state.lock();
            let mut preview = state.config().clone();
            master_config::rename_note(&mut preview, old, new)
        };
        if !referenced {
            return Ok(());
        }

        self.update_config(|config| {
            master_config::rename_note(config, old, new);
            Ok(())
        })
        .await
    }

    fn note_name(&self, id: &str) -> Result<String, ControllerError> {
        self.state
            .lock()
            .note(id)
            .map(|n| n.name.clone())
            .ok_or_else(|| not_found(id))
    }

    fn reject_master(&self, id: &str) -> Result<(), ControllerError> {
        if self.state.lock().master_note_id() == Some(id) {
            return Err(ControllerError::Invalid(
                "The master config file is not a note".to_string(),
            ));
        }
        Ok(())
    }

    /// Open a note in an edit buffer, or re-activate its existing buffer.
    pub async fn open_note(&self, id: &str) -> Result<OpenNote, ControllerError> {
        self.reject_master(id)?;

        let ticket = {
            let mut state = self.state.lock();
            if let Some(buffer) = state.open_note(id).cloned() {
                state.apply(WorkspaceEvent::NoteActivated { id: id.to_string() });
                return Ok(buffer);
            }
            state.begin(Resource::NoteContent(id.to_string()))
        };

        let content = self
            .store
            .read_content(id)
            .await
            .map_err(remote("Failed to load note"))?;

        let mut state = self.state.lock();
        if !state.apply(WorkspaceEvent::NoteOpened {
            ticket,
            id: id.to_string(),
            content,
        }) {
            log::warn!("[WORKSPACE] Discarded stale content for {}", id);
            return Err(ControllerError::Stale(format!(
                "A newer load of note {} superseded this one",
                id
            )));
        }
        state.open_note(id).cloned().ok_or_else(|| not_found(id))
    }

    pub fn activate(&self, id: &str) -> Result<OpenNote, ControllerError> {
        let mut state = self.state.lock();
        let buffer = state.open_note(id).cloned().ok_or_else(|| not_found(id))?;
        state.apply(WorkspaceEvent::NoteActivated { id: id.to_string() });
        Ok(buffer)
    }

    pub fn edit_buffer(
        &self,
        id: &str,
        content: Option<String>,
        name: Option<String>,
    ) -> Result<OpenNote, ControllerError> {
        let mut state = self.state.lock();
        if state.open_note(id).is_none() {
            return Err(not_found(id));
        }
        state.apply(WorkspaceEvent::BufferEdited {
            id: id.to_string(),
            content,
            name,
        });
        state.open_note(id).cloned().ok_or_else(|| not_found(id))
    }

    /// Close a buffer. Returns the note that is active afterwards.
    pub fn close_note(&self, id: &str) -> Result<Option<String>, ControllerError> {
        let mut state = self.state.lock();
        if state.open_note(id).is_none() {
            return Err(not_found(id));
        }
        state.apply(WorkspaceEvent::NoteClosed { id: id.to_string() });
        Ok(state.active_note_id().map(str::to_string))
    }

    /// Write an open buffer back to Drive, renaming first when its title changed.
    pub async fn save_note(&self, id: &str) -> Result<OpenNote, ControllerError> {
        let (buffer, listed_name) = {
            let state = self.state.lock();
            let buffer = state.open_note(id).cloned().ok_or_else(|| not_found(id))?;
            (buffer, state.note(id).map(|n| n.name.clone()))
        };

        let name = buffer.name.trim().to_string();
        if let Some(old) = listed_name.filter(|old| *old != name) {
            check_note_name(&name)?;
            self.store
                .rename_note(id, &name)
                .await
                .map_err(remote("Failed to save"))?;
            self.state.lock().apply(WorkspaceEvent::NoteRenamed {
                id: id.to_string(),
                name: name.clone(),
            });
            self.propagate_rename(&old, &name).await?;
        }

        self.store
            .update_content(id, &buffer.content)
            .await
            .map_err(remote("Failed to save"))?;

        let saved = {
            let mut state = self.state.lock();
            state.apply(WorkspaceEvent::NoteSaved {
                id: id.to_string(),
                name,
                content: buffer.content,
                modified_time: Utc::now(),
            });
            state.open_note(id).cloned().ok_or_else(|| not_found(id))?
        };

        if let Err(e) = self.refresh().await {
            log::warn!("[WORKSPACE] Refresh after save failed: {}", e);
        }
        Ok(saved)
    }

    /// Create an empty note named after the current local time and open it.
    pub async fn create_note(&self, extension: NoteExtension) -> Result<Note, ControllerError> {
        let name = new_note_name(Local::now(), extension);
        let note = self
            .store
            .create_note(&name, "")
            .await
            .map_err(remote("Failed to create note"))?;

        self.state
            .lock()
            .apply(WorkspaceEvent::NoteCreated { note: note.clone() });
        Ok(note)
    }

    /// Rename a note and rewrite its config references. Returns the final name.
    pub async fn rename_note(&self, id: &str, raw_name: &str) -> Result<String, ControllerError> {
        let name = normalize_note_name(raw_name)?;
        let old = self.note_name(id)?;

        self.store
            .rename_note(id, &name)
            .await
            .map_err(remote("Failed to rename note"))?;
        self.state.lock().apply(WorkspaceEvent::NoteRenamed {
            id: id.to_string(),
            name: name.clone(),
        });

        self.propagate_rename(&old, &name).await?;
        Ok(name)
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), ControllerError> {
        self.reject_master(id)?;
        self.store
            .delete_note(id)
            .await
            .map_err(remote("Failed to delete note"))?;
        self.state
            .lock()
            .apply(WorkspaceEvent::NoteDeleted { id: id.to_string() });
        Ok(())
    }

    pub async fn toggle_pin(&self, id: &str) -> Result<ToggleResult, ControllerError> {
        let name = self.note_name(id)?;
        let active = self
            .update_config(|config| Ok(master_config::toggle_pinned(config, &name)))
            .await?;
        Ok(ToggleResult { name, active })
    }

    pub async fn toggle_archive(&self, id: &str) -> Result<ToggleResult, ControllerError> {
        let name = self.note_name(id)?;
        let active = self
            .update_config(|config| Ok(master_config::toggle_archived(config, &name)))
            .await?;
        Ok(ToggleResult { name, active })
    }

    pub async fn add_category(&self, name: &str) -> Result<String, ControllerError> {
        self.update_config(|config| {
            master_config::add_category(config, name).map_err(ControllerError::Invalid)
        })
        .await
    }

    /// Move a note into one category, or out of all of them with `None`.
    pub async fn move_to_category(
        &self,
        id: &str,
        category: Option<&str>,
    ) -> Result<MasterConfig, ControllerError> {
        let name = self.note_name(id)?;
        self.update_config(|config| {
            if let Some(category) = category {
                if !config.categories.contains_key(category) {
                    return Err(ControllerError::Invalid(format!(
                        "Unknown category: {}",
                        category
                    )));
                }
            }
            master_config::move_to_category(config, &name, category);
            Ok(config.clone())
        })
        .await
    }
}

/// `Note_YYYY-MM-DD_HH-MM-SS.<ext>`
pub fn new_note_name(now: DateTime<Local>, extension: NoteExtension) -> String {
    format!("Note_{}.{}", now.format("%Y-%m-%d_%H-%M-%S"), extension.as_str())
}

/// Trim and make sure the name ends in `.txt` or `.md`.
pub fn normalize_note_name(raw: &str) -> Result<String, ControllerError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ControllerError::Invalid("Note name is empty".to_string()));
    }

    let lower = name.to_lowercase();
    let name = if lower.ends_with(".txt") || lower.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.txt", name)
    };

    check_note_name(&name)?;
    Ok(name)
}

/// A note name must not be the master file's and must be storable in it.
fn check_note_name(name: &str) -> Result<(), ControllerError> {
    if name.is_empty() {
        return Err(ControllerError::Invalid("Note name is empty".to_string()));
    }
    if name == MASTER_NOTE_NAME {
        return Err(ControllerError::Invalid(format!("{} is reserved", MASTER_NOTE_NAME)));
    }
    if !master_config::is_member_name(name) {
        return Err(ControllerError::Invalid(format!(
            "Note name cannot be stored in the master config: {:?}",
            name
        )));
    }
    Ok(())
}
