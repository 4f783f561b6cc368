//! Filtered and sorted note listing, recomputed on demand from workspace state.

use crate::master_config::MASTER_NOTE_NAME;
use drive_notes_types::{MasterConfig, Note, SortBy, SortOrder, ViewParams};
use std::cmp::Ordering;

/// Which slice of the notes to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every note that is not archived
    #[default]
    All,
    Pinned,
    Archived,
    Category(String),
}

impl Selection {
    /// `pinned` and `archived` name the pseudo-categories; anything else is a category.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Selection::All,
            Some("pinned") => Selection::Pinned,
            Some("archived") => Selection::Archived,
            Some(name) => Selection::Category(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub selection: Selection,
    /// Case-insensitive name filter. When non-empty it replaces the selection.
    pub search: String,
    pub sort_by: SortBy,
    pub order: SortOrder,
}

impl From<ViewParams> for ViewQuery {
    fn from(params: ViewParams) -> Self {
        Self {
            selection: Selection::parse(params.selection.as_deref()),
            search: params.q.unwrap_or_default(),
            sort_by: params.sort.unwrap_or_default(),
            order: params.order.unwrap_or_default(),
        }
    }
}

/// Whether a note passes the query's filter
pub fn is_visible(note: &Note, config: &MasterConfig, query: &ViewQuery) -> bool {
    if note.name == MASTER_NOTE_NAME {
        return false;
    }

    let search = query.search.trim();
    if !search.is_empty() {
        return note.name.to_lowercase().contains(&search.to_lowercase());
    }

    let archived = config.is_archived(&note.name);
    match &query.selection {
        Selection::Pinned => config.is_pinned(&note.name) && !archived,
        Selection::Archived => archived,
        Selection::Category(name) => match config.categories.get(name) {
            Some(members) => members.iter().any(|n| *n == note.name) && !archived,
            // Unknown category falls back to the default view
            None => !archived,
        },
        Selection::All => !archived,
    }
}

/// Stable comparison under the query's sort key and direction
pub fn compare(a: &Note, b: &Note, sort_by: SortBy, order: SortOrder) -> Ordering {
    let cmp = match sort_by {
        SortBy::Name => a.name.cmp(&b.name),
        SortBy::ModifiedTime => a.modified_time.cmp(&b.modified_time),
    };
    match order {
        SortOrder::Asc => cmp,
        SortOrder::Desc => cmp.reverse(),
    }
}

/// Filter then sort the notes for display
pub fn visible_notes(notes: &[Note], config: &MasterConfig, query: &ViewQuery) -> Vec<Note> {
    let mut visible: Vec<Note> = notes
        .iter()
        .filter(|n| is_visible(n, config, query))
        .cloned()
        .collect();
    visible.sort_by(|a, b| compare(a, b, query.sort_by, query.order));
    visible
}
