//! Master config codec: pin/archive/category membership stored as one text file.
//!
//! Line-oriented format with three section headers:
//!
//! ```text
//! [PINNED]
//! foo.txt
//!
//! [ARCHIVED]
//!
//! [CATEGORY:Work]
//! bar.txt
//! ```
//!
//! Hand-rolled like the frontmatter parser: no error recovery, unknown lines
//! before the first header are dropped, and encoding does not preserve them.

use drive_notes_types::MasterConfig;

/// Reserved name of the remote file holding the master config
pub const MASTER_NOTE_NAME: &str = "_SYSTEM_MASTER.txt";

const PINNED_HEADER: &str = "[PINNED]";
const ARCHIVED_HEADER: &str = "[ARCHIVED]";
const CATEGORY_PREFIX: &str = "[CATEGORY:";

#[derive(Debug, Clone, PartialEq)]
enum Section {
    Pinned,
    Archived,
    Category(String),
}

/// Parse master config text.
pub fn decode(content: &str) -> MasterConfig {
    let mut config = MasterConfig::default();
    let mut section: Option<Section> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed == PINNED_HEADER {
            section = Some(Section::Pinned);
        } else if trimmed == ARCHIVED_HEADER {
            section = Some(Section::Archived);
        } else if let Some(rest) = trimmed.strip_prefix(CATEGORY_PREFIX) {
            let name = rest.strip_suffix(']').unwrap_or(rest).to_string();
            // A repeated header re-opens the category instead of resetting it
            config.categories.entry(name.clone()).or_default();
            section = Some(Section::Category(name));
        } else {
            match &section {
                Some(Section::Pinned) => config.pinned.push(trimmed.to_string()),
                Some(Section::Archived) => config.archived.push(trimmed.to_string()),
                Some(Section::Category(name)) => config
                    .categories
                    .entry(name.clone())
                    .or_default()
                    .push(trimmed.to_string()),
                None => {}
            }
        }
    }

    config
}

/// Serialize a master config: pinned, then archived, then one block per category.
pub fn encode(config: &MasterConfig) -> String {
    let mut text = format!(
        "{}\n{}\n\n{}\n{}",
        PINNED_HEADER,
        config.pinned.join("\n"),
        ARCHIVED_HEADER,
        config.archived.join("\n"),
    );

    for (name, members) in &config.categories {
        text.push_str(&format!("\n\n{}{}]\n{}", CATEGORY_PREFIX, name, members.join("\n")));
    }

    text
}

/// Whether `name` can be stored as a member line and decode back unchanged.
pub fn is_member_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.contains(['\n', '\r'])
        && name != PINNED_HEADER
        && name != ARCHIVED_HEADER
        && !name.starts_with(CATEGORY_PREFIX)
}

/// Add the note to the pinned set, or remove it if already pinned.
/// Returns whether the note is pinned afterwards.
pub fn toggle_pinned(config: &mut MasterConfig, name: &str) -> bool {
    toggle(&mut config.pinned, name)
}

/// Add the note to the archived set, or remove it if already archived.
/// Returns whether the note is archived afterwards.
pub fn toggle_archived(config: &mut MasterConfig, name: &str) -> bool {
    toggle(&mut config.archived, name)
}

fn toggle(members: &mut Vec<String>, name: &str) -> bool {
    if members.iter().any(|n| n == name) {
        members.retain(|n| n != name);
        false
    } else {
        members.push(name.to_string());
        true
    }
}

/// Create an empty category. Returns the trimmed name that was added.
pub fn add_category(config: &mut MasterConfig, name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Category name is empty".to_string());
    }
    if name.contains('\n') || name.contains(']') {
        return Err(format!("Category name contains a reserved character: {}", name));
    }
    // These collide with the pinned/archived selections
    if name == "pinned" || name == "archived" {
        return Err(format!("Category name is reserved: {}", name));
    }
    if config.categories.contains_key(name) {
        return Err("Category already exists".to_string());
    }
    config.categories.insert(name.to_string(), Vec::new());
    Ok(name.to_string())
}

/// Remove the note from every category, then append it to `category` when
/// that category exists. Returns whether the note landed in a category.
pub fn move_to_category(config: &mut MasterConfig, name: &str, category: Option<&str>) -> bool {
    for members in config.categories.values_mut() {
        members.retain(|n| n != name);
    }

    match category.and_then(|c| config.categories.get_mut(c)) {
        Some(members) => {
            members.push(name.to_string());
            true
        }
        None => false,
    }
}

/// Rewrite every reference to `old` as `new`. Returns whether anything changed.
pub fn rename_note(config: &mut MasterConfig, old: &str, new: &str) -> bool {
    if old == new {
        return false;
    }

    let mut changed = rename_in(&mut config.pinned, old, new);
    changed |= rename_in(&mut config.archived, old, new);
    for members in config.categories.values_mut() {
        changed |= rename_in(members, old, new);
    }
    changed
}

fn rename_in(members: &mut [String], old: &str, new: &str) -> bool {
    let mut changed = false;
    for member in members.iter_mut().filter(|m| m.as_str() == old) {
        *member = new.to_string();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> MasterConfig {
        let mut categories = BTreeMap::new();
        categories.insert("Work".to_string(), vec!["report.md".to_string(), "todo.txt".to_string()]);
        categories.insert("Home".to_string(), vec![]);
        categories.insert("Ideas & Plans".to_string(), vec!["todo.txt".to_string()]);
        MasterConfig {
            pinned: vec!["todo.txt".to_string(), "a b c.txt".to_string()],
            archived: vec!["old.txt".to_string()],
            categories,
        }
    }

    #[test]
    fn test_decode_sample_master_file() {
        let config = decode("[PINNED]\nfoo.txt\n\n[ARCHIVED]\n\n[CATEGORY:Work]\nbar.txt");
        assert_eq!(config.pinned, vec!["foo.txt"]);
        assert!(config.archived.is_empty());
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories["Work"], vec!["bar.txt"]);
    }

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(decode(""), MasterConfig::default());
    }

    #[test]
    fn test_decode_ignores_lines_before_first_header() {
        let config = decode("stray line\n# comment\n[PINNED]\na.txt");
        assert_eq!(config.pinned, vec!["a.txt"]);
        assert!(config.archived.is_empty());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_decode_trims_and_skips_blank_lines() {
        let config = decode("  [PINNED]  \r\n   a.txt   \n\n\t\n b.txt\n");
        assert_eq!(config.pinned, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_decode_repeated_category_appends() {
        let text = "[CATEGORY:Work]\na.txt\n[PINNED]\np.txt\n[CATEGORY:Work]\nb.txt";
        let config = decode(text);
        assert_eq!(config.categories["Work"], vec!["a.txt", "b.txt"]);
        assert_eq!(config.pinned, vec!["p.txt"]);
    }

    #[test]
    fn test_decode_empty_category_is_kept() {
        let config = decode("[CATEGORY:Later]\n");
        assert!(config.categories.contains_key("Later"));
        assert!(config.categories["Later"].is_empty());
    }

    #[test]
    fn test_decode_category_without_closing_bracket() {
        let config = decode("[CATEGORY:Work\nx.txt");
        assert_eq!(config.categories["Work"], vec!["x.txt"]);
    }

    #[test]
    fn test_encode_layout() {
        let mut config = MasterConfig::default();
        config.pinned.push("foo.txt".into());
        config.categories.insert("Work".into(), vec!["bar.txt".into()]);
        assert_eq!(
            encode(&config),
            "[PINNED]\nfoo.txt\n\n[ARCHIVED]\n\n\n[CATEGORY:Work]\nbar.txt"
        );
    }

    #[test]
    fn test_round_trip() {
        let config = sample();
        assert_eq!(decode(&encode(&config)), config);
        assert_eq!(decode(&encode(&MasterConfig::default())), MasterConfig::default());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let config = sample();
        assert_eq!(encode(&config), encode(&config));
        assert_eq!(encode(&decode(&encode(&config))), encode(&config));
    }

    #[test]
    fn test_toggle_pinned_and_archived() {
        let mut config = MasterConfig::default();
        assert!(toggle_pinned(&mut config, "a.txt"));
        assert!(toggle_pinned(&mut config, "b.txt"));
        assert!(!toggle_pinned(&mut config, "a.txt"));
        assert_eq!(config.pinned, vec!["b.txt"]);

        assert!(toggle_archived(&mut config, "b.txt"));
        assert_eq!(config.archived, vec!["b.txt"]);
        assert!(config.is_pinned("b.txt"));
    }

    #[test]
    fn test_add_category_rejects_duplicates_and_blank() {
        let mut config = MasterConfig::default();
        assert_eq!(add_category(&mut config, "  Work ").unwrap(), "Work");
        assert!(add_category(&mut config, "Work").is_err());
        assert!(add_category(&mut config, "   ").is_err());
        assert!(add_category(&mut config, "a]b").is_err());
        assert_eq!(config.categories.len(), 1);
    }

    #[test]
    fn test_add_category_rejects_selection_names() {
        let mut config = MasterConfig::default();
        assert!(add_category(&mut config, "pinned").is_err());
        assert!(add_category(&mut config, " archived ").is_err());
        assert!(config.categories.is_empty());
        assert_eq!(add_category(&mut config, "Pinned Ideas").unwrap(), "Pinned Ideas");
    }

    #[test]
    fn test_member_names_that_survive_encoding() {
        assert!(is_member_name("todo.txt"));
        assert!(is_member_name("[draft].txt"));
        assert!(!is_member_name(""));
        assert!(!is_member_name(" padded.txt"));
        assert!(!is_member_name("x\ny.txt"));
        assert!(!is_member_name("x\ry.txt"));
        assert!(!is_member_name("[PINNED]"));
        assert!(!is_member_name("[ARCHIVED]"));
        assert!(!is_member_name("[CATEGORY:x].txt"));

        let mut config = MasterConfig::default();
        toggle_pinned(&mut config, "[draft].txt");
        assert_eq!(decode(&encode(&config)), config);
    }

    #[test]
    fn test_move_to_category_is_exclusive() {
        let mut config = sample();
        assert!(move_to_category(&mut config, "todo.txt", Some("Home")));
        assert_eq!(config.categories_of("todo.txt"), vec!["Home"]);

        assert!(!move_to_category(&mut config, "todo.txt", None));
        assert!(config.categories_of("todo.txt").is_empty());

        // Unknown target: removed everywhere, added nowhere
        move_to_category(&mut config, "report.md", Some("Nope"));
        assert!(config.categories_of("report.md").is_empty());
        assert!(!config.categories.contains_key("Nope"));
    }

    #[test]
    fn test_rename_propagates_to_every_reference() {
        let mut config = MasterConfig::default();
        config.pinned = vec!["x.txt".into(), "keep.txt".into()];
        config.archived = vec!["x.txt".into()];
        config.categories.insert("Work".into(), vec!["x.txt".into()]);
        config.categories.insert("Home".into(), vec!["keep.txt".into(), "x.txt".into()]);

        assert!(rename_note(&mut config, "x.txt", "y.txt"));

        assert_eq!(config.pinned, vec!["y.txt", "keep.txt"]);
        assert_eq!(config.archived, vec!["y.txt"]);
        assert_eq!(config.categories["Work"], vec!["y.txt"]);
        assert_eq!(config.categories["Home"], vec!["keep.txt", "y.txt"]);
        assert!(!encode(&config).contains("x.txt"));
    }

    #[test]
    fn test_rename_unreferenced_note_is_noop() {
        let mut config = sample();
        let before = config.clone();
        assert!(!rename_note(&mut config, "ghost.txt", "other.txt"));
        assert!(!rename_note(&mut config, "todo.txt", "todo.txt"));
        assert_eq!(config, before);
    }
}
