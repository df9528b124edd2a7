//! Serialized workspace document and storage paths.
//!
//! Persistence collaborators (autosave, import/export) speak this format; it
//! matches the original editor's JSON field naming so existing documents load
//! unchanged. Loading is tolerant: a missing or malformed file degrades to a
//! single empty tab instead of failing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::diagram::Diagram;
use crate::session::{Session, TabId};

/// Get the default storage path for the workspace document
pub fn default_storage_path() -> PathBuf {
    // Use XDG data directory if available, otherwise fallback to ~/.local/share
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    data_dir.join("flujo").join("document.json")
}

/// The on-disk workspace: every tab's graph plus the tab registry state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorkspace {
    pub tabs: BTreeMap<TabId, Diagram>,
    pub current_tab_id: TabId,
    pub next_tab_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl SavedWorkspace {
    /// The valid empty document: a single empty tab with id 1
    pub fn baseline() -> Self {
        let mut tabs = BTreeMap::new();
        tabs.insert(TabId::new(1), Diagram::new());
        Self {
            tabs,
            current_tab_id: TabId::new(1),
            next_tab_id: 2,
            version: None,
            timestamp: None,
        }
    }

    /// Capture a session for persistence. `timestamp` is left to the caller;
    /// the core carries no clock.
    pub fn from_session(session: &Session) -> Self {
        Self {
            tabs: session.tabs().clone(),
            current_tab_id: session.current_tab(),
            next_tab_id: session.next_tab_id(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            timestamp: None,
        }
    }

    /// Build a session from this document. Invalid registry state (no tabs,
    /// dangling active tab, stale tab counter) is repaired rather than
    /// rejected.
    pub fn into_session(self) -> Session {
        Session::from_tabs(self.tabs, self.current_tab_id, self.next_tab_id)
    }

    /// Parse a serialized document. Malformed input degrades to the baseline.
    pub fn parse(content: &str) -> Self {
        match serde_json::from_str(content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("malformed workspace document, starting empty: {e}");
                Self::baseline()
            }
        }
    }

    /// Load from disk. A missing or unreadable file yields the baseline.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::baseline();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("could not read {path:?}, starting empty: {e}");
                Self::baseline()
            }
        }
    }

    /// Save to disk, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {parent:?}"))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to save to {path:?}"))?;
        Ok(())
    }
}

impl Default for SavedWorkspace {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeType;

    fn session_with_content() -> Session {
        let mut session = Session::new();
        let (a, _) = session.add_shape(ShapeType::Start, 0.0, 0.0, None);
        let (b, _) = session.add_shape(ShapeType::Process, 200.0, 100.0, None);
        session.connect(&a.id, 1, &b.id, 3).unwrap();
        session.create_tab();
        session.add_shape(ShapeType::Comment, 50.0, 50.0, Some("nota"));
        session
    }

    #[test]
    fn json_round_trip_preserves_everything() {
        let session = session_with_content();
        let saved = SavedWorkspace::from_session(&session);

        let json = serde_json::to_string_pretty(&saved).unwrap();
        let reloaded = SavedWorkspace::parse(&json);
        assert_eq!(reloaded, saved);

        let restored = reloaded.into_session();
        assert_eq!(restored.current_tab(), session.current_tab());
        assert_eq!(restored.tab_ids(), session.tab_ids());
        for tab in session.tab_ids() {
            assert_eq!(restored.diagram_for(tab), session.diagram_for(tab));
        }
    }

    #[test]
    fn wire_format_matches_the_original_editor() {
        let session = session_with_content();
        let json = serde_json::to_string(&SavedWorkspace::from_session(&session)).unwrap();

        assert!(json.contains("\"currentTabId\":2"));
        assert!(json.contains("\"nextTabId\":3"));
        assert!(json.contains("\"shapeIdCounter\""));
        assert!(json.contains("\"connectionIdCounter\""));
        assert!(json.contains("\"fromId\":\"shape-0\""));
        assert!(json.contains("\"fromPoint\":1"));
        assert!(json.contains("\"type\":\"start\""));
        assert!(json.contains("\"id\":\"conn-0\""));
    }

    #[test]
    fn malformed_documents_degrade_to_the_baseline() {
        for bad in ["", "not json", "{\"tabs\": 4}", "[1,2,3]"] {
            let doc = SavedWorkspace::parse(bad);
            assert_eq!(doc, SavedWorkspace::baseline(), "input: {bad:?}");
        }

        let session = SavedWorkspace::parse("garbage").into_session();
        assert_eq!(session.current_tab(), TabId::new(1));
        assert!(session.diagram().is_empty());
    }

    #[test]
    fn missing_file_loads_as_the_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let doc = SavedWorkspace::load(&dir.path().join("nope.json"));
        assert_eq!(doc, SavedWorkspace::baseline());
    }

    #[test]
    fn save_then_load_round_trips_via_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("document.json");

        let saved = SavedWorkspace::from_session(&session_with_content());
        saved.save(&path).unwrap();

        let loaded = SavedWorkspace::load(&path);
        assert_eq!(loaded, saved);
    }

    #[test]
    fn into_session_repairs_a_dangling_active_tab() {
        let mut doc = SavedWorkspace::baseline();
        doc.current_tab_id = TabId::new(9);
        doc.next_tab_id = 0;

        let session = doc.into_session();
        assert_eq!(session.current_tab(), TabId::new(1));
        // tab counter moved past every existing id
        let fresh = session.next_tab_id();
        assert!(fresh >= 2);
    }
}
