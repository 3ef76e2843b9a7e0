//! Plant selection and the info panel it drives

use crate::catalog::PlantCatalog;

/// What the info card should show
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InfoPanel {
    #[default]
    Hidden,
    Visible { name: String, description: String },
}

impl InfoPanel {
    pub fn is_visible(&self) -> bool {
        matches!(self, InfoPanel::Visible { .. })
    }
}

/// The currently selected plant key, written only by selection events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<String>,
}

impl SelectionState {
    /// Apply a selection-changed event and return the panel to display
    ///
    /// An empty value clears the selection. An unrecognized key is still
    /// stored (placement will fail to load it) but hides the panel.
    pub fn select(&mut self, catalog: &PlantCatalog, key: &str) -> InfoPanel {
        let key = key.trim();
        self.selected = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };

        match catalog.get(key) {
            Some(entry) => InfoPanel::Visible {
                name: entry.name.clone(),
                description: entry.description.clone(),
            },
            None => InfoPanel::Hidden,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_shows_panel() {
        let catalog = PlantCatalog::builtin().unwrap();
        let mut selection = SelectionState::default();

        let panel = selection.select(&catalog, "Cinnamon");
        assert_eq!(selection.selected(), Some("Cinnamon"));
        match panel {
            InfoPanel::Visible { name, description } => {
                assert_eq!(name, "Cinnamon");
                assert!(description.contains("antioxidants"));
            }
            InfoPanel::Hidden => panic!("panel should be visible"),
        }
    }

    #[test]
    fn test_unknown_keys_hide_panel() {
        let catalog = PlantCatalog::builtin().unwrap();
        let mut selection = SelectionState::default();

        for key in ["", "   ", "basil", "TULSI", "models/tulsi.glb"] {
            let panel = selection.select(&catalog, key);
            assert_eq!(panel, InfoPanel::Hidden, "key {:?}", key);
        }
    }

    #[test]
    fn test_empty_value_clears_selection() {
        let catalog = PlantCatalog::builtin().unwrap();
        let mut selection = SelectionState::default();

        selection.select(&catalog, "tulsi");
        assert_eq!(selection.selected(), Some("tulsi"));

        selection.select(&catalog, "");
        assert_eq!(selection.selected(), None);
    }
}
