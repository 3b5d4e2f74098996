use crate::model::ProductId;

/// Zero or one selected product. The detail panel is visible exactly when
/// something is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<ProductId>,
    /// Bookmark toggle of the detail panel, reset whenever the selection changes
    saved: bool,
}

impl Selection {
    pub fn id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn saved(&self) -> bool {
        self.saved
    }

    /// Returns true when the selection changed
    pub fn select(&mut self, id: ProductId) -> bool {
        if self.current.as_ref() == Some(&id) {
            return false;
        }
        self.current = Some(id);
        self.saved = false;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.saved = false;
        self.current.take().is_some()
    }

    /// Drop the selection if `visible` no longer contains it
    pub fn retain_if<F: Fn(&str) -> bool>(&mut self, visible: F) -> bool {
        match &self.current {
            Some(id) if !visible(id) => self.clear(),
            _ => false,
        }
    }

    pub fn toggle_saved(&mut self) {
        if self.current.is_some() {
            self.saved = !self.saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_most_one_selected() {
        let mut s = Selection::default();
        assert!(!s.is_open());
        assert!(s.select("1".to_string()));
        assert!(s.select("2".to_string()));
        assert_eq!(s.id(), Some("2"));
        assert!(!s.select("2".to_string()));
    }

    #[test]
    fn test_saved_flag_resets_on_new_selection() {
        let mut s = Selection::default();
        s.toggle_saved();
        assert!(!s.saved(), "nothing to save without a selection");
        s.select("1".to_string());
        s.toggle_saved();
        assert!(s.saved());
        s.select("2".to_string());
        assert!(!s.saved());
    }

    #[test]
    fn test_retain_if_drops_invisible() {
        let mut s = Selection::default();
        s.select("1".to_string());
        assert!(!s.retain_if(|id| id == "1"));
        assert!(s.retain_if(|id| id == "2"));
        assert!(!s.is_open());
    }
}
