/// Two-tier query state. `local` follows every keystroke; `applied` only
/// moves on an explicit submit, a suggestion chip or a clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInput {
    local: String,
    applied: String,
    focused: bool,
}

/// Local text -> applied query
pub fn commit(local: &str) -> String {
    local.trim().to_string()
}

impl SearchInput {
    pub fn new(initial: &str) -> Self {
        Self { local: initial.to_string(), applied: commit(initial), focused: false }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn applied(&self) -> &str {
        &self.applied
    }

    /// Editable buffer for text widgets
    pub fn local_mut(&mut self) -> &mut String {
        &mut self.local
    }

    pub fn edit(&mut self, text: &str) {
        self.local.clear();
        self.local.push_str(text);
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Suggestion chips show while the field is focused and empty
    pub fn suggestions_visible(&self) -> bool {
        self.focused && self.local.is_empty()
    }

    pub fn submit(&mut self) -> &str {
        self.applied = commit(&self.local);
        self.focused = false;
        &self.applied
    }

    pub fn pick_suggestion(&mut self, suggestion: &str) -> &str {
        self.edit(suggestion);
        self.submit()
    }

    pub fn clear(&mut self) {
        self.local.clear();
        self.applied.clear();
    }

    /// The parent applied a query of its own (e.g. another view's search box)
    pub fn sync_applied(&mut self, applied: &str) {
        if self.applied != applied {
            self.applied = applied.to_string();
            self.local = applied.to_string();
        }
    }
}
