use crate::todo::Todo;

/// Case-insensitive substring matcher for todo text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// Determine whether the title or description contains the query.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        self.matches_field(&todo.title) || self.matches_field(&todo.description)
    }

    fn matches_field(&self, value: &str) -> bool {
        !value.is_empty() && value.to_lowercase().contains(&self.needle)
    }
}
