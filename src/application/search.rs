//! Free-text substring search over titles and bodies.

use crate::domain::entities::{PostRecord, TagRecord};

/// Entities that expose text fields to the search box.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for PostRecord {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.body.as_str()]
    }
}

impl Searchable for TagRecord {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

/// Normalized `search` query parameter.
///
/// NUL characters are dropped, since no stored text can contain them. A
/// missing, empty or whitespace-only value then means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    term: Option<String>,
}

impl SearchQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let term = raw
            .map(|value| value.replace('\0', ""))
            .filter(|value| !value.trim().is_empty());
        Self { term }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.term.is_some()
    }

    /// `ILIKE` pattern matching the term literally anywhere in a column.
    ///
    /// Uses `\` as the escape character, which is the Postgres default.
    pub fn like_pattern(&self) -> Option<String> {
        self.term.as_deref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for ch in term.chars() {
                if matches!(ch, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }

    /// Case-insensitive substring match against any searchable field.
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        let Some(term) = self.term.as_deref() else {
            return true;
        };
        let needle = term.to_lowercase();
        item.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
