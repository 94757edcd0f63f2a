//! Entry filters

use chrono::NaiveDate;

/// Filter and ordering for entry listings.
///
/// Owner scoping is not part of the query; the store applies it to every
/// statement on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    /// Trimmed search text; `None` when blank. Case folding happens in the store.
    text: Option<String>,
    newest_first: bool,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            text: None,
            newest_first: true,
        }
    }
}

impl EntryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to `from..=to`; either bound may be open
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Case-insensitive substring match on title or body. Blank text matches all.
    pub fn matching(mut self, text: Option<&str>) -> Self {
        self.text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    pub fn ordered(mut self, newest_first: bool) -> Self {
        self.newest_first = newest_first;
        self
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn newest_first(&self) -> bool {
        self.newest_first
    }
}
