//! Shared value types for the clinic workspace.
//!
//! - [`NonEmptyText`] for fields that must carry at least one visible character
//!   (patient identifiers).
//! - [`FrequencyTable`] for the (category, count) tables produced by reporting and
//!   consumed by chart sinks.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Trimmed text with at least one visible character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input`, rejecting it with [`TextError::Empty`] if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

/// An ordered set of `(category, count)` pairs.
///
/// Categories keep the order in which they were first counted unless the table is
/// built from already-ordered pairs with [`FrequencyTable::from_pairs`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FrequencyTable {
    title: String,
    entries: Vec<(String, u64)>,
}

impl FrequencyTable {
    /// Creates an empty table with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Creates a table from pairs, keeping their order as given.
    ///
    /// Repeated categories are merged into the first occurrence.
    pub fn from_pairs<I, S>(title: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut table = Self::new(title);
        for (category, count) in pairs {
            table.add(category, count);
        }
        table
    }

    /// Adds one occurrence of `category`.
    pub fn increment(&mut self, category: impl Into<String>) {
        self.add(category, 1);
    }

    fn add(&mut self, category: impl Into<String>, count: u64) {
        let category = category.into();
        match self.entries.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += count,
            None => self.entries.push((category, count)),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
