//! Per-section fetch results.
//!
//! Pages that issue several independent fetches render each part of the page
//! from its own `Section`, so one failed request never blanks the whole view.

use tracing::warn;

use crate::state::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Loaded(T),
    Empty,
    Failed(String),
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Section::Empty
    }
}

impl<T> Section<T> {
    /// Wraps a fetch result, logging failures under `name`.
    pub fn from_result(name: &str, result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Section::Loaded(value),
            Err(err) => {
                warn!(section = name, error = %err, "section failed to load");
                Section::Failed(err.user_message())
            }
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Section::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Section::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed(_))
    }
}

impl<T: Clone + Default> Section<T> {
    /// The loaded value, or the type's empty value when absent or failed.
    pub fn or_empty(&self) -> T {
        self.loaded().cloned().unwrap_or_default()
    }
}

impl<T> Section<Vec<T>> {
    /// Collapses an empty list to `Empty` so pages can tell "nothing yet" from data.
    pub fn from_list(name: &str, result: Result<Vec<T>, ApiError>) -> Self {
        match Section::from_result(name, result) {
            Section::Loaded(items) if items.is_empty() => Section::Empty,
            other => other,
        }
    }

    pub fn len(&self) -> usize {
        self.loaded().map(Vec::len).unwrap_or(0)
    }

    pub fn items(&self) -> &[T] {
        self.loaded().map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_fetch_keeps_its_message() {
        let s: Section<Vec<u8>> = Section::from_list(
            "companies",
            Err(ApiError::Api {
                status: 500,
                message: "boom".into(),
            }),
        );
        assert_eq!(s.error(), Some("boom"));
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn empty_list_is_reported_as_empty() {
        let s: Section<Vec<u8>> = Section::from_list("works", Ok(vec![]));
        assert_eq!(s, Section::Empty);
        let s = Section::from_list("works", Ok(vec![1u8, 2]));
        assert_eq!(s.items(), &[1, 2]);
    }
}
