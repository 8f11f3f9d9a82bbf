/// Value objects for the domain layer
use super::base::{DomainError, DomainResult, ValueObject};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a Page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(i64);

impl PageId {
    /// Id shown for a page that has not been stored yet
    pub const UNSAVED: i64 = -1;

    pub fn new(id: i64) -> Self {
        PageId(id)
    }

    /// Parse an id received as text, e.g. from a submitted form
    pub fn parse(raw: &str) -> DomainResult<Self> {
        raw.trim()
            .parse::<i64>()
            .map(PageId)
            .map_err(|_| DomainError::InvalidValue(format!("page id is not a number: {:?}", raw)))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl ValueObject for PageId {}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw Markdown source of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markdown(String);

impl Markdown {
    /// Shown, and offered for editing, when a page does not exist yet
    pub const EMPTY_PAGE: &'static str = "# A new page\n\nFeel-free to write in Markdown!\n";

    pub fn new(text: impl Into<String>) -> Self {
        Markdown(text.into())
    }

    pub fn empty_page() -> Self {
        Markdown(Self::EMPTY_PAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl ValueObject for Markdown {}

impl fmt::Display for Markdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_parse() {
        assert_eq!(PageId::parse("42").unwrap(), PageId::new(42));
        assert_eq!(PageId::parse(" 7 ").unwrap().value(), 7);
        assert_eq!(PageId::parse("-1").unwrap().value(), PageId::UNSAVED);
    }

    #[test]
    fn test_page_id_parse_rejects_garbage() {
        assert!(matches!(
            PageId::parse("abc"),
            Err(DomainError::InvalidValue(_))
        ));
        assert!(PageId::parse("").is_err());
        assert!(PageId::parse("1.5").is_err());
    }

    #[test]
    fn test_page_id_serializes_as_number() {
        let json = serde_json::to_string(&PageId::new(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_empty_page_markdown() {
        let md = Markdown::empty_page();
        assert!(md.as_str().starts_with("# A new page"));
        assert!(md.as_str().contains("Feel-free to write in Markdown!"));
    }
}
