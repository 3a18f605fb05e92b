//! Bibliographic record model shared by every metadata source.

use serde::{Deserialize, Serialize};

/// BibTeX entry type produced by a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Web pages (URL source)
    Online,
    /// Books (ISBN source)
    Book,
    /// Articles (arXiv source)
    Article,
}

impl EntryType {
    /// Returns the BibTeX spelling of the entry type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Online => "online",
            EntryType::Book => "book",
            EntryType::Article => "article",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How field values are delimited when the record is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `field = {value}`
    #[default]
    Braces,
    /// `field = "value"`
    Quotes,
}

/// A single `name = value` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A normalized bibliographic record
///
/// Records only live for the duration of one lookup. Fields keep their
/// insertion order; empty values are kept here and dropped later by tidy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibRecord {
    /// Entry type (`@online`, `@book`, `@article`)
    pub entry_type: EntryType,

    /// Citation key
    pub key: String,

    /// Value delimiter used when rendering
    pub delimiter: Delimiter,

    /// Fields in template order
    pub fields: Vec<Field>,
}

impl BibRecord {
    /// Create an empty record
    pub fn new(entry_type: EntryType, key: impl Into<String>) -> Self {
        Self {
            entry_type,
            key: key.into(),
            delimiter: Delimiter::default(),
            fields: Vec::new(),
        }
    }

    /// Get a field value by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author")
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn year(&self) -> Option<&str> {
        self.get("year")
    }

    /// Names of the fields that carry a non-empty value
    pub fn populated_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.value.trim().is_empty())
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Builder for constructing BibRecord objects
#[derive(Debug, Clone)]
pub struct BibRecordBuilder {
    record: BibRecord,
}

impl BibRecordBuilder {
    /// Create a new builder with required fields
    pub fn new(entry_type: EntryType, key: impl Into<String>) -> Self {
        Self {
            record: BibRecord::new(entry_type, key),
        }
    }

    /// Set the value delimiter
    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.record.delimiter = delimiter;
        self
    }

    /// Append a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Build the BibRecord
    pub fn build(self) -> BibRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = BibRecordBuilder::new(EntryType::Book, "Doe_2021")
            .delimiter(Delimiter::Quotes)
            .field("title", "Test Book Title")
            .field("author", "John Doe")
            .field("year", "")
            .build();

        assert_eq!(record.entry_type, EntryType::Book);
        assert_eq!(record.key, "Doe_2021");
        assert_eq!(record.delimiter, Delimiter::Quotes);
        assert_eq!(record.author(), Some("John Doe"));
        assert_eq!(record.title(), Some("Test Book Title"));
        assert_eq!(record.year(), Some(""));
        assert_eq!(record.get("TITLE"), Some("Test Book Title"));
        assert_eq!(record.get("publisher"), None);
    }

    #[test]
    fn test_populated_fields() {
        let record = BibRecordBuilder::new(EntryType::Online, "Example")
            .field("author", "")
            .field("title", "  ")
            .field("url", "http://example.com")
            .build();

        assert_eq!(record.populated_fields(), vec!["url"]);
    }

    #[test]
    fn test_entry_type_display() {
        assert_eq!(EntryType::Online.to_string(), "online");
        assert_eq!(EntryType::Book.as_str(), "book");
        assert_eq!(EntryType::Article.as_str(), "article");
    }
}
