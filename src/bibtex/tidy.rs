//! BibTeX normalization.
//!
//! [`Tidy`] re-renders a BibTeX document with one consistent layout: curly
//! delimiters, bare numbers, aligned `=` signs, a fixed field order and no
//! empty or repeated fields. Running it twice gives the same text as running
//! it once.

use std::collections::HashSet;

use super::parser::{self, Item, RawEntry, RawField, ValuePart};

/// Field order used when sorting; fields not listed follow alphabetically
pub const DEFAULT_FIELD_ORDER: &[&str] = &[
    "title",
    "shorttitle",
    "author",
    "year",
    "month",
    "day",
    "journal",
    "booktitle",
    "location",
    "on",
    "publisher",
    "address",
    "series",
    "volume",
    "number",
    "pages",
    "doi",
    "isbn",
    "issn",
    "url",
    "urldate",
    "copyright",
    "category",
    "note",
    "metadata",
];

/// Formatting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TidyOptions {
    /// Indentation placed before every field
    pub indent: String,
    /// Column the `=` sign is aligned to
    pub align: usize,
    /// Wrap every delimited value in braces, converting quotes
    pub curly: bool,
    /// Render purely numeric values without delimiters
    pub numeric: bool,
    /// Sort fields by `field_order`
    pub sort_fields: bool,
    pub field_order: Vec<String>,
    pub remove_empty_fields: bool,
    /// Keep only the first occurrence of a field name within an entry
    pub remove_duplicate_fields: bool,
    /// Report entries sharing a citation key
    pub warn_duplicate_keys: bool,
    /// Fields whose value is always wrapped in an extra pair of braces
    pub enclosing_braces: Vec<String>,
    /// Lowercase entry types and field names
    pub lowercase: bool,
}

impl Default for TidyOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            align: 13,
            curly: true,
            numeric: true,
            sort_fields: true,
            field_order: DEFAULT_FIELD_ORDER.iter().map(|s| s.to_string()).collect(),
            remove_empty_fields: true,
            remove_duplicate_fields: true,
            warn_duplicate_keys: true,
            enclosing_braces: vec!["title".to_string()],
            lowercase: true,
        }
    }
}

/// Result of a tidy pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TidyOutput {
    pub bibtex: String,
    pub warnings: Vec<String>,
}

/// Anything that can normalize BibTeX text
pub trait BibFormatter: Send + Sync {
    /// Format the input. Never fails; problems are reported as warnings.
    fn tidy(&self, input: &str) -> TidyOutput;
}

/// The built-in formatter
#[derive(Debug, Clone, Default)]
pub struct Tidy {
    options: TidyOptions,
}

impl Tidy {
    pub fn new(options: TidyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TidyOptions {
        &self.options
    }

    fn render_entry(&self, entry: &RawEntry) -> String {
        let entry_type = if self.options.lowercase {
            entry.entry_type.to_lowercase()
        } else {
            entry.entry_type.clone()
        };

        let fields = self.normalize_fields(&entry.fields);
        if fields.is_empty() {
            return format!("@{}{{{}}}", entry_type, entry.key);
        }

        let width = self.options.align.saturating_sub(1);
        let lines: Vec<String> = fields
            .iter()
            .map(|(name, field)| {
                format!(
                    "{}{:<width$} = {}",
                    self.options.indent,
                    name,
                    self.render_value(name, &field.parts),
                    width = width
                )
            })
            .collect();

        format!("@{}{{{},\n{}\n}}", entry_type, entry.key, lines.join(",\n"))
    }

    /// Apply naming, removal, dedup and ordering rules
    fn normalize_fields<'a>(&self, fields: &'a [RawField]) -> Vec<(String, &'a RawField)> {
        let mut seen = HashSet::new();
        let mut out: Vec<(String, &RawField)> = Vec::with_capacity(fields.len());

        for field in fields {
            if self.options.remove_empty_fields && is_empty_value(&field.parts) {
                continue;
            }

            let name = if self.options.lowercase {
                field.name.to_lowercase()
            } else {
                field.name.clone()
            };

            if self.options.remove_duplicate_fields && !seen.insert(name.to_lowercase()) {
                continue;
            }

            out.push((name, field));
        }

        if self.options.sort_fields {
            out.sort_by(|(a, _), (b, _)| {
                self.field_rank(a)
                    .cmp(&self.field_rank(b))
                    .then_with(|| a.cmp(b))
            });
        }

        out
    }

    fn field_rank(&self, name: &str) -> usize {
        self.options
            .field_order
            .iter()
            .position(|f| f.eq_ignore_ascii_case(name))
            .unwrap_or(self.options.field_order.len())
    }

    fn render_value(&self, name: &str, parts: &[ValuePart]) -> String {
        if let [part] = parts {
            return self.render_single(name, part);
        }

        parts
            .iter()
            .map(|part| match part {
                ValuePart::Number(n) | ValuePart::Macro(n) => n.clone(),
                ValuePart::Braced(c) => self.delimit(&collapse_whitespace(c), false),
                ValuePart::Quoted(c) => self.delimit(&collapse_whitespace(c), true),
            })
            .collect::<Vec<_>>()
            .join(" # ")
    }

    fn render_single(&self, name: &str, part: &ValuePart) -> String {
        let (content, quoted) = match part {
            ValuePart::Number(n) if self.options.numeric => return n.clone(),
            ValuePart::Number(n) => return self.delimit(n, false),
            ValuePart::Macro(m) => return m.clone(),
            ValuePart::Braced(c) => (collapse_whitespace(c), false),
            ValuePart::Quoted(c) => (collapse_whitespace(c), true),
        };

        if self.options.numeric && is_numeric(&content) {
            return content;
        }

        let encloses = self
            .options
            .enclosing_braces
            .iter()
            .any(|f| f.eq_ignore_ascii_case(name));

        if encloses && !is_enclosed(&content) {
            self.delimit(&format!("{{{}}}", content), quoted)
        } else {
            self.delimit(&content, quoted)
        }
    }

    fn delimit(&self, content: &str, quoted: bool) -> String {
        if quoted && !self.options.curly {
            format!("\"{}\"", content)
        } else {
            format!("{{{}}}", content)
        }
    }
}

impl BibFormatter for Tidy {
    fn tidy(&self, input: &str) -> TidyOutput {
        let parsed = parser::parse(input);
        let mut warnings: Vec<String> = parsed
            .issues
            .iter()
            .map(|issue| format!("line {}: {}", issue.line, issue.message))
            .collect();

        let mut keys = HashSet::new();
        let mut blocks = Vec::with_capacity(parsed.items.len());

        for item in &parsed.items {
            match item {
                Item::Entry(entry) => {
                    if self.options.warn_duplicate_keys && !keys.insert(entry.key.to_lowercase()) {
                        warnings.push(format!("Duplicate key: {}", entry.key));
                    }
                    blocks.push(self.render_entry(entry));
                }
                Item::Verbatim(text) | Item::Text(text) => blocks.push(text.clone()),
            }
        }

        for warning in &warnings {
            tracing::warn!(warning = %warning, "BibTeX tidy warning");
        }

        let mut bibtex = blocks.join("\n\n");
        if !bibtex.is_empty() {
            bibtex.push('\n');
        }

        TidyOutput { bibtex, warnings }
    }
}

/// Collapse whitespace runs to one space without trimming
fn collapse_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_space = false;

    for c in value.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    out
}

fn is_numeric(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some('1'..='9')) && chars.all(|c| c.is_ascii_digit())
}

fn is_empty_value(parts: &[ValuePart]) -> bool {
    parts.iter().all(|part| match part {
        ValuePart::Braced(c) | ValuePart::Quoted(c) => c.trim().is_empty(),
        ValuePart::Number(_) | ValuePart::Macro(_) => false,
    })
}

/// Whether the whole value is one brace group, e.g. `{A Title}` but not `{A} {B}`
fn is_enclosed(content: &str) -> bool {
    if !content.starts_with('{') || !content.ends_with('}') {
        return false;
    }

    let mut depth = 0usize;
    for (pos, byte) in content.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return pos == content.len() - 1;
                }
            }
            _ => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"@article{steward03,
            author =	 {Martha Steward},
            title =	 {Cooking behind bars}, publisher = "Culinary Expert Series",
            year = {2003}
          }
          @Book{impossible,
            Author =	 { Stefan Sweig },
            title =	 { The impossible book },
            publisher =	 { Dead Poet Society},
            year =	 1942,
            month =        mar
          }"#;

    fn tidy(input: &str) -> TidyOutput {
        Tidy::default().tidy(input)
    }

    #[test]
    fn test_original_fixture() {
        let output = tidy(FIXTURE);

        assert!(output.bibtex.contains("title        = {{ The impossible book }},"));
        assert!(output.bibtex.contains("year         = 1942,"));
        assert!(output.bibtex.contains("publisher    = {Culinary Expert Series}"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_full_layout() {
        let output = tidy(FIXTURE);
        let expected = "@article{steward03,\n\
\ttitle        = {{Cooking behind bars}},\n\
\tauthor       = {Martha Steward},\n\
\tyear         = 2003,\n\
\tpublisher    = {Culinary Expert Series}\n\
}\n\
\n\
@book{impossible,\n\
\ttitle        = {{ The impossible book }},\n\
\tauthor       = { Stefan Sweig },\n\
\tyear         = 1942,\n\
\tmonth        = mar,\n\
\tpublisher    = { Dead Poet Society}\n\
}\n";
        assert_eq!(output.bibtex, expected);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            FIXTURE,
            r#"@misc{k, note = "say {"}hi{"}" # jan, title = {{Already} {Braced}}}"#,
            "% free text\n@string{acm = {ACM}}\n@online{x, url = {http://example.com}}",
            "@misc{lonely}",
        ];

        for input in inputs {
            let once = tidy(input).bibtex;
            let twice = tidy(&once).bibtex;
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_removes_empty_and_duplicate_fields() {
        let output = tidy(r#"@misc{k, note = {}, Year = "2020", title = {A   b}, author = {X}, author = {Y}}"#);
        assert_eq!(
            output.bibtex,
            "@misc{k,\n\ttitle        = {{A b}},\n\tauthor       = {X},\n\tyear         = 2020\n}\n"
        );
    }

    #[test]
    fn test_unknown_fields_sorted_alphabetically_after_known() {
        let output = tidy("@online{k, zeta = {z}, url = {u}, alpha = {a}, title = {t}}");
        let names: Vec<&str> = output
            .bibtex
            .lines()
            .filter_map(|l| l.strip_prefix('\t'))
            .filter_map(|l| l.split_whitespace().next())
            .collect();
        assert_eq!(names, vec!["title", "url", "alpha", "zeta"]);
    }

    #[test]
    fn test_long_field_names_are_not_truncated() {
        let output = tidy("@misc{k, howpublished = {web}, organization = {ACME}}");
        assert!(output.bibtex.contains("\thowpublished = {web}"));
        assert!(output.bibtex.contains("\torganization = {ACME}"));
    }

    #[test]
    fn test_numeric_rules() {
        let output = tidy(r#"@misc{k, year = "2020", volume = {007}, pages = {1--10}}"#);
        assert!(output.bibtex.contains("year         = 2020"));
        assert!(output.bibtex.contains("volume       = {007}"));
        assert!(output.bibtex.contains("pages        = {1--10}"));
    }

    #[test]
    fn test_quoted_content_converted_to_braces() {
        let output = tidy(r#"@book{k, title = "He said {"}hi{"}", publisher = "P"}"#);
        assert!(output.bibtex.contains(r#"title        = {{He said {"}hi{"}}}"#));
        assert!(output.bibtex.contains("publisher    = {P}"));
    }

    #[test]
    fn test_partially_braced_title_is_wrapped() {
        let output = tidy("@misc{k, title = {{A} and {B}}}");
        assert!(output.bibtex.contains("title        = {{{A} and {B}}}"));
    }

    #[test]
    fn test_duplicate_keys_warn() {
        let output = tidy("@misc{same, title = {A}}\n@misc{Same, title = {B}}");
        assert_eq!(output.warnings, vec!["Duplicate key: Same".to_string()]);
        assert_eq!(output.bibtex.matches("@misc{").count(), 2);
    }

    #[test]
    fn test_preserves_verbatim_and_text() {
        let output = tidy("Some notes\n@preamble{\"\\newcommand{\\x}{y}\"}\n@misc{k, title = {T}}");
        assert!(output.bibtex.starts_with("Some notes\n\n@preamble{"));
        assert!(output.bibtex.ends_with("}\n"));
    }

    #[test]
    fn test_email_in_leading_comment_is_kept_whole() {
        let output = tidy("% Exported by jane@example.org\n@misc{k, title = {T}}");
        assert!(output.bibtex.starts_with("% Exported by jane@example.org\n"));
        assert!(output.bibtex.contains("@misc{k,\n\ttitle        = {{T}}\n}"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_parenthesized_entry_is_formatted() {
        let output = tidy("@Article(k, Title = \"T\", year = {1999})");
        assert_eq!(
            output.bibtex,
            "@article{k,\n\ttitle        = {{T}},\n\tyear         = 1999\n}\n"
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_malformed_input_never_fails() {
        let output = tidy("@article{broken, title = {oops");
        assert_eq!(output.bibtex, "@article{broken, title = {oops\n");
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let output = tidy("   \n");
        assert_eq!(output.bibtex, "");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_quotes_kept_when_not_curly() {
        let formatter = Tidy::new(TidyOptions {
            curly: false,
            ..TidyOptions::default()
        });
        let output = formatter.tidy(r#"@misc{k, note = "n"}"#);
        assert!(output.bibtex.contains("note         = \"n\""));
    }

    #[test]
    fn test_is_enclosed() {
        assert!(is_enclosed("{A}"));
        assert!(is_enclosed("{{A} B}"));
        assert!(!is_enclosed("{A} {B}"));
        assert!(!is_enclosed(" {A}"));
        assert!(!is_enclosed("A"));
    }
}
