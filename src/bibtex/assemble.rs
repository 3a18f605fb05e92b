//! Turn a [`BibRecord`] into formatted BibTeX.

use crate::models::{BibRecord, Delimiter};

use super::tidy::BibFormatter;

/// Render a record as raw BibTeX, before formatting
///
/// Values are written with the record's delimiter. A value whose braces do
/// not balance has them removed, and `"` inside a quoted value is protected
/// as `{"}`, so the result always parses.
pub fn render(record: &BibRecord) -> String {
    let mut out = format!("@{}{{{},\n", record.entry_type, record.key);

    for field in &record.fields {
        let value = delimit(&field.value, record.delimiter);
        out.push_str(&format!("    {} = {},\n", field.name, value));
    }

    out.push('}');
    out
}

/// Render a record and pass it through the formatter
pub fn assemble(record: &BibRecord, formatter: &dyn BibFormatter) -> String {
    formatter.tidy(&render(record)).bibtex
}

fn delimit(value: &str, delimiter: Delimiter) -> String {
    let value = if braces_balanced(value) {
        value.to_string()
    } else {
        value.replace(['{', '}'], "")
    };

    match delimiter {
        Delimiter::Braces => format!("{{{}}}", value),
        Delimiter::Quotes => format!("\"{}\"", value.replace('"', "{\"}")),
    }
}

fn braces_balanced(value: &str) -> bool {
    let mut depth = 0i64;
    for c in value.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
