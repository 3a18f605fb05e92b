//! Citation key generation.
//!
//! Keys are built from author surnames, years and host names and are always
//! reduced to ASCII word characters. Accented letters are dropped, not
//! transliterated: `Müller` becomes `Mller`.

/// Key used when a source has nothing to build a key from
pub const UNKNOWN_KEY: &str = "unknown";

/// Remove every character that is not an ASCII letter, digit or underscore
pub fn clean_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Final whitespace-delimited token of a full name (`"John Q. Doe"` -> `"Doe"`)
pub fn last_name(full_name: &str) -> &str {
    full_name.split_whitespace().last().unwrap_or("")
}

/// Key for a web page: capitalized host labels followed by the year
///
/// `("example.com", "2020")` -> `ExampleCom2020`
pub fn url_key(host: &str, year: &str) -> String {
    let labels: String = host.split('.').map(capitalize).collect();
    clean_string(&format!("{}{}", labels, year))
}

/// `<lastName>_<year>`, with the separator only when both parts survive cleaning
pub fn author_year_key(last_name: &str, year: &str) -> String {
    let name = clean_string(last_name);
    let year = clean_string(year);

    match (name.is_empty(), year.is_empty()) {
        (false, false) => format!("{}_{}", name, year),
        (false, true) => name,
        (true, false) => year,
        (true, true) => String::new(),
    }
}

/// Key for a book record
///
/// The surname defaults to `unknown` when the record has no author.
pub fn isbn_key(first_author: Option<&str>, year: &str) -> String {
    let surname = first_author
        .map(last_name)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_KEY);

    non_empty_or_unknown(author_year_key(surname, year))
}

/// Key for an arXiv record; `unknown` when neither surname nor year exist
pub fn arxiv_key(first_author: Option<&str>, year: &str) -> String {
    let surname = first_author.map(last_name).unwrap_or("");
    non_empty_or_unknown(author_year_key(surname, year))
}

fn non_empty_or_unknown(key: String) -> String {
    if key.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        key
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
