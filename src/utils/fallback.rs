//! Ordered fallback chains for metadata extraction.

/// A single extraction rule in a fallback chain
pub type Extractor<'a> = Box<dyn Fn() -> Option<String> + 'a>;

/// Run extractors in order and return the first non-empty (after trimming) value
///
/// Returns an empty string when no extractor produces a value.
pub fn first_non_empty(extractors: &[Extractor<'_>]) -> String {
    extractors
        .iter()
        .filter_map(|extract| extract())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_value_wins() {
        let chain: Vec<Extractor> = vec![
            Box::new(|| None),
            Box::new(|| Some("second".to_string())),
            Box::new(|| Some("third".to_string())),
        ];
        assert_eq!(first_non_empty(&chain), "second");
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let chain: Vec<Extractor> = vec![
            Box::new(|| Some(String::new())),
            Box::new(|| Some("   ".to_string())),
            Box::new(|| Some("value".to_string())),
        ];
        assert_eq!(first_non_empty(&chain), "value");
    }

    #[test]
    fn test_empty_chain() {
        let chain: Vec<Extractor> = vec![Box::new(|| None)];
        assert_eq!(first_non_empty(&chain), "");
        assert_eq!(first_non_empty(&[]), "");
    }

    #[test]
    fn test_stops_at_first_match() {
        let calls = Cell::new(0);
        let chain: Vec<Extractor> = vec![
            Box::new(|| {
                calls.set(calls.get() + 1);
                Some("hit".to_string())
            }),
            Box::new(|| {
                calls.set(calls.get() + 1);
                Some("miss".to_string())
            }),
        ];
        assert_eq!(first_non_empty(&chain), "hit");
        assert_eq!(calls.get(), 1);
    }
}
