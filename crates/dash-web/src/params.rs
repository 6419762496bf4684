//! Bind-list extraction from URL query parameters.
//!
//! A key takes part in binding when its uppercased form is exactly `PARAM_`
//! followed by zero or more ASCII digits. Matching keys are sorted by their
//! original spelling (plain byte order, so `PARAM_10` sorts before `PARAM_2`)
//! and their values become the positional parameters of the template.
//!
//! Keys that differ only by case are distinct and may both match. Callers
//! must keep parameter keys case-distinct; this is not validated here.
//!
//! The match is anchored at both ends. This differs from an unanchored
//! `PARAM_[0-9]*` search: keys like `X_PARAM_1` or `PARAM_1_label` would
//! match such a search but do not bind here.

use std::collections::HashSet;

pub const PARAM_PREFIX: &str = "PARAM_";

/// Whether a query key names a positional bind parameter.
pub fn is_bind_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    upper
        .strip_prefix(PARAM_PREFIX)
        .is_some_and(|suffix| suffix.bytes().all(|b| b.is_ascii_digit()))
}

/// Build the ordered bind list from a parameter bag.
///
/// When a key repeats, its first value wins.
pub fn bind_list(bag: &[(String, String)]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selected: Vec<(&str, &str)> = Vec::new();
    for (key, value) in bag {
        if !is_bind_key(key) || !seen.insert(key.as_str()) {
            continue;
        }
        selected.push((key.as_str(), value.as_str()));
    }
    selected.sort_by(|a, b| a.0.cmp(b.0));
    selected
        .into_iter()
        .map(|(_, value)| value.to_string())
        .collect()
}

/// Collapse a parameter bag to one value per key, first occurrence wins.
pub fn first_values(bag: &[(String, String)]) -> Vec<(String, String)> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(bag.len());
    bag.iter()
        .filter(|(key, _)| seen.insert(key.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn selects_and_orders_param_keys() {
        let bag = bag(&[("PARAM_2", "b"), ("PARAM_1", "a"), ("OTHER", "x")]);
        assert_eq!(bind_list(&bag), vec!["a", "b"]);
    }

    #[test]
    fn extraction_is_deterministic_across_input_orders() {
        let forward = bag(&[("PARAM_1", "a"), ("PARAM_3", "c"), ("PARAM_2", "b")]);
        let backward = bag(&[("PARAM_2", "b"), ("PARAM_3", "c"), ("PARAM_1", "a")]);
        assert_eq!(bind_list(&forward), bind_list(&backward));
        assert_eq!(bind_list(&forward), bind_list(&forward));
    }

    #[test]
    fn no_matching_keys_yields_empty_list() {
        let bag = bag(&[("view", "grid"), ("PARAMX", "1")]);
        assert!(bind_list(&bag).is_empty());
        assert!(bind_list(&[]).is_empty());
    }

    #[test]
    fn matching_is_case_insensitive_but_keys_stay_distinct() {
        let bag = bag(&[("param_1", "lower"), ("PARAM_1", "upper")]);
        // Both spellings match; byte order puts the uppercase key first.
        assert_eq!(bind_list(&bag), vec!["upper", "lower"]);
    }

    #[test]
    fn bare_prefix_matches_and_trailing_garbage_does_not() {
        assert!(is_bind_key("PARAM_"));
        assert!(is_bind_key("Param_007"));
        assert!(!is_bind_key("PARAM_1X"));
        assert!(!is_bind_key("XPARAM_1"));
        assert!(!is_bind_key("PARAM"));
    }

    #[test]
    fn ordering_is_lexicographic_not_numeric() {
        let bag = bag(&[("PARAM_2", "two"), ("PARAM_10", "ten")]);
        assert_eq!(bind_list(&bag), vec!["ten", "two"]);
    }

    #[test]
    fn repeated_key_keeps_first_value() {
        let bag = bag(&[("PARAM_1", "first"), ("PARAM_1", "second")]);
        assert_eq!(bind_list(&bag), vec!["first"]);
        assert_eq!(first_values(&bag), vec![("PARAM_1".into(), "first".into())]);
    }

    #[test]
    fn embedded_param_names_do_not_bind() {
        let bag = bag(&[("X_PARAM_1", "x"), ("PARAM_1_label", "l"), ("PARAM_1", "a")]);
        assert_eq!(bind_list(&bag), vec!["a"]);
    }

    #[test]
    fn first_values_keeps_arrival_order_over_many_keys() {
        let mut pairs: Vec<(String, String)> = (0..2000)
            .map(|i| (format!("k{i}"), format!("v{i}")))
            .collect();
        pairs.push(("k7".into(), "late".into()));
        let collapsed = first_values(&pairs);
        assert_eq!(collapsed.len(), 2000);
        assert_eq!(collapsed[7], ("k7".into(), "v7".into()));
        assert_eq!(collapsed[1999].0, "k1999");
    }
}
