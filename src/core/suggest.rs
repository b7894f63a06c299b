//! Field suggestions for the comma-delimited `fields` parameter
//!
//! Two tiers, both literal substring matches (case-sensitive):
//! 1. keys containing the term
//! 2. if no key matched, keys whose description contains the term
//!
//! Results keep table declaration order.

use super::catalog::FieldDefinition;

/// The segment after the last comma, i.e. what the user is typing now
pub fn current_term(input: &str) -> &str {
    input.rsplit(',').next().unwrap_or("")
}

/// Suggested keys for `term`. An empty term matches every key.
pub fn suggest(table: &[FieldDefinition], term: &str) -> Vec<String> {
    let by_key: Vec<String> = table
        .iter()
        .filter(|def| def.key.contains(term))
        .map(|def| def.key.clone())
        .collect();

    if !by_key.is_empty() {
        return by_key;
    }

    table
        .iter()
        .filter(|def| def.description.contains(term))
        .map(|def| def.key.clone())
        .collect()
}

/// Replace the last comma segment of `input` with `choice`
pub fn replace_last_segment(input: &str, choice: &str) -> String {
    let mut segments: Vec<&str> = input.split(',').collect();
    segments.pop();
    segments.push(choice);
    segments.join(",")
}
