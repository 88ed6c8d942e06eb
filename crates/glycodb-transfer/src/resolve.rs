use std::collections::BTreeSet;

use serde::Serialize;

/// Which rule produced a table match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    CaseInsensitive,
    SnakeCase,
    SnakeCaseInsensitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMatch {
    pub table: String,
    pub rule: MatchRule,
}

/// Convert `CamelCase` to `snake_case`: an underscore goes before every
/// uppercase letter except a leading one, and everything is lowercased.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

fn match_name(candidate: &str, known: &BTreeSet<String>) -> Option<(String, bool)> {
    if known.contains(candidate) {
        return Some((candidate.to_string(), true));
    }
    let folded = candidate.to_lowercase();
    // BTreeSet order keeps the pick deterministic when several names fold together
    known
        .iter()
        .find(|t| t.to_lowercase() == folded)
        .map(|t| (t.clone(), false))
}

/// Map a CSV file stem to one of the `known` table names.
///
/// Rules, first match wins: exact, case-insensitive, then the same two on
/// the snake_case form of `candidate`.
pub fn resolve_table_name(candidate: &str, known: &BTreeSet<String>) -> Option<TableMatch> {
    if let Some((table, exact)) = match_name(candidate, known) {
        let rule = if exact {
            MatchRule::Exact
        } else {
            MatchRule::CaseInsensitive
        };
        return Some(TableMatch { table, rule });
    }

    let snake = camel_to_snake(candidate);
    match_name(&snake, known).map(|(table, exact)| TableMatch {
        table,
        rule: if exact {
            MatchRule::SnakeCase
        } else {
            MatchRule::SnakeCaseInsensitive
        },
    })
}
