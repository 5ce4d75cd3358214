//! Pipeline chaining detection
//!
//! A python unit chains to another pipeline when its code contains a literal
//! call such as `Pipeline("daily.xml")`. This is a lexical scan for that one
//! pattern: paths built at runtime (variables, concatenation, f-strings) are
//! not detected.

use regex::Regex;
use std::sync::OnceLock;
use tagflow_markup::{Table, UnitType};

static CHAIN_REGEX: OnceLock<Regex> = OnceLock::new();

fn chain_regex() -> &'static Regex {
    CHAIN_REGEX.get_or_init(|| {
        Regex::new(r#"Pipeline\(['"](.*?\.xml)['"]\)"#).expect("chain regex is valid")
    })
}

/// First pipeline file named by a `Pipeline('<file>.xml')` call in the code
pub fn detect_chain(code: &str) -> Option<String> {
    if !code.contains("Pipeline(") {
        return None;
    }
    chain_regex()
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Chain target of a unit; only python units can chain
pub fn chain_for(table: &Table) -> Option<String> {
    match table.unit_type {
        UnitType::Python => detect_chain(&table.code),
        UnitType::Sql => None,
    }
}
