//! SQL identifier sanitization.
//!
//! Identifier positions cannot be parameter-bound, so every table or column
//! name a caller supplies is validated and quoted here before it is embedded
//! in generated SQL text. This is the sole injection defense: a name that
//! fails validation never reaches the engine.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GlimpseError, Result};

/// Upper bound on identifier length.
const MAX_IDENTIFIER_LEN: usize = 255;

/// Upper bound on caller-supplied aggregate expressions.
const MAX_EXPRESSION_LEN: usize = 1000;

/// Validates a table or column name without escaping it.
///
/// Names coming out of real datasets are messy (spaces, mixed case, dashes),
/// so the rule is not an allowlist of "pretty" identifiers: anything goes
/// except characters that could terminate the quoted context or smuggle in
/// further statements.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(GlimpseError::security(
            "identifier cannot be empty or whitespace-only",
        ));
    }
    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(GlimpseError::security(format!(
            "identifier too long ({} bytes, max {MAX_IDENTIFIER_LEN})",
            identifier.len()
        )));
    }
    if identifier.chars().any(|c| c.is_control()) {
        return Err(GlimpseError::security(
            "identifier cannot contain control characters",
        ));
    }
    if identifier.contains(['"', '\'', '`', ';', '\\']) {
        return Err(GlimpseError::security(format!(
            "identifier {identifier:?} contains a quote or statement terminator"
        )));
    }
    if identifier.contains("--") || identifier.contains("/*") || identifier.contains("*/") {
        return Err(GlimpseError::security(format!(
            "identifier {identifier:?} contains a comment token"
        )));
    }
    Ok(())
}

/// Validates and escapes an identifier for embedding in SQL text.
///
/// The result is double-quoted. Embedded double quotes never need doubling
/// because [`validate_identifier`] rejects them outright.
pub fn escape_identifier(identifier: &str) -> Result<String> {
    validate_identifier(identifier)?;
    Ok(format!("\"{identifier}\""))
}

/// Validates a caller-supplied aggregate expression such as `count(*)` or
/// `sum(amount)`.
///
/// Aggregate expressions are the one place callers hand us raw SQL, so the
/// check is stricter than for identifiers: statement terminators, comment
/// tokens, and mutating keywords are all rejected.
pub fn validate_aggregate_expression(expression: &str) -> Result<()> {
    if expression.trim().is_empty() {
        return Err(GlimpseError::security(
            "aggregate expression cannot be empty",
        ));
    }
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(GlimpseError::security(format!(
            "aggregate expression too long ({} bytes, max {MAX_EXPRESSION_LEN})",
            expression.len()
        )));
    }
    if expression.chars().any(|c| c.is_control()) {
        return Err(GlimpseError::security(
            "aggregate expression cannot contain control characters",
        ));
    }
    if expression.contains([';', '\'', '"', '`', '\\']) {
        return Err(GlimpseError::security(
            "aggregate expression contains a quote or statement terminator",
        ));
    }
    if expression.contains("--") || expression.contains("/*") || expression.contains("*/") {
        return Err(GlimpseError::security(
            "aggregate expression contains a comment token",
        ));
    }

    static MUTATING_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
        // Hard-coded pattern, known valid.
        #[allow(clippy::expect_used)]
        Regex::new(
            r"(?i)\b(drop|create|alter|truncate|insert|update|delete|attach|copy|union|select)\b",
        )
        .expect("hard-coded regex pattern should be valid")
    });
    if let Some(found) = MUTATING_KEYWORDS.find(expression) {
        return Err(GlimpseError::security(format!(
            "aggregate expression contains disallowed keyword {:?}",
            found.as_str()
        )));
    }

    Ok(())
}
