// Field coercion for the tab-delimited source files
//
// Every coercion is a tagged result:
//   Ok(Some(v)) -> value present
//   Ok(None)    -> token was empty or whitespace only
//   Err(_)      -> token present but malformed

use crate::error::FieldError;
use bigdecimal::{BigDecimal, ToPrimitive};
use std::str::FromStr;

pub type Coerced<T> = Result<Option<T>, FieldError>;

fn is_blank(token: &str) -> bool {
    token.trim().is_empty()
}

/// `"True"` → true, `"False"` → false, anything else → None. Never fails.
pub fn string_to_boolean(token: &str) -> Option<bool> {
    match token {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

/// Property-type columns use 0/1, older files spell them out
pub fn nullable_flag(token: &str) -> Coerced<bool> {
    if is_blank(token) {
        return Ok(None);
    }
    match token.trim() {
        "1" | "True" => Ok(Some(true)),
        "0" | "False" => Ok(Some(false)),
        _ => Err(FieldError::InvalidFlag(token.to_string())),
    }
}

/// Integer columns sometimes arrive as `7.0`; the fraction is truncated
pub fn nullable_int(token: &str) -> Coerced<i64> {
    let Some(value) = nullable_decimal(token).map_err(|_| FieldError::InvalidInt(token.to_string()))?
    else {
        return Ok(None);
    };
    value
        .with_scale(0)
        .to_i64()
        .map(Some)
        .ok_or_else(|| FieldError::InvalidInt(token.to_string()))
}

pub fn nullable_string(token: &str) -> Option<String> {
    if is_blank(token) {
        None
    } else {
        Some(token.to_string())
    }
}

/// Exact decimal; accepts the `.5532` / `-.375` spellings used by the feed
pub fn nullable_decimal(token: &str) -> Coerced<BigDecimal> {
    if is_blank(token) {
        return Ok(None);
    }
    let trimmed = token.trim();
    let normalized = if let Some(rest) = trimmed.strip_prefix("-.") {
        format!("-0.{}", rest)
    } else if let Some(rest) = trimmed.strip_prefix('.') {
        format!("0.{}", rest)
    } else {
        trimmed.to_string()
    };

    // BigDecimal also takes exponents; the feed never uses them and a stray
    // letter should be rejected rather than read as scientific notation.
    if !normalized
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
    {
        return Err(FieldError::InvalidDecimal(token.to_string()));
    }
    // "." and "-." normalize to a bare "0." which BigDecimal reads as zero
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(FieldError::InvalidDecimal(token.to_string()));
    }

    BigDecimal::from_str(&normalized)
        .map(Some)
        .map_err(|_| FieldError::InvalidDecimal(token.to_string()))
}

pub fn nullable_float(token: &str) -> Coerced<f64> {
    if is_blank(token) {
        return Ok(None);
    }
    token
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FieldError::InvalidFloat(token.to_string()))
}

/// Non-nullable column: a blank token is an error
pub fn required<T>(coerced: Coerced<T>) -> Result<T, FieldError> {
    coerced?.ok_or(FieldError::Missing)
}
