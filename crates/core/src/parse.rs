//! Best-effort numeric parsing for configuration and filter inputs
//!
//! These helpers accept the converter's configuration syntax: decimal or
//! `0x`-prefixed hex tokens, with multiple tokens XOR-combined when joined
//! by `^`. They are used only when reading settings files and building
//! filters, never on the wire decode path.

fn parse_token_i64(token: &str) -> Option<i64> {
    let trimmed = token.trim().to_ascii_lowercase();
    if let Some(hex) = trimmed.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else {
        trimmed.parse().ok()
    }
}

/// Parse a string to i64, XOR-combining `^`-separated tokens.
///
/// `"0x10 ^ 0x01"` parses to 17; `"42"` parses to 42. Returns `None`
/// when any token fails to parse.
pub fn parse_i64(input: &str) -> Option<i64> {
    let mut value = 0i64;
    for token in input.split('^') {
        value ^= parse_token_i64(token)?;
    }
    Some(value)
}

/// Parse a string to i32 with the same syntax as [`parse_i64`].
pub fn parse_i32(input: &str) -> Option<i32> {
    let mut value = 0i32;
    for token in input.split('^') {
        value ^= i32::try_from(parse_token_i64(token)?).ok()?;
    }
    Some(value)
}

/// Parse a float, falling back to `default` on malformed input.
pub fn parse_f32_or(input: &str, default: f32) -> f32 {
    input.trim().parse().unwrap_or(default)
}
