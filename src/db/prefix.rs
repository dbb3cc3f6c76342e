//! Identifier quoting, literal quoting and table-prefix rewriting.
//!
//! Stored SQL refers to tables through a logical token (`#__content`). Before a
//! statement reaches the native client the token is rewritten to the installation's
//! physical prefix (`jos_content`), so several installations can share one database.
//! The rewrite must leave string literals alone: a value such as `'#__ is a token'`
//! is data, not a table name. The exception is a sequence-function argument such as
//! `nextval('#__items_seq')`, which names a relation even though it is quoted.

use std::ops::Range;

/// Default logical prefix token.
pub const PREFIX_TOKEN: &str = "#__";

/// Functions whose quoted argument names a sequence.
const SEQUENCE_FUNCTIONS: [&str; 3] = ["currval", "nextval", "setval"];

/// Escape a string for inclusion in a single-quoted SQL literal.
pub fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

/// Wrap a string in single quotes, escaping embedded quotes.
pub fn quote(text: &str) -> String {
    format!("'{}'", escape(text))
}

/// Quote an identifier, handling `schema.table` style names.
///
/// Parts that are already wrapped in the quote character are left as they are,
/// so quoting an already-quoted name is a no-op.
pub fn quote_name(name: &str, quote_char: char) -> String {
    if is_quoted(name, quote_char) {
        return name.to_string();
    }
    name.split('.')
        .map(|part| quote_part(part, quote_char))
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote an identifier and give it an alias.
pub fn quote_name_as(name: &str, alias: &str, quote_char: char) -> String {
    format!(
        "{} AS {}",
        quote_name(name, quote_char),
        quote_name(alias, quote_char)
    )
}

fn is_quoted(part: &str, quote_char: char) -> bool {
    part.len() >= 2 && part.starts_with(quote_char) && part.ends_with(quote_char)
}

fn quote_part(part: &str, quote_char: char) -> String {
    if part == "*" || is_quoted(part, quote_char) {
        return part.to_string();
    }
    let doubled: String = [quote_char, quote_char].iter().collect();
    format!(
        "{q}{}{q}",
        part.replace(quote_char, &doubled),
        q = quote_char
    )
}

/// Rewrite every `token` outside single-quoted literals to `prefix`.
///
/// Inside literals the token is only rewritten when the literal sits in the argument
/// list of `currval`, `nextval` or `setval`.
pub fn replace_prefix(sql: &str, token: &str, prefix: &str) -> String {
    let sql = sql.trim();
    if token.is_empty() {
        return sql.to_string();
    }
    if !sql.contains('\'') {
        return sql.replace(token, prefix);
    }

    let zones = sequence_argument_zones(sql);
    let mut out = String::with_capacity(sql.len() + prefix.len());
    let mut offset = 0;

    for (idx, segment) in sql.split('\'').enumerate() {
        if idx > 0 {
            out.push('\'');
        }
        if idx % 2 == 0 {
            out.push_str(&segment.replace(token, prefix));
        } else {
            let mut last = 0;
            for (pos, _) in segment.match_indices(token) {
                let absolute = offset + pos;
                if zones.iter().any(|z| z.contains(&absolute)) {
                    out.push_str(&segment[last..pos]);
                    out.push_str(prefix);
                    last = pos + token.len();
                }
            }
            out.push_str(&segment[last..]);
        }
        offset += segment.len() + 1;
    }

    out
}

/// Byte ranges covering the parenthesised argument lists of sequence functions.
///
/// Only calls written outside literals count: a function name inside a quoted
/// value is data.
fn sequence_argument_zones(sql: &str) -> Vec<Range<usize>> {
    let lower = sql.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let in_literal = literal_mask(bytes);
    let mut zones = Vec::new();

    for function in SEQUENCE_FUNCTIONS {
        for (start, _) in lower.match_indices(function) {
            if in_literal[start] {
                continue;
            }
            let preceded_by_ident = start > 0 && is_ident_byte(bytes[start - 1]);
            if preceded_by_ident {
                continue;
            }
            let mut open = start + function.len();
            while open < bytes.len() && bytes[open].is_ascii_whitespace() {
                open += 1;
            }
            if bytes.get(open) != Some(&b'(') {
                continue;
            }
            zones.push(open..closing_paren(bytes, open));
        }
    }

    zones
}

/// For each byte, whether it sits inside a single-quoted literal. Quote bytes
/// themselves count as outside.
fn literal_mask(bytes: &[u8]) -> Vec<bool> {
    let mut inside = false;
    bytes
        .iter()
        .map(|&b| {
            if b == b'\'' {
                inside = !inside;
                false
            } else {
                inside
            }
        })
        .collect()
}

/// Index one past the `)` matching the `(` at `open`, ignoring parens in literals.
///
/// `open` must be outside any literal.
fn closing_paren(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut in_literal = false;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'\'' => in_literal = !in_literal,
            b'(' if !in_literal => depth += 1,
            b')' if !in_literal => {
                depth -= 1;
                if depth == 0 {
                    return idx + 1;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_outside_literals() {
        assert_eq!(
            replace_prefix("SELECT * FROM #__users JOIN #__groups", "#__", "jos_"),
            "SELECT * FROM jos_users JOIN jos_groups"
        );
    }

    #[test]
    fn test_literal_left_untouched() {
        assert_eq!(
            replace_prefix(
                "UPDATE #__content SET title = 'about #__ tokens' WHERE id = 1",
                "#__",
                "jos_"
            ),
            "UPDATE jos_content SET title = 'about #__ tokens' WHERE id = 1"
        );
    }

    #[test]
    fn test_literal_at_start_of_statement() {
        assert_eq!(
            replace_prefix("'#__x' || #__y", "#__", "p_"),
            "'#__x' || p_y"
        );
    }

    #[test]
    fn test_sequence_argument_is_rewritten() {
        assert_eq!(
            replace_prefix("SELECT nextval('#__items_id_seq')", "#__", "jos_"),
            "SELECT nextval('jos_items_id_seq')"
        );
        assert_eq!(
            replace_prefix("SELECT setval('#__a_seq', 10), currval('#__b_seq')", "#__", "x_"),
            "SELECT setval('x_a_seq', 10), currval('x_b_seq')"
        );
    }

    #[test]
    fn test_every_sequence_call_is_rewritten() {
        assert_eq!(
            replace_prefix(
                "SELECT nextval('#__a'), nextval('#__b'), nextval('#__c')",
                "#__",
                "p_"
            ),
            "SELECT nextval('p_a'), nextval('p_b'), nextval('p_c')"
        );
    }

    #[test]
    fn test_literal_after_sequence_call_untouched() {
        assert_eq!(
            replace_prefix(
                "INSERT INTO #__t (id, note) VALUES (NEXTVAL('#__t_seq'), '#__keep')",
                "#__",
                "p_"
            ),
            "INSERT INTO p_t (id, note) VALUES (NEXTVAL('p_t_seq'), '#__keep')"
        );
    }

    #[test]
    fn test_function_name_inside_identifier_is_not_a_sequence_call() {
        assert_eq!(
            replace_prefix("SELECT my_nextval('#__a') FROM #__b", "#__", "p_"),
            "SELECT my_nextval('#__a') FROM p_b"
        );
    }

    #[test]
    fn test_function_name_inside_literal_is_data() {
        assert_eq!(
            replace_prefix(
                "UPDATE #__t SET note = 'call nextval(#__x) later' WHERE id = 1",
                "#__",
                "jos_"
            ),
            "UPDATE jos_t SET note = 'call nextval(#__x) later' WHERE id = 1"
        );
    }

    #[test]
    fn test_unclosed_call_inside_literal_does_not_leak() {
        assert_eq!(
            replace_prefix(
                "INSERT INTO #__t (a, b) VALUES ('nextval(', '#__keep')",
                "#__",
                "jos_"
            ),
            "INSERT INTO jos_t (a, b) VALUES ('nextval(', '#__keep')"
        );
        assert_eq!(
            replace_prefix(
                "INSERT INTO #__t (a, b) VALUES ('it''s setval(', nextval('#__seq'))",
                "#__",
                "p_"
            ),
            "INSERT INTO p_t (a, b) VALUES ('it''s setval(', nextval('p_seq'))"
        );
    }

    #[test]
    fn test_statement_is_trimmed() {
        assert_eq!(replace_prefix("  SELECT 1 FROM #__t \n", "#__", "p_"), "SELECT 1 FROM p_t");
    }

    #[test]
    fn test_custom_token_and_empty_prefix() {
        assert_eq!(replace_prefix("SELECT * FROM {pfx}t", "{pfx}", ""), "SELECT * FROM t");
        assert_eq!(replace_prefix("SELECT '#__'", "", "p_"), "SELECT '#__'");
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("users", '"'), "\"users\"");
        assert_eq!(quote_name("main.users", '"'), "\"main\".\"users\"");
        assert_eq!(quote_name("t.*", '"'), "\"t\".*");
        assert_eq!(quote_name("odd\"name", '"'), "\"odd\"\"name\"");
    }

    #[test]
    fn test_quote_name_is_idempotent() {
        let once = quote_name("#__users", '"');
        assert_eq!(quote_name(&once, '"'), once);
        assert_eq!(quote_name("\"a.b\"", '"'), "\"a.b\"");
    }

    #[test]
    fn test_quote_name_as() {
        assert_eq!(quote_name_as("a.id", "key", '"'), "\"a\".\"id\" AS \"key\"");
    }

    #[test]
    fn test_quote_and_escape() {
        assert_eq!(escape("it's"), "it''s");
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote(""), "''");
    }
}
