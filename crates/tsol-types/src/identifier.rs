//! Escaping of rich identifiers into plain identifiers.
//!
//! Rich identifiers use `(`, `)` and `,` to show structure. Code generators
//! need names from `[A-Za-z0-9_$]` only, so those characters are rewritten
//! with `$` as an escape prefix:
//!
//! | input | output |
//! |-------|--------|
//! | `$`   | `$$`   |
//! | `(`   | `$o`   |
//! | `)`   | `$c`   |
//! | `,`   | `$s`   |
//!
//! Every escape sequence starts with `$` and `$` never appears unescaped in
//! the output, so the mapping is a prefix code and [`unescape_identifier`]
//! inverts it exactly.

/// Escape `$`, `(`, `)` and `,` in `input`.
pub fn escape_identifier(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for c in input.chars() {
        match c {
            '$' => out.push_str("$$"),
            '(' => out.push_str("$o"),
            ')' => out.push_str("$c"),
            ',' => out.push_str("$s"),
            other => out.push(other),
        }
    }
    out
}

/// Invert [`escape_identifier`]. Returns `None` on a malformed escape.
pub fn unescape_identifier(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            '$' => '$',
            'o' => '(',
            'c' => ')',
            's' => ',',
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

/// True if `s` is usable as an identifier by the code generator.
pub fn is_valid_identifier(s: &str) -> bool {
    !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
