//! Reversible mapping between Pd class names and XML element names.
//!
//! Operator classes use a fixed table (`+` is `op_plus`, `+~` is
//! `op_plus_tilde`). Everything else is escaped one character at a time:
//! `_` doubles, `~` becomes `_tilde`, and any character not allowed in an
//! XML name becomes `_x{hex}_`. Since every literal underscore is doubled, a
//! single underscore in a tag always starts an escape.

use crate::error::{PatchError, Result};

/// Element name used for an object box with no text.
pub const EMPTY_TAG: &str = "_";

const TILDE: &str = "_tilde";

const OPERATORS: [(&str, &str); 18] = [
    ("+", "op_plus"),
    ("-", "op_minus"),
    ("*", "op_mul"),
    ("/", "op_div"),
    ("%", "op_mod"),
    ("==", "op_eq"),
    ("!=", "op_ne"),
    (">", "op_gt"),
    ("<", "op_lt"),
    (">=", "op_ge"),
    ("<=", "op_le"),
    ("||", "op_or"),
    ("&&", "op_and"),
    ("!", "op_not"),
    ("&", "binop_and"),
    ("|", "binop_bor"),
    (">>", "binop_rs"),
    ("<<", "binop_ls"),
];

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '.'
}

fn malformed(name: &str, reason: impl Into<String>) -> PatchError {
    PatchError::MalformedName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

pub fn to_xml_tag(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(malformed(id, "empty identifier"));
    }

    let (stem, tilde) = match id.strip_suffix('~') {
        Some(stem) if !stem.is_empty() => (stem, true),
        _ => (id, false),
    };
    if let Some((_, tag)) = OPERATORS.iter().find(|(op, _)| *op == stem) {
        return Ok(if tilde {
            format!("{tag}{TILDE}")
        } else {
            tag.to_string()
        });
    }

    let mut tag = String::with_capacity(id.len());
    for (i, ch) in id.chars().enumerate() {
        match ch {
            '_' => tag.push_str("__"),
            '~' => tag.push_str(TILDE),
            ch if (i == 0 && is_name_start(ch)) || (i > 0 && is_name_char(ch)) => tag.push(ch),
            ch => tag.push_str(&format!("_x{:x}_", ch as u32)),
        }
    }
    Ok(tag)
}

pub fn from_xml_tag(tag: &str) -> Result<String> {
    if tag.is_empty() {
        return Err(malformed(tag, "empty tag"));
    }

    let (stem, tilde) = match tag.strip_suffix(TILDE) {
        Some(stem) => (stem, true),
        None => (tag, false),
    };
    if let Some((op, _)) = OPERATORS.iter().find(|(_, name)| *name == stem) {
        return Ok(if tilde {
            format!("{op}~")
        } else {
            op.to_string()
        });
    }

    let mut id = String::with_capacity(tag.len());
    let mut rest = tag;
    while let Some(ch) = rest.chars().next() {
        if ch != '_' {
            let valid = if id.is_empty() && rest.len() == tag.len() {
                is_name_start(ch)
            } else {
                is_name_char(ch)
            };
            if !valid {
                return Err(malformed(tag, format!("`{ch}` is not allowed here")));
            }
            id.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        let escape = &rest[1..];
        if let Some(after) = escape.strip_prefix('_') {
            id.push('_');
            rest = after;
        } else if let Some(after) = escape.strip_prefix("tilde") {
            id.push('~');
            rest = after;
        } else if let Some(after) = escape.strip_prefix('x') {
            let end = after
                .find('_')
                .ok_or_else(|| malformed(tag, "unterminated `_x` escape"))?;
            let decoded = u32::from_str_radix(&after[..end], 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| malformed(tag, format!("bad code point `{}`", &after[..end])))?;
            id.push(decoded);
            rest = &after[end + 1..];
        } else {
            return Err(malformed(tag, "stray `_`"));
        }
    }
    Ok(id)
}
