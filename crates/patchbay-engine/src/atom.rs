//! Typed words of the native format.
//!
//! The native grammar is untyped: every argument is just a word. A word that
//! looks like a number becomes [`Atom::Float`], anything else an
//! [`Atom::Symbol`]. Writing an atom back produces the same spelling the
//! native writer uses, so `parse -> write` is stable for files saved by Pd.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Atom {
    Float(f64),
    Symbol(String),
}

impl Atom {
    /// Infer the type of a single word.
    pub fn parse(word: &str) -> Atom {
        match parse_float(word) {
            Some(value) => Atom::Float(value),
            None => Atom::Symbol(word.to_string()),
        }
    }

    pub fn symbol(text: impl Into<String>) -> Atom {
        Atom::Symbol(text.into())
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Atom::Float(value) => Some(*value),
            Atom::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(text) => Some(text),
            Atom::Float(_) => None,
        }
    }

    /// The word as it appears in native text, before escaping.
    pub fn to_word(&self) -> String {
        match self {
            Atom::Float(value) => format_float(*value),
            Atom::Symbol(text) => text.clone(),
        }
    }
}

impl From<f64> for Atom {
    fn from(value: f64) -> Self {
        Atom::Float(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Symbol(value.to_string())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(value) => f.write_str(&format_float(*value)),
            Atom::Symbol(text) => f.write_str(&escape_symbol(text)),
        }
    }
}

pub fn is_numeric(word: &str) -> bool {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC
        .get_or_init(|| {
            Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
                .expect("Invalid numeric regex")
        })
        .is_match(word)
}

/// A finite float, or `None`. Words that overflow `f64` stay symbols, since
/// neither the native writer nor JSON can spell an infinity.
pub fn parse_float(word: &str) -> Option<f64> {
    if is_numeric(word) {
        word.parse().ok().filter(|value: &f64| value.is_finite())
    } else {
        None
    }
}

/// Format a float the way `%g` does (6 significant digits), falling back to
/// the shortest exact representation when `%g` would lose the value.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let short = format_g(value);
    match short.parse::<f64>() {
        Ok(parsed) if parsed == value => short,
        _ => format!("{value}"),
    }
}

fn format_g(value: f64) -> String {
    let scientific = format!("{value:.5e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Escape the characters that would otherwise end a word or a statement.
pub fn escape_symbol(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, ';' | ',' | ' ' | '\t' | '\n' | '\r') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
