use patchbay_syntax::{Binbuf, Word};

use crate::atom::parse_float;
use crate::error::{PatchError, Result};
use crate::geometry::Point;

/// The words after the two leading keywords, with a trailing `, f N` box
/// width split off.
#[derive(Debug)]
pub(crate) struct Body<'b> {
    pub words: Vec<&'b str>,
    pub width: Option<f64>,
}

impl<'b> Body<'b> {
    /// Unescaped commas that are not part of a width suffix stay in the
    /// word list as `,`.
    pub fn of(binbuf: &'b Binbuf) -> Result<Self> {
        let words = binbuf.words.get(2..).unwrap_or_default();
        let suffix = words
            .iter()
            .rposition(|word| matches!(word, Word::Comma))
            .and_then(|at| match &words[at + 1..] {
                [Word::Text(f), Word::Text(width)] if f == "f" => Some((at, width)),
                _ => None,
            });

        let (main, width) = match suffix {
            Some((at, width)) => (&words[..at], Some(number(width, "box width")?)),
            None => (words, None),
        };

        Ok(Self {
            words: main.iter().map(text).collect(),
            width,
        })
    }

    pub fn position(&self) -> Result<(Point, &[&'b str])> {
        match self.words.as_slice() {
            [x, y, rest @ ..] => Ok((
                Point::new(number(x, "x position")?, number(y, "y position")?),
                rest,
            )),
            _ => Err(PatchError::argument("missing box position")),
        }
    }
}

pub(crate) fn text(word: &Word) -> &str {
    match word {
        Word::Text(text) => text,
        Word::Comma => ",",
    }
}

pub(crate) fn number(word: &str, what: &str) -> Result<f64> {
    parse_float(word)
        .ok_or_else(|| PatchError::argument(format!("expected a number for {what}, found `{word}`")))
}

/// A node index or port number.
pub(crate) fn index(word: &str, what: &str) -> Result<usize> {
    let value = number(word, what)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(PatchError::argument(format!(
            "{what} must be a non-negative integer, found `{word}`"
        )));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_syntax::split;
    use pretty_assertions::assert_eq;

    fn first(source: &str) -> Binbuf {
        split(source).next().unwrap().unwrap()
    }

    #[test]
    fn width_suffix_is_split_off() {
        let binbuf = first("#X obj 10 20 print hello, f 12;");
        let body = Body::of(&binbuf).unwrap();
        assert_eq!(body.words, vec!["10", "20", "print", "hello"]);
        assert_eq!(body.width, Some(12.0));
    }

    #[test]
    fn other_commas_stay_in_place() {
        let binbuf = first("#X msg 0 0 1, 2;");
        let body = Body::of(&binbuf).unwrap();
        assert_eq!(body.words, vec!["0", "0", "1", ",", "2"]);
        assert_eq!(body.width, None);
    }

    #[test]
    fn position_needs_two_numbers() {
        let binbuf = first("#X obj 10 print;");
        let body = Body::of(&binbuf).unwrap();
        assert!(body.position().is_err());
    }

    #[test]
    fn indices_must_be_whole() {
        assert_eq!(index("3", "node").unwrap(), 3);
        assert!(index("-1", "node").is_err());
        assert!(index("1.5", "node").is_err());
    }
}
