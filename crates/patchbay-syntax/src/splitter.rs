//! Groups lexer tokens into words and words into semicolon-terminated
//! statements ("binbufs").

use logos::Logos;
use thiserror::Error;

use crate::lexer::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("malformed line {line} (statement {statement}): {message}")]
    MalformedLine {
        statement: usize,
        line: usize,
        message: String,
    },
}

/// One word of a statement.
///
/// Escaped delimiters are already folded into `Text` with their backslash
/// removed. `Comma` only appears for an unescaped `,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    Text(String),
    Comma,
}

impl Word {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Word::Text(text) => Some(text),
            Word::Comma => None,
        }
    }
}

impl From<&str> for Word {
    fn from(value: &str) -> Self {
        Word::Text(value.to_string())
    }
}

/// A single statement of patch text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binbuf {
    /// Ordinal of the statement in the file, starting at 0
    pub index: usize,
    /// 1-based line where the statement starts
    pub line: usize,
    pub words: Vec<Word>,
}

impl Binbuf {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Text of the word at `position`, `None` for a comma or past the end.
    pub fn text(&self, position: usize) -> Option<&str> {
        self.words.get(position).and_then(Word::as_text)
    }

    /// The leading `#N`/`#X`/`#A` marker and the keyword after it.
    pub fn keyword(&self) -> (Option<&str>, Option<&str>) {
        (self.text(0), self.text(1))
    }
}

/// Lazy iterator over the statements of a patch text.
///
/// Cloning a splitter gives an independent cursor at the same position, and
/// [`Splitter::restart`] rewinds to the beginning of the source.
#[derive(Debug, Clone)]
pub struct Splitter<'a> {
    source: &'a str,
    position: usize,
    line: usize,
    index: usize,
    failed: bool,
}

/// Split `source` into binbufs.
pub fn split(source: &str) -> Splitter<'_> {
    Splitter::new(source)
}

impl<'a> Splitter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            index: 0,
            failed: false,
        }
    }

    pub fn restart(&self) -> Self {
        Self::new(self.source)
    }

    fn next_statement(&mut self) -> Option<Result<Binbuf, SplitError>> {
        loop {
            let rest = &self.source[self.position..];
            if rest.is_empty() {
                return None;
            }

            let mut lexer = TokenKind::lexer(rest);
            let mut words = Vec::new();
            let mut current: Option<String> = None;
            let mut start_line = None;
            let mut consumed = rest.len();

            while let Some(result) = lexer.next() {
                let slice = lexer.slice();
                match result {
                    Ok(TokenKind::Whitespace) => {
                        flush(&mut current, &mut words);
                        self.line += count_newlines(slice);
                        continue;
                    }
                    Ok(TokenKind::Semi) => {
                        flush(&mut current, &mut words);
                        consumed = lexer.span().end;
                        break;
                    }
                    Ok(TokenKind::Comma) => {
                        flush(&mut current, &mut words);
                        words.push(Word::Comma);
                    }
                    Ok(TokenKind::EscapedDelimiter) => {
                        let delimiter = &slice[1..];
                        current.get_or_insert_default().push_str(delimiter);
                        self.line += count_newlines(delimiter);
                    }
                    Ok(TokenKind::Escaped | TokenKind::Text) => {
                        current.get_or_insert_default().push_str(slice);
                    }
                    Err(()) => {
                        self.failed = true;
                        return Some(Err(SplitError::MalformedLine {
                            statement: self.index,
                            line: self.line,
                            message: format!("unterminated escape sequence {slice:?}"),
                        }));
                    }
                }
                start_line.get_or_insert(self.line);
            }

            self.position += consumed;
            flush(&mut current, &mut words);

            if words.is_empty() {
                continue;
            }

            let binbuf = Binbuf {
                index: self.index,
                line: start_line.unwrap_or(self.line),
                words,
            };
            self.index += 1;
            return Some(Ok(binbuf));
        }
    }
}

impl Iterator for Splitter<'_> {
    type Item = Result<Binbuf, SplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_statement()
    }
}

fn flush(current: &mut Option<String>, words: &mut Vec<Word>) {
    if let Some(text) = current.take() {
        words.push(Word::Text(text));
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn texts(binbuf: &Binbuf) -> Vec<&str> {
        binbuf
            .words
            .iter()
            .map(|w| w.as_text().unwrap_or(","))
            .collect()
    }

    fn split_all(source: &str) -> Vec<Binbuf> {
        split(source).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn splits_statements_on_one_line() {
        let statements = split_all("#N canvas 0 0 450 300 10; #X obj 10 10 osc~ 440;");
        assert_eq!(statements.len(), 2);
        assert_eq!(texts(&statements[0]), vec!["#N", "canvas", "0", "0", "450", "300", "10"]);
        assert_eq!(texts(&statements[1]), vec!["#X", "obj", "10", "10", "osc~", "440"]);
        assert_eq!(statements[1].index, 1);
    }

    #[test]
    fn tracks_statement_lines() {
        let statements = split_all("#N canvas 0 50 450 300 12;\n#X obj 1 2\n  metro 100;\n#X text 1 1 hi;");
        let lines: Vec<usize> = statements.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[rstest]
    #[case(r"#X msg 1 1 \; pd dsp 1;", vec!["#X", "msg", "1", "1", ";", "pd", "dsp", "1"])]
    #[case(r"#X msg 1 1 1 \, 2;", vec!["#X", "msg", "1", "1", "1", ",", "2"])]
    #[case(r"#X text 1 1 a\ b;", vec!["#X", "text", "1", "1", "a b"])]
    #[case(r"#X obj 1 1 f \$1;", vec!["#X", "obj", "1", "1", "f", r"\$1"])]
    #[case(r"#X text 1 1 end\;;", vec!["#X", "text", "1", "1", "end;"])]
    fn escaped_delimiters_are_stripped(#[case] source: &str, #[case] expected: Vec<&str>) {
        let statements = split_all(source);
        assert_eq!(statements.len(), 1);
        assert_eq!(texts(&statements[0]), expected);
    }

    #[test]
    fn unescaped_comma_is_its_own_word() {
        let statements = split_all("#X obj 1 1 print, f 20;");
        assert_eq!(statements[0].words[4], Word::from("print"));
        assert_eq!(statements[0].words[5], Word::Comma);
        assert_eq!(statements[0].text(6), Some("f"));
    }

    #[test]
    fn empty_statements_are_skipped() {
        let statements = split_all(";;  ;\n#X obj 1 1 f;;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].index, 0);
    }

    #[test]
    fn unterminated_final_statement_is_kept() {
        let statements = split_all("#X obj 1 1 f;\n#X obj 2 2 t b");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].text(4), Some("t"));
    }

    #[test]
    fn trailing_backslash_is_malformed() {
        // Given a statement whose escape never completes
        let mut splitter = split("#X obj 1 1 f;\n#X text 1 1 oops\\");

        // When iterating
        let first = splitter.next().unwrap();
        let second = splitter.next().unwrap();

        // Then the first statement is fine and the second fails
        assert!(first.is_ok());
        assert_eq!(
            second,
            Err(SplitError::MalformedLine {
                statement: 1,
                line: 2,
                message: "unterminated escape sequence \"\\\\\"".to_string(),
            })
        );
        assert!(splitter.next().is_none());
    }

    #[test]
    fn splitter_is_restartable() {
        let mut splitter = split("#X obj 1 1 a;#X obj 1 1 b;");
        let _ = splitter.next();
        let fork = splitter.clone();

        assert_eq!(splitter.count(), 1);
        assert_eq!(fork.restart().count(), 2);
    }
}
