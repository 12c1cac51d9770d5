use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::geometry::Point;
use crate::model::Canvas;

/// A generic object box: `#X obj x y class args...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub position: Point,
    /// Empty for a box with no text
    pub class_name: String,
    #[serde(default)]
    pub args: Vec<Atom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Vec<Atom>>,
}

impl Object {
    pub fn new(class_name: impl Into<String>, args: Vec<Atom>) -> Self {
        Self {
            position: Point::default(),
            class_name: class_name.into(),
            args,
            width: None,
            data: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        join_words(
            std::iter::once(self.class_name.clone()).chain(self.args.iter().map(Atom::to_word)),
        )
    }
}

/// Messages sent to a named receiver after a `\;` in a message box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTarget {
    pub address: String,
    #[serde(default)]
    pub messages: Vec<Vec<Atom>>,
}

/// A message box.
///
/// `outlet` holds the comma-separated messages sent out of the box's outlet.
/// Each `\;` starts a new [`MessageTarget`] whose first word is the receiver
/// name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub position: Point,
    #[serde(default)]
    pub outlet: Vec<Vec<Atom>>,
    #[serde(default)]
    pub targets: Vec<MessageTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl Message {
    pub fn new(outlet: Vec<Vec<Atom>>) -> Self {
        Self {
            position: Point::default(),
            outlet,
            targets: Vec::new(),
            width: None,
        }
    }

    /// Build from the payload words, where `;` and `,` are separators.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut segments: Vec<Vec<&str>> = vec![Vec::new()];
        for word in words {
            match word {
                ";" => segments.push(Vec::new()),
                _ => {
                    if let Some(segment) = segments.last_mut() {
                        segment.push(word);
                    }
                }
            }
        }

        let mut segments = segments.into_iter();
        let outlet = segments.next().map(|s| split_commas(&s)).unwrap_or_default();
        let targets = segments
            .map(|segment| match segment.split_first() {
                Some((address, rest)) => MessageTarget {
                    address: address.to_string(),
                    messages: split_commas(rest),
                },
                None => MessageTarget {
                    address: String::new(),
                    messages: Vec::new(),
                },
            })
            .collect();

        Self {
            position: Point::default(),
            outlet,
            targets,
            width: None,
        }
    }

    /// The payload as a word list, with `;` and `,` as separator words.
    pub fn words(&self) -> Vec<String> {
        let mut words = comma_words(&self.outlet);
        for target in &self.targets {
            words.push(";".to_string());
            if !target.address.is_empty() {
                words.push(target.address.clone());
            }
            words.extend(comma_words(&target.messages));
        }
        words
    }

    pub fn text(&self) -> String {
        join_words(self.words())
    }
}

fn split_commas(words: &[&str]) -> Vec<Vec<Atom>> {
    if words.is_empty() {
        return Vec::new();
    }
    words
        .split(|word| *word == ",")
        .map(|group| group.iter().map(|word| Atom::parse(word)).collect())
        .collect()
}

fn comma_words(messages: &[Vec<Atom>]) -> Vec<String> {
    let mut words = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            words.push(",".to_string());
        }
        words.extend(message.iter().map(Atom::to_word));
    }
    words
}

/// A comment: `#X text x y words...`. Words are kept exactly as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub position: Point,
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl Comment {
    pub fn new(text: &str) -> Self {
        Self {
            position: Point::default(),
            words: text.split_whitespace().map(str::to_string).collect(),
            width: None,
        }
    }

    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// A subpatch box: the child canvas plus the `#X restore` line that closes
/// it and places it on the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subpatch {
    pub position: Point,
    /// `pd`, `graph`, `table`...
    pub class_name: String,
    #[serde(default)]
    pub args: Vec<Atom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    pub canvas: Canvas,
}

impl Subpatch {
    pub fn text(&self) -> String {
        join_words(
            std::iter::once(self.class_name.clone()).chain(self.args.iter().map(Atom::to_word)),
        )
    }
}

fn join_words(words: impl IntoIterator<Item = String>) -> String {
    words
        .into_iter()
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn message_splits_outlet_and_targets() {
        let message = Message::from_words(["1", ",", "2", ";", "pd", "dsp", "1"]);

        assert_eq!(
            message.outlet,
            vec![vec![Atom::Float(1.0)], vec![Atom::Float(2.0)]]
        );
        assert_eq!(message.targets.len(), 1);
        assert_eq!(message.targets[0].address, "pd");
        assert_eq!(
            message.targets[0].messages,
            vec![vec![Atom::symbol("dsp"), Atom::Float(1.0)]]
        );
        assert_eq!(message.text(), "1 , 2 ; pd dsp 1");
    }

    #[test]
    fn message_with_leading_semicolon_has_empty_outlet() {
        let message = Message::from_words([";", "pd", "dsp", "0"]);
        assert!(message.outlet.is_empty());
        assert_eq!(message.words(), vec![";", "pd", "dsp", "0"]);
    }

    #[test]
    fn empty_message_groups_survive() {
        let words = vec![",", "bang"];
        let message = Message::from_words(words.iter().copied());
        assert_eq!(message.outlet, vec![vec![], vec![Atom::symbol("bang")]]);
        assert_eq!(message.words(), words);
    }

    #[test]
    fn object_text_joins_class_and_args() {
        let object = Object::new("osc~", vec![Atom::Float(440.0)]);
        assert_eq!(object.text(), "osc~ 440");
    }
}
