//! Data structures: templates (`#N struct`), scalars and arrays.

use serde::{Deserialize, Serialize};

use crate::atom::{Atom, format_float, parse_float};
use crate::error::{PatchError, Result};
use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FieldKind {
    Float,
    Symbol,
    Text,
    /// Same storage as `Text`, declared with the `list` keyword
    List,
    Array { template: String },
}

impl FieldKind {
    /// Float and symbol fields are written inline before the first `\;`.
    pub fn is_plain(&self) -> bool {
        matches!(self, FieldKind::Float | FieldKind::Symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// A data template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Struct {
    /// Parse `name (type field | array field template)...`.
    pub fn from_words(words: &[&str]) -> Result<Self> {
        let (name, mut rest) = words
            .split_first()
            .ok_or_else(|| PatchError::argument("struct: missing template name"))?;

        let mut fields = Vec::new();
        while let Some((keyword, tail)) = rest.split_first() {
            let Some((field, tail)) = tail.split_first() else {
                return Err(PatchError::argument(format!(
                    "struct {name}: `{keyword}` has no field name"
                )));
            };
            let (kind, tail) = match *keyword {
                "float" => (FieldKind::Float, tail),
                "symbol" => (FieldKind::Symbol, tail),
                "text" => (FieldKind::Text, tail),
                "list" => (FieldKind::List, tail),
                "array" => {
                    let Some((template, tail)) = tail.split_first() else {
                        return Err(PatchError::argument(format!(
                            "struct {name}: array `{field}` has no element template"
                        )));
                    };
                    (
                        FieldKind::Array {
                            template: template.to_string(),
                        },
                        tail,
                    )
                }
                other => {
                    return Err(PatchError::argument(format!(
                        "struct {name}: unknown field type `{other}`"
                    )));
                }
            };
            fields.push(Field {
                name: field.to_string(),
                kind,
            });
            rest = tail;
        }

        Ok(Self {
            name: name.to_string(),
            fields,
        })
    }

    pub fn words(&self) -> Vec<String> {
        let mut words = vec![self.name.clone()];
        for field in &self.fields {
            match &field.kind {
                FieldKind::Float => words.push("float".into()),
                FieldKind::Symbol => words.push("symbol".into()),
                FieldKind::Text => words.push("text".into()),
                FieldKind::List => words.push("list".into()),
                FieldKind::Array { .. } => words.push("array".into()),
            }
            words.push(field.name.clone());
            if let FieldKind::Array { template } = &field.kind {
                words.push(template.clone());
            }
        }
        words
    }

    fn plain_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.kind.is_plain())
    }
}

/// One field value of a scalar, aligned with the template's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    Float(f64),
    Symbol(String),
    Text(Vec<Atom>),
    /// Elements, each following the array's element template
    Array(Vec<Vec<Value>>),
}

impl Value {
    fn matches(&self, kind: &FieldKind) -> bool {
        matches!(
            (self, kind),
            (Value::Float(_), FieldKind::Float)
                | (Value::Symbol(_), FieldKind::Symbol)
                | (Value::Text(_), FieldKind::Text | FieldKind::List)
                | (Value::Array(_), FieldKind::Array { .. })
        )
    }
}

/// `#X scalar template values...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    pub template: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Written in place of the plain fields of a template that has none, so an
/// element is never just a bare `\;`.
const NO_FIELDS: &str = "bang";
const SEMI: &str = ";";

impl Scalar {
    /// Parse the words after the template name, using `structs` to resolve
    /// the template and any element templates.
    pub fn from_words(template: &str, words: &[&str], structs: &[Struct]) -> Result<Self> {
        let mut reader = ValueReader { words, next: 0 };
        let values = reader.read(template, structs, false)?;
        if reader.next < words.len() {
            return Err(PatchError::argument(format!(
                "scalar {template}: {} unexpected trailing words",
                words.len() - reader.next
            )));
        }
        Ok(Self {
            template: template.to_string(),
            values,
        })
    }

    /// The words after the template name, with `;` marking each `\;`.
    pub fn words(&self, structs: &[Struct]) -> Result<Vec<String>> {
        let mut words = Vec::new();
        write_values(&self.template, &self.values, structs, &mut words)?;
        Ok(words)
    }

    /// Check the values against the template, recursively.
    pub fn validate(&self, structs: &[Struct]) -> Result<()> {
        check_values(&self.template, &self.values, structs)
    }
}

fn find<'a>(structs: &'a [Struct], name: &str) -> Result<&'a Struct> {
    structs
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| PatchError::argument(format!("unknown template `{name}`")))
}

fn check_values(template: &str, values: &[Value], structs: &[Struct]) -> Result<()> {
    let def = find(structs, template)?;
    if values.len() != def.fields.len() {
        return Err(PatchError::argument(format!(
            "scalar {template}: expected {} values, found {}",
            def.fields.len(),
            values.len()
        )));
    }
    for (field, value) in def.fields.iter().zip(values) {
        if !value.matches(&field.kind) {
            return Err(PatchError::argument(format!(
                "scalar {template}: field `{}` has the wrong kind of value",
                field.name
            )));
        }
        if let (Value::Array(elements), FieldKind::Array { template }) = (value, &field.kind) {
            for element in elements {
                check_values(template, element, structs)?;
            }
        }
    }
    Ok(())
}

fn write_values(
    template: &str,
    values: &[Value],
    structs: &[Struct],
    out: &mut Vec<String>,
) -> Result<()> {
    check_values(template, values, structs)?;
    let def = find(structs, template)?;

    if def.plain_fields().next().is_none() {
        out.push(NO_FIELDS.into());
    }
    for value in values {
        match value {
            Value::Float(v) => out.push(format_float(*v)),
            Value::Symbol(s) => out.push(s.clone()),
            _ => {}
        }
    }
    out.push(SEMI.into());

    for (field, value) in def.fields.iter().zip(values) {
        match (value, &field.kind) {
            (Value::Array(elements), FieldKind::Array { template }) => {
                for element in elements {
                    write_values(template, element, structs, out)?;
                }
                out.push(SEMI.into());
            }
            (Value::Text(atoms), _) => {
                out.extend(atoms.iter().map(Atom::to_word));
                out.push(SEMI.into());
            }
            _ => {}
        }
    }
    Ok(())
}

struct ValueReader<'a> {
    words: &'a [&'a str],
    next: usize,
}

impl<'a> ValueReader<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.words.get(self.next).copied()
    }

    fn take(&mut self) -> Option<&'a str> {
        let word = self.peek()?;
        self.next += 1;
        Some(word)
    }

    /// Consume a `\;`. The end of the statement also counts as one.
    fn end_group(&mut self) {
        if self.peek() == Some(SEMI) {
            self.next += 1;
        }
    }

    /// Read one set of values. An array element must consume at least one
    /// word before its own arrays are read, which bounds the nesting depth
    /// by the input length even for self-referential templates.
    fn read(&mut self, template: &str, structs: &[Struct], element: bool) -> Result<Vec<Value>> {
        let def = find(structs, template)?;
        let start = self.next;
        let mut values: Vec<Option<Value>> = vec![None; def.fields.len()];

        if def.plain_fields().next().is_none() && self.peek() == Some(NO_FIELDS) {
            self.next += 1;
        }
        for (slot, field) in values.iter_mut().zip(&def.fields) {
            let value = match field.kind {
                FieldKind::Float => {
                    let word = self.plain_word(template, field)?;
                    Value::Float(parse_float(word).ok_or_else(|| {
                        PatchError::argument(format!(
                            "scalar {template}: field `{}` expects a number, found `{word}`",
                            field.name
                        ))
                    })?)
                }
                FieldKind::Symbol => Value::Symbol(self.plain_word(template, field)?.to_string()),
                _ => continue,
            };
            *slot = Some(value);
        }
        self.end_group();
        if element && self.next == start {
            return Err(PatchError::argument(format!(
                "scalar {template}: element consumed no input at word {}",
                start + 1
            )));
        }

        for (slot, field) in values.iter_mut().zip(&def.fields) {
            match &field.kind {
                FieldKind::Array { template } => {
                    let mut elements = Vec::new();
                    while let Some(word) = self.peek() {
                        if word == SEMI {
                            self.next += 1;
                            break;
                        }
                        elements.push(self.read(template, structs, true)?);
                    }
                    *slot = Some(Value::Array(elements));
                }
                FieldKind::Text | FieldKind::List => {
                    let mut atoms = Vec::new();
                    while let Some(word) = self.take() {
                        if word == SEMI {
                            break;
                        }
                        atoms.push(Atom::parse(word));
                    }
                    *slot = Some(Value::Text(atoms));
                }
                FieldKind::Float | FieldKind::Symbol => {}
            }
        }

        Ok(values.into_iter().flatten().collect())
    }

    fn plain_word(&mut self, template: &str, field: &Field) -> Result<&'a str> {
        match self.take() {
            Some(word) if word != SEMI => Ok(word),
            _ => Err(PatchError::argument(format!(
                "scalar {template}: missing value for field `{}`",
                field.name
            ))),
        }
    }
}

/// `#X array name size type flags` inside a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GopArray {
    pub name: String,
    /// May be a `$1`-style symbol
    pub size: Atom,
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Vec<Atom>>,
}

impl GopArray {
    pub fn from_words(words: &[&str]) -> Result<Self> {
        match words {
            [name, size, element_type, rest @ ..] if rest.len() <= 1 => {
                let flags = match rest.first() {
                    Some(word) => Some(parse_float(word).ok_or_else(|| {
                        PatchError::argument(format!("array {name}: flags must be a number"))
                    })?),
                    None => None,
                };
                Ok(Self {
                    name: name.to_string(),
                    size: Atom::parse(size),
                    element_type: element_type.to_string(),
                    flags,
                    data: Vec::new(),
                })
            }
            _ => Err(PatchError::argument(format!(
                "array: expected `name size type flags`, found {} words",
                words.len()
            ))),
        }
    }

    pub fn words(&self) -> Vec<String> {
        let mut words = vec![
            self.name.clone(),
            self.size.to_word(),
            self.element_type.clone(),
        ];
        if let Some(flags) = self.flags {
            words.push(format_float(flags));
        }
        words
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayFlag {
    /// `-k`: keep contents with the patch
    Keep,
    YRange(Atom, Atom),
    Pix(Atom, Atom),
}

/// `array define`, `text define`, `scalar define` and `table` boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDefine {
    pub position: Point,
    /// `array`, `text`, `scalar` or `table`
    pub class_name: String,
    /// Whether the `define` keyword follows the class
    pub define: bool,
    #[serde(default)]
    pub flags: Vec<ArrayFlag>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub args: Vec<Atom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Vec<Atom>>,
}

impl ArrayDefine {
    /// Whether an `obj` box with this class and arguments defines storage.
    pub fn is_define(class_name: &str, args: &[&str]) -> bool {
        match class_name {
            "table" => true,
            "array" | "text" | "scalar" => args.first() == Some(&"define"),
            _ => false,
        }
    }

    pub fn from_words(class_name: &str, position: Point, args: &[&str]) -> Result<Self> {
        let define = args.first() == Some(&"define");
        let mut rest = if define { &args[1..] } else { args };

        let mut flags = Vec::new();
        loop {
            match rest {
                ["-k", tail @ ..] => {
                    flags.push(ArrayFlag::Keep);
                    rest = tail;
                }
                ["-yrange", lo, hi, tail @ ..] => {
                    flags.push(ArrayFlag::YRange(Atom::parse(lo), Atom::parse(hi)));
                    rest = tail;
                }
                ["-pix", w, h, tail @ ..] => {
                    flags.push(ArrayFlag::Pix(Atom::parse(w), Atom::parse(h)));
                    rest = tail;
                }
                ["-yrange" | "-pix", ..] => {
                    return Err(PatchError::argument(format!(
                        "{class_name}: `{}` needs two values",
                        rest[0]
                    )));
                }
                _ => break,
            }
        }

        let (name, rest) = match rest.split_first() {
            Some((name, tail)) => (Some(name.to_string()), tail),
            None => (None, rest),
        };

        Ok(Self {
            position,
            class_name: class_name.to_string(),
            define,
            flags,
            name,
            args: rest.iter().map(|w| Atom::parse(w)).collect(),
            width: None,
            data: Vec::new(),
        })
    }

    /// Class name and arguments as unescaped words.
    pub fn words(&self) -> Vec<String> {
        let mut words = vec![self.class_name.clone()];
        if self.define {
            words.push("define".into());
        }
        for flag in &self.flags {
            match flag {
                ArrayFlag::Keep => words.push("-k".into()),
                ArrayFlag::YRange(lo, hi) => {
                    words.extend(["-yrange".into(), lo.to_word(), hi.to_word()])
                }
                ArrayFlag::Pix(w, h) => words.extend(["-pix".into(), w.to_word(), h.to_word()]),
            }
        }
        words.extend(self.name.clone());
        words.extend(self.args.iter().map(Atom::to_word));
        words
    }

    pub fn text(&self) -> String {
        self.words().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn templates() -> Vec<Struct> {
        vec![
            Struct::from_words(&["point", "float", "x", "float", "y"]).unwrap(),
            Struct::from_words(&[
                "shape", "float", "x", "symbol", "color", "array", "points", "point", "text",
                "notes",
            ])
            .unwrap(),
            Struct::from_words(&["holder", "array", "items", "empty"]).unwrap(),
            Struct::from_words(&["empty"]).unwrap(),
        ]
    }

    #[test]
    fn struct_fields_keep_their_order() {
        let structs = templates();
        let shape = &structs[1];
        assert_eq!(shape.fields.len(), 4);
        assert_eq!(
            shape.fields[2].kind,
            FieldKind::Array {
                template: "point".into()
            }
        );
        assert_eq!(
            shape.words().join(" "),
            "shape float x symbol color array points point text notes"
        );
    }

    #[test]
    fn struct_with_unknown_field_type_fails() {
        let result = Struct::from_words(&["bad", "complex", "z"]);
        assert!(matches!(result, Err(PatchError::Argument { .. })));
    }

    #[test]
    fn scalar_reads_plain_array_and_text_sections() {
        // Given a scalar of a template with an array and a text field
        let structs = templates();
        let words = [
            "10", "red", ";", "0", "0", ";", "5", "7", ";", ";", "hello", "world", ";",
        ];

        // When it is parsed
        let scalar = Scalar::from_words("shape", &words, &structs).unwrap();

        // Then every field is filled in declared order
        assert_eq!(
            scalar.values,
            vec![
                Value::Float(10.0),
                Value::Symbol("red".into()),
                Value::Array(vec![
                    vec![Value::Float(0.0), Value::Float(0.0)],
                    vec![Value::Float(5.0), Value::Float(7.0)],
                ]),
                Value::Text(vec![Atom::symbol("hello"), Atom::symbol("world")]),
            ]
        );
        assert_eq!(scalar.words(&structs).unwrap(), words.to_vec());
    }

    #[test]
    fn elements_without_plain_fields_are_not_mistaken_for_the_array_end() {
        let structs = templates();
        let scalar = Scalar {
            template: "holder".into(),
            values: vec![Value::Array(vec![vec![], vec![]])],
        };
        let words = scalar.words(&structs).unwrap();
        assert_eq!(words, vec!["bang", ";", "bang", ";", "bang", ";", ";"]);

        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        assert_eq!(Scalar::from_words("holder", &refs, &structs).unwrap(), scalar);
    }

    #[rstest]
    #[case::empty_element(&["holder", "array", "items", "blank"], "holder")]
    #[case::self_reference(&["loop", "array", "next", "loop"], "loop")]
    fn element_that_reads_nothing_fails(#[case] holder: &[&str], #[case] template: &str) {
        // Given an element template that can match zero words
        let structs = vec![
            Struct::from_words(holder).unwrap(),
            Struct::from_words(&["blank"]).unwrap(),
        ];

        // When the body holds a word the element cannot take
        let result = Scalar::from_words(template, &["foo"], &structs);

        // Then reading stops with an error instead of looping
        match result {
            Err(PatchError::Argument { message, .. }) => {
                assert!(message.contains("consumed no input"), "{message}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn recursive_template_reads_finite_nesting() {
        // Given a tree template whose children are trees
        let structs = vec![Struct::from_words(&["node", "float", "v", "array", "kids", "node"]).unwrap()];
        let words = ["1", ";", "2", ";", ";", ";"];

        // When a two-level tree is read
        let scalar = Scalar::from_words("node", &words, &structs).unwrap();

        // Then the nesting stops where the data does
        assert_eq!(
            scalar.values,
            vec![
                Value::Float(1.0),
                Value::Array(vec![vec![Value::Float(2.0), Value::Array(vec![])]]),
            ]
        );
        assert_eq!(scalar.words(&structs).unwrap(), words.to_vec());
    }

    #[test]
    fn scalar_of_unknown_template_fails() {
        let result = Scalar::from_words("ghost", &["1"], &templates());
        assert!(matches!(result, Err(PatchError::Argument { .. })));
    }

    #[test]
    fn scalar_with_symbol_in_float_field_fails() {
        let result = Scalar::from_words("point", &["a", "b", ";"], &templates());
        assert!(result.is_err());
    }

    #[rstest]
    #[case("array", &["define", "-k", "-yrange", "-1", "1", "tab", "64"])]
    #[case("table", &["tab1", "100"])]
    #[case("text", &["define", "-k", "notes"])]
    #[case("array", &["define"])]
    fn array_define_words_round_trip(#[case] class_name: &str, #[case] args: &[&str]) {
        assert!(ArrayDefine::is_define(class_name, args));
        let array = ArrayDefine::from_words(class_name, Point::default(), args).unwrap();
        let mut expected = vec![class_name];
        expected.extend_from_slice(args);
        assert_eq!(array.words(), expected);
    }

    #[test]
    fn array_get_is_not_a_definition() {
        assert!(!ArrayDefine::is_define("array", &["get", "tab"]));
    }

    #[test]
    fn gop_array_keeps_symbolic_size() {
        let array = GopArray::from_words(&["\\$0-tab", "\\$1", "float", "3"]).unwrap();
        assert_eq!(array.size, Atom::symbol("\\$1"));
        assert_eq!(array.words(), vec!["\\$0-tab", "\\$1", "float", "3"]);
    }
}
