use serde_json::{Map, Value as Json};

use crate::atom::Atom;
use crate::error::{PatchError, Result};
use crate::geometry::{Area, Bounds, Coords, Point, Size};
use crate::model::{
    ArrayDefine, ArrayFlag, AtomBox, AtomKind, Canvas, CanvasHeader, Comm, Comment, Cursor,
    DeclareEntry, DeclareFlag, Declaration, Dependency, Edge, Field, FieldKind, GopArray, Gui,
    GuiKind, Iem, IemColors, IemFont, IemLabel, Message, MessageTarget, NODE_TYPES, Node, Object,
    Patch, Scalar, Struct, Subpatch, Value,
};

use super::dom::Element;
use super::tags::{EMPTY_TAG, from_xml_tag};

/// Maps an element tree back onto the model. `path` arguments are the
/// slash-separated element names leading to the element being read.
pub(crate) struct Decoder {
    pub tolerant: bool,
    /// Used for a root canvas written without a `font` attribute
    pub font: f64,
}

fn child_path(path: &str, name: &str) -> String {
    format!("{path}/{name}")
}

fn xml_error(path: &str, message: impl Into<String>) -> PatchError {
    PatchError::Xml {
        path: path.to_string(),
        message: message.into(),
    }
}

fn required<'e>(element: &'e Element, key: &str, path: &str) -> Result<&'e str> {
    element
        .get(key)
        .ok_or_else(|| xml_error(path, format!("missing attribute `{key}`")))
}

fn parse_number(text: &str, key: &str, path: &str) -> Result<f64> {
    text.parse()
        .ok()
        .filter(|value: &f64| value.is_finite())
        .ok_or_else(|| xml_error(path, format!("attribute `{key}` is not a number: `{text}`")))
}

fn number(element: &Element, key: &str, path: &str) -> Result<f64> {
    parse_number(required(element, key, path)?, key, path)
}

fn optional_number(element: &Element, key: &str, path: &str) -> Result<Option<f64>> {
    element
        .get(key)
        .map(|text| parse_number(text, key, path))
        .transpose()
}

fn optional_text(element: &Element, key: &str) -> Option<String> {
    element.get(key).map(str::to_string)
}

fn flag(element: &Element, key: &str, path: &str) -> Result<bool> {
    match required(element, key, path)? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(xml_error(
            path,
            format!("attribute `{key}` must be true or false, found `{other}`"),
        )),
    }
}

fn index(element: &Element, key: &str, path: &str) -> Result<usize> {
    let text = required(element, key, path)?;
    text.parse()
        .map_err(|_| xml_error(path, format!("attribute `{key}` is not an index: `{text}`")))
}

fn position(element: &Element, path: &str) -> Result<Point> {
    Ok(Point::new(
        number(element, "x", path)?,
        number(element, "y", path)?,
    ))
}

impl Decoder {
    /// Report an element that has no meaning at this place.
    fn unknown(&self, path: &str, tag: &str) -> Result<()> {
        if self.tolerant {
            log::warn!("{path}: skipping unknown tag <{tag}>");
            Ok(())
        } else {
            Err(PatchError::UnknownTag {
                path: path.to_string(),
                tag: tag.to_string(),
            })
        }
    }

    pub fn patch(&self, root: &Element) -> Result<Patch> {
        let path = root.name.as_str();
        if root.name != "patch" {
            return Err(PatchError::UnknownTag {
                path: String::new(),
                tag: root.name.clone(),
            });
        }

        let mut patch = Patch::new(required(root, "name", path)?);
        for child in &root.children {
            let child_path = child_path(path, &child.name);
            match child.name.as_str() {
                "structs" => {
                    for template in &child.children {
                        if let Some(template) = self.struct_def(template, &child_path)? {
                            patch.structs.push(template);
                        }
                    }
                }
                "declarations" => {
                    for declaration in &child.children {
                        if let Some(declaration) = self.declaration(declaration, &child_path)? {
                            patch.declarations.push(declaration);
                        }
                    }
                }
                "dependencies" => {
                    for dependency in &child.children {
                        match dependency.name.as_str() {
                            "lib" => {
                                patch.dependencies.insert(Dependency::Lib(dependency.text.clone()));
                            }
                            "path" => {
                                patch
                                    .dependencies
                                    .insert(Dependency::Path(dependency.text.clone()));
                            }
                            other => self.unknown(&child_path, other)?,
                        }
                    }
                }
                "canvas" => patch.canvases.push(self.canvas(child, &child_path)?),
                other => self.unknown(path, other)?,
            }
        }
        Ok(patch)
    }

    fn struct_def(&self, element: &Element, path: &str) -> Result<Option<Struct>> {
        if element.name != "struct" {
            self.unknown(path, &element.name)?;
            return Ok(None);
        }
        let path = child_path(path, "struct");
        let mut fields = Vec::new();
        for field in &element.children {
            if field.name != "field" {
                self.unknown(&path, &field.name)?;
                continue;
            }
            let field_path = child_path(&path, "field");
            let kind = match required(field, "kind", &field_path)? {
                "float" => FieldKind::Float,
                "symbol" => FieldKind::Symbol,
                "text" => FieldKind::Text,
                "list" => FieldKind::List,
                "array" => FieldKind::Array {
                    template: required(field, "template", &field_path)?.to_string(),
                },
                other => {
                    return Err(xml_error(&field_path, format!("unknown field kind `{other}`")));
                }
            };
            fields.push(Field {
                name: required(field, "name", &field_path)?.to_string(),
                kind,
            });
        }
        Ok(Some(Struct {
            name: required(element, "name", &path)?.to_string(),
            fields,
        }))
    }

    fn declaration(&self, element: &Element, path: &str) -> Result<Option<Declaration>> {
        if element.name != "declare" {
            self.unknown(path, &element.name)?;
            return Ok(None);
        }
        let path = child_path(path, "declare");
        let mut entries = Vec::new();
        for entry in &element.children {
            if entry.name != "entry" {
                self.unknown(&path, &entry.name)?;
                continue;
            }
            let flag_text = required(entry, "flag", &path)?;
            let flag = DeclareFlag::parse(flag_text)
                .ok_or_else(|| xml_error(&path, format!("unknown declare flag `{flag_text}`")))?;
            entries.push(DeclareEntry {
                flag,
                value: required(entry, "value", &path)?.to_string(),
            });
        }
        Ok(Some(Declaration { entries }))
    }

    fn canvas(&self, element: &Element, path: &str) -> Result<Canvas> {
        let header = match required(element, "kind", path)? {
            "root" => CanvasHeader::Root {
                font: optional_number(element, "font", path)?.unwrap_or(self.font),
            },
            "subpatch" => CanvasHeader::Subpatch {
                title: required(element, "title", path)?.to_string(),
                visible: flag(element, "visible", path)?,
            },
            other => {
                return Err(xml_error(path, format!("unknown canvas kind `{other}`")));
            }
        };

        let mut canvas = Canvas {
            screen: position(element, path)?,
            size: Size::new(
                number(element, "width", path)?,
                number(element, "height", path)?,
            ),
            header,
            nodes: Vec::new(),
            edges: Vec::new(),
            coords: None,
            cursor: Cursor {
                position: Point::new(
                    number(element, "cursor-x", path)?,
                    number(element, "cursor-y", path)?,
                ),
                row_height: number(element, "row-height", path)?,
            },
        };

        for child in &element.children {
            let child_path = child_path(path, &child.name);
            match child.name.as_str() {
                "coords" => canvas.coords = Some(coords(child, &child_path)?),
                "nodes" => {
                    for node in &child.children {
                        if let Some(node) = self.node(node, &child_path)? {
                            canvas.nodes.push(node);
                        }
                    }
                }
                "edges" => {
                    for edge in &child.children {
                        if edge.name != "edge" {
                            self.unknown(&child_path, &edge.name)?;
                            continue;
                        }
                        let edge_path = child_path.clone() + "/edge";
                        canvas.edges.push(Edge::new(
                            index(edge, "from", &edge_path)?,
                            index(edge, "outlet", &edge_path)?,
                            index(edge, "to", &edge_path)?,
                            index(edge, "inlet", &edge_path)?,
                        ));
                    }
                }
                other => self.unknown(path, other)?,
            }
        }
        Ok(canvas)
    }

    fn node(&self, element: &Element, parent: &str) -> Result<Option<Node>> {
        let path = child_path(parent, &element.name);
        let Some(type_name) = element.get("type") else {
            self.unknown(parent, &element.name)?;
            return Ok(None);
        };
        if !NODE_TYPES.contains(&type_name) {
            self.unknown(&path, type_name)?;
            return Ok(None);
        }

        let node = match type_name {
            "Object" => Node::Object(Object {
                position: position(element, &path)?,
                class_name: class_name(&element.name)?,
                args: self.atoms_child(element, "args", &path)?,
                width: optional_number(element, "width", &path)?,
                data: self.data(element, &path)?,
            }),
            "Message" => Node::Message(self.message(element, &path)?),
            "Comment" => Node::Comment(Comment {
                position: position(element, &path)?,
                words: element
                    .children
                    .iter()
                    .filter(|child| child.name == "word")
                    .map(|word| required(word, "value", &path).map(str::to_string))
                    .collect::<Result<_>>()?,
                width: optional_number(element, "width", &path)?,
            }),
            "AtomBox" => Node::AtomBox(atom_box(element, &path)?),
            "Gui" => Node::Gui(self.gui(element, &path)?),
            "Subpatch" => {
                let canvas = element
                    .find("canvas")
                    .ok_or_else(|| xml_error(&path, "subpatch without a canvas"))?;
                Node::Subpatch(Subpatch {
                    position: position(element, &path)?,
                    class_name: class_name(&element.name)?,
                    args: self.atoms_child(element, "args", &path)?,
                    width: optional_number(element, "width", &path)?,
                    canvas: self.canvas(canvas, &child_path(&path, "canvas"))?,
                })
            }
            "GopArray" => {
                let size = element
                    .find("size")
                    .and_then(|size| size.children.first())
                    .ok_or_else(|| xml_error(&path, "array without a size"))?;
                Node::GopArray(GopArray {
                    name: required(element, "name", &path)?.to_string(),
                    size: atom(size, &path)?,
                    element_type: required(element, "element-type", &path)?.to_string(),
                    flags: optional_number(element, "flags", &path)?,
                    data: self.data(element, &path)?,
                })
            }
            "Array" => Node::Array(self.array(element, &path)?),
            "Scalar" => Node::Scalar(Scalar {
                template: required(element, "template", &path)?.to_string(),
                values: self.values(&element.children, &path)?,
            }),
            other => {
                return Err(PatchError::UnknownType {
                    path,
                    kind: other.to_string(),
                });
            }
        };
        Ok(Some(node))
    }

    fn atoms(&self, element: &Element, path: &str) -> Result<Vec<Atom>> {
        let mut atoms = Vec::new();
        for child in &element.children {
            match child.name.as_str() {
                "float" | "symbol" => atoms.push(atom(child, path)?),
                other => self.unknown(path, other)?,
            }
        }
        Ok(atoms)
    }

    fn atoms_child(&self, element: &Element, name: &str, path: &str) -> Result<Vec<Atom>> {
        match element.find(name) {
            Some(child) => self.atoms(child, &child_path(path, name)),
            None => Ok(Vec::new()),
        }
    }

    fn data(&self, element: &Element, path: &str) -> Result<Vec<Vec<Atom>>> {
        let Some(data) = element.find("data") else {
            return Ok(Vec::new());
        };
        let path = child_path(path, "data");
        data.children
            .iter()
            .map(|line| self.atoms(line, &child_path(&path, "line")))
            .collect()
    }

    fn message(&self, element: &Element, path: &str) -> Result<Message> {
        let messages = |element: &Element, path: &str| -> Result<Vec<Vec<Atom>>> {
            element
                .children
                .iter()
                .map(|message| self.atoms(message, &child_path(path, "message")))
                .collect()
        };

        let mut message = Message {
            position: position(element, path)?,
            outlet: Vec::new(),
            targets: Vec::new(),
            width: optional_number(element, "width", path)?,
        };
        for child in &element.children {
            let child_path = child_path(path, &child.name);
            match child.name.as_str() {
                "outlet" => message.outlet = messages(child, &child_path)?,
                "target" => message.targets.push(MessageTarget {
                    address: required(child, "address", &child_path)?.to_string(),
                    messages: messages(child, &child_path)?,
                }),
                other => self.unknown(path, other)?,
            }
        }
        Ok(message)
    }

    fn gui(&self, element: &Element, path: &str) -> Result<Gui> {
        let kind = element
            .find("kind")
            .ok_or_else(|| xml_error(path, "widget without a kind"))?;
        let colors = element
            .find("colors")
            .ok_or_else(|| xml_error(path, "widget without colors"))?;
        let colors_path = child_path(path, "colors");
        let color = |name: &str| -> Result<Option<Atom>> {
            colors
                .find(name)
                .and_then(|slot| slot.children.first())
                .map(|value| atom(value, &colors_path))
                .transpose()
        };

        Ok(Gui {
            position: position(element, path)?,
            class_name: class_name(&element.name)?,
            iem: Iem {
                comm: Comm {
                    send: optional_text(element, "send"),
                    receive: optional_text(element, "receive"),
                },
                label: IemLabel {
                    text: optional_text(element, "label"),
                    offset: Point::new(
                        number(element, "label-x", path)?,
                        number(element, "label-y", path)?,
                    ),
                    font: IemFont {
                        face: number(element, "font-face", path)?,
                        size: number(element, "font-size", path)?,
                    },
                },
                colors: IemColors {
                    background: color("background")?
                        .ok_or_else(|| xml_error(&colors_path, "missing background"))?,
                    foreground: color("foreground")?,
                    label: color("label")?
                        .ok_or_else(|| xml_error(&colors_path, "missing label colour"))?,
                },
            },
            kind: widget_kind(kind, &child_path(path, "kind"))?,
        })
    }

    fn array(&self, element: &Element, path: &str) -> Result<ArrayDefine> {
        let mut flags = Vec::new();
        if let Some(list) = element.find("flags") {
            let flags_path = child_path(path, "flags");
            for flag in &list.children {
                let pair = || -> Result<(Atom, Atom)> {
                    match self.atoms(flag, &flags_path)?.as_slice() {
                        [a, b] => Ok((a.clone(), b.clone())),
                        _ => Err(xml_error(&flags_path, format!("<{}> takes two values", flag.name))),
                    }
                };
                match flag.name.as_str() {
                    "keep" => flags.push(ArrayFlag::Keep),
                    "yrange" => {
                        let (lo, hi) = pair()?;
                        flags.push(ArrayFlag::YRange(lo, hi));
                    }
                    "pix" => {
                        let (w, h) = pair()?;
                        flags.push(ArrayFlag::Pix(w, h));
                    }
                    other => self.unknown(&flags_path, other)?,
                }
            }
        }

        Ok(ArrayDefine {
            position: position(element, path)?,
            class_name: required(element, "class", path)?.to_string(),
            define: flag(element, "define", path)?,
            flags,
            name: optional_text(element, "name"),
            args: self.atoms_child(element, "args", path)?,
            width: optional_number(element, "width", path)?,
            data: self.data(element, path)?,
        })
    }

    fn values(&self, elements: &[Element], path: &str) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for element in elements {
            let value_path = child_path(path, &element.name);
            let value = match element.name.as_str() {
                "float" => Value::Float(number(element, "value", &value_path)?),
                "symbol" => Value::Symbol(required(element, "value", &value_path)?.to_string()),
                "text" => Value::Text(self.atoms(element, &value_path)?),
                "array" => Value::Array(
                    element
                        .children
                        .iter()
                        .map(|item| self.values(&item.children, &child_path(&value_path, "element")))
                        .collect::<Result<_>>()?,
                ),
                other => {
                    self.unknown(path, other)?;
                    continue;
                }
            };
            values.push(value);
        }
        Ok(values)
    }
}

fn class_name(tag: &str) -> Result<String> {
    if tag == EMPTY_TAG {
        Ok(String::new())
    } else {
        from_xml_tag(tag)
    }
}

fn atom(element: &Element, path: &str) -> Result<Atom> {
    match element.name.as_str() {
        "float" => Ok(Atom::Float(number(element, "value", path)?)),
        "symbol" => Ok(Atom::Symbol(required(element, "value", path)?.to_string())),
        other => Err(PatchError::UnknownTag {
            path: path.to_string(),
            tag: other.to_string(),
        }),
    }
}

fn coords(element: &Element, path: &str) -> Result<Coords> {
    let margin = match (
        optional_number(element, "margin-x", path)?,
        optional_number(element, "margin-y", path)?,
    ) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        _ => None,
    };
    Ok(Coords {
        range: Area::new(
            Point::new(number(element, "x1", path)?, number(element, "y1", path)?),
            Point::new(number(element, "x2", path)?, number(element, "y2", path)?),
        ),
        size: Size::new(
            number(element, "width", path)?,
            number(element, "height", path)?,
        ),
        gop: number(element, "gop", path)?,
        margin,
    })
}

fn atom_box(element: &Element, path: &str) -> Result<AtomBox> {
    let kind = AtomKind::from_keyword(&element.name).ok_or_else(|| PatchError::UnknownTag {
        path: path.to_string(),
        tag: element.name.clone(),
    })?;
    Ok(AtomBox {
        kind,
        position: position(element, path)?,
        digits: number(element, "digits", path)?,
        limits: Bounds::new(
            number(element, "lower", path)?,
            number(element, "upper", path)?,
        ),
        label_position: number(element, "label-position", path)?,
        label: optional_text(element, "label"),
        receive: optional_text(element, "receive"),
        send: optional_text(element, "send"),
        font_size: optional_number(element, "font-size", path)?,
        width: optional_number(element, "width", path)?,
    })
}

/// Rebuild the widget fields from dotted attribute names.
fn widget_kind(element: &Element, path: &str) -> Result<GuiKind> {
    let mut fields = Map::new();
    for (key, text) in &element.attrs {
        let value = match text.as_str() {
            "true" => Json::Bool(true),
            "false" => Json::Bool(false),
            text => match text.parse::<f64>() {
                Ok(number) => serde_json::Number::from_f64(number)
                    .map(Json::Number)
                    .ok_or_else(|| xml_error(path, format!("`{key}` is not finite")))?,
                Err(_) => Json::String(text.to_string()),
            },
        };

        let mut target = &mut fields;
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                target.insert(part.to_string(), value);
                break;
            }
            let slot = target
                .entry(part.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            target = match slot {
                Json::Object(map) => map,
                _ => return Err(xml_error(path, format!("`{key}` clashes with another field"))),
            };
        }
    }

    let widget = fields
        .get("widget")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string();
    if !crate::model::WIDGET_TYPES.contains(&widget.as_str()) {
        return Err(PatchError::UnknownType {
            path: path.to_string(),
            kind: widget,
        });
    }
    serde_json::from_value(Json::Object(fields))
        .map_err(|e| xml_error(path, format!("bad widget fields: {e}")))
}
