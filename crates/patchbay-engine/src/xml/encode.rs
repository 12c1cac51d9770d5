use serde_json::Value as Json;

use crate::atom::Atom;
use crate::error::{PatchError, Result};
use crate::geometry::{Coords, Point};
use crate::model::{
    ArrayDefine, ArrayFlag, AtomBox, Canvas, CanvasHeader, Declaration, Dependency, Edge,
    FieldKind, GopArray, Gui, Message, Node, Patch, Scalar, Struct, Value,
};

use super::dom::{Element, format_number};
use super::tags::{EMPTY_TAG, to_xml_tag};

pub(crate) fn patch_element(patch: &Patch) -> Result<Element> {
    let mut root = Element::new("patch")
        .attr("name", patch.name.as_str())
        .child(Element::new("structs").children(patch.structs.iter().map(struct_element)))
        .child(
            Element::new("declarations")
                .children(patch.declarations.iter().map(declaration_element)),
        )
        .child(
            Element::new("dependencies").children(patch.dependencies.iter().map(|dependency| {
                let name = match dependency {
                    Dependency::Lib(_) => "lib",
                    Dependency::Path(_) => "path",
                };
                Element::new(name).text(dependency.name())
            })),
        );
    for canvas in &patch.canvases {
        root = root.child(canvas_element(canvas)?);
    }
    Ok(root)
}

fn position(element: Element, position: Point) -> Element {
    element.number("x", position.x).number("y", position.y)
}

pub(crate) fn atom_element(atom: &Atom) -> Element {
    match atom {
        Atom::Float(value) => Element::new("float").number("value", *value),
        Atom::Symbol(text) => Element::new("symbol").attr("value", text.as_str()),
    }
}

fn atoms_element(name: &str, atoms: &[Atom]) -> Element {
    Element::new(name).children(atoms.iter().map(atom_element))
}

fn data_element(lines: &[Vec<Atom>]) -> Option<Element> {
    (!lines.is_empty()).then(|| {
        Element::new("data").children(lines.iter().map(|line| atoms_element("line", line)))
    })
}

fn struct_element(template: &Struct) -> Element {
    Element::new("struct")
        .attr("name", template.name.as_str())
        .children(template.fields.iter().map(|field| {
            let field_element = Element::new("field").attr("name", field.name.as_str());
            match &field.kind {
                FieldKind::Float => field_element.attr("kind", "float"),
                FieldKind::Symbol => field_element.attr("kind", "symbol"),
                FieldKind::Text => field_element.attr("kind", "text"),
                FieldKind::List => field_element.attr("kind", "list"),
                FieldKind::Array { template } => field_element
                    .attr("kind", "array")
                    .attr("template", template.as_str()),
            }
        }))
}

fn declaration_element(declaration: &Declaration) -> Element {
    Element::new("declare").children(declaration.entries.iter().map(|entry| {
        Element::new("entry")
            .attr("flag", entry.flag.as_str())
            .attr("value", entry.value.as_str())
    }))
}

fn canvas_element(canvas: &Canvas) -> Result<Element> {
    let mut element = position(Element::new("canvas"), canvas.screen)
        .number("width", canvas.size.width)
        .number("height", canvas.size.height);
    element = match &canvas.header {
        CanvasHeader::Root { font } => element.attr("kind", "root").number("font", *font),
        CanvasHeader::Subpatch { title, visible } => element
            .attr("kind", "subpatch")
            .attr("title", title.as_str())
            .attr("visible", visible.to_string()),
    };
    element = element
        .number("cursor-x", canvas.cursor.position.x)
        .number("cursor-y", canvas.cursor.position.y)
        .number("row-height", canvas.cursor.row_height);

    if let Some(coords) = &canvas.coords {
        element = element.child(coords_element(coords));
    }

    let nodes = canvas
        .nodes
        .iter()
        .map(node_element)
        .collect::<Result<Vec<_>>>()?;
    Ok(element
        .child(Element::new("nodes").children(nodes))
        .child(Element::new("edges").children(canvas.edges.iter().map(edge_element))))
}

fn coords_element(coords: &Coords) -> Element {
    Element::new("coords")
        .number("x1", coords.range.a.x)
        .number("y1", coords.range.a.y)
        .number("x2", coords.range.b.x)
        .number("y2", coords.range.b.y)
        .number("width", coords.size.width)
        .number("height", coords.size.height)
        .number("gop", coords.gop)
        .optional_number("margin-x", coords.margin.map(|m| m.x))
        .optional_number("margin-y", coords.margin.map(|m| m.y))
}

fn edge_element(edge: &Edge) -> Element {
    Element::new("edge")
        .attr("from", edge.source.index.to_string())
        .attr("outlet", edge.source.port.to_string())
        .attr("to", edge.sink.index.to_string())
        .attr("inlet", edge.sink.port.to_string())
}

fn class_tag(class_name: &str) -> Result<String> {
    if class_name.is_empty() {
        Ok(EMPTY_TAG.to_string())
    } else {
        to_xml_tag(class_name)
    }
}

fn node_element(node: &Node) -> Result<Element> {
    let element = match node {
        Node::Object(object) => {
            let mut element =
                position(Element::new(class_tag(&object.class_name)?), object.position)
                    .optional_number("width", object.width);
            if !object.args.is_empty() {
                element = element.child(atoms_element("args", &object.args));
            }
            element.children(data_element(&object.data))
        }
        Node::Message(message) => message_element(message),
        Node::Comment(comment) => position(Element::new("comment"), comment.position)
            .optional_number("width", comment.width)
            .children(
                comment
                    .words
                    .iter()
                    .map(|word| Element::new("word").attr("value", word.as_str())),
            ),
        Node::AtomBox(atom_box) => atom_box_element(atom_box),
        Node::Gui(gui) => gui_element(gui)?,
        Node::Subpatch(subpatch) => {
            let mut element =
                position(Element::new(class_tag(&subpatch.class_name)?), subpatch.position)
                    .optional_number("width", subpatch.width);
            if !subpatch.args.is_empty() {
                element = element.child(atoms_element("args", &subpatch.args));
            }
            element.child(canvas_element(&subpatch.canvas)?)
        }
        Node::GopArray(array) => gop_array_element(array),
        Node::Array(array) => array_element(array),
        Node::Scalar(scalar) => scalar_element(scalar),
    };
    Ok(with_type(element, node.type_name()))
}

/// Put the `type` attribute first, where a reader expects it.
fn with_type(mut element: Element, type_name: &str) -> Element {
    element
        .attrs
        .insert(0, ("type".to_string(), type_name.to_string()));
    element
}

fn messages(messages: &[Vec<Atom>]) -> impl Iterator<Item = Element> + '_ {
    messages.iter().map(|message| atoms_element("message", message))
}

fn message_element(message: &Message) -> Element {
    let mut element = position(Element::new("msg"), message.position)
        .optional_number("width", message.width);
    if !message.outlet.is_empty() {
        element = element.child(Element::new("outlet").children(messages(&message.outlet)));
    }
    element.children(message.targets.iter().map(|target| {
        Element::new("target")
            .attr("address", target.address.as_str())
            .children(messages(&target.messages))
    }))
}

fn atom_box_element(atom_box: &AtomBox) -> Element {
    position(Element::new(atom_box.kind.keyword()), atom_box.position)
        .number("digits", atom_box.digits)
        .number("lower", atom_box.limits.lower)
        .number("upper", atom_box.limits.upper)
        .number("label-position", atom_box.label_position)
        .optional("label", atom_box.label.as_deref())
        .optional("receive", atom_box.receive.as_deref())
        .optional("send", atom_box.send.as_deref())
        .optional_number("font-size", atom_box.font_size)
        .optional_number("width", atom_box.width)
}

fn gui_element(gui: &Gui) -> Result<Element> {
    let iem = &gui.iem;
    let mut kind = Element::new("kind");
    let fields = serde_json::to_value(&gui.kind)?;
    flatten(&fields, "", &mut kind)?;

    let colors = &iem.colors;
    let mut palette = Element::new("colors")
        .child(Element::new("background").child(atom_element(&colors.background)));
    if let Some(foreground) = &colors.foreground {
        palette = palette.child(Element::new("foreground").child(atom_element(foreground)));
    }
    palette = palette.child(Element::new("label").child(atom_element(&colors.label)));

    Ok(position(Element::new(class_tag(&gui.class_name)?), gui.position)
        .optional("send", iem.comm.send.as_deref())
        .optional("receive", iem.comm.receive.as_deref())
        .optional("label", iem.label.text.as_deref())
        .number("label-x", iem.label.offset.x)
        .number("label-y", iem.label.offset.y)
        .number("font-face", iem.label.font.face)
        .number("font-size", iem.label.font.size)
        .child(kind)
        .child(palette))
}

/// Write a JSON object's leaves as attributes, joining nested keys with `.`.
fn flatten(value: &Json, prefix: &str, element: &mut Element) -> Result<()> {
    match value {
        Json::Object(map) => {
            for (key, value) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(value, &key, element)?;
            }
        }
        Json::Number(number) => {
            let number = number.as_f64().ok_or_else(|| PatchError::Xml {
                path: prefix.to_string(),
                message: "number out of range".into(),
            })?;
            element.attrs.push((prefix.to_string(), format_number(number)));
        }
        Json::Bool(flag) => element.attrs.push((prefix.to_string(), flag.to_string())),
        Json::String(text) => element.attrs.push((prefix.to_string(), text.clone())),
        Json::Null | Json::Array(_) => {
            return Err(PatchError::Xml {
                path: prefix.to_string(),
                message: "widget field cannot be written as an attribute".into(),
            });
        }
    }
    Ok(())
}

fn gop_array_element(array: &GopArray) -> Element {
    Element::new("garray")
        .attr("name", array.name.as_str())
        .attr("element-type", array.element_type.as_str())
        .optional_number("flags", array.flags)
        .child(Element::new("size").child(atom_element(&array.size)))
        .children(data_element(&array.data))
}

fn array_element(array: &ArrayDefine) -> Element {
    let flags = array.flags.iter().map(|flag| match flag {
        ArrayFlag::Keep => Element::new("keep"),
        ArrayFlag::YRange(lo, hi) => atoms_element("yrange", &[lo.clone(), hi.clone()]),
        ArrayFlag::Pix(w, h) => atoms_element("pix", &[w.clone(), h.clone()]),
    });
    let mut element = position(Element::new("define"), array.position)
        .attr("class", array.class_name.as_str())
        .attr("define", array.define.to_string())
        .optional("name", array.name.as_deref())
        .optional_number("width", array.width)
        .child(Element::new("flags").children(flags));
    if !array.args.is_empty() {
        element = element.child(atoms_element("args", &array.args));
    }
    element.children(data_element(&array.data))
}

fn scalar_element(scalar: &Scalar) -> Element {
    Element::new("scalar")
        .attr("template", scalar.template.as_str())
        .children(scalar.values.iter().map(value_element))
}

fn value_element(value: &Value) -> Element {
    match value {
        Value::Float(v) => Element::new("float").number("value", *v),
        Value::Symbol(s) => Element::new("symbol").attr("value", s.as_str()),
        Value::Text(atoms) => atoms_element("text", atoms),
        Value::Array(elements) => Element::new("array").children(
            elements
                .iter()
                .map(|element| Element::new("element").children(element.iter().map(value_element))),
        ),
    }
}
