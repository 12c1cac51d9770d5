//! [`Patch`] back to native text.
//!
//! Output follows the native writer: words are separated by single spaces,
//! `,` and `;` attach to the word before them, and a line is broken after
//! every `;` or once it runs past 65 columns.

use crate::atom::{Atom, escape_symbol, format_float};
use crate::error::Result;
use crate::geometry::{Coords, Point};
use crate::model::{Canvas, CanvasHeader, Declaration, Edge, Node, Patch, Struct, Subpatch};

const WRAP_COLUMN: usize = 65;

pub fn encode_native(patch: &Patch) -> Result<String> {
    let mut writer = NativeWriter::default();

    for template in &patch.structs {
        writer.keywords("#N", "struct");
        for word in template.words() {
            writer.symbol(&word);
        }
        writer.semi();
    }

    for (i, canvas) in patch.canvases.iter().enumerate() {
        let declarations: &[Declaration] = if i == 0 { &patch.declarations } else { &[] };
        writer.canvas(canvas, declarations, &patch.structs)?;
    }

    Ok(writer.out)
}

#[derive(Default)]
struct NativeWriter {
    out: String,
    column: usize,
}

impl NativeWriter {
    /// Write an already escaped word followed by its separator.
    fn word(&mut self, text: &str) {
        self.out.push_str(text);
        self.column += text.len();
        self.separate(false);
    }

    fn separate(&mut self, semi: bool) {
        if semi || self.column > WRAP_COLUMN {
            self.out.push('\n');
            self.column = 0;
        } else {
            self.out.push(' ');
            self.column += 1;
        }
    }

    fn atom(&mut self, atom: &Atom) {
        self.word(&atom.to_string());
    }

    fn atoms(&mut self, atoms: &[Atom]) {
        for atom in atoms {
            self.atom(atom);
        }
    }

    fn symbol(&mut self, text: &str) {
        self.word(&escape_symbol(text));
    }

    fn float(&mut self, value: f64) {
        self.word(&format_float(value));
    }

    fn point(&mut self, point: Point) {
        self.float(point.x);
        self.float(point.y);
    }

    fn keywords(&mut self, marker: &str, keyword: &str) {
        self.word(marker);
        self.word(keyword);
    }

    fn delimiter(&mut self, delimiter: char, semi: bool) {
        if self.out.ends_with(' ') {
            self.out.pop();
            self.column = self.column.saturating_sub(1);
        }
        self.out.push(delimiter);
        self.column += 1;
        self.separate(semi);
    }

    fn comma(&mut self) {
        self.delimiter(',', false);
    }

    fn semi(&mut self) {
        self.delimiter(';', true);
    }

    /// `, f N` then the closing `;`.
    fn end_box(&mut self, width: Option<f64>) {
        if let Some(width) = width {
            self.comma();
            self.word("f");
            self.float(width);
        }
        self.semi();
    }

    fn data(&mut self, lines: &[Vec<Atom>]) {
        for line in lines {
            self.word("#A");
            self.atoms(line);
            self.semi();
        }
    }

    fn canvas(
        &mut self,
        canvas: &Canvas,
        declarations: &[Declaration],
        structs: &[Struct],
    ) -> Result<()> {
        self.keywords("#N", "canvas");
        self.point(canvas.screen);
        self.float(canvas.size.width);
        self.float(canvas.size.height);
        match &canvas.header {
            CanvasHeader::Root { font } => self.float(*font),
            CanvasHeader::Subpatch { title, visible } => {
                self.symbol(title);
                self.word(if *visible { "1" } else { "0" });
            }
        }
        self.semi();

        for declaration in declarations {
            self.keywords("#X", "declare");
            for entry in &declaration.entries {
                self.word(entry.flag.as_str());
                self.symbol(&entry.value);
            }
            self.semi();
        }

        for node in &canvas.nodes {
            self.node(node, structs)?;
        }
        for edge in &canvas.edges {
            self.edge(edge);
        }
        if let Some(coords) = &canvas.coords {
            self.coords(coords);
        }
        Ok(())
    }

    fn node(&mut self, node: &Node, structs: &[Struct]) -> Result<()> {
        match node {
            Node::Object(object) => {
                self.keywords("#X", "obj");
                self.point(object.position);
                if !object.class_name.is_empty() {
                    self.symbol(&object.class_name);
                }
                self.atoms(&object.args);
                self.end_box(object.width);
                self.data(&object.data);
            }
            Node::Message(message) => {
                self.keywords("#X", "msg");
                self.point(message.position);
                for word in message.words() {
                    self.symbol(&word);
                }
                self.end_box(message.width);
            }
            Node::Comment(comment) => {
                self.keywords("#X", "text");
                self.point(comment.position);
                for word in &comment.words {
                    self.symbol(word);
                }
                self.end_box(comment.width);
            }
            Node::AtomBox(atom_box) => {
                self.keywords("#X", atom_box.kind.keyword());
                self.point(atom_box.position);
                for word in atom_box.words() {
                    self.symbol(&word);
                }
                self.end_box(atom_box.width);
            }
            Node::Gui(gui) => {
                self.keywords("#X", "obj");
                self.point(gui.position);
                for word in gui.words() {
                    self.symbol(&word);
                }
                self.semi();
            }
            Node::Subpatch(subpatch) => self.subpatch(subpatch, structs)?,
            Node::GopArray(array) => {
                self.keywords("#X", "array");
                for word in array.words() {
                    self.symbol(&word);
                }
                self.semi();
                self.data(&array.data);
            }
            Node::Array(array) => {
                self.keywords("#X", "obj");
                self.point(array.position);
                for word in array.words() {
                    self.symbol(&word);
                }
                self.end_box(array.width);
                self.data(&array.data);
            }
            Node::Scalar(scalar) => {
                self.keywords("#X", "scalar");
                self.symbol(&scalar.template);
                for word in scalar.words(structs)? {
                    self.symbol(&word);
                }
                self.semi();
            }
        }
        Ok(())
    }

    fn subpatch(&mut self, subpatch: &Subpatch, structs: &[Struct]) -> Result<()> {
        self.canvas(&subpatch.canvas, &[], structs)?;
        self.keywords("#X", "restore");
        self.point(subpatch.position);
        if !subpatch.class_name.is_empty() {
            self.symbol(&subpatch.class_name);
        }
        self.atoms(&subpatch.args);
        self.end_box(subpatch.width);
        Ok(())
    }

    fn edge(&mut self, edge: &Edge) {
        self.keywords("#X", "connect");
        for value in [
            edge.source.index,
            edge.source.port,
            edge.sink.index,
            edge.sink.port,
        ] {
            self.word(&value.to_string());
        }
        self.semi();
    }

    fn coords(&mut self, coords: &Coords) {
        self.keywords("#X", "coords");
        self.point(coords.range.a);
        self.point(coords.range.b);
        self.float(coords.size.width);
        self.float(coords.size.height);
        self.float(coords.gop);
        if let Some(margin) = coords.margin {
            self.point(margin);
        }
        self.semi();
    }
}
