//! Incremental construction of a [`Patch`].
//!
//! Canvases live in an arena and are addressed by [`CanvasId`]. A subpatch
//! is only linked into its parent when it is restored, which is also when it
//! receives its index in the parent, matching the order Pd assigns.

use std::collections::HashMap;

use crate::atom::Atom;
use crate::error::{PatchError, Result};
use crate::geometry::{Coords, Point, Size};
use crate::layout;
use crate::model::{
    ArrayDefine, AtomBox, Canvas, CanvasHeader, Comment, Declaration, Dependencies, Dependency,
    Edge, GopArray, Gui, Message, Node, Object, Patch, Scalar, Struct, Subpatch,
};
use crate::settings::Settings;

/// Arena index of a canvas inside a [`PatchBuilder`].
pub type CanvasId = usize;

/// The `#X restore` half of a subpatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Restore {
    /// `None` asks the layout engine for a spot in the parent
    pub position: Option<Point>,
    pub class_name: String,
    pub args: Vec<Atom>,
    pub width: Option<f64>,
}

impl Restore {
    pub fn new(class_name: impl Into<String>, args: Vec<Atom>) -> Self {
        Self {
            position: None,
            class_name: class_name.into(),
            args,
            width: None,
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug)]
enum Slot {
    Node(Node),
    Child { canvas: CanvasId, restore: Restore },
}

#[derive(Debug)]
struct CanvasEntry {
    canvas: Canvas,
    slots: Vec<Slot>,
    font: f64,
}

pub struct PatchBuilder<'s> {
    settings: &'s Settings,
    name: String,
    canvases: Vec<Option<CanvasEntry>>,
    stack: Vec<CanvasId>,
    roots: Vec<CanvasId>,
    structs: Vec<Struct>,
    declarations: Vec<Declaration>,
    dependencies: Dependencies,
    last: Option<(CanvasId, usize)>,
    origins: HashMap<(CanvasId, usize), Point>,
}

impl<'s> PatchBuilder<'s> {
    pub fn new(name: impl Into<String>, settings: &'s Settings) -> Self {
        Self {
            settings,
            name: name.into(),
            canvases: Vec::new(),
            stack: Vec::new(),
            roots: Vec::new(),
            structs: Vec::new(),
            declarations: Vec::new(),
            dependencies: Dependencies::default(),
            last: None,
            origins: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &'s Settings {
        self.settings
    }

    /// The canvas new nodes are added to.
    pub fn current_canvas(&self) -> Option<CanvasId> {
        self.stack.last().copied()
    }

    pub fn structs(&self) -> &[Struct] {
        &self.structs
    }

    /// Number of nodes placed on a canvas so far.
    pub fn node_count(&self, canvas: CanvasId) -> Result<usize> {
        Ok(self.entry(canvas)?.slots.len())
    }

    /// Open a canvas. A root header while only another root is open closes
    /// that root and starts a new top-level canvas.
    pub fn open_canvas(
        &mut self,
        header: CanvasHeader,
        screen: Option<Point>,
        size: Option<Size>,
    ) -> Result<CanvasId> {
        let settings = self.settings;
        let defaults = &settings.canvas;
        let font = match &header {
            CanvasHeader::Root { font } => {
                match self.stack.len() {
                    0 => {}
                    1 => {
                        self.stack.pop();
                    }
                    depth => {
                        return Err(PatchError::argument(format!(
                            "top-level canvas opened with {} subpatches still open",
                            depth - 1
                        )));
                    }
                }
                *font
            }
            CanvasHeader::Subpatch { .. } => {
                let parent = self.current_canvas().ok_or_else(|| {
                    PatchError::argument("subpatch canvas opened before any top-level canvas")
                })?;
                self.entry(parent)?.font
            }
        };

        let id = self.canvases.len();
        let is_root = matches!(header, CanvasHeader::Root { .. });
        let canvas = Canvas::new(
            header,
            screen.unwrap_or(defaults.screen),
            size.unwrap_or(defaults.size),
            settings.layout.margin,
        );
        self.canvases.push(Some(CanvasEntry {
            canvas,
            slots: Vec::new(),
            font,
        }));
        if is_root {
            self.roots.push(id);
        }
        self.stack.push(id);
        log::trace!("opened canvas {id} at depth {}", self.stack.len());
        Ok(id)
    }

    /// Open a top-level canvas with the configured font.
    pub fn open_root(&mut self, screen: Option<Point>, size: Option<Size>) -> Result<CanvasId> {
        let font = self.settings.canvas.font;
        self.open_canvas(CanvasHeader::Root { font }, screen, size)
    }

    pub fn add_object(&mut self, object: Object, position: Option<Point>) -> Result<usize> {
        self.add_node(Node::Object(object), position)
    }

    pub fn add_message(&mut self, message: Message, position: Option<Point>) -> Result<usize> {
        self.add_node(Node::Message(message), position)
    }

    pub fn add_comment(&mut self, comment: Comment, position: Option<Point>) -> Result<usize> {
        self.add_node(Node::Comment(comment), position)
    }

    pub fn add_atom_box(&mut self, atom_box: AtomBox, position: Option<Point>) -> Result<usize> {
        atom_box.validate()?;
        self.add_node(Node::AtomBox(atom_box), position)
    }

    pub fn add_gui(&mut self, gui: Gui, position: Option<Point>) -> Result<usize> {
        gui.validate(self.settings.log_range)?;
        self.add_node(Node::Gui(gui), position)
    }

    pub fn add_array(&mut self, array: ArrayDefine, position: Option<Point>) -> Result<usize> {
        self.add_node(Node::Array(array), position)
    }

    /// An `#X array` line. These only appear inside graphs.
    pub fn add_gop_array(&mut self, array: GopArray) -> Result<usize> {
        self.add_node(Node::GopArray(array), None)
    }

    /// Add a graph holding one array, with the coords Pd gives a new one.
    /// Returns the graph's index in the current canvas.
    pub fn add_graph(
        &mut self,
        name: impl Into<String>,
        size: Option<Atom>,
        position: Option<Point>,
    ) -> Result<usize> {
        let settings = self.settings;
        let defaults = &settings.array;
        let size = size.unwrap_or(Atom::Float(defaults.length));
        let length = size.as_float().unwrap_or(defaults.length);
        let array = GopArray {
            name: name.into(),
            size,
            element_type: defaults.element_type.clone(),
            flags: Some(defaults.flags),
            data: Vec::new(),
        };
        let coords = Coords::for_array(length, defaults.graph_size);

        self.open_canvas(
            CanvasHeader::Subpatch {
                title: settings.canvas.subpatch_title.clone(),
                visible: false,
            },
            None,
            None,
        )?;
        self.add_gop_array(array)?;
        self.set_coords(coords)?;

        let mut restore = Restore::new("graph", Vec::new());
        restore.position = position;
        self.restore(restore)
    }

    /// Add a scalar after checking it against the known templates.
    pub fn add_scalar(&mut self, scalar: Scalar) -> Result<usize> {
        scalar.validate(&self.structs)?;
        self.add_node(Node::Scalar(scalar), None)
    }

    pub fn add_struct(&mut self, template: Struct) -> Result<()> {
        if self.structs.iter().any(|s| s.name == template.name) {
            return Err(PatchError::argument(format!(
                "struct `{}` is declared twice",
                template.name
            )));
        }
        self.structs.push(template);
        Ok(())
    }

    /// Record a `#X declare` statement and its dependencies.
    pub fn add_declaration(&mut self, declaration: Declaration) {
        for dependency in declaration.dependencies() {
            self.dependencies.insert(dependency);
        }
        self.declarations.push(declaration);
    }

    /// Record a dependency that has no declaration of its own.
    pub fn add_dependency(&mut self, dependency: Dependency) -> bool {
        self.dependencies.insert(dependency)
    }

    /// Connect two nodes of the current canvas.
    pub fn connect(&mut self, edge: Edge) -> Result<()> {
        let canvas = self.require_canvas()?;
        self.connect_in(canvas, edge)
    }

    pub fn connect_in(&mut self, canvas: CanvasId, edge: Edge) -> Result<()> {
        let entry = self.entry_mut(canvas)?;
        let len = entry.slots.len();
        if edge.source.index >= len || edge.sink.index >= len {
            return Err(PatchError::DanglingEdge {
                statement: None,
                canvas,
                from: edge.source.index,
                to: edge.sink.index,
                len,
            });
        }
        entry.canvas.edges.push(edge);
        Ok(())
    }

    /// Remove a connection from the current canvas. Returns whether it was there.
    pub fn disconnect(&mut self, edge: &Edge) -> Result<bool> {
        let canvas = self.require_canvas()?;
        let edges = &mut self.entry_mut(canvas)?.canvas.edges;
        let before = edges.len();
        edges.retain(|existing| existing != edge);
        Ok(edges.len() < before)
    }

    pub fn set_coords(&mut self, coords: Coords) -> Result<()> {
        let canvas = self.require_canvas()?;
        self.entry_mut(canvas)?.canvas.coords = Some(coords);
        Ok(())
    }

    /// Append an `#A` line to the most recently added node.
    pub fn attach_data(&mut self, line: Vec<Atom>) -> Result<()> {
        let data = match self.last_slot()? {
            Slot::Node(node) => node.data_mut(),
            Slot::Child { .. } => None,
        };
        data.map(|data| data.push(line))
            .ok_or_else(|| PatchError::argument("saved data does not follow an array or object"))
    }

    /// Set the `, f N` box width of the most recently added node.
    pub fn set_width(&mut self, width: f64) -> Result<()> {
        let slot = match self.last_slot()? {
            Slot::Node(node) => node.width_mut(),
            Slot::Child { restore, .. } => Some(&mut restore.width),
        };
        slot.map(|slot| *slot = Some(width))
            .ok_or_else(|| PatchError::argument("box width set on a node that has none"))
    }

    /// Close the current subpatch into its parent and return its index there.
    pub fn restore(&mut self, mut restore: Restore) -> Result<usize> {
        if self.stack.len() < 2 {
            return Err(PatchError::argument("restore without an open subpatch"));
        }
        let child = self.stack.pop().ok_or_else(|| {
            PatchError::argument("restore without an open subpatch")
        })?;
        let parent = self.require_canvas()?;

        let settings = self.settings;
        let layout = &settings.layout;
        let entry = self.entry_mut(parent)?;
        if restore.position.is_none() {
            let mut stand_in = Object::new(restore.class_name.clone(), restore.args.clone());
            stand_in.width = restore.width;
            let size = layout::extent(&Node::Object(stand_in), entry.font, layout);
            restore.position = Some(layout::place(&mut entry.canvas, size, layout));
        }
        entry.slots.push(Slot::Child {
            canvas: child,
            restore,
        });
        let index = entry.slots.len() - 1;
        self.last = Some((parent, index));
        log::trace!("restored canvas {child} as node {index} of canvas {parent}");
        Ok(index)
    }

    /// Move a node to an absolute position. Repeating the call is a no-op.
    pub fn move_to(&mut self, canvas: CanvasId, index: usize, position: Point) -> Result<()> {
        self.set_position(canvas, index, position)?;
        self.origins.insert((canvas, index), position);
        Ok(())
    }

    /// Offset a node from the position it had before its first translation.
    pub fn translate(&mut self, canvas: CanvasId, index: usize, dx: f64, dy: f64) -> Result<()> {
        let current = self.position_of(canvas, index)?;
        let origin = *self.origins.entry((canvas, index)).or_insert(current);
        self.set_position(canvas, index, origin.translate(dx, dy))
    }

    /// Link all canvases into the final tree.
    pub fn finish(mut self) -> Result<Patch> {
        if self.stack.len() > 1 {
            return Err(PatchError::argument(format!(
                "{} subpatch(es) never restored",
                self.stack.len() - 1
            )));
        }

        let roots = std::mem::take(&mut self.roots);
        let canvases = roots
            .into_iter()
            .map(|id| self.assemble(id))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "built patch `{}`: {} top-level canvas(es), {} struct(s), {} dependencies",
            self.name,
            canvases.len(),
            self.structs.len(),
            self.dependencies.len()
        );
        Ok(Patch {
            name: self.name,
            structs: self.structs,
            declarations: self.declarations,
            dependencies: self.dependencies,
            canvases,
        })
    }

    fn assemble(&mut self, id: CanvasId) -> Result<Canvas> {
        let entry = self
            .canvases
            .get_mut(id)
            .and_then(Option::take)
            .ok_or_else(|| PatchError::argument(format!("canvas {id} is linked twice")))?;

        let mut canvas = entry.canvas;
        for slot in entry.slots {
            let node = match slot {
                Slot::Node(node) => node,
                Slot::Child { canvas: child, restore } => Node::Subpatch(Subpatch {
                    position: restore.position.unwrap_or_default(),
                    class_name: restore.class_name,
                    args: restore.args,
                    width: restore.width,
                    canvas: self.assemble(child)?,
                }),
            };
            canvas.nodes.push(node);
        }
        Ok(canvas)
    }

    fn add_node(&mut self, mut node: Node, position: Option<Point>) -> Result<usize> {
        let id = self.require_canvas()?;
        let settings = self.settings;
        let layout = &settings.layout;
        let entry = self.entry_mut(id)?;

        match position {
            Some(position) => {
                node.set_position(position);
            }
            None if node.position().is_some() => {
                let size = layout::extent(&node, entry.font, layout);
                node.set_position(layout::place(&mut entry.canvas, size, layout));
            }
            None => {}
        }

        entry.slots.push(Slot::Node(node));
        let index = entry.slots.len() - 1;
        self.last = Some((id, index));
        Ok(index)
    }

    fn require_canvas(&self) -> Result<CanvasId> {
        self.current_canvas()
            .ok_or_else(|| PatchError::argument("no canvas is open"))
    }

    fn entry(&self, id: CanvasId) -> Result<&CanvasEntry> {
        self.canvases
            .get(id)
            .and_then(Option::as_ref)
            .ok_or_else(|| PatchError::argument(format!("unknown canvas {id}")))
    }

    fn entry_mut(&mut self, id: CanvasId) -> Result<&mut CanvasEntry> {
        self.canvases
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| PatchError::argument(format!("unknown canvas {id}")))
    }

    fn slot_mut(&mut self, canvas: CanvasId, index: usize) -> Result<&mut Slot> {
        self.entry_mut(canvas)?
            .slots
            .get_mut(index)
            .ok_or_else(|| PatchError::argument(format!("canvas {canvas} has no node {index}")))
    }

    fn last_slot(&mut self) -> Result<&mut Slot> {
        let (canvas, index) = self
            .last
            .ok_or_else(|| PatchError::argument("no node to attach to"))?;
        self.slot_mut(canvas, index)
    }

    fn position_of(&mut self, canvas: CanvasId, index: usize) -> Result<Point> {
        match self.slot_mut(canvas, index)? {
            Slot::Node(node) => node
                .position()
                .ok_or_else(|| PatchError::argument(format!("node {index} has no position"))),
            Slot::Child { restore, .. } => Ok(restore.position.unwrap_or_default()),
        }
    }

    fn set_position(&mut self, canvas: CanvasId, index: usize, position: Point) -> Result<()> {
        match self.slot_mut(canvas, index)? {
            Slot::Node(node) => {
                if node.set_position(position) {
                    Ok(())
                } else {
                    Err(PatchError::argument(format!("node {index} has no position")))
                }
            }
            Slot::Child { restore, .. } => {
                restore.position = Some(position);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Area;
    use crate::model::{GuiKind, Value};
    use pretty_assertions::assert_eq;

    fn root() -> CanvasHeader {
        CanvasHeader::Root { font: 12.0 }
    }

    fn subpatch(title: &str) -> CanvasHeader {
        CanvasHeader::Subpatch {
            title: title.into(),
            visible: false,
        }
    }

    #[test]
    fn open_root_uses_the_configured_font() {
        let mut settings = Settings::default();
        settings.canvas.font = 16.0;
        let mut builder = PatchBuilder::new("t", &settings);

        builder.open_root(None, None).unwrap();
        let patch = builder.finish().unwrap();

        assert_eq!(patch.canvases[0].header, CanvasHeader::Root { font: 16.0 });
        assert_eq!(patch.canvases[0].screen, settings.canvas.screen);
    }

    #[test]
    fn disconnect_removes_only_the_matching_edge() {
        // Given two connections out of the same outlet
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_root(None, None).unwrap();
        let osc = builder.add_object(Object::new("osc~", vec![440.0.into()]), None).unwrap();
        let dac = builder.add_object(Object::new("dac~", vec![]), None).unwrap();
        builder.connect(Edge::new(osc, 0, dac, 0)).unwrap();
        builder.connect(Edge::new(osc, 0, dac, 1)).unwrap();

        // When one is removed, then removed again
        let removed = builder.disconnect(&Edge::new(osc, 0, dac, 1)).unwrap();
        let again = builder.disconnect(&Edge::new(osc, 0, dac, 1)).unwrap();

        // Then only the left channel stays connected
        assert!(removed);
        assert!(!again);
        let patch = builder.finish().unwrap();
        assert_eq!(patch.canvases[0].edges, vec![Edge::new(0, 0, 1, 0)]);
    }

    #[test]
    fn adds_return_canvas_local_indices() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();

        let osc = builder.add_object(Object::new("osc~", vec![440.0.into()]), None).unwrap();
        let dac = builder.add_object(Object::new("dac~", vec![]), None).unwrap();
        builder.connect(Edge::new(osc, 0, dac, 0)).unwrap();

        assert_eq!((osc, dac), (0, 1));
        let patch = builder.finish().unwrap();
        assert_eq!(patch.canvases[0].edges, vec![Edge::new(0, 0, 1, 0)]);
    }

    #[test]
    fn connect_rejects_unknown_indices() {
        // Given a canvas with two nodes
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        builder.add_object(Object::new("a", vec![]), None).unwrap();
        builder.add_object(Object::new("b", vec![]), None).unwrap();

        // When connecting to a node that does not exist
        let result = builder.connect(Edge::new(0, 0, 5, 0));

        // Then the edge is reported as dangling
        assert!(matches!(
            result,
            Err(PatchError::DanglingEdge { to: 5, len: 2, .. })
        ));
    }

    #[test]
    fn subpatch_takes_its_index_at_restore() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        builder.add_object(Object::new("inlet", vec![]), None).unwrap();
        builder.open_canvas(subpatch("inner"), None, None).unwrap();
        builder.add_object(Object::new("outlet", vec![]), None).unwrap();
        builder.add_object(Object::new("outlet", vec![]), None).unwrap();
        let index = builder
            .restore(Restore::new("pd", vec![Atom::symbol("inner")]))
            .unwrap();
        let after = builder.add_object(Object::new("print", vec![]), None).unwrap();

        assert_eq!((index, after), (1, 2));
        let patch = builder.finish().unwrap();
        let Node::Subpatch(inner) = &patch.canvases[0].nodes[1] else {
            panic!("expected a subpatch");
        };
        assert_eq!(inner.canvas.nodes.len(), 2);
        assert_eq!(inner.text(), "pd inner");
    }

    #[test]
    fn unclosed_subpatch_fails_at_finish() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        builder.open_canvas(subpatch("open"), None, None).unwrap();
        assert!(matches!(builder.finish(), Err(PatchError::Argument { .. })));
    }

    #[test]
    fn restore_without_subpatch_fails() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        assert!(builder.restore(Restore::new("pd", vec![])).is_err());
    }

    #[test]
    fn auto_placed_nodes_do_not_overlap() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        for name in ["metro 500", "random 127", "mtof", "osc~", "*~ 0.1", "dac~", "print"] {
            builder.add_object(Object::new(name, vec![]), None).unwrap();
        }
        let patch = builder.finish().unwrap();
        let canvas = &patch.canvases[0];
        let areas: Vec<Area> = canvas
            .nodes
            .iter()
            .map(|node| {
                let size = layout::extent(node, 12.0, &settings.layout);
                Area::from_origin(node.position().unwrap(), size)
            })
            .collect();
        for (i, a) in areas.iter().enumerate() {
            for b in &areas[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn translate_is_relative_to_the_original_position() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        let canvas = builder.open_canvas(root(), None, None).unwrap();
        let index = builder
            .add_object(Object::new("f", vec![]), Some(Point::new(10.0, 10.0)))
            .unwrap();

        builder.translate(canvas, index, 5.0, 5.0).unwrap();
        builder.translate(canvas, index, 5.0, 5.0).unwrap();
        builder.move_to(canvas, index, Point::new(50.0, 50.0)).unwrap();
        builder.move_to(canvas, index, Point::new(50.0, 50.0)).unwrap();
        builder.translate(canvas, index, 1.0, 0.0).unwrap();

        let patch = builder.finish().unwrap();
        assert_eq!(patch.canvases[0].nodes[0].position(), Some(Point::new(51.0, 50.0)));
    }

    #[test]
    fn graph_wraps_an_array_with_coords() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        let index = builder.add_graph("table1", Some(Atom::Float(64.0)), None).unwrap();
        builder.attach_data(vec![0.0.into(), 0.5.into()]).unwrap_err();

        let patch = builder.finish().unwrap();
        let Node::Subpatch(graph) = &patch.canvases[0].nodes[index] else {
            panic!("expected a graph");
        };
        assert_eq!(graph.class_name, "graph");
        assert_eq!(graph.canvas.coords.as_ref().unwrap().range.width(), 64.0);
        assert!(matches!(graph.canvas.nodes[0], Node::GopArray(_)));
    }

    #[test]
    fn width_and_data_attach_to_the_last_node() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        builder
            .add_array(
                ArrayDefine::from_words("table", Point::default(), &["t1", "3"]).unwrap(),
                None,
            )
            .unwrap();
        builder.attach_data(vec![0.0.into(), 1.0.into()]).unwrap();
        builder.set_width(20.0).unwrap();

        let patch = builder.finish().unwrap();
        let Node::Array(array) = &patch.canvases[0].nodes[0] else {
            panic!("expected an array");
        };
        assert_eq!(array.data.len(), 1);
        assert_eq!(array.width, Some(20.0));
    }

    #[test]
    fn duplicate_struct_is_rejected() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        let template = Struct::from_words(&["pt", "float", "x"]).unwrap();
        builder.add_struct(template.clone()).unwrap();
        assert!(builder.add_struct(template).is_err());
    }

    #[test]
    fn scalar_is_checked_against_its_template() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        builder
            .add_struct(Struct::from_words(&["pt", "float", "x"]).unwrap())
            .unwrap();

        let good = Scalar {
            template: "pt".into(),
            values: vec![Value::Float(1.0)],
        };
        let bad = Scalar {
            template: "pt".into(),
            values: vec![Value::Symbol("x".into())],
        };
        assert!(builder.add_scalar(good).is_ok());
        assert!(builder.add_scalar(bad).is_err());
    }

    #[test]
    fn second_root_starts_a_new_top_level_canvas() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        builder.add_object(Object::new("a", vec![]), None).unwrap();
        builder.open_canvas(root(), None, None).unwrap();
        builder.add_object(Object::new("b", vec![]), None).unwrap();

        let patch = builder.finish().unwrap();
        assert_eq!(patch.canvases.len(), 2);
        assert_eq!(patch.canvases[1].nodes.len(), 1);
    }

    #[test]
    fn gui_defaults_pass_validation() {
        let settings = Settings::default();
        let mut builder = PatchBuilder::new("t", &settings);
        builder.open_canvas(root(), None, None).unwrap();
        let gui = Gui::with_defaults("hsl", &settings).unwrap();
        builder.add_gui(gui, None).unwrap();

        let patch = builder.finish().unwrap();
        let Node::Gui(gui) = &patch.canvases[0].nodes[0] else {
            panic!("expected a widget");
        };
        assert!(matches!(gui.kind, GuiKind::Slider { .. }));
    }
}
