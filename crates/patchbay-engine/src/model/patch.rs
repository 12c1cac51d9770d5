use serde::{Deserialize, Serialize};

use crate::geometry::{Area, Point, Size};
use crate::model::{
    ArrayDefine, AtomBox, Comment, Gui, GopArray, Message, Object, Scalar, Struct, Subpatch,
};

/// Root of the object model: one converted patch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub dependencies: Dependencies,
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

impl Patch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            structs: Vec::new(),
            declarations: Vec::new(),
            dependencies: Dependencies::default(),
            canvases: Vec::new(),
        }
    }

    /// The first top-level canvas.
    pub fn root(&self) -> Option<&Canvas> {
        self.canvases.first()
    }

    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Every canvas in the tree, depth first, parents before children.
    pub fn all_canvases(&self) -> Vec<&Canvas> {
        let mut out = Vec::new();
        for canvas in &self.canvases {
            canvas.collect(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CanvasHeader {
    Root { font: f64 },
    Subpatch { title: String, visible: bool },
}

/// Auto-layout state of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub position: Point,
    pub row_height: f64,
}

impl Cursor {
    pub fn start(margin: f64) -> Self {
        Self {
            position: Point::new(margin, margin),
            row_height: 0.0,
        }
    }
}

/// A patch window or subpatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub screen: Point,
    pub size: Size,
    pub header: CanvasHeader,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<crate::geometry::Coords>,
    #[serde(default)]
    pub cursor: Cursor,
}

impl Canvas {
    pub fn new(header: CanvasHeader, screen: Point, size: Size, margin: f64) -> Self {
        Self {
            screen,
            size,
            header,
            nodes: Vec::new(),
            edges: Vec::new(),
            coords: None,
            cursor: Cursor::start(margin),
        }
    }

    /// Window geometry as a rectangle in screen coordinates.
    pub fn bounds(&self) -> Area {
        Area::from_origin(self.screen, self.size)
    }

    pub fn is_root(&self) -> bool {
        matches!(self.header, CanvasHeader::Root { .. })
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Canvas>) {
        out.push(self);
        for node in &self.nodes {
            if let Node::Subpatch(subpatch) = node {
                subpatch.canvas.collect(out);
            }
        }
    }
}

/// One box on a canvas. The index of a node is its position in
/// [`Canvas::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Object(Object),
    Message(Message),
    Comment(Comment),
    AtomBox(AtomBox),
    Gui(Gui),
    Subpatch(Subpatch),
    GopArray(GopArray),
    Array(ArrayDefine),
    Scalar(Scalar),
}

/// Discriminator values of [`Node`], as written by the JSON and XML codecs.
pub const NODE_TYPES: [&str; 9] = [
    "Object", "Message", "Comment", "AtomBox", "Gui", "Subpatch", "GopArray", "Array", "Scalar",
];

impl Node {
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Object(_) => "Object",
            Node::Message(_) => "Message",
            Node::Comment(_) => "Comment",
            Node::AtomBox(_) => "AtomBox",
            Node::Gui(_) => "Gui",
            Node::Subpatch(_) => "Subpatch",
            Node::GopArray(_) => "GopArray",
            Node::Array(_) => "Array",
            Node::Scalar(_) => "Scalar",
        }
    }

    /// Canvas position, for nodes that have one.
    pub fn position(&self) -> Option<Point> {
        match self {
            Node::Object(node) => Some(node.position),
            Node::Message(node) => Some(node.position),
            Node::Comment(node) => Some(node.position),
            Node::AtomBox(node) => Some(node.position),
            Node::Gui(node) => Some(node.position),
            Node::Subpatch(node) => Some(node.position),
            Node::Array(node) => Some(node.position),
            Node::GopArray(_) | Node::Scalar(_) => None,
        }
    }

    /// Returns false for nodes without a position.
    pub fn set_position(&mut self, position: Point) -> bool {
        let slot = match self {
            Node::Object(node) => &mut node.position,
            Node::Message(node) => &mut node.position,
            Node::Comment(node) => &mut node.position,
            Node::AtomBox(node) => &mut node.position,
            Node::Gui(node) => &mut node.position,
            Node::Subpatch(node) => &mut node.position,
            Node::Array(node) => &mut node.position,
            Node::GopArray(_) | Node::Scalar(_) => return false,
        };
        *slot = position;
        true
    }

    /// The `, f N` box width slot, for nodes that can carry one.
    pub fn width_mut(&mut self) -> Option<&mut Option<f64>> {
        match self {
            Node::Object(node) => Some(&mut node.width),
            Node::Message(node) => Some(&mut node.width),
            Node::Comment(node) => Some(&mut node.width),
            Node::AtomBox(node) => Some(&mut node.width),
            Node::Subpatch(node) => Some(&mut node.width),
            Node::Array(node) => Some(&mut node.width),
            Node::Gui(_) | Node::GopArray(_) | Node::Scalar(_) => None,
        }
    }

    /// Saved `#A` lines, for nodes that own data.
    pub fn data_mut(&mut self) -> Option<&mut Vec<Vec<crate::atom::Atom>>> {
        match self {
            Node::Object(node) => Some(&mut node.data),
            Node::GopArray(node) => Some(&mut node.data),
            Node::Array(node) => Some(&mut node.data),
            _ => None,
        }
    }

    /// The text a box shows, used to estimate its rendered width.
    pub fn label(&self) -> String {
        match self {
            Node::Object(node) => node.text(),
            Node::Message(node) => node.text(),
            Node::Comment(node) => node.text(),
            Node::AtomBox(node) => "0".repeat(node.digits.max(1.0) as usize),
            Node::Gui(node) => node.class_name.clone(),
            Node::Subpatch(node) => node.text(),
            Node::Array(node) => node.text(),
            Node::GopArray(node) => node.name.clone(),
            Node::Scalar(node) => node.template.clone(),
        }
    }
}

/// One end of a connection: a node index and an outlet or inlet number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub index: usize,
    pub port: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: Source,
    pub sink: Source,
}

impl Edge {
    pub fn new(from: usize, outlet: usize, to: usize, inlet: usize) -> Self {
        Self {
            source: Source {
                index: from,
                port: outlet,
            },
            sink: Source {
                index: to,
                port: inlet,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclareFlag {
    Path,
    Lib,
    StdPath,
    StdLib,
}

impl DeclareFlag {
    pub fn parse(flag: &str) -> Option<Self> {
        match flag {
            "-path" => Some(DeclareFlag::Path),
            "-lib" => Some(DeclareFlag::Lib),
            "-stdpath" => Some(DeclareFlag::StdPath),
            "-stdlib" => Some(DeclareFlag::StdLib),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclareFlag::Path => "-path",
            DeclareFlag::Lib => "-lib",
            DeclareFlag::StdPath => "-stdpath",
            DeclareFlag::StdLib => "-stdlib",
        }
    }

    pub fn dependency(&self, value: &str) -> Dependency {
        match self {
            DeclareFlag::Path | DeclareFlag::StdPath => Dependency::Path(value.to_string()),
            DeclareFlag::Lib | DeclareFlag::StdLib => Dependency::Lib(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareEntry {
    pub flag: DeclareFlag,
    pub value: String,
}

/// A `#X declare` statement, kept in its written order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Declaration {
    pub entries: Vec<DeclareEntry>,
}

impl Declaration {
    pub fn dependencies(&self) -> impl Iterator<Item = Dependency> + '_ {
        self.entries
            .iter()
            .map(|entry| entry.flag.dependency(&entry.value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dependency {
    Path(String),
    Lib(String),
}

impl Dependency {
    pub fn name(&self) -> &str {
        match self {
            Dependency::Path(name) | Dependency::Lib(name) => name,
        }
    }
}

/// Insertion-ordered set of external references. Entries are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dependencies {
    entries: Vec<Dependency>,
}

impl Dependencies {
    /// Returns true if the entry was new.
    pub fn insert(&mut self, dependency: Dependency) -> bool {
        if self.entries.contains(&dependency) {
            return false;
        }
        self.entries.push(dependency);
        true
    }

    pub fn merge(&mut self, other: &Dependencies) {
        for dependency in &other.entries {
            self.insert(dependency.clone());
        }
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.entries.contains(dependency)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|d| match d {
            Dependency::Path(path) => Some(path.as_str()),
            Dependency::Lib(_) => None,
        })
    }

    pub fn libs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|d| match d {
            Dependency::Lib(lib) => Some(lib.as_str()),
            Dependency::Path(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Dependency> for Dependencies {
    fn from_iter<T: IntoIterator<Item = Dependency>>(iter: T) -> Self {
        let mut set = Dependencies::default();
        for dependency in iter {
            set.insert(dependency);
        }
        set
    }
}
