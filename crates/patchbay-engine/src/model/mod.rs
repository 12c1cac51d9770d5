pub mod boxes;
pub mod builder;
pub mod data;
pub mod gui;
pub mod patch;
pub mod validate;

pub use boxes::{Comment, Message, MessageTarget, Object, Subpatch};
pub use builder::{CanvasId, PatchBuilder, Restore};
pub use data::{ArrayDefine, ArrayFlag, Field, FieldKind, GopArray, Scalar, Struct, Value};
pub use gui::{
    AtomBox, AtomKind, Comm, Gui, GuiKind, IEM_CLASSES, Iem, IemColors, IemFont, IemLabel,
    Orientation, WIDGET_TYPES, is_iem_class,
};
pub use patch::{
    Canvas, CanvasHeader, Cursor, DeclareEntry, DeclareFlag, Declaration, Dependencies,
    Dependency, Edge, NODE_TYPES, Node, Patch, Source,
};
