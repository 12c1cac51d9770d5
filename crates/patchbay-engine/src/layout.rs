//! Automatic placement for boxes added without a position.
//!
//! Boxes are laid out left to right in rows. Each canvas keeps its own
//! [`Cursor`](crate::model::Cursor); explicit positions never touch it.

use crate::geometry::{Point, Size};
use crate::model::{Canvas, Node};
use crate::settings::LayoutSettings;

/// `(font size, cell width, cell height)` in pixels, as Pd renders its fonts.
pub const FONT_METRICS: [(f64, f64, f64); 6] = [
    (8.0, 5.0, 11.0),
    (10.0, 6.0, 13.0),
    (12.0, 7.0, 16.0),
    (16.0, 10.0, 19.0),
    (24.0, 14.0, 29.0),
    (36.0, 22.0, 44.0),
];

const MIN_CHARS: usize = 3;

/// Character cell of the largest metric not bigger than `font`.
pub fn cell_size(font: f64) -> Size {
    let (_, width, height) = FONT_METRICS
        .iter()
        .rev()
        .find(|(size, _, _)| *size <= font)
        .copied()
        .unwrap_or(FONT_METRICS[0]);
    Size::new(width, height)
}

/// Estimated on-canvas size of a node.
pub fn extent(node: &Node, font: f64, layout: &LayoutSettings) -> Size {
    let cell = cell_size(font);
    let pad = 2.0 * layout.padding;
    let height = cell.height + pad;

    match node {
        Node::Gui(gui) => gui.kind.extent(font),
        Node::AtomBox(atom) => Size::new(atom.digits.max(1.0) * cell.width + pad, height),
        _ => {
            let chars = match box_width(node) {
                Some(width) => width.max(1.0),
                None => node.label().chars().count().max(MIN_CHARS) as f64,
            };
            Size::new(chars * cell.width + pad, height)
        }
    }
}

fn box_width(node: &Node) -> Option<f64> {
    match node {
        Node::Object(node) => node.width,
        Node::Message(node) => node.width,
        Node::Comment(node) => node.width,
        Node::Subpatch(node) => node.width,
        Node::Array(node) => node.width,
        _ => None,
    }
}

/// Reserve room for a box of `size` at the canvas cursor and return its
/// top-left corner. The canvas only ever grows.
pub fn place(canvas: &mut Canvas, size: Size, layout: &LayoutSettings) -> Point {
    let cursor = &mut canvas.cursor;
    let mut position = cursor.position;

    if position.x > layout.margin && position.x + size.width + layout.margin > canvas.size.width
    {
        position = Point::new(
            layout.margin,
            position.y + cursor.row_height + layout.gap,
        );
        cursor.row_height = 0.0;
    }

    cursor.position = Point::new(position.x + size.width + layout.gap, position.y);
    cursor.row_height = cursor.row_height.max(size.height);

    canvas.size.width = canvas.size.width.max(position.x + size.width + layout.margin);
    canvas.size.height = canvas
        .size
        .height
        .max(position.y + size.height + layout.margin);

    position
}
