//! Invariant checks for a patch that did not come through the builder,
//! such as one decoded from JSON or XML.

use std::collections::HashSet;

use crate::error::{PatchError, Result};
use crate::model::{Node, Patch};
use crate::settings::Settings;

impl Patch {
    /// Check edges, widget ranges, scalars and template names.
    ///
    /// Canvases are numbered depth first, parents before children, the same
    /// order [`Patch::all_canvases`] returns.
    pub fn validate(&self, settings: &Settings) -> Result<()> {
        let mut names = HashSet::new();
        for template in &self.structs {
            if !names.insert(template.name.as_str()) {
                return Err(PatchError::argument(format!(
                    "struct `{}` is declared twice",
                    template.name
                )));
            }
        }

        for (id, canvas) in self.all_canvases().into_iter().enumerate() {
            let len = canvas.nodes.len();
            if let Some(edge) = canvas
                .edges
                .iter()
                .find(|edge| edge.source.index >= len || edge.sink.index >= len)
            {
                return Err(PatchError::DanglingEdge {
                    statement: None,
                    canvas: id,
                    from: edge.source.index,
                    to: edge.sink.index,
                    len,
                });
            }

            for node in &canvas.nodes {
                match node {
                    Node::Gui(gui) => gui.validate(settings.log_range)?,
                    Node::AtomBox(atom_box) => atom_box.validate()?,
                    Node::Scalar(scalar) => scalar.validate(&self.structs)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, Point, Size};
    use crate::model::{Canvas, CanvasHeader, Edge, Gui, GuiKind, Object};

    fn canvas_with(nodes: Vec<Node>, edges: Vec<Edge>) -> Patch {
        let mut canvas = Canvas::new(
            CanvasHeader::Root { font: 12.0 },
            Point::default(),
            Size::new(450.0, 300.0),
            10.0,
        );
        canvas.nodes = nodes;
        canvas.edges = edges;
        let mut patch = Patch::new("t");
        patch.canvases.push(canvas);
        patch
    }

    #[test]
    fn dangling_edge_is_reported() {
        let patch = canvas_with(
            vec![Node::Object(Object::new("a", vec![]))],
            vec![Edge::new(0, 0, 1, 0)],
        );
        assert!(matches!(
            patch.validate(&Settings::default()),
            Err(PatchError::DanglingEdge { canvas: 0, to: 1, .. })
        ));
    }

    #[test]
    fn inverted_widget_range_is_reported() {
        let settings = Settings::default();
        let mut gui = Gui::with_defaults("nbx", &settings).unwrap();
        if let GuiKind::NumberBox { range, .. } = &mut gui.kind {
            *range = Bounds::new(10.0, 0.0);
        }
        let patch = canvas_with(vec![Node::Gui(gui)], vec![]);
        assert!(matches!(
            patch.validate(&settings),
            Err(PatchError::Argument { .. })
        ));
    }

    #[test]
    fn valid_patch_passes() {
        let patch = canvas_with(
            vec![
                Node::Object(Object::new("a", vec![])),
                Node::Object(Object::new("b", vec![])),
            ],
            vec![Edge::new(0, 0, 1, 0)],
        );
        assert!(patch.validate(&Settings::default()).is_ok());
    }
}
