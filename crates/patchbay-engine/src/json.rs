//! JSON rendition of a [`Patch`], straight from the serde derives.
//!
//! Nodes carry a `"type"` discriminator and widgets a `"widget"` one. Before
//! deserialising, [`decode_json`] checks both against the known variants so
//! an unknown name is reported with its path rather than as a generic serde
//! error.

use serde_json::Value as Json;

use crate::error::{PatchError, Result};
use crate::model::{NODE_TYPES, Patch, WIDGET_TYPES};
use crate::settings::Settings;

pub fn encode_json(patch: &Patch) -> Result<String> {
    Ok(serde_json::to_string_pretty(patch)?)
}

pub fn decode_json(source: &str, settings: &Settings) -> Result<Patch> {
    let value: Json = serde_json::from_str(source)?;
    if let Some(canvases) = value.get("canvases").and_then(Json::as_array) {
        for (i, canvas) in canvases.iter().enumerate() {
            check_canvas(canvas, &format!("canvases/{i}"))?;
        }
    }

    let patch: Patch = serde_json::from_value(value)?;
    patch.validate(settings)?;
    log::debug!("decoded `{}` from JSON", patch.name);
    Ok(patch)
}

fn unknown_type(path: String, kind: Option<&Json>) -> PatchError {
    PatchError::UnknownType {
        path,
        kind: match kind {
            Some(Json::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
    }
}

fn check_canvas(canvas: &Json, path: &str) -> Result<()> {
    let Some(nodes) = canvas.get("nodes").and_then(Json::as_array) else {
        return Ok(());
    };
    for (i, node) in nodes.iter().enumerate() {
        let path = format!("{path}/nodes/{i}");
        let type_name = node.get("type");
        match type_name.and_then(Json::as_str) {
            Some(name) if NODE_TYPES.contains(&name) => {}
            _ => return Err(unknown_type(format!("{path}/type"), type_name)),
        }

        match type_name.and_then(Json::as_str) {
            Some("Gui") => {
                let widget = node.get("kind").and_then(|kind| kind.get("widget"));
                match widget.and_then(Json::as_str) {
                    Some(name) if WIDGET_TYPES.contains(&name) => {}
                    _ => return Err(unknown_type(format!("{path}/kind/widget"), widget)),
                }
            }
            Some("Subpatch") => {
                if let Some(inner) = node.get("canvas") {
                    check_canvas(inner, &format!("{path}/canvas"))?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
