//! # patchbay-engine
//!
//! Object model and converters for Pure Data patches.
//!
//! ## Pipeline
//!
//! ```text
//! native text ─ split ─► binbufs ─ pass 1 ─► PatchBuilder ─ pass 2 ─► Patch
//!                                                                      │
//!                        ┌─────────────┬──────────────┬────────────────┤
//!                        ▼             ▼              ▼                ▼
//!                     native         JSON            XML       CBOR snapshot
//! ```
//!
//! Pass 1 feeds every statement to the [`PatchBuilder`] and records
//! connections; pass 2 resolves them once every node index is known. The
//! JSON, XML and snapshot codecs all read back into the same [`Patch`], and
//! the [`Translator`] ties them together with the snapshot cache.
//!
//! ```
//! use patchbay_engine::{Format, Settings, Translator};
//!
//! let source = b"#N canvas 0 50 450 300 12;\n#X obj 10 10 osc~ 440;\n";
//! let translation = Translator::new(Settings::default())
//!     .translate("osc", source, Format::Native, Format::Json)
//!     .unwrap();
//!
//! assert_eq!(translation.patch.canvases[0].nodes.len(), 1);
//! assert!(translation.text().unwrap().contains("\"osc~\""));
//! ```

pub mod atom;
pub mod cache;
pub mod dependencies;
pub mod error;
pub mod geometry;
pub mod io;
pub mod json;
pub mod layout;
pub mod model;
pub mod native;
pub mod parser;
pub mod settings;
pub mod translator;
pub mod xml;

// Re-export key types for easier usage
pub use atom::Atom;
pub use cache::{Snapshot, SnapshotCache, content_hash, decode_snapshot, encode_snapshot};
pub use dependencies::collect_dependencies;
pub use error::{PatchError, Result};
pub use geometry::{Area, Bounds, Coords, Point, Size};
pub use json::{decode_json, encode_json};
pub use model::*;
pub use native::encode_native;
pub use parser::{Parser, parse};
pub use settings::{LogRangePolicy, Settings};
pub use translator::{Format, Translation, Translator};
pub use xml::{decode_xml, encode_xml, from_xml_tag, to_xml_tag};
