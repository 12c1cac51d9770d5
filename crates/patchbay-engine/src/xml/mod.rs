//! XML rendition of a [`Patch`].
//!
//! Node elements are named after their class through the reversible mapping
//! in [`tags`], and carry a `type` attribute naming the model variant so a
//! reader never has to guess from the class. Structure elements (`canvas`,
//! `nodes`, `edges`, ...) are fixed.
//!
//! ```xml
//! <patch name="osc">
//!   <canvas x="0" y="50" width="450" height="300" kind="root" font="12" ...>
//!     <nodes>
//!       <osc_tilde type="Object" x="10" y="10">
//!         <args><float value="440"/></args>
//!       </osc_tilde>
//!     </nodes>
//!     <edges><edge from="0" outlet="0" to="1" inlet="0"/></edges>
//!   </canvas>
//! </patch>
//! ```

mod decode;
mod dom;
mod encode;
pub mod tags;

pub use tags::{EMPTY_TAG, from_xml_tag, to_xml_tag};

use crate::error::Result;
use crate::model::Patch;
use crate::settings::Settings;

pub fn encode_xml(patch: &Patch) -> Result<String> {
    dom::write_document(&encode::patch_element(patch)?)
}

/// Read a patch back from XML and check it.
///
/// Unknown elements fail with [`PatchError::UnknownTag`] unless
/// [`Settings::tolerant_xml`] is set, in which case they are logged and
/// skipped.
///
/// [`PatchError::UnknownTag`]: crate::error::PatchError::UnknownTag
pub fn decode_xml(source: &str, settings: &Settings) -> Result<Patch> {
    let root = dom::read_document(source)?;
    let decoder = decode::Decoder {
        tolerant: settings.tolerant_xml,
        font: settings.canvas.font,
    };
    let patch = decoder.patch(&root)?;
    patch.validate(settings)?;
    Ok(patch)
}
