//! Conversion between the four patch representations.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::cache::{Snapshot, SnapshotCache, decode_snapshot, encode_snapshot};
use crate::dependencies::collect_dependencies;
use crate::error::{PatchError, Result};
use crate::io::decode_text;
use crate::json::{decode_json, encode_json};
use crate::model::{Dependencies, Patch};
use crate::native::encode_native;
use crate::parser::Parser;
use crate::settings::Settings;
use crate::xml::{decode_xml, encode_xml};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Native,
    Json,
    Xml,
    Snapshot,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Native, Format::Json, Format::Xml, Format::Snapshot];

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Native => "pd",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Snapshot => crate::cache::SNAPSHOT_EXTENSION,
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Format::Snapshot)
    }
}

impl FromStr for Format {
    type Err = PatchError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pd" | "puredata" => Ok(Format::Native),
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            "snapshot" | "snap" | "pdsnap" => Ok(Format::Snapshot),
            other => Err(PatchError::argument(format!("unknown format `{other}`"))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Native => "pd",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Snapshot => "snapshot",
        };
        f.write_str(name)
    }
}

/// Result of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub output: Vec<u8>,
    pub patch: Patch,
    pub dependencies: Dependencies,
    /// Whether the patch came from the snapshot cache
    pub cached: bool,
}

impl Translation {
    /// The output as text, unless the target format is binary.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.output).ok()
    }
}

/// Decodes a source in one format and encodes it in another.
///
/// Native sources are looked up in the snapshot cache first when one is
/// configured, and stored there after a fresh parse.
pub struct Translator {
    settings: Settings,
    cache: Option<SnapshotCache>,
}

impl Translator {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cache: None,
        }
    }

    /// Serve native sources from `cache`, in the part of it that belongs
    /// to this translator's settings.
    pub fn with_cache(mut self, cache: SnapshotCache) -> Result<Self> {
        self.cache = Some(cache.scoped(&self.settings)?);
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&SnapshotCache> {
        self.cache.as_ref()
    }

    pub fn translate(
        &self,
        name: &str,
        source: &[u8],
        from: Format,
        to: Format,
    ) -> Result<Translation> {
        if from == to {
            return Err(PatchError::argument(format!(
                "source and target are both {from}"
            )));
        }

        let (patch, cached) = self.decode(name, source, from)?;
        let dependencies = collect_dependencies(&patch);
        let output = match to {
            Format::Native => encode_native(&patch)?.into_bytes(),
            Format::Json => encode_json(&patch)?.into_bytes(),
            Format::Xml => encode_xml(&patch)?.into_bytes(),
            Format::Snapshot => encode_snapshot(&Snapshot::new(source, patch.clone()))?,
        };

        log::debug!(
            "translated `{name}` {from} -> {to}: {} bytes, {} dependencies{}",
            output.len(),
            dependencies.len(),
            if cached { " (cached)" } else { "" }
        );
        Ok(Translation {
            output,
            patch,
            dependencies,
            cached,
        })
    }

    /// Decode `source` into a checked patch.
    pub fn decode(&self, name: &str, source: &[u8], from: Format) -> Result<(Patch, bool)> {
        match from {
            Format::Native => {
                if let Some(cache) = &self.cache
                    && let Some(mut patch) = cache.load(source)?
                {
                    patch.validate(&self.settings)?;
                    patch.name = name.to_string();
                    return Ok((patch, true));
                }
                let patch = Parser::new(&self.settings).parse(name, &decode_text(source))?;
                if let Some(cache) = &self.cache {
                    cache.store(source, &patch)?;
                }
                Ok((patch, false))
            }
            Format::Json => Ok((decode_json(&decode_text(source), &self.settings)?, false)),
            Format::Xml => Ok((decode_xml(&decode_text(source), &self.settings)?, false)),
            Format::Snapshot => {
                let patch = decode_snapshot(source)?.patch;
                patch.validate(&self.settings)?;
                Ok((patch, false))
            }
        }
    }
}
