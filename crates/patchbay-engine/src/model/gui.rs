//! Native number/symbol/list boxes and the IEMGUI widget family.
//!
//! IEMGUI widgets are written as ordinary `#X obj` lines whose class name is
//! one of [`IEM_CLASSES`]. Their arguments follow a fixed order per widget;
//! [`Gui::from_words`] and [`Gui::words`] are the single place that order is
//! spelled out.

use serde::{Deserialize, Serialize};

use crate::atom::{Atom, format_float, parse_float};
use crate::error::{PatchError, Result};
use crate::geometry::{Bounds, Point, Size};
use crate::settings::{LogRangePolicy, Settings};

/// Class names that are parsed as [`Gui`] rather than [`crate::model::Object`].
pub const IEM_CLASSES: [&str; 12] = [
    "tgl", "bng", "nbx", "hsl", "vsl", "hradio", "vradio", "hdl", "vdl", "vu", "cnv", "my_canvas",
];

/// Discriminator values of [`GuiKind`].
pub const WIDGET_TYPES: [&str; 7] = [
    "Toggle",
    "Bang",
    "NumberBox",
    "Slider",
    "Radio",
    "VuMeter",
    "NativeCanvas",
];

const EMPTY: &str = "empty";
const NONE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomKind {
    Float,
    Symbol,
    List,
}

impl AtomKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "floatatom" => Some(AtomKind::Float),
            "symbolatom" => Some(AtomKind::Symbol),
            "listbox" => Some(AtomKind::List),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            AtomKind::Float => "floatatom",
            AtomKind::Symbol => "symbolatom",
            AtomKind::List => "listbox",
        }
    }

    pub fn default_digits(&self) -> f64 {
        match self {
            AtomKind::Float => 5.0,
            AtomKind::Symbol => 10.0,
            AtomKind::List => 20.0,
        }
    }
}

/// `#X floatatom|symbolatom|listbox x y digits lower upper flag label receive send [fontsize]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomBox {
    pub kind: AtomKind,
    pub position: Point,
    pub digits: f64,
    pub limits: Bounds,
    pub label_position: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub receive: Option<String>,
    #[serde(default)]
    pub send: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl AtomBox {
    pub fn new(kind: AtomKind) -> Self {
        Self {
            kind,
            position: Point::default(),
            digits: kind.default_digits(),
            limits: Bounds::default(),
            label_position: 0.0,
            label: None,
            receive: None,
            send: None,
            font_size: None,
            width: None,
        }
    }

    /// Parse the fields after the position.
    pub fn from_words(kind: AtomKind, position: Point, words: &[&str]) -> Result<Self> {
        if !(7..=8).contains(&words.len()) {
            return Err(PatchError::argument(format!(
                "{}: expected 9 or 10 fields, found {}",
                kind.keyword(),
                words.len() + 2
            )));
        }
        let mut args = Args::new(kind.keyword(), words);
        let atom_box = Self {
            kind,
            position,
            digits: args.float("width")?,
            limits: Bounds::new(args.float("lower")?, args.float("upper")?),
            label_position: args.float("label position")?,
            label: args.name(NONE)?,
            receive: args.name(NONE)?,
            send: args.name(NONE)?,
            font_size: args.optional_float("font size")?,
            width: None,
        };
        atom_box.validate()?;
        Ok(atom_box)
    }

    /// The fields after the position, as unescaped words.
    pub fn words(&self) -> Vec<String> {
        let mut words = vec![
            format_float(self.digits),
            format_float(self.limits.lower),
            format_float(self.limits.upper),
            format_float(self.label_position),
            name_word(&self.label, NONE),
            name_word(&self.receive, NONE),
            name_word(&self.send, NONE),
        ];
        if let Some(size) = self.font_size {
            words.push(format_float(size));
        }
        words
    }

    pub fn validate(&self) -> Result<()> {
        if !self.limits.is_ordered() {
            return Err(PatchError::argument(format!(
                "{}: lower limit {} is above upper limit {}",
                self.kind.keyword(),
                format_float(self.limits.lower),
                format_float(self.limits.upper)
            )));
        }
        Ok(())
    }
}

/// Send and receive names. `None` is written as `empty`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comm {
    #[serde(default)]
    pub send: Option<String>,
    #[serde(default)]
    pub receive: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IemFont {
    pub face: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IemLabel {
    #[serde(default)]
    pub text: Option<String>,
    pub offset: Point,
    pub font: IemFont,
}

/// Colours as written: legacy packed integers or `#rrggbb` symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IemColors {
    pub background: Atom,
    /// Absent on `vu` and `cnv`
    #[serde(default)]
    pub foreground: Option<Atom>,
    pub label: Atom,
}

/// Attributes every IEMGUI widget carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iem {
    pub comm: Comm,
    pub label: IemLabel,
    pub colors: IemColors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "widget")]
pub enum GuiKind {
    Toggle {
        size: f64,
        init: bool,
        state: f64,
        nonzero: f64,
    },
    Bang {
        size: f64,
        hold: f64,
        interrupt: f64,
        init: bool,
    },
    NumberBox {
        digits: f64,
        height: f64,
        range: Bounds,
        log: bool,
        init: bool,
        value: f64,
        log_height: f64,
    },
    Slider {
        orientation: Orientation,
        size: Size,
        range: Bounds,
        log: bool,
        init: bool,
        value: f64,
        steady: bool,
    },
    Radio {
        orientation: Orientation,
        size: f64,
        change: bool,
        init: bool,
        number: f64,
        value: f64,
    },
    VuMeter {
        size: Size,
        scale: bool,
        flag: f64,
    },
    NativeCanvas {
        selectable: f64,
        size: Size,
        flag: f64,
    },
}

impl GuiKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            GuiKind::Toggle { .. } => "Toggle",
            GuiKind::Bang { .. } => "Bang",
            GuiKind::NumberBox { .. } => "NumberBox",
            GuiKind::Slider { .. } => "Slider",
            GuiKind::Radio { .. } => "Radio",
            GuiKind::VuMeter { .. } => "VuMeter",
            GuiKind::NativeCanvas { .. } => "NativeCanvas",
        }
    }

    /// The output range and log flag, for widgets that have one.
    pub fn range(&self) -> Option<(Bounds, bool)> {
        match self {
            GuiKind::NumberBox { range, log, .. } | GuiKind::Slider { range, log, .. } => {
                Some((*range, *log))
            }
            _ => None,
        }
    }

    /// Approximate on-canvas size in pixels.
    pub fn extent(&self, font_size: f64) -> Size {
        match self {
            GuiKind::Toggle { size, .. } | GuiKind::Bang { size, .. } => Size::new(*size, *size),
            GuiKind::NumberBox { digits, height, .. } => {
                Size::new(digits * font_size * 0.6 + height / 2.0 + 4.0, *height)
            }
            GuiKind::Slider { size, .. }
            | GuiKind::VuMeter { size, .. }
            | GuiKind::NativeCanvas { size, .. } => *size,
            GuiKind::Radio {
                orientation,
                size,
                number,
                ..
            } => match orientation {
                Orientation::Horizontal => Size::new(size * number, *size),
                Orientation::Vertical => Size::new(*size, size * number),
            },
        }
    }
}

/// An IEMGUI widget box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gui {
    pub position: Point,
    /// Exact class as written (`hsl`, `vradio`, `my_canvas`...)
    pub class_name: String,
    pub iem: Iem,
    pub kind: GuiKind,
}

pub fn is_iem_class(class_name: &str) -> bool {
    IEM_CLASSES.contains(&class_name)
}

fn orientation_of(class_name: &str) -> Orientation {
    if class_name.starts_with('v') {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}

impl Gui {
    /// A widget with the defaults Pd uses for a freshly placed box.
    pub fn with_defaults(class_name: &str, settings: &Settings) -> Result<Self> {
        let defaults = &settings.iemgui;
        let orientation = orientation_of(class_name);
        let (kind, offset) = match class_name {
            "tgl" => (
                GuiKind::Toggle {
                    size: 15.0,
                    init: false,
                    state: 0.0,
                    nonzero: 1.0,
                },
                Point::new(17.0, 7.0),
            ),
            "bng" => (
                GuiKind::Bang {
                    size: 15.0,
                    hold: 250.0,
                    interrupt: 50.0,
                    init: false,
                },
                Point::new(17.0, 7.0),
            ),
            "nbx" => (
                GuiKind::NumberBox {
                    digits: 5.0,
                    height: 14.0,
                    range: Bounds::new(-1e37, 1e37),
                    log: false,
                    init: false,
                    value: 0.0,
                    log_height: 256.0,
                },
                Point::new(0.0, -8.0),
            ),
            "hsl" | "vsl" => (
                GuiKind::Slider {
                    orientation,
                    size: match orientation {
                        Orientation::Horizontal => Size::new(128.0, 15.0),
                        Orientation::Vertical => Size::new(15.0, 128.0),
                    },
                    range: Bounds::new(0.0, 127.0),
                    log: false,
                    init: false,
                    value: 0.0,
                    steady: true,
                },
                match orientation {
                    Orientation::Horizontal => Point::new(-2.0, -8.0),
                    Orientation::Vertical => Point::new(0.0, -9.0),
                },
            ),
            "hradio" | "vradio" | "hdl" | "vdl" => (
                GuiKind::Radio {
                    orientation,
                    size: 15.0,
                    change: true,
                    init: false,
                    number: 8.0,
                    value: 0.0,
                },
                Point::new(0.0, -8.0),
            ),
            "vu" => (
                GuiKind::VuMeter {
                    size: Size::new(15.0, 120.0),
                    scale: true,
                    flag: 0.0,
                },
                Point::new(-1.0, -8.0),
            ),
            "cnv" | "my_canvas" => (
                GuiKind::NativeCanvas {
                    selectable: 15.0,
                    size: Size::new(100.0, 60.0),
                    flag: 0.0,
                },
                Point::new(20.0, 12.0),
            ),
            other => {
                return Err(PatchError::argument(format!(
                    "`{other}` is not an IEMGUI class"
                )));
            }
        };

        let colors = match kind {
            GuiKind::VuMeter { .. } => IemColors {
                background: Atom::symbol("#404040"),
                foreground: None,
                label: Atom::symbol(defaults.label.as_str()),
            },
            GuiKind::NativeCanvas { .. } => IemColors {
                background: Atom::symbol("#e0e0e0"),
                foreground: None,
                label: Atom::symbol("#404040"),
            },
            _ => IemColors {
                background: Atom::symbol(defaults.background.as_str()),
                foreground: Some(Atom::symbol(defaults.foreground.as_str())),
                label: Atom::symbol(defaults.label.as_str()),
            },
        };
        let font_size = match kind {
            GuiKind::NativeCanvas { .. } => 14.0,
            _ => defaults.font_size,
        };

        Ok(Self {
            position: Point::default(),
            class_name: class_name.to_string(),
            iem: Iem {
                comm: Comm::default(),
                label: IemLabel {
                    text: None,
                    offset,
                    font: IemFont {
                        face: defaults.font_face,
                        size: font_size,
                    },
                },
                colors,
            },
            kind,
        })
    }

    /// Parse the arguments that follow the class name. An empty argument
    /// list yields the defaults.
    pub fn from_words(
        class_name: &str,
        position: Point,
        words: &[&str],
        settings: &Settings,
    ) -> Result<Self> {
        if words.is_empty() {
            let mut gui = Self::with_defaults(class_name, settings)?;
            gui.position = position;
            return Ok(gui);
        }

        let orientation = orientation_of(class_name);
        let mut args = Args::new(class_name, words);
        let gui = match class_name {
            "tgl" => {
                let size = args.float("size")?;
                let init = args.flag("init")?;
                let comm = args.comm()?;
                let label = args.label()?;
                let colors = args.colors(true)?;
                let kind = GuiKind::Toggle {
                    size,
                    init,
                    state: args.float("state")?,
                    nonzero: args.float("nonzero value")?,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            "bng" => {
                let size = args.float("size")?;
                let hold = args.float("hold")?;
                let interrupt = args.float("interrupt")?;
                let init = args.flag("init")?;
                let comm = args.comm()?;
                let label = args.label()?;
                let colors = args.colors(true)?;
                let kind = GuiKind::Bang {
                    size,
                    hold,
                    interrupt,
                    init,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            "nbx" => {
                let digits = args.float("digits")?;
                let height = args.float("height")?;
                let range = Bounds::new(args.float("lower")?, args.float("upper")?);
                let log = args.flag("log")?;
                let init = args.flag("init")?;
                let comm = args.comm()?;
                let label = args.label()?;
                let colors = args.colors(true)?;
                let kind = GuiKind::NumberBox {
                    digits,
                    height,
                    range,
                    log,
                    init,
                    value: args.float("value")?,
                    log_height: args.float("log height")?,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            "hsl" | "vsl" => {
                let size = Size::new(args.float("width")?, args.float("height")?);
                let range = Bounds::new(args.float("lower")?, args.float("upper")?);
                let log = args.flag("log")?;
                let init = args.flag("init")?;
                let comm = args.comm()?;
                let label = args.label()?;
                let colors = args.colors(true)?;
                let kind = GuiKind::Slider {
                    orientation,
                    size,
                    range,
                    log,
                    init,
                    value: args.float("value")?,
                    steady: args.flag("steady")?,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            "hradio" | "vradio" | "hdl" | "vdl" => {
                let size = args.float("size")?;
                let change = args.flag("change")?;
                let init = args.flag("init")?;
                let number = args.float("number")?;
                let comm = args.comm()?;
                let label = args.label()?;
                let colors = args.colors(true)?;
                let kind = GuiKind::Radio {
                    orientation,
                    size,
                    change,
                    init,
                    number,
                    value: args.float("value")?,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            "vu" => {
                let size = Size::new(args.float("width")?, args.float("height")?);
                let comm = Comm {
                    send: None,
                    receive: args.name(EMPTY)?,
                };
                let label = args.label()?;
                let colors = args.colors(false)?;
                let kind = GuiKind::VuMeter {
                    size,
                    scale: args.flag("scale")?,
                    flag: args.float("flag")?,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            "cnv" | "my_canvas" => {
                let selectable = args.float("selectable size")?;
                let size = Size::new(args.float("width")?, args.float("height")?);
                let comm = args.comm()?;
                let label = args.label()?;
                let colors = args.colors(false)?;
                let kind = GuiKind::NativeCanvas {
                    selectable,
                    size,
                    flag: args.float("flag")?,
                };
                Self::assemble(class_name, position, comm, label, colors, kind)
            }
            other => {
                return Err(PatchError::argument(format!(
                    "`{other}` is not an IEMGUI class"
                )));
            }
        };
        args.finish()?;
        gui.validate(settings.log_range)?;
        Ok(gui)
    }

    fn assemble(
        class_name: &str,
        position: Point,
        comm: Comm,
        label: IemLabel,
        colors: IemColors,
        kind: GuiKind,
    ) -> Self {
        Self {
            position,
            class_name: class_name.to_string(),
            iem: Iem {
                comm,
                label,
                colors,
            },
            kind,
        }
    }

    /// Check the range ordering under the given policy.
    pub fn validate(&self, policy: LogRangePolicy) -> Result<()> {
        if let Some((range, log)) = self.kind.range()
            && !policy.permits(&range, log)
        {
            return Err(PatchError::argument(format!(
                "{}: lower bound {} is above upper bound {}",
                self.class_name,
                format_float(range.lower),
                format_float(range.upper)
            )));
        }
        Ok(())
    }

    /// Class name followed by every argument, as unescaped words.
    pub fn words(&self) -> Vec<String> {
        let mut w = Words::default();
        w.push(&self.class_name);
        let iem = &self.iem;
        match &self.kind {
            GuiKind::Toggle {
                size,
                init,
                state,
                nonzero,
            } => {
                w.float(*size).flag(*init).comm(&iem.comm).label(&iem.label);
                w.colors(&iem.colors).float(*state).float(*nonzero);
            }
            GuiKind::Bang {
                size,
                hold,
                interrupt,
                init,
            } => {
                w.float(*size).float(*hold).float(*interrupt).flag(*init);
                w.comm(&iem.comm).label(&iem.label).colors(&iem.colors);
            }
            GuiKind::NumberBox {
                digits,
                height,
                range,
                log,
                init,
                value,
                log_height,
            } => {
                w.float(*digits).float(*height).range(range).flag(*log).flag(*init);
                w.comm(&iem.comm).label(&iem.label).colors(&iem.colors);
                w.float(*value).float(*log_height);
            }
            GuiKind::Slider {
                size,
                range,
                log,
                init,
                value,
                steady,
                ..
            } => {
                w.float(size.width).float(size.height).range(range).flag(*log).flag(*init);
                w.comm(&iem.comm).label(&iem.label).colors(&iem.colors);
                w.float(*value).flag(*steady);
            }
            GuiKind::Radio {
                size,
                change,
                init,
                number,
                value,
                ..
            } => {
                w.float(*size).flag(*change).flag(*init).float(*number);
                w.comm(&iem.comm).label(&iem.label).colors(&iem.colors);
                w.float(*value);
            }
            GuiKind::VuMeter { size, scale, flag } => {
                w.float(size.width).float(size.height);
                w.push(&name_word(&iem.comm.receive, EMPTY));
                w.label(&iem.label).colors(&iem.colors).flag(*scale).float(*flag);
            }
            GuiKind::NativeCanvas {
                selectable,
                size,
                flag,
            } => {
                w.float(*selectable).float(size.width).float(size.height);
                w.comm(&iem.comm).label(&iem.label).colors(&iem.colors);
                w.float(*flag);
            }
        }
        w.0
    }
}

#[derive(Default)]
struct Words(Vec<String>);

impl Words {
    fn push(&mut self, word: &str) -> &mut Self {
        self.0.push(word.to_string());
        self
    }

    fn float(&mut self, value: f64) -> &mut Self {
        self.0.push(format_float(value));
        self
    }

    fn flag(&mut self, value: bool) -> &mut Self {
        self.0.push(if value { "1" } else { "0" }.to_string());
        self
    }

    fn range(&mut self, range: &Bounds) -> &mut Self {
        self.float(range.lower).float(range.upper)
    }

    fn comm(&mut self, comm: &Comm) -> &mut Self {
        self.0.push(name_word(&comm.send, EMPTY));
        self.0.push(name_word(&comm.receive, EMPTY));
        self
    }

    fn label(&mut self, label: &IemLabel) -> &mut Self {
        self.0.push(name_word(&label.text, EMPTY));
        self.float(label.offset.x).float(label.offset.y);
        self.float(label.font.face).float(label.font.size)
    }

    fn colors(&mut self, colors: &IemColors) -> &mut Self {
        self.0.push(colors.background.to_word());
        if let Some(foreground) = &colors.foreground {
            self.0.push(foreground.to_word());
        }
        self.0.push(colors.label.to_word());
        self
    }
}

fn name_word(name: &Option<String>, sentinel: &str) -> String {
    name.clone().unwrap_or_else(|| sentinel.to_string())
}

/// Sequential reader over widget arguments with per-field error messages.
struct Args<'a> {
    class_name: &'a str,
    words: &'a [&'a str],
    next: usize,
}

impl<'a> Args<'a> {
    fn new(class_name: &'a str, words: &'a [&'a str]) -> Self {
        Self {
            class_name,
            words,
            next: 0,
        }
    }

    fn word(&mut self, what: &str) -> Result<&'a str> {
        let word = self.words.get(self.next).copied().ok_or_else(|| {
            PatchError::argument(format!(
                "{}: missing {what} (argument {})",
                self.class_name,
                self.next + 1
            ))
        })?;
        self.next += 1;
        Ok(word)
    }

    fn float(&mut self, what: &str) -> Result<f64> {
        let word = self.word(what)?;
        parse_float(word).ok_or_else(|| {
            PatchError::argument(format!(
                "{}: expected a number for {what}, found `{word}`",
                self.class_name
            ))
        })
    }

    fn optional_float(&mut self, what: &str) -> Result<Option<f64>> {
        if self.next >= self.words.len() {
            return Ok(None);
        }
        self.float(what).map(Some)
    }

    fn flag(&mut self, what: &str) -> Result<bool> {
        Ok(self.float(what)? != 0.0)
    }

    fn name(&mut self, sentinel: &str) -> Result<Option<String>> {
        let word = self.word("name")?;
        Ok((word != sentinel).then(|| word.to_string()))
    }

    fn comm(&mut self) -> Result<Comm> {
        Ok(Comm {
            send: self.name(EMPTY)?,
            receive: self.name(EMPTY)?,
        })
    }

    fn label(&mut self) -> Result<IemLabel> {
        Ok(IemLabel {
            text: self.name(EMPTY)?,
            offset: Point::new(self.float("label x")?, self.float("label y")?),
            font: IemFont {
                face: self.float("font face")?,
                size: self.float("font size")?,
            },
        })
    }

    fn colors(&mut self, with_foreground: bool) -> Result<IemColors> {
        let background = Atom::parse(self.word("background colour")?);
        let foreground = if with_foreground {
            Some(Atom::parse(self.word("foreground colour")?))
        } else {
            None
        };
        Ok(IemColors {
            background,
            foreground,
            label: Atom::parse(self.word("label colour")?),
        })
    }

    fn finish(self) -> Result<()> {
        if self.next < self.words.len() {
            return Err(PatchError::argument(format!(
                "{}: {} unexpected trailing arguments",
                self.class_name,
                self.words.len() - self.next
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn words(line: &str) -> Vec<&str> {
        line.split(' ').collect()
    }

    #[rstest]
    #[case("tgl 15 0 empty empty empty 17 7 0 10 #fcfcfc #000000 #000000 0 1")]
    #[case("bng 15 250 50 0 empty empty empty 17 7 0 10 #fcfcfc #000000 #000000")]
    #[case("nbx 5 14 -1e+37 1e+37 0 0 empty empty empty 0 -8 0 10 #fcfcfc #000000 #000000 0 256")]
    #[case("hsl 128 15 0 127 0 0 empty empty empty -2 -8 0 10 #fcfcfc #000000 #000000 0 1")]
    #[case("vsl 15 128 0 127 0 0 snd rcv level 0 -9 0 10 -262144 -1 -1 0 1")]
    #[case("hradio 15 1 0 8 empty empty empty 0 -8 0 10 #fcfcfc #000000 #000000 0")]
    #[case("vu 15 120 empty empty -1 -8 0 10 #404040 #000000 1 0")]
    #[case("cnv 15 100 60 empty empty empty 20 12 0 14 #e0e0e0 #404040 0")]
    fn widget_arguments_round_trip(#[case] line: &str) {
        let all = words(line);
        let gui = Gui::from_words(all[0], Point::new(1.0, 2.0), &all[1..], &Settings::default())
            .unwrap();
        assert_eq!(gui.words().join(" "), line);
    }

    #[test]
    fn names_use_the_empty_sentinel() {
        let all = words("tgl 15 0 out in empty 17 7 0 10 #fcfcfc #000000 #000000 0 1");
        let gui = Gui::from_words("tgl", Point::default(), &all[1..], &Settings::default())
            .unwrap();
        assert_eq!(gui.iem.comm.send.as_deref(), Some("out"));
        assert_eq!(gui.iem.comm.receive.as_deref(), Some("in"));
        assert_eq!(gui.iem.label.text, None);
    }

    #[test]
    fn inverted_number_box_range_is_rejected() {
        // Given a number box declared with lower=10, upper=0
        let all = words("nbx 5 14 10 0 0 0 empty empty empty 0 -8 0 10 #fcfcfc #000000 #000000 0 256");

        // When it is constructed
        let result = Gui::from_words("nbx", Point::default(), &all[1..], &Settings::default());

        // Then construction fails with an argument error
        assert!(matches!(result, Err(PatchError::Argument { .. })));
    }

    #[rstest]
    #[case(LogRangePolicy::Strict, false)]
    #[case(LogRangePolicy::AllowInverted, true)]
    fn inverted_log_slider_follows_policy(#[case] policy: LogRangePolicy, #[case] accepted: bool) {
        let settings = Settings {
            log_range: policy,
            ..Settings::default()
        };
        let all = words("hsl 128 15 1000 20 1 0 empty empty empty -2 -8 0 10 #fcfcfc #000000 #000000 0 1");
        let result = Gui::from_words("hsl", Point::default(), &all[1..], &settings);
        assert_eq!(result.is_ok(), accepted);
    }

    #[test]
    fn missing_arguments_are_reported() {
        let result = Gui::from_words("tgl", Point::default(), &["15", "0"], &Settings::default());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("tgl: missing name"), "{message}");
    }

    #[test]
    fn bare_widget_gets_defaults() {
        let gui = Gui::from_words("vsl", Point::new(5.0, 5.0), &[], &Settings::default()).unwrap();
        assert_eq!(gui.position, Point::new(5.0, 5.0));
        assert!(matches!(
            gui.kind,
            GuiKind::Slider {
                orientation: Orientation::Vertical,
                ..
            }
        ));
    }

    #[test]
    fn atom_box_fields_round_trip() {
        let fields = ["5", "0", "0", "0", "-", "-", "-", "0"];
        let atom = AtomBox::from_words(AtomKind::Float, Point::default(), &fields).unwrap();
        assert_eq!(atom.words(), fields.to_vec());
        assert_eq!(atom.label, None);
    }
}
