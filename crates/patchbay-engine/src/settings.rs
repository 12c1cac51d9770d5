//! Defaults and policies shared by the parser, builder, layout and codecs.
//!
//! A [`Settings`] value is built once per conversion job and only ever
//! borrowed immutably afterwards, so one instance can be shared by any number
//! of jobs running on separate threads.

use serde::Serialize;

use crate::geometry::{Bounds, Point, Size};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Settings {
    pub canvas: CanvasDefaults,
    pub array: ArrayDefaults,
    pub iemgui: IemDefaults,
    pub layout: LayoutSettings,
    pub log_range: LogRangePolicy,
    /// Skip unknown XML tags with a warning instead of failing.
    pub tolerant_xml: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasDefaults {
    pub screen: Point,
    pub size: Size,
    pub font: f64,
    pub subpatch_title: String,
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        Self {
            screen: Point::new(0.0, 50.0),
            size: Size::new(450.0, 300.0),
            font: 12.0,
            subpatch_title: "(subpatch)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayDefaults {
    pub length: f64,
    pub element_type: String,
    pub flags: f64,
    pub graph_size: Size,
}

impl Default for ArrayDefaults {
    fn default() -> Self {
        Self {
            length: 100.0,
            element_type: "float".to_string(),
            flags: 3.0,
            graph_size: Size::new(200.0, 140.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IemDefaults {
    pub font_face: f64,
    pub font_size: f64,
    pub background: String,
    pub foreground: String,
    pub label: String,
}

impl Default for IemDefaults {
    fn default() -> Self {
        Self {
            font_face: 0.0,
            font_size: 10.0,
            background: "#fcfcfc".to_string(),
            foreground: "#000000".to_string(),
            label: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSettings {
    /// Distance kept between auto-placed boxes and the canvas edge
    pub margin: f64,
    /// Space between neighbouring boxes, both across and down
    pub gap: f64,
    /// Inner padding added around the estimated text width
    pub padding: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            margin: 10.0,
            gap: 10.0,
            padding: 4.0,
        }
    }
}

/// How widget ranges are checked.
///
/// `Strict` requires `lower <= upper` everywhere. `AllowInverted` accepts an
/// inverted range on widgets whose log-scale flag is set, since a reversed
/// log slider is still well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LogRangePolicy {
    #[default]
    Strict,
    AllowInverted,
}

impl LogRangePolicy {
    pub fn permits(&self, range: &Bounds, log: bool) -> bool {
        range.is_ordered() || (log && *self == LogRangePolicy::AllowInverted)
    }
}

impl std::str::FromStr for LogRangePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "strict" => Ok(LogRangePolicy::Strict),
            "allow-inverted" => Ok(LogRangePolicy::AllowInverted),
            other => Err(format!("unknown log range policy `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LogRangePolicy::Strict, Bounds::new(0.0, 1.0), false, true)]
    #[case(LogRangePolicy::Strict, Bounds::new(10.0, 0.0), false, false)]
    #[case(LogRangePolicy::Strict, Bounds::new(10.0, 1.0), true, false)]
    #[case(LogRangePolicy::AllowInverted, Bounds::new(10.0, 1.0), true, true)]
    #[case(LogRangePolicy::AllowInverted, Bounds::new(10.0, 1.0), false, false)]
    fn range_policy(
        #[case] policy: LogRangePolicy,
        #[case] range: Bounds,
        #[case] log: bool,
        #[case] permitted: bool,
    ) {
        assert_eq!(policy.permits(&range, log), permitted);
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!("strict".parse(), Ok(LogRangePolicy::Strict));
        assert_eq!("allow-inverted".parse(), Ok(LogRangePolicy::AllowInverted));
        assert!("sideways".parse::<LogRangePolicy>().is_err());
    }
}
