//! Rendering configuration derived from a message's labels.
//!
//! A [`WidgetConfig`] is never stored on a message. It is rebuilt from the
//! message's current labels, tags and text on every classification pass.

use serde::Serialize;

/// A directive value after coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Coerce a raw directive value.
    ///
    /// Integers win over booleans, booleans over text. Text is trimmed.
    pub fn coerce(raw: &str) -> Self {
        let value = raw.trim();
        if let Some(n) = parse_int(value) {
            Scalar::Int(n)
        } else if value == "true" {
            Scalar::Bool(true)
        } else if value == "false" {
            Scalar::Bool(false)
        } else {
            Scalar::Text(value.to_string())
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Int(n) => serde_json::Value::from(*n),
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Parse a strict base-10 integer: optional `-`, then digits only.
///
/// Values like `1.5`, `1e3`, `+4` or ` 7` stay text.
pub fn parse_int(value: &str) -> Option<i64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Ordered CSS-like property map.
///
/// Setting a property that already exists replaces its value in place, so
/// repeated or contradictory directives never produce duplicate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| p == property) {
            Some(entry) => entry.1 = value,
            None => self.0.push((property.to_string(), value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.iter().find(|(p, _)| p == property).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Render as an inline declaration list, e.g. `color:#fff;height:40px;`.
    pub fn render(&self) -> String {
        self.0.iter().map(|(p, v)| format!("{}:{};", p, v)).collect()
    }
}

/// Kind of widget drawn for a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    #[default]
    None,
    ProgressBar,
    Line,
    Bar,
    Pie,
    Custom(String),
}

impl WidgetKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" => WidgetKind::None,
            "progressbar" => WidgetKind::ProgressBar,
            "line" => WidgetKind::Line,
            "bar" => WidgetKind::Bar,
            "pie" => WidgetKind::Pie,
            _ => WidgetKind::Custom(name.trim().to_string()),
        }
    }

    pub fn is_chart(&self) -> bool {
        matches!(self, WidgetKind::Line | WidgetKind::Bar | WidgetKind::Pie)
    }

    pub fn label(&self) -> &str {
        match self {
            WidgetKind::None => "-",
            WidgetKind::ProgressBar => "progress",
            WidgetKind::Line => "line",
            WidgetKind::Bar => "bar",
            WidgetKind::Pie => "pie",
            WidgetKind::Custom(name) => name,
        }
    }
}

/// Visual emphasis of a message.
///
/// Ordered by severity so that `max()` picks the most urgent one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Success,
    #[default]
    Warning,
    Danger,
}

impl StatusClass {
    pub fn symbol(&self) -> &'static str {
        match self {
            StatusClass::Success => "UP",
            StatusClass::Warning => "WARN",
            StatusClass::Danger => "AL",
        }
    }

    /// CSS class used by the web dashboard for this status.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusClass::Success => "btn-success",
            StatusClass::Warning => "btn-warning",
            StatusClass::Danger => "btn-danger",
        }
    }
}

/// Series of a chart widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChartSeries {
    /// One flat series, as set by `widget-data-serie:`.
    Flat(Vec<Scalar>),
    /// One row per `widget-data-series:` directive.
    Rows(Vec<Vec<Scalar>>),
}

impl Default for ChartSeries {
    fn default() -> Self {
        ChartSeries::Rows(Vec::new())
    }
}

impl ChartSeries {
    /// Series as rows; a flat series is a single row.
    pub fn rows(&self) -> Vec<&[Scalar]> {
        match self {
            ChartSeries::Flat(values) => vec![values.as_slice()],
            ChartSeries::Rows(rows) => rows.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChartSeries::Flat(values) => values.is_empty(),
            ChartSeries::Rows(rows) => rows.is_empty(),
        }
    }
}

/// Chart labels and series built by the `widget-data-*` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: ChartSeries,
}

/// Everything needed to draw one message as a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Box style.
    pub style: StyleMap,
    pub title_style: StyleMap,
    pub value_style: StyleMap,
    pub hide_bottom: bool,
    pub widget: WidgetKind,
    pub widget_min: Option<Scalar>,
    pub widget_max: Option<Scalar>,
    pub widget_value: Option<Scalar>,
    pub widget_value_text: Option<Scalar>,
    pub widget_mode: Option<String>,
    pub widget_class: Option<String>,
    /// Progress bar reached 100%.
    pub complete: bool,
    pub options: serde_json::Map<String, serde_json::Value>,
    pub legend_names: Option<Vec<String>>,
    pub chart: Option<ChartData>,
    /// Free value shown in the widget body (`value:` directive).
    pub value: Option<Scalar>,
    pub url: Option<String>,
    pub order_box: i64,
    pub status_class: StatusClass,
    /// Message text without routing hashtags.
    pub text: String,
}

impl WidgetConfig {
    /// True when directives styled the box itself.
    ///
    /// Custom styling takes precedence over status colors when drawing.
    pub fn has_custom_style(&self) -> bool {
        !self.style.is_empty()
    }

    /// Progress in percent for progress widgets, clamped to 0..=100.
    pub fn percent(&self) -> Option<u16> {
        // Label values span all of i64, so widen before subtracting
        let value = i128::from(self.widget_value.as_ref()?.as_int()?);
        let min = i128::from(self.widget_min.as_ref().and_then(Scalar::as_int).unwrap_or(0));
        let max = i128::from(self.widget_max.as_ref().and_then(Scalar::as_int).unwrap_or(100));
        if max <= min {
            return None;
        }
        let ratio = (value - min) as f64 / (max - min) as f64;
        Some((ratio * 100.0).clamp(0.0, 100.0).round() as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_strict() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("007"), Some(7));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int("1.5"), None);
        assert_eq!(parse_int("+4"), None);
        assert_eq!(parse_int("12px"), None);
        assert_eq!(parse_int("99999999999999999999"), None);
    }

    #[test]
    fn test_scalar_coerce() {
        assert_eq!(Scalar::coerce(" 10 "), Scalar::Int(10));
        assert_eq!(Scalar::coerce("true"), Scalar::Bool(true));
        assert_eq!(Scalar::coerce("false"), Scalar::Bool(false));
        assert_eq!(Scalar::coerce(" ms "), Scalar::Text("ms".to_string()));
    }

    #[test]
    fn test_style_map_replaces_in_place() {
        let mut style = StyleMap::new();
        style.set("color", "#fff");
        style.set("height", "40px");
        style.set("color", "#000");

        assert_eq!(style.get("color"), Some("#000"));
        assert_eq!(style.render(), "color:#000;height:40px;");
    }

    #[test]
    fn test_widget_kind_parse() {
        assert_eq!(WidgetKind::parse("progressbar"), WidgetKind::ProgressBar);
        assert_eq!(WidgetKind::parse("Line"), WidgetKind::Line);
        assert_eq!(WidgetKind::parse(""), WidgetKind::None);
        assert_eq!(WidgetKind::parse("gauge"), WidgetKind::Custom("gauge".to_string()));
        assert!(WidgetKind::Pie.is_chart());
        assert!(!WidgetKind::ProgressBar.is_chart());
    }

    #[test]
    fn test_percent_uses_range() {
        let config = WidgetConfig {
            widget_value: Some(Scalar::Int(15)),
            widget_min: Some(Scalar::Int(10)),
            widget_max: Some(Scalar::Int(20)),
            ..WidgetConfig::default()
        };
        assert_eq!(config.percent(), Some(50));

        let over = WidgetConfig {
            widget_value: Some(Scalar::Int(250)),
            ..WidgetConfig::default()
        };
        assert_eq!(over.percent(), Some(100));

        let text = WidgetConfig {
            widget_value: Some(Scalar::Text("n/a".to_string())),
            ..WidgetConfig::default()
        };
        assert_eq!(text.percent(), None);
    }

    #[test]
    fn test_status_class_ordering() {
        assert!(StatusClass::Danger > StatusClass::Warning);
        assert!(StatusClass::Warning > StatusClass::Success);
        assert_eq!(StatusClass::default(), StatusClass::Warning);
    }
}
