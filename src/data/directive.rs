//! Label directive parsing.
//!
//! Labels double as a small configuration language. A label whose text
//! starts with a known prefix is a directive; its remainder (or, for the
//! color directives, the label's color) configures how the message is
//! drawn. Parsing is best effort: unknown labels and uncoercible values are
//! skipped and never stop the rest of the message from rendering.

use serde_json::{json, Map, Value};

use super::chart::{split_tokens, ChartAccumulator};
use super::message::{Label, MessageFields};
use super::status;
use super::widget::{parse_int, Scalar, StatusClass, StyleMap, WidgetConfig, WidgetKind};

/// Widget class applied to an empty progress bar so it stays visible.
const EMPTY_BAR_CLASS: &str = "progress-bar-danger";

/// Directive keys, one per recognised prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKey {
    BgColor,
    BorderWidth,
    BorderStyle,
    BorderColor,
    TitleFontSize,
    ValueFontSize,
    Color,
    Height,
    Width,
    HideBottom,
    Url,
    Value,
    Order,
    Widget,
    WidgetMin,
    WidgetMax,
    WidgetMode,
    WidgetClass,
    PercentRunning,
    WidgetValue,
    WidgetOptions,
    DataLabels,
    DataLegendNames,
    DataSerie,
    DataSeries,
}

/// Prefixes in match priority order. The first prefix the label text
/// starts with decides the directive.
static PREFIXES: [(&str, DirectiveKey); 25] = [
    ("bg-color", DirectiveKey::BgColor),
    ("border-width", DirectiveKey::BorderWidth),
    ("border-style", DirectiveKey::BorderStyle),
    ("border-color", DirectiveKey::BorderColor),
    ("title-font-size", DirectiveKey::TitleFontSize),
    ("value-font-size", DirectiveKey::ValueFontSize),
    ("color", DirectiveKey::Color),
    ("height:", DirectiveKey::Height),
    ("width:", DirectiveKey::Width),
    ("hide-bottom", DirectiveKey::HideBottom),
    ("url:", DirectiveKey::Url),
    ("value:", DirectiveKey::Value),
    ("order:", DirectiveKey::Order),
    ("widget:", DirectiveKey::Widget),
    ("widget-min:", DirectiveKey::WidgetMin),
    ("widget-max:", DirectiveKey::WidgetMax),
    ("widget-mode:", DirectiveKey::WidgetMode),
    ("widget-class:", DirectiveKey::WidgetClass),
    ("percentRunning:", DirectiveKey::PercentRunning),
    ("widget-value:", DirectiveKey::WidgetValue),
    ("widget-options:", DirectiveKey::WidgetOptions),
    ("widget-data-labels:", DirectiveKey::DataLabels),
    ("widget-data-legendNames:", DirectiveKey::DataLegendNames),
    ("widget-data-serie:", DirectiveKey::DataSerie),
    ("widget-data-series:", DirectiveKey::DataSeries),
];

/// A label recognised as a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    pub key: DirectiveKey,
    /// Text after the prefix.
    pub value: &'a str,
    /// The label's color, used by the color directives.
    pub color: &'a str,
}

impl<'a> Directive<'a> {
    /// Recognise a label, or `None` if it carries no directive.
    ///
    /// Prefixes without a trailing `:` (such as `border-width`) are followed
    /// by a single separator character which is not part of the value.
    pub fn parse(label: &'a Label) -> Option<Self> {
        let (prefix, key) = PREFIXES.iter().find(|(prefix, _)| label.text.starts_with(prefix))?;
        let rest = &label.text[prefix.len()..];
        let value = if prefix.ends_with(':') {
            rest
        } else {
            let mut chars = rest.chars();
            chars.next();
            chars.as_str()
        };
        Some(Self {
            key: *key,
            value,
            color: &label.color,
        })
    }
}

/// Remove routing hashtags from a message text.
///
/// Strips `#monitoring`, then `#item:<item>` for the first `item:` tag,
/// then `#<service>` for the second tag.
pub fn sanitize_text<M: MessageFields + ?Sized>(message: &M) -> String {
    let mut text = message.text().replacen("#monitoring", "", 1).trim().to_string();
    if let Some(item) = message.item() {
        text = text.replacen(&format!("#item:{}", item), "", 1);
    }
    if let Some(service) = message.service().filter(|s| !s.is_empty()) {
        text = text.replacen(&format!("#{}", service), "", 1);
    }
    text.trim().to_string()
}

/// Build the widget configuration of a message.
///
/// Pure: the result only depends on the message's text, tags and labels,
/// so calling it twice on an unchanged message yields equal configs.
pub fn classify<M: MessageFields + ?Sized>(message: &M) -> WidgetConfig {
    let mut builder = Builder::new(sanitize_text(message));
    for label in message.labels() {
        if let Some(directive) = Directive::parse(label) {
            builder.apply(directive);
        }
    }
    builder.finish(message.labels())
}

struct Builder {
    config: WidgetConfig,
    chart: ChartAccumulator,
    order_box: Option<i64>,
    forced_status: Option<StatusClass>,
}

impl Builder {
    fn new(text: String) -> Self {
        Self {
            config: WidgetConfig {
                text,
                ..WidgetConfig::default()
            },
            chart: ChartAccumulator::new(),
            order_box: None,
            forced_status: None,
        }
    }

    fn apply(&mut self, directive: Directive<'_>) {
        let Directive { key, value, color } = directive;
        let config = &mut self.config;

        match key {
            DirectiveKey::BgColor => set_non_empty(&mut config.style, "background-color", color),
            DirectiveKey::Color => set_non_empty(&mut config.style, "color", color),
            DirectiveKey::BorderWidth => set_non_empty(&mut config.style, "border-width", value),
            DirectiveKey::BorderStyle => set_non_empty(&mut config.style, "border-style", value),
            DirectiveKey::BorderColor => set_non_empty(&mut config.style, "border-color", value),
            DirectiveKey::Height => set_non_empty(&mut config.style, "height", value),
            DirectiveKey::Width => set_non_empty(&mut config.style, "width", value),
            DirectiveKey::TitleFontSize => {
                set_non_empty(&mut config.title_style, "font-size", value)
            }
            DirectiveKey::ValueFontSize => {
                set_non_empty(&mut config.value_style, "font-size", value)
            }
            DirectiveKey::HideBottom => config.hide_bottom = true,
            DirectiveKey::Url => {
                config.url = Some(value.trim().to_string());
                config.style.set("cursor", "pointer");
            }
            DirectiveKey::Value => config.value = Some(Scalar::coerce(value)),
            DirectiveKey::Order => {
                if let Some(order) = parse_int(value.trim()) {
                    self.order_box = Some(order);
                }
            }
            DirectiveKey::Widget => config.widget = WidgetKind::parse(value),
            DirectiveKey::WidgetMin => config.widget_min = Some(Scalar::coerce(value)),
            DirectiveKey::WidgetMax => config.widget_max = Some(Scalar::coerce(value)),
            DirectiveKey::WidgetMode => config.widget_mode = Some(value.trim().to_string()),
            DirectiveKey::WidgetClass => config.widget_class = Some(value.trim().to_string()),
            DirectiveKey::PercentRunning => self.percent_running(value),
            DirectiveKey::WidgetValue => {
                let scalar = Scalar::coerce(value);
                // Once complete, later values do not reopen the bar
                if scalar.as_int() == Some(100) {
                    config.complete = true;
                }
                config.widget_value = Some(scalar);
            }
            DirectiveKey::WidgetOptions => apply_options(&mut config.options, value),
            DirectiveKey::DataLabels => self.chart.set_labels(value),
            DirectiveKey::DataLegendNames => {
                config.legend_names =
                    Some(split_tokens(value).into_iter().map(str::to_string).collect());
            }
            DirectiveKey::DataSerie => self.chart.set_flat_series(value),
            DirectiveKey::DataSeries => self.chart.push_series_row(value),
        }
    }

    fn percent_running(&mut self, value: &str) {
        let config = &mut self.config;
        config.widget = WidgetKind::ProgressBar;
        self.forced_status = None;

        let scalar = Scalar::coerce(value);
        match scalar.as_int() {
            Some(0) => {
                // An empty bar is drawn full and red, the text still says 0
                config.widget_value = Some(Scalar::Int(99));
                config.widget_value_text = Some(Scalar::Int(0));
                config.widget_class = Some(EMPTY_BAR_CLASS.to_string());
                self.forced_status = Some(StatusClass::Danger);
            }
            Some(n) => {
                config.widget_value = Some(Scalar::Int(n));
                config.widget_value_text = Some(Scalar::Int(n));
                if n == 100 {
                    config.complete = true;
                }
            }
            None => {
                config.widget_value = Some(scalar.clone());
                config.widget_value_text = Some(scalar);
            }
        }
    }

    fn finish(mut self, labels: &[Label]) -> WidgetConfig {
        let (status_class, default_order) = status::classify(labels);
        self.config.order_box = self.order_box.unwrap_or(default_order);
        self.config.status_class = self.forced_status.unwrap_or(status_class);
        self.config.chart = self.chart.finish();
        self.config
    }
}

fn set_non_empty(style: &mut StyleMap, property: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        style.set(property, value);
    }
}

/// Apply a `widget-options:` value: `attr:value` tokens merged into the
/// chart options, with axis offsets nested under their axis.
fn apply_options(options: &mut Map<String, Value>, value: &str) {
    for token in split_tokens(value) {
        let Some((attr, raw)) = token.split_once(':') else {
            continue;
        };
        if attr.is_empty() {
            continue;
        }
        let scalar = Scalar::coerce(raw);
        match (attr, scalar.as_int()) {
            ("axisX.offset", Some(offset)) => {
                options.insert("axisX".to_string(), json!({ "offset": offset }));
            }
            ("axisY.offset", Some(offset)) => {
                options.insert("axisY".to_string(), json!({ "offset": offset }));
            }
            _ => {
                options.insert(attr.to_string(), scalar.to_json());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::message::Message;
    use crate::data::widget::ChartSeries;

    fn message_with(labels: &[(&str, &str)]) -> Message {
        labels
            .iter()
            .fold(Message::new("m", 1.0, 1.0), |m, (text, color)| m.with_label(text, color))
    }

    fn classify_labels(texts: &[&str]) -> WidgetConfig {
        let labels: Vec<(&str, &str)> = texts.iter().map(|t| (*t, "#ccc")).collect();
        classify(&message_with(&labels))
    }

    #[test]
    fn test_parse_prefix_priority() {
        let label = Label::new("bg-color", "#123456");
        let directive = Directive::parse(&label).unwrap();
        assert_eq!(directive.key, DirectiveKey::BgColor);
        assert_eq!(directive.color, "#123456");

        let label = Label::new("border-width:2px", "");
        let directive = Directive::parse(&label).unwrap();
        assert_eq!(directive.key, DirectiveKey::BorderWidth);
        assert_eq!(directive.value, "2px");

        let label = Label::new("widget-data-series:1,2", "");
        assert_eq!(Directive::parse(&label).unwrap().key, DirectiveKey::DataSeries);

        let label = Label::new("widget-data-serie:1,2", "");
        assert_eq!(Directive::parse(&label).unwrap().key, DirectiveKey::DataSerie);

        assert!(Directive::parse(&Label::new("AL", "#f00")).is_none());
        assert!(Directive::parse(&Label::new("widget", "")).is_none());
    }

    #[test]
    fn test_percent_running_complete() {
        let config = classify_labels(&["percentRunning:100"]);
        assert_eq!(config.widget, WidgetKind::ProgressBar);
        assert_eq!(config.widget_value, Some(Scalar::Int(100)));
        assert_eq!(config.widget_value_text, Some(Scalar::Int(100)));
        assert!(config.complete);
    }

    #[test]
    fn test_percent_running_zero_stays_visible() {
        let config = classify_labels(&["percentRunning:0"]);
        assert_eq!(config.widget, WidgetKind::ProgressBar);
        assert_eq!(config.widget_value, Some(Scalar::Int(99)));
        assert_eq!(config.widget_value_text, Some(Scalar::Int(0)));
        assert_eq!(config.widget_class.as_deref(), Some(EMPTY_BAR_CLASS));
        assert_eq!(config.status_class, StatusClass::Danger);
        assert!(!config.complete);
    }

    #[test]
    fn test_percent_running_zero_overrides_status_label() {
        let config = classify_labels(&["UP", "percentRunning:0"]);
        assert_eq!(config.status_class, StatusClass::Danger);
        // Order box still comes from the status label
        assert_eq!(config.order_box, 3);
    }

    #[test]
    fn test_percent_running_last_write_wins() {
        let config = classify_labels(&["percentRunning:0", "percentRunning:40"]);
        assert_eq!(config.widget_value, Some(Scalar::Int(40)));
        assert_eq!(config.status_class, StatusClass::Warning);
    }

    #[test]
    fn test_percent_running_non_numeric() {
        let config = classify_labels(&["percentRunning:unknown"]);
        assert_eq!(config.widget, WidgetKind::ProgressBar);
        assert_eq!(config.widget_value, Some(Scalar::Text("unknown".to_string())));
        assert!(!config.complete);
    }

    #[test]
    fn test_widget_value_complete() {
        let config = classify_labels(&["widget:progressbar", "widget-value:100"]);
        assert_eq!(config.widget_value, Some(Scalar::Int(100)));
        assert!(config.complete);

        let config = classify_labels(&["widget-value:42"]);
        assert!(!config.complete);
    }

    #[test]
    fn test_complete_is_sticky() {
        let config = classify_labels(&["percentRunning:100", "widget-value:50"]);
        assert_eq!(config.widget_value, Some(Scalar::Int(50)));
        assert!(config.complete);

        let config = classify_labels(&["widget-value:100", "percentRunning:40"]);
        assert_eq!(config.widget_value, Some(Scalar::Int(40)));
        assert!(config.complete);

        let config = classify_labels(&["percentRunning:100", "percentRunning:0"]);
        assert!(config.complete);
    }

    #[test]
    fn test_widget_options_axis_and_bool() {
        let config = classify_labels(&["widget-options:axisY.offset:10,smooth:false"]);
        let expected = json!({ "axisY": { "offset": 10 }, "smooth": false });
        assert_eq!(Value::Object(config.options), expected);
    }

    #[test]
    fn test_widget_options_whitespace_and_text() {
        let config = classify_labels(&["widget-options:axisX.offset:20 showArea:true unit:ms bad"]);
        let expected = json!({ "axisX": { "offset": 20 }, "showArea": true, "unit": "ms" });
        assert_eq!(Value::Object(config.options), expected);
    }

    #[test]
    fn test_widget_options_non_numeric_offset_stays_flat() {
        let config = classify_labels(&["widget-options:axisY.offset:auto"]);
        assert_eq!(config.options.get("axisY.offset"), Some(&json!("auto")));
        assert!(config.options.get("axisY").is_none());
    }

    #[test]
    fn test_style_directives() {
        let config = classify(&message_with(&[
            ("bg-color", "#336699"),
            ("color", "#ffffff"),
            ("border-width:3px", ""),
            ("border-style:dashed", ""),
            ("height:120px", ""),
            ("title-font-size:20px", ""),
            ("value-font-size:40px", ""),
            ("hide-bottom", ""),
            ("bg-color", "#000000"),
        ]));

        let mut style = StyleMap::new();
        style.set("background-color", "#000000");
        style.set("color", "#ffffff");
        style.set("border-width", "3px");
        style.set("border-style", "dashed");
        style.set("height", "120px");
        assert_eq!(config.style, style);
        assert_eq!(config.title_style.get("font-size"), Some("20px"));
        assert_eq!(config.value_style.get("font-size"), Some("40px"));
        assert!(config.hide_bottom);
        assert!(config.has_custom_style());
    }

    #[test]
    fn test_url_value_and_order() {
        let config = classify_labels(&["url:https://ci.example.com/job/1", "value:42", "order:7"]);
        assert_eq!(config.url.as_deref(), Some("https://ci.example.com/job/1"));
        assert_eq!(config.style.get("cursor"), Some("pointer"));
        assert_eq!(config.value, Some(Scalar::Int(42)));
        assert_eq!(config.order_box, 7);

        let config = classify_labels(&["value:12 ms"]);
        assert_eq!(config.value, Some(Scalar::Text("12 ms".to_string())));
    }

    #[test]
    fn test_explicit_order_beats_status_default() {
        let config = classify_labels(&["order:5", "AL"]);
        assert_eq!(config.order_box, 5);
        assert_eq!(config.status_class, StatusClass::Danger);

        let config = classify_labels(&["order:high", "AL"]);
        assert_eq!(config.order_box, 1);
    }

    #[test]
    fn test_widget_range_mode_class() {
        let config = classify_labels(&[
            "widget:Line",
            "widget-min:0",
            "widget-max:500",
            "widget-mode:donut",
            "widget-class:progress-bar-info",
        ]);
        assert_eq!(config.widget, WidgetKind::Line);
        assert_eq!(config.widget_min, Some(Scalar::Int(0)));
        assert_eq!(config.widget_max, Some(Scalar::Int(500)));
        assert_eq!(config.widget_mode.as_deref(), Some("donut"));
        assert_eq!(config.widget_class.as_deref(), Some("progress-bar-info"));
    }

    #[test]
    fn test_chart_data_directives() {
        let config = classify_labels(&[
            "widget:bar",
            "widget-data-labels:mon,tue,wed",
            "widget-data-legendNames:errors warnings",
            "widget-data-series:1,2,3",
            "widget-data-series:4,5,6",
        ]);
        let chart = config.chart.unwrap();
        assert_eq!(chart.labels, vec!["mon", "tue", "wed"]);
        assert_eq!(
            chart.series,
            ChartSeries::Rows(vec![
                vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)],
                vec![Scalar::Int(4), Scalar::Int(5), Scalar::Int(6)],
            ])
        );
        assert_eq!(
            config.legend_names,
            Some(vec!["errors".to_string(), "warnings".to_string()])
        );
    }

    #[test]
    fn test_no_chart_without_chart_directives() {
        let config = classify_labels(&["widget:pie", "UP"]);
        assert!(config.chart.is_none());
    }

    #[test]
    fn test_unknown_and_empty_directives_ignored() {
        let config = classify_labels(&["something-else", "height:", "order:", "widget-options:"]);
        assert!(config.style.is_empty());
        assert_eq!(config.order_box, 2);
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_sanitize_text() {
        let msg = Message::new("m", 1.0, 1.0)
            .with_text("#monitoring #api #item:db disk usage at 91%")
            .with_tags(["monitoring", "api", "item:db"]);
        assert_eq!(sanitize_text(&msg), "disk usage at 91%");
    }

    #[test]
    fn test_sanitize_only_first_item_tag() {
        let msg = Message::new("m", 1.0, 1.0)
            .with_text("#item:a #item:b check")
            .with_tags(["x", "item:a", "item:b"]);
        // Second tag is also the service, already stripped as an item
        assert_eq!(sanitize_text(&msg), "#item:b check");
    }

    #[test]
    fn test_sanitize_without_tags() {
        let msg = Message::new("m", 1.0, 1.0).with_text("  plain #text  ");
        assert_eq!(sanitize_text(&msg), "plain #text");
    }

    #[test]
    fn test_classify_is_idempotent() {
        let msg = message_with(&[
            ("bg-color", "#111"),
            ("percentRunning:0", ""),
            ("widget-options:axisY.offset:10,smooth:false", ""),
            ("widget-data-series:1 2 3", ""),
            ("WARN", ""),
        ])
        .with_text("#monitoring build");

        assert_eq!(classify(&msg), classify(&msg));
    }
}
