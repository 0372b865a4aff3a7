//! Status classification from well-known label texts.

use super::message::Label;
use super::widget::StatusClass;

/// Order box used when no status label is present.
pub const DEFAULT_ORDER_BOX: i64 = 2;

/// Derive the status class and default order box of a message.
///
/// The first label whose text is exactly one of the status tokens decides:
///
/// | label          | class   | order box |
/// |----------------|---------|-----------|
/// | `AL`, `open`   | danger  | 1         |
/// | `WARN`         | warning | 2         |
/// | `UP`, `done`   | success | 3         |
///
/// Without a match the message is a warning with order box 2.
pub fn classify(labels: &[Label]) -> (StatusClass, i64) {
    labels
        .iter()
        .find_map(|label| match label.text.as_str() {
            "AL" | "open" => Some((StatusClass::Danger, 1)),
            "UP" | "done" => Some((StatusClass::Success, 3)),
            "WARN" => Some((StatusClass::Warning, 2)),
            _ => None,
        })
        .unwrap_or((StatusClass::Warning, DEFAULT_ORDER_BOX))
}
