//! Validation messages accumulated during a build.
//!
//! Messages are data: a key, a severity and structured arguments. Turning
//! them into human-readable (and localized) text is the caller's job; the
//! `Display` impl renders a plain English fallback for logs and tests
//! only.

use std::fmt;

use thiserror::Error;

use crate::config::Side;

/// Severity of a validation message. A single `Error` fails the build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Stable message keys; the localization layer maps these to text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
    /// The configuration contains no strings.
    NoStrings,
    /// A required scale length is missing (args: context).
    MissingScaleLength,
    /// A spacing distance list has an invalid length
    /// (args: given count, string count).
    InvalidDistanceCount,
    /// Manual center alignment is configured at both ends at once.
    ConflictingManualAlignment,
    /// A scale length is shorter than the horizontal nut/bridge offset it
    /// has to span (args: context).
    ScaleLengthTooShort,
    /// A string has no gauge data; spacing treats it as zero width
    /// (args: string index).
    MissingGaugeWidth,
    /// The scale-length mode does not apply to a single string; the build
    /// falls back to the nearest configured value.
    UnsupportedScaleMode,
    /// An internal error aborted the build (args: description).
    UnexpectedError,
}

impl MessageKey {
    /// English fallback template; `{}` slots are filled in argument order.
    fn template(self) -> &'static str {
        match self {
            MessageKey::NoStrings => "the configuration contains no strings",
            MessageKey::MissingScaleLength => "missing scale length for {}",
            MessageKey::InvalidDistanceCount => {
                "{} spacing distances given; expected one value or {} (one per gap)"
            }
            MessageKey::ConflictingManualAlignment => {
                "manual alignment cannot be configured at both the nut and the bridge"
            }
            MessageKey::ScaleLengthTooShort => {
                "scale length for {} is shorter than its nut/bridge offset"
            }
            MessageKey::MissingGaugeWidth => "string {} has no gauge data; assuming zero width",
            MessageKey::UnsupportedScaleMode => {
                "the scale-length mode is not meaningful for a single string"
            }
            MessageKey::UnexpectedError => "unexpected error: {}",
        }
    }
}

/// A structured message argument.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageArg {
    Index(usize),
    Count(usize),
    Side(Side),
    Number(f64),
    Text(String),
}

impl fmt::Display for MessageArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageArg::Index(i) => write!(f, "string {}", i + 1),
            MessageArg::Count(c) => write!(f, "{c}"),
            MessageArg::Side(Side::Bass) => write!(f, "the bass side"),
            MessageArg::Side(Side::Treble) => write!(f, "the treble side"),
            MessageArg::Number(n) => write!(f, "{n}"),
            MessageArg::Text(t) => write!(f, "{t}"),
        }
    }
}

/// One validation message.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub key: MessageKey,
    pub args: Vec<MessageArg>,
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut args = self.args.iter();
        let mut parts = self.key.template().split("{}");
        if let Some(first) = parts.next() {
            f.write_str(first)?;
        }
        for part in parts {
            match args.next() {
                Some(arg) => write!(f, "{arg}")?,
                None => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

/// Ordered accumulator for validation messages.
#[derive(Clone, Debug, Default)]
pub struct Messages {
    items: Vec<ValidationMessage>,
}

impl Messages {
    pub fn new() -> Messages {
        Messages::default()
    }

    pub fn push(&mut self, severity: Severity, key: MessageKey, args: Vec<MessageArg>) {
        self.items.push(ValidationMessage {
            severity,
            key,
            args,
        });
    }

    pub fn info(&mut self, key: MessageKey, args: Vec<MessageArg>) {
        self.push(Severity::Info, key, args);
    }

    pub fn warning(&mut self, key: MessageKey, args: Vec<MessageArg>) {
        self.push(Severity::Warning, key, args);
    }

    pub fn error(&mut self, key: MessageKey, args: Vec<MessageArg>) {
        self.push(Severity::Error, key, args);
    }

    /// Whether any accumulated message is an error. Builders signal
    /// failure through this alone.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationMessage> {
        self.items
    }
}

/// Marker error a builder returns after pushing an `Error` message, so the
/// pipeline can stop with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("layout build aborted")]
pub struct BuildAborted;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_substitutes_arguments_in_order() {
        let msg = ValidationMessage {
            severity: Severity::Error,
            key: MessageKey::InvalidDistanceCount,
            args: vec![MessageArg::Count(3), MessageArg::Count(5)],
        };
        assert_eq!(
            msg.to_string(),
            "3 spacing distances given; expected one value or 5 (one per gap)"
        );
    }

    #[test]
    fn display_handles_missing_arguments() {
        let msg = ValidationMessage {
            severity: Severity::Error,
            key: MessageKey::MissingScaleLength,
            args: vec![],
        };
        assert_eq!(msg.to_string(), "missing scale length for ?");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut messages = Messages::new();
        messages.warning(MessageKey::MissingGaugeWidth, vec![MessageArg::Index(0)]);
        assert!(!messages.has_errors());
        messages.error(MessageKey::ConflictingManualAlignment, vec![]);
        assert!(messages.has_errors());
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn index_argument_is_one_based_in_text() {
        let msg = ValidationMessage {
            severity: Severity::Warning,
            key: MessageKey::MissingGaugeWidth,
            args: vec![MessageArg::Index(0)],
        };
        assert_eq!(msg.to_string(), "string 1 has no gauge data; assuming zero width");
    }
}
