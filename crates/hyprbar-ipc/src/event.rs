//! Generic event records read from the Hyprland event socket
//!
//! Each line on `.socket2.sock` has the shape `TYPE>>field1,field2,...`.
//! Fields are split on every comma with no escaping, so a field that itself
//! contains a comma (a window title, say) cannot be told apart from two
//! fields at this layer. The typed layer in [`crate::typed`] knows which
//! fields are free-form and handles that there.

use std::fmt;

/// Separator between the event type and its field list
pub const TYPE_DELIMITER: &str = ">>";

/// One parsed event record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event type, e.g. `workspace` or `openwindow`
    pub kind: String,

    /// Positional fields in wire order
    pub fields: Vec<String>,
}

impl Event {
    pub fn new(kind: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            kind: kind.into(),
            fields,
        }
    }

    /// Parse a single event-stream record
    ///
    /// Splits on the first `>>`; returns `None` when the delimiter is absent.
    /// The remainder is always split on `,`, so `TYPE>>` yields one empty
    /// field.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (kind, rest) = line.split_once(TYPE_DELIMITER)?;

        Some(Self {
            kind: kind.to_string(),
            fields: rest.split(',').map(str::to_string).collect(),
        })
    }

    /// Field at `index`, if present
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind, TYPE_DELIMITER, self.fields.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_type_and_fields() {
        let event = Event::parse("TYPE>>a,b,c").unwrap();
        assert_eq!(event.kind, "TYPE");
        assert_eq!(event.fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_single_field() {
        let event = Event::parse("workspace>>3").unwrap();
        assert_eq!(event, Event::new("workspace", vec!["3".to_string()]));
    }

    #[test]
    fn test_line_without_delimiter_is_dropped() {
        assert!(Event::parse("workspace 3").is_none());
        assert!(Event::parse("").is_none());
        assert!(Event::parse("workspace>3").is_none());
    }

    #[test]
    fn test_empty_remainder_yields_one_empty_field() {
        let event = Event::parse("submap>>").unwrap();
        assert_eq!(event.kind, "submap");
        assert_eq!(event.fields, vec![""]);
    }

    #[test]
    fn test_only_first_delimiter_splits() {
        let event = Event::parse("activewindow>>kitty,a >> b").unwrap();
        assert_eq!(event.kind, "activewindow");
        assert_eq!(event.fields, vec!["kitty", "a >> b"]);
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let event = Event::parse("activewindow>> kitty , title ").unwrap();
        assert_eq!(event.fields, vec![" kitty ", " title "]);
    }

    #[test]
    fn test_embedded_commas_split_into_extra_fields() {
        let event = Event::parse("activewindow>>firefox,Hello, world").unwrap();
        assert_eq!(event.fields, vec!["firefox", "Hello", " world"]);
    }

    #[test]
    fn test_trailing_carriage_return_is_stripped() {
        let event = Event::parse("workspace>>3\r").unwrap();
        assert_eq!(event.fields, vec!["3"]);
    }

    #[test]
    fn test_empty_type_is_kept() {
        let event = Event::parse(">>x").unwrap();
        assert_eq!(event.kind, "");
        assert_eq!(event.fields, vec!["x"]);
    }

    #[test]
    fn test_display_renders_wire_form() {
        let event = Event::parse("openwindow>>80a3,2,kitty,zsh").unwrap();
        assert_eq!(event.to_string(), "openwindow>>80a3,2,kitty,zsh");
        assert_eq!(event.field(2), Some("kitty"));
        assert_eq!(event.field(4), None);
    }
}
