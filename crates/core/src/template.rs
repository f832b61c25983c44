//! Alert message templates.
//!
//! A template is parsed once at startup and rendered on every alert, so a
//! malformed template is rejected before monitoring begins instead of
//! failing when the first alert is due.
//!
//! Supported placeholders:
//!
//! | Placeholder              | Replaced with                  |
//! |--------------------------|--------------------------------|
//! | `{download}`, `{0}`      | current download speed         |
//! | `{upload}`, `{1}`        | current upload speed           |
//! | `{}`                     | next positional reading        |
//! | `{{`, `}}`               | a literal `{` / `}`            |
//!
//! `{}` and explicit indices cannot be mixed in one template. Names may
//! appear alongside either.
//!
//! Readings are rendered with [`format_speed`].

use crate::bandwidth::{format_speed, Bandwidth};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Download,
    Upload,
}

/// A validated alert message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Parse and validate a template string.
    pub fn parse(source: &str) -> Result<Self, CoreError> {
        if source.trim().is_empty() {
            return Err(CoreError::Validation(
                "Message template must not be empty".to_string(),
            ));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut next_positional = 0usize;
        let mut numbering = Numbering::Unused;
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(CoreError::Validation(format!(
                                    "Unterminated placeholder '{{{name}' in message template"
                                )));
                            }
                        }
                    }

                    let segment = if name.is_empty() {
                        numbering.switch_to(Numbering::Automatic)?;
                        let segment = positional(next_positional)?;
                        next_positional += 1;
                        segment
                    } else if let Ok(index) = name.parse::<usize>() {
                        numbering.switch_to(Numbering::Manual)?;
                        positional(index)?
                    } else {
                        named(&name)?
                    };

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(CoreError::Validation(
                        "Single '}' in message template; use '}}' for a literal brace"
                            .to_string(),
                    ));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Substitute the current readings into the template.
    pub fn render(&self, bandwidth: &Bandwidth) -> String {
        let download = format_speed(bandwidth.download);
        let upload = format_speed(bandwidth.upload);

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Download => out.push_str(&download),
                Segment::Upload => out.push_str(&upload),
            }
        }
        out
    }
}

/// How positional readings are numbered within one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numbering {
    Unused,
    Automatic,
    Manual,
}

impl Numbering {
    fn switch_to(&mut self, next: Numbering) -> Result<(), CoreError> {
        match *self {
            Numbering::Unused => {
                *self = next;
                Ok(())
            }
            current if current == next => Ok(()),
            _ => Err(CoreError::Validation(
                "Message template mixes '{}' with explicit indices like '{0}'".to_string(),
            )),
        }
    }
}

fn positional(index: usize) -> Result<Segment, CoreError> {
    match index {
        0 => Ok(Segment::Download),
        1 => Ok(Segment::Upload),
        _ => Err(CoreError::Validation(format!(
            "Message template references reading #{index}; only 0 (download) and 1 (upload) exist"
        ))),
    }
}

fn named(name: &str) -> Result<Segment, CoreError> {
    match name {
        "download" => Ok(Segment::Download),
        "upload" => Ok(Segment::Upload),
        other => Err(CoreError::Validation(format!(
            "Unknown placeholder '{{{other}}}' in message template"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
