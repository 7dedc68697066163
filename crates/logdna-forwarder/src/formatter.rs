// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Rendering of incoming messages into single text lines.
//!
//! Templates use the field-reference subset of Go's `text/template` syntax,
//! which is what `RAW_FORMAT` values are written in:
//!
//! ```text
//! {{.Data}}                       raw text only (default)
//! [{{.Source}}] {{.Data}}         literal text around fields
//! {{ .Container.Name }}: {{.Data}} nested fields, inner whitespace ignored
//! {{.}}                           the whole message as JSON
//! ```
//!
//! Go trim markers are honoured: `{{- .Data}}` drops the whitespace before the
//! action and `{{.Data -}}` the whitespace after it. Any other action
//! (`range`, `if`, pipelines, functions) is rejected when the template is
//! compiled.
//!
//! A null value renders as the empty string, where Go's `text/template`
//! prints `<nil>`. `{{.Container}}` on a message without container metadata
//! therefore renders nothing.
//!
//! Templates are compiled once; rendering never re-parses.

use serde::Serialize;
use serde_json::Value;

use crate::constants::DEFAULT_TEMPLATE;
use crate::error::TemplateError;
use crate::message::LogMessage;
use crate::payload::FormattedLine;
use crate::util::unix_now;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// Field path; empty means the value itself.
    Field(Vec<String>),
}

/// A compiled line template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Default for Template {
    fn default() -> Self {
        Template {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![Segment::Field(vec!["Data".to_string()])],
        }
    }
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = rest.find("{{") {
            let position = offset + start;
            let inner = &rest[start + 2..];
            let Some(end) = inner.find("}}") else {
                return Err(TemplateError::Unclosed { position });
            };
            let (action, trim_before, trim_after) = strip_trim_markers(&inner[..end]);

            let mut text = &rest[..start];
            if trim_next {
                text = text.trim_start();
            }
            if trim_before {
                text = text.trim_end();
            }
            push_text(&mut segments, text);
            segments.push(Segment::Field(parse_action(action, position)?));
            trim_next = trim_after;

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        push_text(&mut segments, if trim_next { rest.trim_start() } else { rest });

        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    /// The text the template was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders `value` through the template.
    ///
    /// `value` is viewed through its serde representation, so any
    /// `Serialize` type works; field names are the serialized names.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String, TemplateError> {
        let root = serde_json::to_value(value).map_err(TemplateError::Serialize)?;
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(path) => write_value(&mut out, lookup(&root, path)?),
            }
        }
        Ok(out)
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

/// Splits `{{- ` and ` -}}` markers off an action. A dash only counts as a
/// marker when whitespace separates it from the action body.
fn strip_trim_markers(action: &str) -> (&str, bool, bool) {
    let (action, trim_before) = match action.strip_prefix('-') {
        Some(stripped) if stripped.starts_with(char::is_whitespace) => (stripped, true),
        _ => (action, false),
    };
    let (action, trim_after) = match action.strip_suffix('-') {
        Some(stripped) if stripped.ends_with(char::is_whitespace) => (stripped, true),
        _ => (action, false),
    };
    (action, trim_before, trim_after)
}

fn parse_action(action: &str, position: usize) -> Result<Vec<String>, TemplateError> {
    let action = action.trim();
    let Some(path) = action.strip_prefix('.') else {
        return Err(TemplateError::UnsupportedAction {
            action: action.to_string(),
            position,
        });
    };
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<String> = path.split('.').map(str::to_string).collect();
    let valid = parts.iter().all(|part| {
        !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if !valid {
        return Err(TemplateError::InvalidField {
            path: action.to_string(),
            position,
        });
    }
    Ok(parts)
}

fn lookup<'a>(root: &'a Value, path: &[String]) -> Result<&'a Value, TemplateError> {
    let mut current = root;
    for (depth, part) in path.iter().enumerate() {
        current = current
            .as_object()
            .and_then(|fields| fields.get(part))
            .ok_or_else(|| TemplateError::MissingField(path[..=depth].join(".")))?;
    }
    Ok(current)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
    }
}

/// Turns messages into [`FormattedLine`]s using a compiled template.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    template: Template,
}

impl Formatter {
    #[must_use]
    pub fn new(template: Template) -> Self {
        Formatter { template }
    }

    pub fn render(&self, message: &LogMessage) -> Result<String, TemplateError> {
        self.template.render(message)
    }

    /// Renders `message` and stamps it with the current time.
    pub fn format(&self, message: &LogMessage) -> Result<FormattedLine, TemplateError> {
        Ok(FormattedLine {
            timestamp: unix_now(),
            text: self.render(message)?,
            source_file: String::new(),
        })
    }
}
