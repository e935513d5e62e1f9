//! Manifest templates with `${NAME}` placeholders.
//!
//! A template is a YAML document. Every string scalar (mapping keys included)
//! may contain placeholders. A scalar made of exactly one placeholder is
//! replaced by a typed value, so `replicas: "${REPLICAS}"` renders as an
//! integer and `cpu: "${CPUS}"` as a CPU quantity. Placeholders inside longer
//! text are spliced in as plain text. Rendering never leaves a placeholder
//! behind: an unknown name, a missing value or a value of the wrong kind is
//! an error.

mod builtin;
mod error;
mod placeholder;
mod value;

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value, value::TaggedValue};
use snafu::{OptionExt, ResultExt};

pub use self::{
    builtin::ManifestTemplates,
    error::Error,
    placeholder::{Placeholder, ValueKind},
    value::{TemplateValue, TemplateValues},
};

const OPEN: &str = "${";
const CLOSE: char = '}';

#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    document: Value,
}

impl Template {
    /// Parses a template and checks that every placeholder in it is known
    /// and terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not YAML or uses a malformed or unknown
    /// placeholder.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, Error> {
        let name = name.into();
        let document = serde_yaml::from_str(text)
            .context(error::ParseTemplateSnafu { template: name.clone() })?;
        let template = Self { name, document };
        let _placeholders = template.placeholders()?;
        Ok(template)
    }

    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Every placeholder used by the template.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed or unknown placeholders.
    pub fn placeholders(&self) -> Result<BTreeSet<Placeholder>, Error> {
        let mut found = BTreeSet::new();
        collect(&self.name, &self.document, &mut found)?;
        Ok(found)
    }

    /// Substitutes every placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder has no value, or a value of the
    /// wrong kind, or a CPU or memory amount that is not positive.
    pub fn render(&self, values: &TemplateValues) -> Result<Value, Error> {
        self.render_node(&self.document, values)
    }

    /// Renders the template and deserializes the result into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the result is not a valid
    /// `kind`.
    pub fn render_as<T: DeserializeOwned>(
        &self,
        values: &TemplateValues,
        kind: &'static str,
    ) -> Result<T, Error> {
        serde_yaml::from_value(self.render(values)?)
            .context(error::DeserializeSnafu { template: self.name.clone(), kind })
    }

    fn render_node(&self, node: &Value, values: &TemplateValues) -> Result<Value, Error> {
        match node {
            Value::String(text) => self.render_scalar(text, values),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.render_node(item, values))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(mapping) => {
                let mut rendered = Mapping::with_capacity(mapping.len());
                for (key, item) in mapping {
                    let _previous = rendered
                        .insert(self.render_node(key, values)?, self.render_node(item, values)?);
                }
                Ok(Value::Mapping(rendered))
            }
            Value::Tagged(tagged) => Ok(Value::Tagged(Box::new(TaggedValue {
                tag: tagged.tag.clone(),
                value: self.render_node(&tagged.value, values)?,
            }))),
            other => Ok(other.clone()),
        }
    }

    fn render_scalar(&self, text: &str, values: &TemplateValues) -> Result<Value, Error> {
        let segments = tokenize(&self.name, text)?;
        if let [Segment::Slot(placeholder)] = segments.as_slice() {
            return Ok(self.lookup(*placeholder, values)?.typed());
        }

        let mut rendered = String::with_capacity(text.len());
        for segment in segments {
            match segment {
                Segment::Literal(literal) => rendered.push_str(literal),
                Segment::Slot(placeholder) => {
                    rendered.push_str(&self.lookup(placeholder, values)?.text());
                }
            }
        }
        Ok(Value::String(rendered))
    }

    fn lookup<'v>(
        &self,
        placeholder: Placeholder,
        values: &'v TemplateValues,
    ) -> Result<&'v TemplateValue, Error> {
        let value = values
            .get(placeholder)
            .context(error::MissingValueSnafu { template: self.name.clone(), placeholder })?;

        let expected = placeholder.expected_kind();
        if value.kind() != expected {
            return error::IncompatibleValueSnafu {
                template: self.name.clone(),
                placeholder,
                expected,
                found: value.kind(),
            }
            .fail();
        }
        if !value.is_well_formed() {
            return error::InvalidQuantitySnafu {
                template: self.name.clone(),
                placeholder,
                kind: expected,
            }
            .fail();
        }
        Ok(value)
    }
}

#[derive(Debug)]
enum Segment<'t> {
    Literal(&'t str),
    Slot(Placeholder),
}

fn tokenize<'t>(template: &str, text: &'t str) -> Result<Vec<Segment<'t>>, Error> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let after = &rest[start + OPEN.len()..];
        let end = after
            .find(CLOSE)
            .context(error::UnterminatedPlaceholderSnafu { template, text })?;
        let name = &after[..end];
        let placeholder = Placeholder::from_name(name)
            .context(error::UnknownPlaceholderSnafu { template, name })?;
        segments.push(Segment::Slot(placeholder));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

fn collect(template: &str, node: &Value, found: &mut BTreeSet<Placeholder>) -> Result<(), Error> {
    match node {
        Value::String(text) => {
            for segment in tokenize(template, text)? {
                if let Segment::Slot(placeholder) = segment {
                    let _inserted = found.insert(placeholder);
                }
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect(template, item, found)?;
            }
        }
        Value::Mapping(mapping) => {
            for (key, item) in mapping {
                collect(template, key, found)?;
                collect(template, item, found)?;
            }
        }
        Value::Tagged(tagged) => collect(template, &tagged.value, found)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
