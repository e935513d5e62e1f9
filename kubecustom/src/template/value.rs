use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::template::{Placeholder, ValueKind};

/// A value substituted for a placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    Text(String),
    Count(u32),
    /// Whole CPU cores, rendered as a Kubernetes CPU quantity.
    Cpu(f64),
    /// Decimal gigabytes, rendered with the `G` suffix.
    Memory(f64),
}

impl TemplateValue {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Count(_) => ValueKind::Count,
            Self::Cpu(_) => ValueKind::Cpu,
            Self::Memory(_) => ValueKind::Memory,
        }
    }

    /// Returns false for CPU and memory amounts that are not positive and
    /// finite.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Cpu(amount) | Self::Memory(amount) => amount.is_finite() && *amount > 0.0,
            Self::Text(_) | Self::Count(_) => true,
        }
    }

    /// The value used when the placeholder is a whole scalar.
    pub(crate) fn typed(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Count(count) => Value::Number((*count).into()),
            Self::Cpu(cores) => Value::String(format!("{cores}")),
            Self::Memory(gigabytes) => Value::String(format!("{gigabytes}G")),
        }
    }

    /// The value spliced into surrounding text.
    pub(crate) fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Count(count) => count.to_string(),
            Self::Cpu(amount) | Self::Memory(amount) => format!("{amount}"),
        }
    }
}

/// The mapping from placeholders to the values substituted for them.
#[derive(Clone, Debug, Default)]
pub struct TemplateValues {
    values: BTreeMap<Placeholder, TemplateValue>,
}

impl TemplateValues {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with(mut self, placeholder: Placeholder, value: TemplateValue) -> Self {
        let _previous = self.values.insert(placeholder, value);
        self
    }

    #[must_use]
    pub fn with_text(self, placeholder: Placeholder, text: impl Into<String>) -> Self {
        self.with(placeholder, TemplateValue::Text(text.into()))
    }

    #[must_use]
    pub fn get(&self, placeholder: Placeholder) -> Option<&TemplateValue> {
        self.values.get(&placeholder)
    }
}
