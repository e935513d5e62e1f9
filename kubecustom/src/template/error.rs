use std::path::PathBuf;

use snafu::Snafu;

use crate::template::{Placeholder, ValueKind};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read template {}, error: {source}", path.display()))]
    ReadTemplate { path: PathBuf, source: std::io::Error },

    #[snafu(display("Template '{template}' is not valid YAML, error: {source}"))]
    ParseTemplate { template: String, source: serde_yaml::Error },

    #[snafu(display("Template '{template}' uses unknown placeholder '{name}'"))]
    UnknownPlaceholder { template: String, name: String },

    #[snafu(display("Template '{template}' has an unterminated placeholder in '{text}'"))]
    UnterminatedPlaceholder { template: String, text: String },

    #[snafu(display("Template '{template}' needs a value for placeholder '{placeholder}'"))]
    MissingValue { template: String, placeholder: Placeholder },

    #[snafu(display(
        "Template '{template}' expects a {expected} for placeholder '{placeholder}', got a {found}"
    ))]
    IncompatibleValue {
        template: String,
        placeholder: Placeholder,
        expected: ValueKind,
        found: ValueKind,
    },

    #[snafu(display(
        "Template '{template}' needs a positive {kind} for placeholder '{placeholder}'"
    ))]
    InvalidQuantity { template: String, placeholder: Placeholder, kind: ValueKind },

    #[snafu(display("Rendered template '{template}' is not a valid {kind}, error: {source}"))]
    Deserialize { template: String, kind: &'static str, source: serde_yaml::Error },
}
