use std::path::PathBuf;

use snafu::Snafu;

/// Represents the possible errors that can occur when handling the
/// configuration file and the profiles it stores.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// No configuration file exists yet at `filename`.
    #[snafu(display(
        "No configuration found at {}. Add a profile with `kubecustom profile add` or start from \
         the template printed by `kubecustom default-config`",
        filename.display()
    ))]
    MissingConfig { filename: PathBuf },

    #[snafu(display("Failed to open config from {}, error: {source}", filename.display()))]
    OpenConfig { filename: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to parse config from {}, error: {source}", filename.display()))]
    ParseConfig { filename: PathBuf, source: serde_yaml::Error },

    #[snafu(display("Failed to serialize config, error: {source}"))]
    SerializeConfig { source: serde_yaml::Error },

    #[snafu(display("Failed to write config to {}, error: {source}", filename.display()))]
    WriteConfig { filename: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to resolve file path {}, error: {source}", file_path.display()))]
    ResolveFilePath { file_path: PathBuf, source: std::io::Error },

    /// The requested profile is a supported kind but has not been added.
    #[snafu(display(
        "Configuration '{key}' is unknown, available configurations: [{}]",
        available.join(", ")
    ))]
    UnknownProfile { key: String, available: Vec<String> },

    #[snafu(display("No configuration is active, select one with `kubecustom profile use <key>`"))]
    NoActiveProfile,

    #[snafu(display(
        "Deployment prefix '{prefix}' is invalid, only lowercase letters and digits are allowed"
    ))]
    InvalidDeploymentPrefix { prefix: String },

    #[snafu(display("Configuration '{key}' is listed more than once"))]
    DuplicateProfile { key: String },

    /// A profile field is missing or malformed.
    #[snafu(display("Configuration '{key}' has an invalid '{field}': {reason}"))]
    Validation { key: String, field: String, reason: String },
}
