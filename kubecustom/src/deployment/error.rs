use std::path::PathBuf;

use snafu::Snafu;

use crate::{cluster, inspector, template};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid {field}: {reason}"))]
    Validation { field: &'static str, reason: String },

    #[snafu(display("Artifact path {} cannot be used: {reason}", path.display()))]
    Path { path: PathBuf, reason: String },

    #[snafu(display("Deployment {name} already exists in namespace {namespace}"))]
    AlreadyExists { namespace: String, name: String },

    #[snafu(display("Deployment {name} does not exist in namespace {namespace}"))]
    NotFound { namespace: String, name: String },

    #[snafu(display("Failed to serialize rendered {kind} {name}, error: {source}"))]
    SerializeManifest { kind: &'static str, name: String, source: serde_yaml::Error },

    #[snafu(display("Failed to write rendered manifest {}, error: {source}", path.display()))]
    WriteManifest { path: PathBuf, source: std::io::Error },

    #[snafu(display("{source}"), context(false))]
    Template { source: template::Error },

    #[snafu(display("{source}"), context(false))]
    Cluster { source: cluster::Error },

    #[snafu(display("{source}"), context(false))]
    Inspect { source: inspector::Error },
}
