use std::time::Duration;

use snafu::Snafu;

use crate::cluster;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid {field}: {reason}"))]
    Validation { field: &'static str, reason: String },

    #[snafu(display(
        "Persistent volume claim {name} in namespace {namespace} is not bound after {}s, last \
         phase: {}",
        timeout.as_secs(),
        phase.as_deref().unwrap_or("unknown")
    ))]
    NotBound { namespace: String, name: String, timeout: Duration, phase: Option<String> },

    #[snafu(display(
        "Persistent volume claim {name} disappeared from namespace {namespace} before it was \
         bound"
    ))]
    Vanished { namespace: String, name: String },

    #[snafu(display("Persistent volume claim {name} does not exist in namespace {namespace}"))]
    NotFound { namespace: String, name: String },

    #[snafu(display("{source}"), context(false))]
    Cluster { source: cluster::Error },
}
