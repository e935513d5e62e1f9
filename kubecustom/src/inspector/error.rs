use snafu::Snafu;

use crate::{cluster, quantity};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"), context(false))]
    Cluster { source: cluster::Error },

    #[snafu(display("Failed to write the pod summary, error: {source}"))]
    WriteOutput { source: std::io::Error },

    /// Some deletions went through before others were refused.
    #[snafu(display(
        "Deleted {deleted} pods but failed to delete {failed}, first error: {source}"
    ))]
    DeletePods { deleted: usize, failed: usize, source: cluster::Error },

    #[snafu(display("Failed to read the {resource} usage of pod {pod}, error: {source}"))]
    Usage { pod: String, resource: &'static str, source: quantity::Error },
}
