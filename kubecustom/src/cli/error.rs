use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Template { source: crate::template::Error },

    #[snafu(display("{source}"))]
    Deployment { source: crate::deployment::Error },

    #[snafu(display("{source}"))]
    Inspector { source: crate::inspector::Error },

    #[snafu(display("{source}"))]
    Volume { source: crate::volume::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to serialize profile '{key}', error: {source}"))]
    SerializeProfile { key: String, source: serde_yaml::Error },

    #[snafu(display("Failed to initialize Kubernetes client configuration, error: {source}"))]
    KubeConfig { source: kube::Error },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Either a deployment name or a tag is required"))]
    MissingDeploymentTarget,

    #[snafu(display("Failed to listen for the interrupt signal, error: {source}"))]
    ListenInterrupt { source: std::io::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::template::Error> for Error {
    fn from(source: crate::template::Error) -> Self { Self::Template { source } }
}

impl From<crate::deployment::Error> for Error {
    fn from(source: crate::deployment::Error) -> Self { Self::Deployment { source } }
}

impl From<crate::inspector::Error> for Error {
    fn from(source: crate::inspector::Error) -> Self { Self::Inspector { source } }
}

impl From<crate::volume::Error> for Error {
    fn from(source: crate::volume::Error) -> Self { Self::Volume { source } }
}
