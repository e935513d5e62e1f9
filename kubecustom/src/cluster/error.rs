use snafu::Snafu;

/// Failures reported by the cluster API.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{kind} {name} already exists in namespace {namespace}"))]
    AlreadyExists { kind: &'static str, namespace: String, name: String },

    #[snafu(display("Not allowed to {operation} {name} in namespace {namespace}: {message}"))]
    Forbidden { operation: &'static str, namespace: String, name: String, message: String },

    #[snafu(display(
        "Failed to get deployment {name} in namespace {namespace}, error: {source}"
    ))]
    GetDeployment {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list deployments in namespace {namespace}, error: {source}"))]
    ListDeployments {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to create deployment {name} in namespace {namespace}, error: {source}"
    ))]
    CreateDeployment {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to delete deployment {name} in namespace {namespace}, error: {source}"
    ))]
    DeleteDeployment {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to scale deployment {name} in namespace {namespace}, error: {source}"
    ))]
    ScaleDeployment {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to create secret {name} in namespace {namespace}, error: {source}"))]
    CreateSecret {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to delete secret {name} in namespace {namespace}, error: {source}"))]
    DeleteSecret {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list pods in namespace {namespace}, error: {source}"))]
    ListPods {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list pod metrics in namespace {namespace}, error: {source}"))]
    ListPodMetrics {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to delete pod {name} in namespace {namespace}, error: {source}"))]
    DeletePod {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to annotate pod {name} in namespace {namespace}, error: {source}"))]
    AnnotatePod {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to create persistent volume claim {name} in namespace {namespace}, error: {source}"
    ))]
    CreatePvc {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to get persistent volume claim {name} in namespace {namespace}, error: {source}"
    ))]
    GetPvc {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to delete persistent volume claim {name} in namespace {namespace}, error: {source}"
    ))]
    DeletePvc {
        namespace: String,
        name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },
}
