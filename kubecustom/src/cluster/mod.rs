//! The narrow slice of the Kubernetes API the deployment manager and the pod
//! inspector depend on.
//!
//! Everything above this module talks to a [`Cluster`], so the lifecycle and
//! aggregation logic can be exercised against an in-memory cluster in tests
//! while [`KubeCluster`] drives a real API server.

mod error;
#[cfg(test)]
pub mod fake;
mod kube_cluster;
mod metrics;

use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{PersistentVolumeClaim, Pod, Secret},
};

pub use self::{
    error::Error,
    kube_cluster::KubeCluster,
    metrics::{ContainerMetrics, ContainerUsage, PodMetrics},
};

/// Result of a mutating call against an object that may be absent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Applied,
    NotFound,
}

pub trait Cluster {
    async fn get_deployment(&self, namespace: &str, name: &str)
    -> Result<Option<Deployment>, Error>;

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Deployment>, Error>;

    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] when a deployment of the same name is
    /// present.
    async fn create_deployment(&self, namespace: &str, deployment: &Deployment)
    -> Result<(), Error>;

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<Outcome, Error>;

    async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<Outcome, Error>;

    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] when a secret of the same name is
    /// present.
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<(), Error>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<Outcome, Error>;

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, Error>;

    async fn list_pod_metrics(&self, namespace: &str) -> Result<Vec<PodMetrics>, Error>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<Outcome, Error>;

    async fn annotate_pod(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<Outcome, Error>;

    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] when a claim of the same name is
    /// present.
    async fn create_pvc(&self, namespace: &str, claim: &PersistentVolumeClaim)
    -> Result<(), Error>;

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, Error>;

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<Outcome, Error>;
}
