//! Types of the `metrics.k8s.io/v1beta1` API, which `k8s-openapi` does not
//! ship.

use k8s_openapi::apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContainerUsage {
    pub cpu: Quantity,
    pub memory: Quantity,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContainerMetrics {
    pub name: String,
    pub usage: ContainerUsage,
}

/// Live usage of one pod as reported by the metrics server.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PodMetrics {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub window: Option<String>,

    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
}

impl PodMetrics {
    #[must_use]
    pub fn pod_name(&self) -> &str { self.metadata.name.as_deref().unwrap_or_default() }
}

impl k8s_openapi::Resource for PodMetrics {
    type Scope = k8s_openapi::NamespaceResourceScope;

    const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
    const GROUP: &'static str = "metrics.k8s.io";
    const KIND: &'static str = "PodMetrics";
    const URL_PATH_SEGMENT: &'static str = "pods";
    const VERSION: &'static str = "v1beta1";
}

impl k8s_openapi::Metadata for PodMetrics {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &Self::Ty { &self.metadata }

    fn metadata_mut(&mut self) -> &mut Self::Ty { &mut self.metadata }
}
