//! In-memory [`Cluster`] used by unit tests, plus fixtures for the objects it
//! serves.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
};

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Container, ContainerState, ContainerStateRunning, ContainerStateTerminated,
            ContainerStateWaiting, ContainerStatus, PersistentVolumeClaim,
            PersistentVolumeClaimStatus, Pod, PodSpec, PodStatus, PodTemplateSpec,
            ResourceRequirements, Secret,
        },
    },
    apimachinery::pkg::{
        api::resource::Quantity,
        apis::meta::v1::{LabelSelector, ObjectMeta},
    },
};

use crate::cluster::{
    Cluster, ContainerMetrics, ContainerUsage, Error, Outcome, PodMetrics, error,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    CreateSecret(String),
    CreateDeployment(String),
    DeleteDeployment(String),
    DeleteSecret(String),
    ScaleDeployment(String, i32),
    DeletePod(String),
    AnnotatePod { pod: String, key: String, value: String },
    CreatePvc(String),
    DeletePvc(String),
}

type Key = (String, String);

#[derive(Debug, Default)]
struct State {
    deployments: BTreeMap<Key, Deployment>,
    secrets: BTreeMap<Key, Secret>,
    pods: BTreeMap<Key, Pod>,
    metrics: BTreeMap<Key, PodMetrics>,
    failing: BTreeSet<&'static str>,
    vanishing_pods: BTreeSet<String>,
    protected_pods: BTreeSet<String>,
    claims: BTreeMap<Key, PersistentVolumeClaim>,
    pvc_reads: BTreeMap<Key, usize>,
    pvc_pending_reads: usize,
    pvc_never_binding: bool,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

fn key(namespace: &str, name: &str) -> Key { (namespace.to_string(), name.to_string()) }

fn object_key(metadata: &ObjectMeta) -> Key {
    key(
        metadata.namespace.as_deref().unwrap_or_default(),
        metadata.name.as_deref().unwrap_or_default(),
    )
}

fn matches_selector(labels: Option<&BTreeMap<String, String>>, selector: Option<&str>) -> bool {
    let Some(selector) = selector.filter(|selector| !selector.is_empty()) else {
        return true;
    };
    selector.split(',').all(|requirement| {
        requirement.split_once('=').is_some_and(|(label, value)| {
            labels.and_then(|labels| labels.get(label)).is_some_and(|found| found == value)
        })
    })
}

impl FakeCluster {
    pub fn new() -> Self { Self::default() }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake cluster state is poisoned")
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        let _previous = self.state().deployments.insert(object_key(&deployment.metadata), deployment);
        self
    }

    pub fn with_secret(self, secret: Secret) -> Self {
        let _previous = self.state().secrets.insert(object_key(&secret.metadata), secret);
        self
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        let _previous = self.state().pods.insert(object_key(&pod.metadata), pod);
        self
    }

    pub fn with_metrics(self, metrics: PodMetrics) -> Self {
        let _previous = self.state().metrics.insert(object_key(&metrics.metadata), metrics);
        self
    }

    /// Makes every call of `operation` fail with [`Error::Forbidden`].
    pub fn failing(self, operation: &'static str) -> Self {
        let _inserted = self.state().failing.insert(operation);
        self
    }

    /// Keeps `pod` listed but has it disappear once its deletion is issued,
    /// as if another client removed it first.
    pub fn vanishing_pod(self, pod: &str) -> Self {
        let _inserted = self.state().vanishing_pods.insert(pod.to_string());
        self
    }

    /// Makes deleting `pod` fail with [`Error::Forbidden`] while other pods
    /// can still be deleted.
    pub fn protected_pod(self, pod: &str) -> Self {
        let _inserted = self.state().protected_pods.insert(pod.to_string());
        self
    }

    /// Reports claims as `Pending` for their first `reads` reads, and as
    /// `Bound` afterwards.
    pub fn pvc_pending_for(self, reads: usize) -> Self {
        self.state().pvc_pending_reads = reads;
        self
    }

    /// Keeps every claim `Pending`.
    pub fn pvc_never_binding(self) -> Self {
        self.state().pvc_never_binding = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> { self.state().calls.clone() }

    pub fn pvc(&self, namespace: &str, name: &str) -> Option<PersistentVolumeClaim> {
        self.state().claims.get(&key(namespace, name)).cloned()
    }

    pub fn pvc_reads(&self, namespace: &str, name: &str) -> usize {
        self.state().pvc_reads.get(&key(namespace, name)).copied().unwrap_or_default()
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state().deployments.get(&key(namespace, name)).cloned()
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state().secrets.get(&key(namespace, name)).cloned()
    }

    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.state().pods.get(&key(namespace, name)).cloned()
    }

    fn check(&self, operation: &'static str, namespace: &str, name: &str) -> Result<(), Error> {
        if self.state().failing.contains(operation) {
            return error::ForbiddenSnafu {
                operation,
                namespace,
                name,
                message: "rejected by fake cluster",
            }
            .fail();
        }
        Ok(())
    }

    fn record(&self, call: Call) { self.state().calls.push(call); }
}

impl Cluster for FakeCluster {
    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, Error> {
        self.check("get deployment", namespace, name)?;
        Ok(self.deployment(namespace, name))
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Deployment>, Error> {
        self.check("list deployments", namespace, "")?;
        Ok(self
            .state()
            .deployments
            .iter()
            .filter(|((ns, _), deployment)| {
                ns == namespace
                    && matches_selector(deployment.metadata.labels.as_ref(), label_selector)
            })
            .map(|(_, deployment)| deployment.clone())
            .collect())
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), Error> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        self.check("create deployment", namespace, &name)?;
        self.record(Call::CreateDeployment(name.clone()));
        let mut state = self.state();
        if state.deployments.contains_key(&key(namespace, &name)) {
            return error::AlreadyExistsSnafu { kind: "Deployment", namespace, name }.fail();
        }
        let mut deployment = deployment.clone();
        deployment.metadata.namespace = Some(namespace.to_string());
        let _previous = state.deployments.insert(key(namespace, &name), deployment);
        Ok(())
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        self.check("delete deployment", namespace, name)?;
        self.record(Call::DeleteDeployment(name.to_string()));
        Ok(match self.state().deployments.remove(&key(namespace, name)) {
            Some(_) => Outcome::Applied,
            None => Outcome::NotFound,
        })
    }

    async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<Outcome, Error> {
        self.check("scale deployment", namespace, name)?;
        self.record(Call::ScaleDeployment(name.to_string(), replicas));
        Ok(match self.state().deployments.get_mut(&key(namespace, name)) {
            Some(deployment) => {
                deployment.spec.get_or_insert_with(DeploymentSpec::default).replicas =
                    Some(replicas);
                Outcome::Applied
            }
            None => Outcome::NotFound,
        })
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<(), Error> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.check("create secret", namespace, &name)?;
        self.record(Call::CreateSecret(name.clone()));
        let mut state = self.state();
        if state.secrets.contains_key(&key(namespace, &name)) {
            return error::AlreadyExistsSnafu { kind: "Secret", namespace, name }.fail();
        }
        let mut secret = secret.clone();
        secret.metadata.namespace = Some(namespace.to_string());
        let _previous = state.secrets.insert(key(namespace, &name), secret);
        Ok(())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        self.check("delete secret", namespace, name)?;
        self.record(Call::DeleteSecret(name.to_string()));
        Ok(match self.state().secrets.remove(&key(namespace, name)) {
            Some(_) => Outcome::Applied,
            None => Outcome::NotFound,
        })
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, Error> {
        self.check("list pods", namespace, "")?;
        Ok(self
            .state()
            .pods
            .iter()
            .filter(|((ns, _), pod)| {
                ns == namespace && matches_selector(pod.metadata.labels.as_ref(), label_selector)
            })
            .map(|(_, pod)| pod.clone())
            .collect())
    }

    async fn list_pod_metrics(&self, namespace: &str) -> Result<Vec<PodMetrics>, Error> {
        self.check("list pod metrics", namespace, "")?;
        Ok(self
            .state()
            .metrics
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, metrics)| metrics.clone())
            .collect())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        self.check("delete pod", namespace, name)?;
        self.record(Call::DeletePod(name.to_string()));
        let mut state = self.state();
        if state.protected_pods.contains(name) {
            return error::ForbiddenSnafu {
                operation: "delete pod",
                namespace,
                name,
                message: "pod is protected",
            }
            .fail();
        }
        if state.vanishing_pods.contains(name) {
            let _gone = state.pods.remove(&key(namespace, name));
        }
        Ok(match state.pods.remove(&key(namespace, name)) {
            Some(_) => Outcome::Applied,
            None => Outcome::NotFound,
        })
    }

    async fn annotate_pod(
        &self,
        namespace: &str,
        name: &str,
        annotation: &str,
        value: &str,
    ) -> Result<Outcome, Error> {
        self.check("annotate pod", namespace, name)?;
        self.record(Call::AnnotatePod {
            pod: name.to_string(),
            key: annotation.to_string(),
            value: value.to_string(),
        });
        Ok(match self.state().pods.get_mut(&key(namespace, name)) {
            Some(pod) => {
                let _previous = pod
                    .metadata
                    .annotations
                    .get_or_insert_with(BTreeMap::new)
                    .insert(annotation.to_string(), value.to_string());
                Outcome::Applied
            }
            None => Outcome::NotFound,
        })
    }

    async fn create_pvc(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> Result<(), Error> {
        let name = claim.metadata.name.clone().unwrap_or_default();
        self.check("create pvc", namespace, &name)?;
        self.record(Call::CreatePvc(name.clone()));
        let mut state = self.state();
        if state.claims.contains_key(&key(namespace, &name)) {
            return error::AlreadyExistsSnafu { kind: "PersistentVolumeClaim", namespace, name }
                .fail();
        }
        let mut claim = claim.clone();
        claim.metadata.namespace = Some(namespace.to_string());
        claim.status = Some(PersistentVolumeClaimStatus {
            phase: Some("Pending".to_string()),
            ..PersistentVolumeClaimStatus::default()
        });
        let _previous = state.claims.insert(key(namespace, &name), claim);
        Ok(())
    }

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, Error> {
        self.check("get pvc", namespace, name)?;
        let mut guard = self.state();
        let state = &mut *guard;
        let Some(claim) = state.claims.get_mut(&key(namespace, name)) else {
            return Ok(None);
        };
        let reads = state.pvc_reads.entry(key(namespace, name)).or_default();
        *reads += 1;
        if !state.pvc_never_binding && *reads > state.pvc_pending_reads {
            claim.status.get_or_insert_with(PersistentVolumeClaimStatus::default).phase =
                Some("Bound".to_string());
        }
        Ok(Some(claim.clone()))
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        self.check("delete pvc", namespace, name)?;
        self.record(Call::DeletePvc(name.to_string()));
        Ok(match self.state().claims.remove(&key(namespace, name)) {
            Some(_) => Outcome::Applied,
            None => Outcome::NotFound,
        })
    }
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect()
}

fn resources(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ])
}

/// A deployment whose selector and pod template carry `selector`, with a
/// single container requesting `cpu` and `memory`.
pub fn deployment(
    namespace: &str,
    name: &str,
    replicas: i32,
    selector: &[(&str, &str)],
    cpu: &str,
    memory: &str,
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels(selector)),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(labels(selector)),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels(selector)),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "worker".to_string(),
                        resources: Some(ResourceRequirements {
                            requests: Some(resources(cpu, memory)),
                            ..ResourceRequirements::default()
                        }),
                        ..Container::default()
                    }],
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

/// Builder for pods with a single container.
pub struct PodFixture {
    pod: Pod,
}

impl PodFixture {
    pub fn new(namespace: &str, name: &str) -> Self {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "worker".to_string(),
                    ..Container::default()
                }],
                ..PodSpec::default()
            }),
            status: Some(PodStatus {
                container_statuses: Some(vec![ContainerStatus {
                    name: "worker".to_string(),
                    ..ContainerStatus::default()
                }]),
                ..PodStatus::default()
            }),
        };
        Self { pod }
    }

    pub fn label(mut self, label: &str, value: &str) -> Self {
        let _previous = self
            .pod
            .metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(label.to_string(), value.to_string());
        self
    }

    fn status(&mut self) -> &mut ContainerStatus {
        &mut self
            .pod
            .status
            .as_mut()
            .and_then(|status| status.container_statuses.as_mut())
            .expect("fixture pods always carry a container status")[0]
    }

    pub fn running(mut self) -> Self {
        self.status().state = Some(ContainerState {
            running: Some(ContainerStateRunning::default()),
            ..ContainerState::default()
        });
        self
    }

    pub fn waiting(mut self, reason: &str) -> Self {
        self.status().state = Some(ContainerState {
            waiting: Some(ContainerStateWaiting {
                reason: Some(reason.to_string()),
                ..ContainerStateWaiting::default()
            }),
            ..ContainerState::default()
        });
        self
    }

    pub fn terminated(mut self, reason: &str) -> Self {
        self.status().state = Some(ContainerState {
            terminated: Some(ContainerStateTerminated {
                reason: Some(reason.to_string()),
                ..ContainerStateTerminated::default()
            }),
            ..ContainerState::default()
        });
        self
    }

    pub fn previously_terminated(mut self, reason: &str) -> Self {
        self.status().last_state = Some(ContainerState {
            terminated: Some(ContainerStateTerminated {
                reason: Some(reason.to_string()),
                ..ContainerStateTerminated::default()
            }),
            ..ContainerState::default()
        });
        self
    }

    pub fn restarts(mut self, count: i32) -> Self {
        self.status().restart_count = count;
        self
    }

    pub fn build(self) -> Pod { self.pod }
}

pub fn pod_metrics(namespace: &str, name: &str, cpu: &str, memory: &str) -> PodMetrics {
    PodMetrics {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        timestamp: None,
        window: None,
        containers: vec![ContainerMetrics {
            name: "worker".to_string(),
            usage: ContainerUsage {
                cpu: Quantity(cpu.to_string()),
                memory: Quantity(memory.to_string()),
            },
        }],
    }
}
