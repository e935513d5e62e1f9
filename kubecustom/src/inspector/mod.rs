//! Pod state and utilization reporting.
//!
//! The inspector joins pods with the metrics API and the pod templates of
//! their deployments. Every call reads the cluster afresh; nothing is cached
//! between calls.

mod error;
mod snapshot;
mod utilization;

use std::collections::BTreeMap;

use futures::{StreamExt, stream};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use snafu::ResultExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub use self::{
    error::Error,
    snapshot::{ContainerPhase, ContainerStatusSummary, ParseContainerPhaseError, PodSnapshot},
    utilization::{ResourceRequest, Stats, UtilizationRecord},
};
use crate::{
    cluster::{Cluster, Outcome, PodMetrics},
    config::ProfileContext,
    consts::{ACTIVE_CPU_THRESHOLD, MAX_CONCURRENT_DELETIONS, k8s::labels},
    quantity::{parse_cpu, parse_memory_gb},
    ui::table::PodSnapshotsExt as _,
};

/// Which pods [`PodInspector::get_pods_resource_info`] reports on.
#[derive(Clone, Debug, Default)]
pub struct PodQuery {
    /// Restricts the query to the pods of one deployment.
    pub deployment: Option<String>,

    /// Overrides the namespace of the active profile.
    pub namespace: Option<String>,

    /// Keeps only pods whose name contains this string.
    pub keep_key: Option<String>,

    pub verbose: bool,
}

impl PodQuery {
    #[must_use]
    pub fn deployment(name: impl Into<String>) -> Self {
        Self { deployment: Some(name.into()), ..Self::default() }
    }
}

#[derive(Clone, Copy, Debug)]
struct Usage {
    cpus: f64,
    memory_gb: f64,
}

pub struct PodInspector<'a, C> {
    cluster: &'a C,
    context: &'a ProfileContext,
}

impl<'a, C: Cluster> PodInspector<'a, C> {
    pub const fn new(cluster: &'a C, context: &'a ProfileContext) -> Self {
        Self { cluster, context }
    }
}

impl<C: Cluster> PodInspector<'_, C> {
    /// Snapshots of the pods selected by `query`, keyed by pod name.
    ///
    /// Pods of a deployment are found through the live deployment's
    /// selector, or through the instance label when the deployment is gone.
    /// When the metrics API cannot be reached every pod is reported without
    /// usage.
    ///
    /// # Errors
    ///
    /// Fails when pods cannot be listed or a usage figure cannot be parsed.
    pub async fn get_pods_resource_info(
        &self,
        query: &PodQuery,
    ) -> Result<BTreeMap<String, PodSnapshot>, Error> {
        let namespace = self.context.namespace_or(query.namespace.clone());
        let selector = match &query.deployment {
            Some(deployment) => Some(self.selector_for(&namespace, deployment).await?),
            None => None,
        };

        let pods = self
            .cluster
            .list_pods(&namespace, selector.as_deref())
            .await?
            .into_iter()
            .filter(|pod| keep(pod_name(pod), query.keep_key.as_deref()))
            .collect::<Vec<_>>();
        if pods.is_empty() {
            tracing::debug!("No pods matched in namespace {namespace}");
            return Ok(BTreeMap::new());
        }

        let usage = self.usage_by_pod(&namespace).await?;
        let snapshots = pods
            .iter()
            .map(|pod| {
                let snapshot = snapshot_with_usage(pod, &usage);
                if query.verbose {
                    tracing::info!(
                        "Pod {} restarts={} current={:?} previous={:?}",
                        snapshot.pod_name,
                        snapshot.restart_count,
                        snapshot.current_reason(),
                        snapshot.previous.as_ref().map(|previous| previous.reason.as_str()),
                    );
                }
                (snapshot.pod_name.clone(), snapshot)
            })
            .collect::<BTreeMap<_, _>>();
        Ok(snapshots)
    }

    /// Writes the pods of `deployment_name` as a table to `out`. A
    /// deployment without pods yields the header only.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::get_pods_resource_info`], or when `out` cannot be
    /// written.
    pub async fn print_pods_summary<W: AsyncWrite + Unpin>(
        &self,
        deployment_name: &str,
        namespace: Option<&str>,
        out: &mut W,
    ) -> Result<(), Error> {
        let query = PodQuery {
            namespace: namespace.map(ToString::to_string),
            ..PodQuery::deployment(deployment_name)
        };
        let snapshots = self.get_pods_resource_info(&query).await?;
        let table = snapshots.into_values().collect::<Vec<_>>().render_table();
        out.write_all(table.as_bytes()).await.context(error::WriteOutputSnafu)?;
        out.write_u8(b'\n').await.context(error::WriteOutputSnafu)
    }

    /// Deletes every pod whose current status reason is exactly `status`,
    /// optionally only among the pods of one deployment.
    ///
    /// Returns how many pods were deleted. Pods that disappear before their
    /// deletion is issued are not counted and not treated as failures.
    ///
    /// # Errors
    ///
    /// Fails when pods cannot be listed. When some deletions are refused the
    /// others still run, and [`Error::DeletePods`] reports both counts.
    pub async fn delete_pods_by_status(
        &self,
        status: &str,
        deployment: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<usize, Error> {
        let namespace = self.context.namespace_or(namespace.map(ToString::to_string));
        let matches = |snapshot: &PodSnapshot| snapshot.current_reason() == Some(status);
        let targets = self.matching_pods(&namespace, deployment, matches).await?;
        if targets.is_empty() {
            tracing::info!("No pod in namespace {namespace} has status {status}");
            return Ok(0);
        }
        self.delete_pods(&namespace, targets, &format!("status {status}")).await
    }

    /// Deletes every pod whose current container state is `state`, such as
    /// all waiting pods whatever their reason. Otherwise behaves like
    /// [`Self::delete_pods_by_status`].
    ///
    /// # Errors
    ///
    /// Fails like [`Self::delete_pods_by_status`].
    pub async fn delete_pods_by_state(
        &self,
        state: ContainerPhase,
        deployment: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<usize, Error> {
        let namespace = self.context.namespace_or(namespace.map(ToString::to_string));
        let matches = |snapshot: &PodSnapshot| snapshot.current_phase() == Some(state);
        let targets = self.matching_pods(&namespace, deployment, matches).await?;
        if targets.is_empty() {
            tracing::info!("No pod in namespace {namespace} is {state}");
            return Ok(0);
        }
        self.delete_pods(&namespace, targets, &format!("state {state}")).await
    }

    async fn matching_pods(
        &self,
        namespace: &str,
        deployment: Option<&str>,
        predicate: impl Fn(&PodSnapshot) -> bool,
    ) -> Result<Vec<String>, Error> {
        let selector = match deployment {
            Some(deployment) => Some(self.selector_for(namespace, deployment).await?),
            None => None,
        };
        Ok(self
            .cluster
            .list_pods(namespace, selector.as_deref())
            .await?
            .iter()
            .map(PodSnapshot::from_pod)
            .filter(&predicate)
            .map(|snapshot| snapshot.pod_name)
            .collect())
    }

    async fn delete_pods(
        &self,
        namespace: &str,
        targets: Vec<String>,
        matched: &str,
    ) -> Result<usize, Error> {
        let results = stream::iter(targets)
            .map(|pod_name| async move {
                let outcome = self.cluster.delete_pod(namespace, &pod_name).await;
                (pod_name, outcome)
            })
            .buffer_unordered(MAX_CONCURRENT_DELETIONS)
            .collect::<Vec<_>>()
            .await;

        let mut deleted = 0;
        let mut failures = Vec::new();
        for (pod_name, outcome) in results {
            match outcome {
                Ok(Outcome::Applied) => {
                    tracing::info!("Deleted pod {pod_name} with {matched}");
                    deleted += 1;
                }
                Ok(Outcome::NotFound) => tracing::warn!("Pod {pod_name} was already gone"),
                Err(err) => {
                    tracing::warn!("Failed to delete pod {pod_name}: {err}");
                    failures.push(err);
                }
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(deleted),
            Some(first) => Err(first).context(error::DeletePodsSnafu { deleted, failed }),
        }
    }

    /// Utilization of every deployment in the namespace whose name contains
    /// `keep_key`, ordered by deployment name. Deployments without running
    /// pods or without positive declared requests are left out.
    ///
    /// # Errors
    ///
    /// Fails when deployments or pods cannot be listed or a usage figure
    /// cannot be parsed.
    pub async fn utilization_per_deployment(
        &self,
        namespace: Option<&str>,
        keep_key: Option<&str>,
        verbose: bool,
    ) -> Result<Vec<UtilizationRecord>, Error> {
        let namespace = self.context.namespace_or(namespace.map(ToString::to_string));
        let mut deployments = self
            .cluster
            .list_deployments(&namespace, None)
            .await?
            .into_iter()
            .filter(|deployment| keep(object_name(deployment), keep_key))
            .collect::<Vec<_>>();
        if deployments.is_empty() {
            return Ok(Vec::new());
        }
        deployments.sort_by(|a, b| object_name(a).cmp(object_name(b)));

        let usage = self.usage_by_pod(&namespace).await?;
        let mut records = Vec::with_capacity(deployments.len());
        for deployment in &deployments {
            let name = object_name(deployment);
            let request = match ResourceRequest::of_deployment(deployment) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    tracing::warn!(
                        "Deployment {name} declares no positive CPU or memory request, skipped"
                    );
                    continue;
                }
                Err(err) => {
                    tracing::warn!("Deployment {name} has an unreadable request, skipped: {err}");
                    continue;
                }
            };

            let selector = deployment_selector(deployment, name);
            let snapshots = self
                .cluster
                .list_pods(&namespace, Some(&selector))
                .await?
                .iter()
                .map(|pod| snapshot_with_usage(pod, &usage))
                .collect::<Vec<_>>();

            match UtilizationRecord::aggregate(name, request, &snapshots) {
                Some(record) => records.push(record),
                None if verbose => tracing::info!("Deployment {name} has no running pods"),
                None => {}
            }
        }
        Ok(records)
    }

    async fn selector_for(&self, namespace: &str, deployment: &str) -> Result<String, Error> {
        Ok(match self.cluster.get_deployment(namespace, deployment).await? {
            Some(found) => deployment_selector(&found, deployment),
            None => instance_selector(deployment),
        })
    }

    async fn usage_by_pod(&self, namespace: &str) -> Result<BTreeMap<String, Usage>, Error> {
        let metrics = match self.cluster.list_pod_metrics(namespace).await {
            Ok(metrics) => metrics,
            Err(err) => {
                tracing::warn!("Pod metrics are unavailable in namespace {namespace}: {err}");
                return Ok(BTreeMap::new());
            }
        };
        metrics
            .iter()
            .map(|metrics| {
                let usage = pod_usage(metrics, &self.context.profile.container_name)?;
                Ok((metrics.pod_name().to_string(), usage))
            })
            .collect()
    }
}

/// Pods currently running and using more than a sliver of a core, in input
/// order.
pub fn get_active_tasks<'a>(
    pods: impl IntoIterator<Item = &'a PodSnapshot>,
) -> Vec<&'a PodSnapshot> {
    pods.into_iter()
        .filter(|pod| pod.is_running() && pod.cpus.is_some_and(|cpus| cpus > ACTIVE_CPU_THRESHOLD))
        .collect()
}

fn keep(name: &str, keep_key: Option<&str>) -> bool {
    keep_key.is_none_or(|keep_key| name.contains(keep_key))
}

fn pod_name(pod: &Pod) -> &str { pod.metadata.name.as_deref().unwrap_or_default() }

fn object_name(deployment: &Deployment) -> &str {
    deployment.metadata.name.as_deref().unwrap_or_default()
}

fn instance_selector(deployment: &str) -> String { format!("{}={deployment}", labels::INSTANCE) }

fn deployment_selector(deployment: &Deployment, name: &str) -> String {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.match_labels.as_ref())
        .filter(|labels| !labels.is_empty())
        .map_or_else(
            || instance_selector(name),
            |labels| {
                labels.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join(",")
            },
        )
}

fn snapshot_with_usage(pod: &Pod, usage: &BTreeMap<String, Usage>) -> PodSnapshot {
    let mut snapshot = PodSnapshot::from_pod(pod);
    if let Some(usage) = usage.get(&snapshot.pod_name) {
        snapshot.cpus = Some(usage.cpus);
        snapshot.memory_gb = Some(usage.memory_gb);
    }
    snapshot
}

/// Usage of the container named `container_name`, or the sum over all
/// containers of the pod when none has that name.
fn pod_usage(metrics: &PodMetrics, container_name: &str) -> Result<Usage, Error> {
    let pod = metrics.pod_name();
    let selected = metrics
        .containers
        .iter()
        .find(|container| container.name == container_name)
        .map_or_else(|| metrics.containers.iter().collect::<Vec<_>>(), |container| vec![container]);

    let mut usage = Usage { cpus: 0.0, memory_gb: 0.0 };
    for container in selected {
        let cpu = parse_cpu(&container.usage.cpu.0)
            .context(error::UsageSnafu { pod, resource: "CPU" })?;
        if cpu.unit_inferred {
            tracing::warn!(
                "CPU usage '{}' of pod {pod} has no unit, reading it as whole cores",
                container.usage.cpu.0
            );
        }
        usage.cpus += cpu.cores;
        usage.memory_gb += parse_memory_gb(&container.usage.memory.0)
            .context(error::UsageSnafu { pod, resource: "memory" })?;
    }
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::{
        cluster::fake::{self, Call, FakeCluster, PodFixture},
        config::{ProfileKind, sample_profile},
    };

    const NS: &str = "openforcefield";
    const DEPLOYMENT: &str = "openff-jac-qca-psi4-pyddx-600";

    fn context() -> ProfileContext {
        ProfileContext {
            profile: sample_profile(ProfileKind::QcaPsi4),
            deployment_prefix: "openff".to_string(),
        }
    }

    fn instance_pod(name: &str) -> PodFixture {
        PodFixture::new(NS, name).label(labels::INSTANCE, DEPLOYMENT)
    }

    #[test_log::test(tokio::test)]
    async fn summary_of_deployment_without_pods_is_header_only() {
        let cluster = FakeCluster::new().with_pod(PodFixture::new(NS, "unrelated").running().build());
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let snapshots =
            inspector.get_pods_resource_info(&PodQuery::deployment(DEPLOYMENT)).await.unwrap();
        assert!(snapshots.is_empty());

        let mut out = Vec::new();
        inspector.print_pods_summary(DEPLOYMENT, None, &mut out).await.unwrap();
        let printed = String::from_utf8(out).unwrap();
        let lines = printed.lines().filter(|line| !line.trim().is_empty()).collect::<Vec<_>>();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("NAME"));
        assert!(!printed.contains("unrelated"));
    }

    #[test_log::test(tokio::test)]
    async fn snapshots_join_pods_with_metrics() {
        let cluster = FakeCluster::new()
            .with_deployment(fake::deployment(NS, DEPLOYMENT, 2, &[("app", "psi4")], "16", "32G"))
            .with_pod(PodFixture::new(NS, "psi4-a").label("app", "psi4").running().restarts(1).build())
            .with_pod(PodFixture::new(NS, "psi4-b").label("app", "psi4").waiting("ImagePullBackOff").build())
            .with_pod(PodFixture::new(NS, "other").label("app", "xtb").running().build())
            .with_metrics(fake::pod_metrics(NS, "psi4-a", "1500m", "2Gi"));
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let snapshots =
            inspector.get_pods_resource_info(&PodQuery::deployment(DEPLOYMENT)).await.unwrap();
        assert_eq!(snapshots.keys().map(String::as_str).collect::<Vec<_>>(), vec!["psi4-a", "psi4-b"]);

        let running = &snapshots["psi4-a"];
        assert_eq!(running.restart_count, 1);
        assert!((running.cpus.unwrap() - 1.5).abs() < 1e-9);
        assert!((running.memory_gb.unwrap() - 2.147_483_648).abs() < 1e-9);

        let waiting = &snapshots["psi4-b"];
        assert_eq!(waiting.cpus, None);
        assert_eq!(waiting.current_reason(), Some("ImagePullBackOff"));
    }

    #[test_log::test(tokio::test)]
    async fn missing_deployment_falls_back_to_instance_label() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("left-over").running().build())
            .with_pod(PodFixture::new(NS, "stranger").running().build());
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let snapshots =
            inspector.get_pods_resource_info(&PodQuery::deployment(DEPLOYMENT)).await.unwrap();
        assert_eq!(snapshots.keys().map(String::as_str).collect::<Vec<_>>(), vec!["left-over"]);
    }

    #[test_log::test(tokio::test)]
    async fn unavailable_metrics_api_is_not_fatal() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("worker").running().build())
            .failing("list pod metrics");
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let snapshots =
            inspector.get_pods_resource_info(&PodQuery::deployment(DEPLOYMENT)).await.unwrap();
        assert_eq!(snapshots["worker"].cpus, None);
    }

    #[test_log::test(tokio::test)]
    async fn keep_key_filters_by_substring() {
        let cluster = FakeCluster::new()
            .with_pod(PodFixture::new(NS, "psi4-a").running().build())
            .with_pod(PodFixture::new(NS, "xtb-a").running().build());
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let query = PodQuery { keep_key: Some("xtb".to_string()), ..PodQuery::default() };
        let snapshots = inspector.get_pods_resource_info(&query).await.unwrap();
        assert_eq!(snapshots.keys().map(String::as_str).collect::<Vec<_>>(), vec!["xtb-a"]);
    }

    #[test]
    fn active_tasks_are_running_and_busy() {
        let busy = PodSnapshot {
            cpus: Some(0.5),
            ..PodSnapshot::from_pod(&PodFixture::new(NS, "busy").running().build())
        };
        let idle = PodSnapshot {
            cpus: Some(0.001),
            ..PodSnapshot::from_pod(&PodFixture::new(NS, "idle").running().build())
        };
        let unmeasured = PodSnapshot::from_pod(&PodFixture::new(NS, "unmeasured").running().build());
        let waiting = PodSnapshot {
            cpus: Some(3.0),
            ..PodSnapshot::from_pod(&PodFixture::new(NS, "waiting").waiting("ContainerCreating").build())
        };
        let also_busy = PodSnapshot {
            cpus: Some(2.0),
            ..PodSnapshot::from_pod(&PodFixture::new(NS, "also-busy").running().build())
        };
        let pods = vec![busy, idle, unmeasured, waiting, also_busy];

        let active = get_active_tasks(&pods).into_iter().map(|pod| pod.pod_name.as_str()).collect::<Vec<_>>();
        assert_eq!(active, vec!["busy", "also-busy"]);
    }

    #[test_log::test(tokio::test)]
    async fn delete_by_status_without_matches_issues_no_deletes() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("a").running().build())
            .with_pod(instance_pod("b").waiting("ImagePullBackOff").build());
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let deleted = inspector.delete_pods_by_status("ContainerCreating", None, None).await.unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(cluster.calls(), Vec::new());
    }

    #[test_log::test(tokio::test)]
    async fn delete_by_status_matches_exactly() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("stuck-1").waiting("ContainerCreating").build())
            .with_pod(instance_pod("stuck-2").waiting("ContainerCreating").build())
            .with_pod(instance_pod("creating-ish").waiting("ContainerCreatingSlowly").build())
            .with_pod(instance_pod("fine").running().build());
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let deleted = inspector
            .delete_pods_by_status("ContainerCreating", Some(DEPLOYMENT), None)
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let mut calls = cluster.calls();
        calls.sort_by_key(|call| format!("{call:?}"));
        assert_eq!(
            calls,
            vec![Call::DeletePod("stuck-1".to_string()), Call::DeletePod("stuck-2".to_string())]
        );
        assert!(cluster.pod(NS, "creating-ish").is_some());
        assert!(cluster.pod(NS, "fine").is_some());
    }

    #[test_log::test(tokio::test)]
    async fn delete_by_status_ignores_pods_already_gone() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("stuck-1").waiting("ContainerCreating").build())
            .with_pod(instance_pod("stuck-2").waiting("ContainerCreating").build())
            .vanishing_pod("stuck-2");
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let deleted = inspector.delete_pods_by_status("ContainerCreating", None, None).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(cluster.calls().len(), 2);
        assert!(cluster.pod(NS, "stuck-1").is_none());
        assert!(cluster.pod(NS, "stuck-2").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn refused_deletions_keep_the_count_of_the_others() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("stuck-1").waiting("ContainerCreating").build())
            .with_pod(instance_pod("stuck-2").waiting("ContainerCreating").build())
            .with_pod(instance_pod("stuck-3").waiting("ContainerCreating").build())
            .protected_pod("stuck-2");
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        match inspector.delete_pods_by_status("ContainerCreating", None, None).await {
            Err(Error::DeletePods { deleted, failed, source }) => {
                assert_eq!(deleted, 2);
                assert_eq!(failed, 1);
                assert!(source.to_string().contains("stuck-2"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(cluster.calls().len(), 3);
        assert!(cluster.pod(NS, "stuck-1").is_none());
        assert!(cluster.pod(NS, "stuck-2").is_some());
        assert!(cluster.pod(NS, "stuck-3").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn delete_by_state_matches_the_container_state() {
        let cluster = FakeCluster::new()
            .with_pod(instance_pod("creating").waiting("ContainerCreating").build())
            .with_pod(instance_pod("pulling").waiting("ImagePullBackOff").build())
            .with_pod(instance_pod("done").terminated("Completed").build())
            .with_pod(instance_pod("busy").running().build())
            .with_pod(PodFixture::new(NS, "stranger").waiting("ContainerCreating").build());
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let deleted = inspector
            .delete_pods_by_state(ContainerPhase::Waiting, Some(DEPLOYMENT), None)
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(cluster.pod(NS, "creating").is_none());
        assert!(cluster.pod(NS, "pulling").is_none());
        assert!(cluster.pod(NS, "done").is_some());
        assert!(cluster.pod(NS, "busy").is_some());
        assert!(cluster.pod(NS, "stranger").is_some());

        let deleted =
            inspector.delete_pods_by_state(ContainerPhase::Terminated, None, None).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(cluster.pod(NS, "done").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn utilization_without_metrics_reports_idle_replicas() {
        let cluster = FakeCluster::new()
            .with_deployment(fake::deployment(NS, "openff-jac-qca-psi4-a", 2, &[("app", "a")], "16", "32G"))
            .with_pod(PodFixture::new(NS, "a-1").label("app", "a").running().build())
            .with_pod(PodFixture::new(NS, "a-2").label("app", "a").running().build())
            .failing("list pod metrics");
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let records = inspector.utilization_per_deployment(None, None, false).await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.replicas, 2);
        for value in [record.cpu.mean, record.cpu.max, record.memory.mean, record.memory.max] {
            assert!(value.abs() < 1e-9);
        }
        assert!((record.cpu_request - 16.0).abs() < 1e-9);
    }

    #[test_log::test(tokio::test)]
    async fn utilization_skips_deployments_with_zero_requests() {
        let cluster = FakeCluster::new()
            .with_deployment(fake::deployment(NS, "openff-jac-qca-psi4-a", 1, &[("app", "a")], "0", "8G"))
            .with_deployment(fake::deployment(NS, "openff-jac-qca-psi4-b", 1, &[("app", "b")], "4", "8G"))
            .with_pod(PodFixture::new(NS, "a-1").label("app", "a").running().build())
            .with_pod(PodFixture::new(NS, "b-1").label("app", "b").running().build())
            .with_metrics(fake::pod_metrics(NS, "a-1", "1", "2G"))
            .with_metrics(fake::pod_metrics(NS, "b-1", "1", "2G"));
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let records = inspector.utilization_per_deployment(None, None, false).await.unwrap();
        assert_eq!(
            records.iter().map(|record| record.deployment_name.as_str()).collect::<Vec<_>>(),
            vec!["openff-jac-qca-psi4-b"]
        );
        assert!(records[0].cpu.mean.is_finite());
        assert!((records[0].cpu.mean - 25.0).abs() < 1e-9);
    }

    #[test_log::test(tokio::test)]
    async fn utilization_skips_deployments_without_running_pods() {
        let cluster = FakeCluster::new()
            .with_deployment(fake::deployment(NS, "openff-jac-qca-psi4-a", 3, &[("app", "a")], "16", "32G"))
            .with_deployment(fake::deployment(NS, "openff-jac-qca-psi4-b", 1, &[("app", "b")], "4", "8G"))
            .with_deployment(fake::deployment(NS, "openff-jac-qca-xtb-c", 1, &[("app", "c")], "4", "8G"))
            .with_pod(PodFixture::new(NS, "a-1").label("app", "a").running().build())
            .with_pod(PodFixture::new(NS, "a-2").label("app", "a").running().build())
            .with_pod(PodFixture::new(NS, "a-3").label("app", "a").running().build())
            .with_pod(PodFixture::new(NS, "b-1").label("app", "b").waiting("Pending").build())
            .with_pod(PodFixture::new(NS, "c-1").label("app", "c").running().build())
            .with_metrics(fake::pod_metrics(NS, "a-1", "4", "8G"))
            .with_metrics(fake::pod_metrics(NS, "a-2", "4000m", "8000M"))
            .with_metrics(fake::pod_metrics(NS, "a-3", "4000000000n", "8G"));
        let context = context();
        let inspector = PodInspector::new(&cluster, &context);

        let records = inspector.utilization_per_deployment(None, Some("psi4"), false).await.unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.deployment_name, "openff-jac-qca-psi4-a");
        assert_eq!(record.replicas, 3);
        for value in [record.cpu.mean, record.cpu.min, record.cpu.max] {
            assert!((value - 25.0).abs() < 1e-9);
        }
        for value in [record.memory.mean, record.memory.min, record.memory.max] {
            assert!((value - 25.0).abs() < 1e-9);
        }
    }
}
