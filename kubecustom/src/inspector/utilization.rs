use k8s_openapi::{
    api::{apps::v1::Deployment, core::v1::ResourceRequirements},
    apimachinery::pkg::api::resource::Quantity,
};

use crate::{
    inspector::PodSnapshot,
    quantity::{self, parse_cpu, parse_memory_gb},
};

/// Mean, minimum and maximum of a set of percentages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().sum();
        Some(Self {
            mean: sum / samples.len() as f64,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// CPU and memory declared by a deployment's pod template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceRequest {
    pub cpus: f64,
    pub memory_gb: f64,
}

impl ResourceRequest {
    /// Reads the requests of the first container, using its limits for a
    /// resource without a request. `None` when either is undeclared or not
    /// positive.
    ///
    /// # Errors
    ///
    /// Fails if a declared quantity uses an unknown unit.
    pub fn of_deployment(deployment: &Deployment) -> Result<Option<Self>, quantity::Error> {
        let Some(resources) = deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .and_then(|spec| spec.containers.first())
            .and_then(|container| container.resources.as_ref())
        else {
            return Ok(None);
        };

        let (Some(cpu), Some(memory)) =
            (declared(resources, "cpu"), declared(resources, "memory"))
        else {
            return Ok(None);
        };
        let request =
            Self { cpus: parse_cpu(&cpu.0)?.cores, memory_gb: parse_memory_gb(&memory.0)? };
        Ok(request.is_positive().then_some(request))
    }

    fn is_positive(self) -> bool { self.cpus > 0.0 && self.memory_gb > 0.0 }
}

fn declared<'a>(resources: &'a ResourceRequirements, resource: &str) -> Option<&'a Quantity> {
    resources
        .requests
        .as_ref()
        .and_then(|requests| requests.get(resource))
        .or_else(|| resources.limits.as_ref().and_then(|limits| limits.get(resource)))
}

/// Utilization of one deployment across its running replicas, in percent of
/// the declared request.
#[derive(Clone, Debug, PartialEq)]
pub struct UtilizationRecord {
    pub deployment_name: String,
    pub replicas: usize,
    pub memory: Stats,
    pub memory_request_gb: f64,
    pub cpu: Stats,
    pub cpu_request: f64,
}

impl UtilizationRecord {
    /// Aggregates the running pods among `pods`. Pods in any other state
    /// are left out, and running pods without metrics count as idle.
    /// Returns `None` when no pod is running or the request is not positive.
    #[must_use]
    pub fn aggregate(
        deployment_name: &str,
        request: ResourceRequest,
        pods: &[PodSnapshot],
    ) -> Option<Self> {
        if !request.is_positive() {
            return None;
        }
        let running = pods.iter().filter(|pod| pod.is_running()).collect::<Vec<_>>();
        let memory = running
            .iter()
            .map(|pod| 100.0 * pod.memory_gb.unwrap_or_default() / request.memory_gb)
            .collect::<Vec<_>>();
        let cpu = running
            .iter()
            .map(|pod| 100.0 * pod.cpus.unwrap_or_default() / request.cpus)
            .collect::<Vec<_>>();

        Some(Self {
            deployment_name: deployment_name.to_string(),
            replicas: running.len(),
            memory: Stats::from_samples(&memory)?,
            memory_request_gb: request.memory_gb,
            cpu: Stats::from_samples(&cpu)?,
            cpu_request: request.cpus,
        })
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::{
        cluster::fake::{self, PodFixture},
        inspector::PodSnapshot,
    };

    fn approx(left: f64, right: f64) -> bool { (left - right).abs() < 1e-9 }

    fn snapshot(name: &str, cpus: Option<f64>, memory_gb: Option<f64>) -> PodSnapshot {
        PodSnapshot {
            cpus,
            memory_gb,
            ..PodSnapshot::from_pod(&PodFixture::new("ns", name).running().build())
        }
    }

    #[test]
    fn stats_of_samples() {
        let stats = Stats::from_samples(&[10.0, 20.0, 60.0]).unwrap();
        assert!(approx(stats.mean, 30.0));
        assert!(approx(stats.min, 10.0));
        assert!(approx(stats.max, 60.0));
        assert_eq!(Stats::from_samples(&[]), None);
    }

    #[test]
    fn request_falls_back_to_limits() {
        let mut deployment = fake::deployment("ns", "dep", 1, &[("app", "dep")], "4", "8G");
        let resources = deployment
            .spec
            .as_mut()
            .and_then(|spec| spec.template.spec.as_mut())
            .and_then(|spec| spec.containers[0].resources.as_mut())
            .unwrap();
        resources.limits = resources.requests.take();

        let request = ResourceRequest::of_deployment(&deployment).unwrap().unwrap();
        assert!(approx(request.cpus, 4.0));
        assert!(approx(request.memory_gb, 8.0));
    }

    #[test]
    fn zero_request_is_treated_as_undeclared() {
        for (cpu, memory) in [("0", "8G"), ("4", "0"), ("0m", "0Gi")] {
            let deployment = fake::deployment("ns", "dep", 1, &[("app", "dep")], cpu, memory);
            assert_eq!(ResourceRequest::of_deployment(&deployment).unwrap(), None);
        }

        let pods = vec![snapshot("pod-a", Some(1.0), Some(2.0))];
        let request = ResourceRequest { cpus: 0.0, memory_gb: 4.0 };
        assert_eq!(UtilizationRecord::aggregate("dep", request, &pods), None);
    }

    #[test]
    fn identical_replicas_have_equal_mean_min_and_max() {
        let request = ResourceRequest { cpus: 16.0, memory_gb: 32.0 };
        let pods = (0..4).map(|i| snapshot(&format!("pod-{i}"), Some(4.0), Some(8.0))).collect::<Vec<_>>();

        let record = UtilizationRecord::aggregate("dep", request, &pods).unwrap();
        assert_eq!(record.replicas, 4);
        for value in [record.cpu.mean, record.cpu.min, record.cpu.max] {
            assert!(approx(value, 25.0));
        }
        for value in [record.memory.mean, record.memory.min, record.memory.max] {
            assert!(approx(value, 25.0));
        }
    }

    #[test]
    fn waiting_pods_are_left_out_and_missing_metrics_count_as_idle() {
        let request = ResourceRequest { cpus: 2.0, memory_gb: 4.0 };
        let waiting = PodSnapshot {
            cpus: Some(2.0),
            memory_gb: Some(4.0),
            ..PodSnapshot::from_pod(&PodFixture::new("ns", "pod-w").waiting("ContainerCreating").build())
        };
        let pods = vec![snapshot("pod-a", Some(1.0), Some(2.0)), snapshot("pod-b", None, None), waiting];

        let record = UtilizationRecord::aggregate("dep", request, &pods).unwrap();
        assert_eq!(record.replicas, 2);
        assert!(approx(record.cpu.mean, 25.0));
        assert!(approx(record.cpu.min, 0.0));
        assert!(approx(record.cpu.max, 50.0));
    }

    #[test]
    fn no_running_pods_means_no_record() {
        let request = ResourceRequest { cpus: 1.0, memory_gb: 1.0 };
        assert_eq!(UtilizationRecord::aggregate("dep", request, &[]), None);
    }
}
