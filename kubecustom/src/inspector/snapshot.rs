use std::{fmt, str::FromStr};

use k8s_openapi::api::core::v1::{ContainerState, Pod};
use snafu::Snafu;

use crate::consts::k8s::reasons;

/// Which of the three container states a status was read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContainerPhase {
    Running,
    Waiting,
    Terminated,
}

impl ContainerPhase {
    pub const ALL: [Self; 3] = [Self::Running, Self::Waiting, Self::Terminated];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ContainerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ContainerPhase {
    type Err = ParseContainerPhaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| ParseContainerPhaseError::Invalid { value: value.to_string() })
    }
}

#[derive(Debug, Snafu)]
pub enum ParseContainerPhaseError {
    #[snafu(display(
        "'{value}' is not a container state, expected one of running, waiting, terminated"
    ))]
    Invalid { value: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerStatusSummary {
    pub phase: ContainerPhase,

    /// `Running` for running containers, otherwise the reason reported by
    /// the kubelet such as `ContainerCreating` or `OOMKilled`.
    pub reason: String,
}

impl ContainerStatusSummary {
    fn from_state(state: &ContainerState) -> Option<Self> {
        if state.running.is_some() {
            return Some(Self { phase: ContainerPhase::Running, reason: reasons::RUNNING.into() });
        }
        if let Some(waiting) = &state.waiting {
            return Some(Self {
                phase: ContainerPhase::Waiting,
                reason: waiting.reason.clone().unwrap_or_else(|| "Waiting".to_string()),
            });
        }
        state.terminated.as_ref().map(|terminated| Self {
            phase: ContainerPhase::Terminated,
            reason: terminated.reason.clone().unwrap_or_else(|| "Terminated".to_string()),
        })
    }
}

/// State of one pod at query time.
#[derive(Clone, Debug, PartialEq)]
pub struct PodSnapshot {
    pub pod_name: String,
    pub restart_count: i32,

    /// Memory in use, in decimal gigabytes. `None` without metrics.
    pub memory_gb: Option<f64>,

    /// CPU in use, in cores. `None` without metrics.
    pub cpus: Option<f64>,

    pub current: Option<ContainerStatusSummary>,
    pub previous: Option<ContainerStatusSummary>,
}

impl PodSnapshot {
    /// Reads restarts and container states from the first container status
    /// of `pod`. Usage is filled in separately.
    #[must_use]
    pub fn from_pod(pod: &Pod) -> Self {
        let status = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_ref())
            .and_then(|statuses| statuses.first());
        Self {
            pod_name: pod.metadata.name.clone().unwrap_or_default(),
            restart_count: status.map_or(0, |status| status.restart_count),
            memory_gb: None,
            cpus: None,
            current: status
                .and_then(|status| status.state.as_ref())
                .and_then(ContainerStatusSummary::from_state),
            previous: status
                .and_then(|status| status.last_state.as_ref())
                .and_then(ContainerStatusSummary::from_state),
        }
    }

    #[must_use]
    pub fn current_reason(&self) -> Option<&str> {
        self.current.as_ref().map(|current| current.reason.as_str())
    }

    #[must_use]
    pub fn current_phase(&self) -> Option<ContainerPhase> {
        self.current.as_ref().map(|current| current.phase)
    }

    #[must_use]
    pub fn is_running(&self) -> bool { self.current_phase() == Some(ContainerPhase::Running) }
}
