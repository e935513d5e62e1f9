//! Persistent volume claims the replicas of a deployment can share.

mod error;

use std::{collections::BTreeMap, time::Duration};

use k8s_openapi::{
    api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements},
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta},
};

pub use self::error::Error;
use crate::{
    PROJECT_NAME,
    cluster::{Cluster, Outcome},
    config::{ProfileContext, is_name_fragment},
    consts::{
        DEFAULT_PVC_POLL_INTERVAL_SECS, DEFAULT_PVC_STORAGE_TB, DEFAULT_PVC_TIMEOUT_SECS,
        k8s::{labels, volumes},
    },
};

/// Everything `create_pvc` needs to know about a claim.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeRequest {
    pub name: String,

    /// Requested capacity in terabytes.
    pub storage_tb: f64,

    /// Overrides the storage class of the profile. Without either the
    /// cluster default applies.
    pub storage_class: Option<String>,

    pub namespace: Option<String>,

    /// How long to wait for the claim to be bound.
    pub timeout: Duration,

    pub poll_interval: Duration,
}

impl VolumeRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_tb: DEFAULT_PVC_STORAGE_TB,
            storage_class: None,
            namespace: None,
            timeout: Duration::from_secs(DEFAULT_PVC_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_PVC_POLL_INTERVAL_SECS),
        }
    }
}

pub struct VolumeManager<'a, C> {
    cluster: &'a C,
    context: &'a ProfileContext,
}

impl<'a, C: Cluster> VolumeManager<'a, C> {
    pub const fn new(cluster: &'a C, context: &'a ProfileContext) -> Self {
        Self { cluster, context }
    }
}

impl<C: Cluster> VolumeManager<'_, C> {
    /// Builds the `ReadWriteMany` claim for `request` without touching the
    /// cluster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for names that are not DNS-1123 labels
    /// and for capacities below one gigabyte.
    pub fn claim(&self, request: &VolumeRequest) -> Result<PersistentVolumeClaim, Error> {
        if !is_name_fragment(&request.name) {
            return error::ValidationSnafu {
                field: "name",
                reason: format!(
                    "'{}' may only contain lowercase letters, digits and '-', and must start and \
                     end with a letter or digit",
                    request.name
                ),
            }
            .fail();
        }
        let storage_gb = request.storage_tb * 1000.0;
        if !storage_gb.is_finite() || storage_gb < 1.0 {
            return error::ValidationSnafu {
                field: "storage",
                reason: format!("{} TB is less than one gigabyte", request.storage_tb),
            }
            .fail();
        }

        let storage_class = request
            .storage_class
            .clone()
            .or_else(|| self.context.profile.storage_class_name.clone());
        Ok(PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(request.name.clone()),
                labels: Some(BTreeMap::from([(
                    labels::MANAGED_BY.to_string(),
                    PROJECT_NAME.to_string(),
                )])),
                ..ObjectMeta::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![volumes::ACCESS_MODE.to_string()]),
                storage_class_name: storage_class,
                resources: Some(VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        Quantity(format!("{storage_gb:.0}G")),
                    )])),
                    ..VolumeResourceRequirements::default()
                }),
                ..PersistentVolumeClaimSpec::default()
            }),
            ..PersistentVolumeClaim::default()
        })
    }

    /// Creates the claim and waits until it is bound, reading it again every
    /// `request.poll_interval`.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] for unusable names or capacities.
    /// * [`Error::Cluster`] if the claim exists already or the API fails.
    /// * [`Error::NotBound`] if the claim is still unbound after
    ///   `request.timeout`. The claim is left in place.
    pub async fn create_pvc(&self, request: &VolumeRequest) -> Result<PersistentVolumeClaim, Error> {
        let claim = self.claim(request)?;
        let namespace = self.context.namespace_or(request.namespace.clone());
        let name = request.name.as_str();

        self.cluster.create_pvc(&namespace, &claim).await?;
        tracing::info!("Created persistent volume claim {name} in namespace {namespace}");

        let mut last_phase = None;
        let waited = tokio::time::timeout(
            request.timeout,
            self.wait_bound(&namespace, name, request.poll_interval, &mut last_phase),
        )
        .await;

        match waited {
            Ok(result) => result,
            Err(_elapsed) => error::NotBoundSnafu {
                namespace,
                name,
                timeout: request.timeout,
                phase: last_phase,
            }
            .fail(),
        }
    }

    /// Reads the claim until it is bound, recording the last phase seen.
    async fn wait_bound(
        &self,
        namespace: &str,
        name: &str,
        poll_interval: Duration,
        last_phase: &mut Option<String>,
    ) -> Result<PersistentVolumeClaim, Error> {
        loop {
            let Some(found) = self.cluster.get_pvc(namespace, name).await? else {
                return error::VanishedSnafu { namespace, name }.fail();
            };
            let phase = found.status.as_ref().and_then(|status| status.phase.clone());
            if phase.as_deref() == Some(volumes::BOUND_PHASE) {
                tracing::info!("Persistent volume claim {name} is bound");
                return Ok(found);
            }
            tracing::info!(
                "Waiting for persistent volume claim {name} to be bound, current phase: {}",
                phase.as_deref().unwrap_or("unknown")
            );
            *last_phase = phase;
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Deletes the claim `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such claim, and
    /// [`Error::Cluster`] when the API refuses, for instance while a pod
    /// still mounts it.
    pub async fn delete_pvc(&self, name: &str, namespace: Option<&str>) -> Result<(), Error> {
        let namespace = self.context.namespace_or(namespace.map(ToString::to_string));
        match self.cluster.delete_pvc(&namespace, name).await? {
            Outcome::Applied => {
                tracing::info!("Deleted persistent volume claim {name} in namespace {namespace}");
                Ok(())
            }
            Outcome::NotFound => error::NotFoundSnafu { namespace, name }.fail(),
        }
    }
}
