//! Lifecycle of per-user compute deployments and the secrets they mount.

mod error;
mod manifest;
mod naming;

use std::path::{Path, PathBuf};

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Secret};
use snafu::ResultExt;

pub use self::{error::Error, naming::deployment_name};
use crate::{
    cluster::{self, Cluster, Outcome},
    config::ProfileContext,
    consts::{
        RENDERED_DEPLOYMENT_FILE, RENDERED_SECRET_FILE, SCALE_DOWN_POD_DELETION_COST,
        k8s::annotations,
    },
    inspector::{PodInspector, PodQuery, PodSnapshot, ResourceRequest},
    template::{ManifestTemplates, Placeholder, TemplateValue, TemplateValues},
};

/// What to create with [`DeploymentManager::create_secret_deployment`].
#[derive(Clone, Debug)]
pub struct DeploymentRequest {
    /// Existing directory receiving the rendered manifests.
    pub path: PathBuf,

    pub tag: String,

    /// CPU cores requested per replica.
    pub cpus: f64,

    /// Memory requested per replica, in decimal gigabytes.
    pub memory_gb: f64,

    pub replicas: u32,

    /// Nodes the pods must not be scheduled on.
    pub excluded_nodes: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatedDeployment {
    pub name: String,
    pub namespace: String,
    pub manifests: Vec<PathBuf>,
}

/// What happened to the secret after its deployment was removed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SecretCleanup {
    Deleted,
    AlreadyGone,
    Failed(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeleteReport {
    pub name: String,
    pub secret: SecretCleanup,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScaleReport {
    pub name: String,
    pub previous: Option<i32>,
    pub replicas: i32,

    /// Pods annotated to be removed first when scaling down.
    pub marked_for_removal: Vec<String>,
}

/// One row of [`DeploymentManager::list_deployments`].
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentSummary {
    pub name: String,
    pub ready: i32,
    pub desired: i32,
    pub request: Option<ResourceRequest>,
}

impl DeploymentSummary {
    fn from_deployment(deployment: &Deployment) -> Self {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let request = ResourceRequest::of_deployment(deployment).unwrap_or_else(|err| {
            tracing::warn!("Deployment {name} has an unreadable request: {err}");
            None
        });
        Self {
            ready: deployment
                .status
                .as_ref()
                .and_then(|status| status.ready_replicas)
                .unwrap_or_default(),
            desired: deployment.spec.as_ref().and_then(|spec| spec.replicas).unwrap_or_default(),
            request,
            name,
        }
    }
}

/// Creates, deletes, scales and lists the deployments of one profile.
pub struct DeploymentManager<'a, C> {
    cluster: &'a C,
    context: &'a ProfileContext,
    templates: ManifestTemplates,
}

impl<'a, C: Cluster> DeploymentManager<'a, C> {
    pub const fn new(
        cluster: &'a C,
        context: &'a ProfileContext,
        templates: ManifestTemplates,
    ) -> Self {
        Self { cluster, context, templates }
    }
}

impl<C: Cluster> DeploymentManager<'_, C> {
    fn namespace(&self) -> &str { self.context.namespace() }

    /// See [`deployment_name`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unusable tags.
    pub fn get_deployment_name(&self, tag: &str) -> Result<String, Error> {
        deployment_name(self.context, tag)
    }

    fn template_values(&self, name: &str, request: &DeploymentRequest) -> TemplateValues {
        let profile = &self.context.profile;
        TemplateValues::new()
            .with_text(Placeholder::DeploymentName, name)
            .with_text(Placeholder::User, &profile.cluster_user_id)
            .with_text(Placeholder::Tag, &request.tag)
            .with(Placeholder::Replicas, TemplateValue::Count(request.replicas))
            .with_text(Placeholder::ContainerImage, &profile.container_image)
            .with_text(Placeholder::ContainerName, &profile.container_name)
            .with(Placeholder::Cpus, TemplateValue::Cpu(request.cpus))
            .with(Placeholder::MemoryG, TemplateValue::Memory(request.memory_gb))
            .with_text(Placeholder::Username, &profile.username)
            .with_text(Placeholder::Password, &profile.password)
            .with_text(Placeholder::Cluster, &profile.cluster_name)
            .with_text(Placeholder::Namespace, &profile.namespace)
    }

    /// Renders the secret and deployment for `request` without touching the
    /// cluster.
    ///
    /// # Errors
    ///
    /// Fails for invalid tags and for templates that cannot be rendered.
    pub fn render(&self, request: &DeploymentRequest) -> Result<(Secret, Deployment), Error> {
        let name = self.get_deployment_name(&request.tag)?;
        let values = self.template_values(&name, request);

        let mut secret: Secret = self.templates.secret.render_as(&values, "Secret")?;
        manifest::stamp_secret(&mut secret, &name, self.namespace());

        let mut deployment: Deployment =
            self.templates.deployment.render_as(&values, "Deployment")?;
        manifest::stamp_deployment(&mut deployment, &name, self.namespace());
        manifest::exclude_nodes(&mut deployment, &request.excluded_nodes);

        Ok((secret, deployment))
    }

    /// Creates the secret and then the deployment named after `request.tag`.
    ///
    /// The artifact directory is checked before any API call. The rendered
    /// manifests are written into it once the name is known to be free. If
    /// the deployment cannot be created the secret is removed again.
    ///
    /// # Errors
    ///
    /// * [`Error::Path`] if `request.path` is not an existing directory.
    /// * [`Error::Validation`] for unusable tags.
    /// * [`Error::Template`] if a manifest cannot be rendered.
    /// * [`Error::AlreadyExists`] if the deployment or its secret exists.
    /// * [`Error::Cluster`] for other API failures.
    pub async fn create_secret_deployment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<CreatedDeployment, Error> {
        check_directory(&request.path).await?;
        let (secret, deployment) = self.render(request)?;
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let namespace = self.namespace();

        if self.cluster.get_deployment(namespace, &name).await?.is_some() {
            return error::AlreadyExistsSnafu { namespace, name }.fail();
        }

        let manifests = vec![
            write_manifest(&request.path.join(RENDERED_SECRET_FILE), "Secret", &name, &secret)
                .await?,
            write_manifest(
                &request.path.join(RENDERED_DEPLOYMENT_FILE),
                "Deployment",
                &name,
                &deployment,
            )
            .await?,
        ];

        self.cluster.create_secret(namespace, &secret).await.map_err(|err| conflict(err, &name))?;
        tracing::info!("Created secret {name} in namespace {namespace}");

        if let Err(err) = self.cluster.create_deployment(namespace, &deployment).await {
            match self.cluster.delete_secret(namespace, &name).await {
                Ok(_) => tracing::info!("Removed secret {name} after failed deployment creation"),
                Err(cleanup) => {
                    tracing::warn!("Failed to remove secret {name} after failed creation: {cleanup}");
                }
            }
            return Err(conflict(err, &name));
        }
        tracing::info!("Created deployment {name} in namespace {namespace}");

        Ok(CreatedDeployment { name, namespace: namespace.to_string(), manifests })
    }

    /// Deletes the deployment and then its secret.
    ///
    /// The secret is deleted even when the deployment was already gone. A
    /// failure to delete the secret is reported in the returned
    /// [`DeleteReport`] but is not an error once the deployment is deleted.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`] if the deployment did not exist.
    /// * [`Error::Cluster`] if the deployment could not be deleted.
    pub async fn delete_secret_deployment(
        &self,
        deployment_name: &str,
    ) -> Result<DeleteReport, Error> {
        let namespace = self.namespace();
        let deployment = self.cluster.delete_deployment(namespace, deployment_name).await?;

        let secret = match self.cluster.delete_secret(namespace, deployment_name).await {
            Ok(Outcome::Applied) => SecretCleanup::Deleted,
            Ok(Outcome::NotFound) => SecretCleanup::AlreadyGone,
            Err(err) => {
                tracing::warn!("Failed to delete secret {deployment_name}: {err}");
                SecretCleanup::Failed(err.to_string())
            }
        };

        match deployment {
            Outcome::Applied => {
                tracing::info!("Deleted deployment {deployment_name} in namespace {namespace}");
                Ok(DeleteReport { name: deployment_name.to_string(), secret })
            }
            Outcome::NotFound => {
                if secret == SecretCleanup::Deleted {
                    tracing::info!("Removed orphaned secret {deployment_name}");
                }
                error::NotFoundSnafu { namespace, name: deployment_name }.fail()
            }
        }
    }

    /// Sets the replica count of a live deployment with a merge patch.
    ///
    /// When scaling down, the least busy pods are annotated with a low
    /// deletion cost first so the controller removes them before busy ones.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] if `replicas` is negative or too large.
    /// * [`Error::NotFound`] if the deployment does not exist.
    pub async fn scale_deployment(
        &self,
        deployment_name: &str,
        replicas: i64,
    ) -> Result<ScaleReport, Error> {
        let replicas = i32::try_from(replicas).ok().filter(|replicas| *replicas >= 0).ok_or_else(
            || Error::Validation {
                field: "replicas",
                reason: format!("{replicas} is not a non-negative replica count"),
            },
        )?;
        let namespace = self.namespace();

        let Some(live) = self.cluster.get_deployment(namespace, deployment_name).await? else {
            return error::NotFoundSnafu { namespace, name: deployment_name }.fail();
        };
        let previous = live.spec.as_ref().and_then(|spec| spec.replicas);

        let marked_for_removal = match previous {
            Some(previous) if replicas < previous => {
                let surplus = usize::try_from(previous - replicas).unwrap_or_default();
                self.mark_least_busy(deployment_name, surplus).await?
            }
            _ => Vec::new(),
        };

        match self.cluster.scale_deployment(namespace, deployment_name, replicas).await? {
            Outcome::Applied => {
                tracing::info!(
                    "Scaled deployment {deployment_name} from {} to {replicas} replicas",
                    previous.map_or_else(|| "unknown".to_string(), |previous| previous.to_string())
                );
                Ok(ScaleReport {
                    name: deployment_name.to_string(),
                    previous,
                    replicas,
                    marked_for_removal,
                })
            }
            Outcome::NotFound => {
                error::NotFoundSnafu { namespace, name: deployment_name }.fail()
            }
        }
    }

    async fn mark_least_busy(
        &self,
        deployment_name: &str,
        count: usize,
    ) -> Result<Vec<String>, Error> {
        let inspector = PodInspector::new(self.cluster, self.context);
        let mut pods = inspector
            .get_pods_resource_info(&PodQuery::deployment(deployment_name))
            .await?
            .into_values()
            .collect::<Vec<_>>();
        // Pods that are not running or report no usage go first.
        pods.sort_by(|a, b| {
            let busy = |pod: &PodSnapshot| {
                if pod.is_running() { pod.cpus.unwrap_or_default() } else { -1.0 }
            };
            busy(a).total_cmp(&busy(b))
        });

        let mut marked = Vec::with_capacity(count);
        for pod in pods.into_iter().take(count) {
            let annotated = self
                .cluster
                .annotate_pod(
                    self.namespace(),
                    &pod.pod_name,
                    annotations::POD_DELETION_COST,
                    SCALE_DOWN_POD_DELETION_COST,
                )
                .await;
            match annotated {
                Ok(Outcome::Applied) => marked.push(pod.pod_name),
                Ok(Outcome::NotFound) => {}
                Err(err) => tracing::warn!("Failed to annotate pod {}: {err}", pod.pod_name),
            }
        }
        Ok(marked)
    }

    /// Deployments in the namespace whose name contains `keep_key`, by name.
    ///
    /// # Errors
    ///
    /// Fails if deployments cannot be listed.
    pub async fn list_deployments(
        &self,
        namespace: Option<&str>,
        keep_key: Option<&str>,
    ) -> Result<Vec<DeploymentSummary>, Error> {
        let namespace = self.context.namespace_or(namespace.map(ToString::to_string));
        let mut summaries = self
            .cluster
            .list_deployments(&namespace, None)
            .await?
            .iter()
            .map(DeploymentSummary::from_deployment)
            .filter(|summary| keep_key.is_none_or(|keep_key| summary.name.contains(keep_key)))
            .collect::<Vec<_>>();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}

/// Maps a conflict on create to [`Error::AlreadyExists`] for the deployment.
fn conflict(err: cluster::Error, name: &str) -> Error {
    match err {
        cluster::Error::AlreadyExists { namespace, .. } => {
            Error::AlreadyExists { namespace, name: name.to_string() }
        }
        err => Error::from(err),
    }
}

async fn check_directory(path: &Path) -> Result<(), Error> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => error::PathSnafu { path, reason: "it is not a directory" }.fail(),
        Err(err) => error::PathSnafu { path, reason: err.to_string() }.fail(),
    }
}

async fn write_manifest<T: serde::Serialize>(
    path: &Path,
    kind: &'static str,
    name: &str,
    manifest: &T,
) -> Result<PathBuf, Error> {
    let content =
        serde_yaml::to_string(manifest).context(error::SerializeManifestSnafu { kind, name })?;
    tokio::fs::write(path, content).await.context(error::WriteManifestSnafu { path })?;
    Ok(path.to_path_buf())
}
