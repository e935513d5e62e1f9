use std::path::PathBuf;

use clap::{ArgAction, Args};

use crate::{
    cli::{Error, error, write_stdout},
    cluster::Cluster,
    config::ProfileContext,
    consts::DEFAULT_REPLICAS,
    deployment::{
        CreatedDeployment, DeploymentManager, DeploymentRequest, ScaleReport, SecretCleanup,
        deployment_name,
    },
    template::ManifestTemplates,
    ui::table::DeploymentSummaryExt,
};

/// Names a deployment directly or through the tag it was created with.
#[derive(Args, Clone)]
pub struct DeploymentTarget {
    #[arg(
        help = "Name of the deployment",
        required_unless_present = "tag",
        conflicts_with = "tag"
    )]
    pub name: Option<String>,

    #[arg(
        short,
        long,
        help = "Tag the deployment was created with. The name is derived from the active profile."
    )]
    pub tag: Option<String>,
}

impl DeploymentTarget {
    pub fn resolve(&self, context: &ProfileContext) -> Result<String, Error> {
        match (&self.name, &self.tag) {
            (Some(name), _) => Ok(name.clone()),
            (None, Some(tag)) => Ok(deployment_name(context, tag)?),
            (None, None) => error::MissingDeploymentTargetSnafu.fail(),
        }
    }
}

#[derive(Args, Clone)]
pub struct NameCommand {
    #[arg(help = "Tag identifying the deployment within the active profile")]
    pub tag: String,
}

impl NameCommand {
    pub async fn run(self, context: &ProfileContext) -> Result<(), Error> {
        write_stdout(&deployment_name(context, &self.tag)?).await
    }
}

#[derive(Args, Clone)]
pub struct CreateCommand {
    #[arg(help = "Tag identifying the deployment within the active profile")]
    pub tag: String,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Existing directory receiving the rendered deployment.yaml and secret.yaml"
    )]
    pub path: PathBuf,

    #[arg(short, long, help = "CPU cores requested by each replica")]
    pub cpus: f64,

    #[arg(short, long = "memory", help = "Memory requested by each replica, in GB")]
    pub memory_gb: f64,

    #[arg(short, long, default_value_t = DEFAULT_REPLICAS, help = "Number of replicas")]
    pub replicas: u32,

    #[arg(
        short = 'x',
        long = "exclude-node",
        action = ArgAction::Append,
        help = "Node the pods must not run on. May be given more than once."
    )]
    pub excluded_nodes: Vec<String>,
}

impl CreateCommand {
    pub async fn run<C: Cluster>(
        self,
        cluster: &C,
        context: &ProfileContext,
        templates: ManifestTemplates,
    ) -> Result<(), Error> {
        let Self { tag, path, cpus, memory_gb, replicas, excluded_nodes } = self;
        let request = DeploymentRequest { path, tag, cpus, memory_gb, replicas, excluded_nodes };

        let created = DeploymentManager::new(cluster, context, templates)
            .create_secret_deployment(&request)
            .await?;

        write_stdout(&created_message(&created)).await
    }
}

fn created_message(created: &CreatedDeployment) -> String {
    std::iter::once(format!(
        "Created deployment {} in namespace {}",
        created.name, created.namespace
    ))
    .chain(created.manifests.iter().map(|manifest| format!("Rendered {}", manifest.display())))
    .collect::<Vec<_>>()
    .join("\n")
}

#[derive(Args, Clone)]
pub struct DeleteCommand {
    #[command(flatten)]
    pub target: DeploymentTarget,
}

impl DeleteCommand {
    pub async fn run<C: Cluster>(
        self,
        cluster: &C,
        context: &ProfileContext,
        templates: ManifestTemplates,
    ) -> Result<(), Error> {
        let name = self.target.resolve(context)?;
        let report =
            DeploymentManager::new(cluster, context, templates).delete_secret_deployment(&name).await?;

        let secret = match report.secret {
            SecretCleanup::Deleted => "its secret was deleted".to_string(),
            SecretCleanup::AlreadyGone => "its secret was already gone".to_string(),
            SecretCleanup::Failed(reason) => {
                format!("its secret could not be deleted ({reason}); run delete again to retry")
            }
        };
        write_stdout(&format!("Deleted deployment {}, {secret}", report.name)).await
    }
}

#[derive(Args, Clone)]
pub struct ScaleCommand {
    #[command(flatten)]
    pub target: DeploymentTarget,

    #[arg(short, long, allow_negative_numbers = true, help = "Desired number of replicas")]
    pub replicas: i64,
}

impl ScaleCommand {
    pub async fn run<C: Cluster>(
        self,
        cluster: &C,
        context: &ProfileContext,
        templates: ManifestTemplates,
    ) -> Result<(), Error> {
        let name = self.target.resolve(context)?;
        let report = DeploymentManager::new(cluster, context, templates)
            .scale_deployment(&name, self.replicas)
            .await?;

        write_stdout(&scaled_message(&report)).await
    }
}

fn scaled_message(report: &ScaleReport) -> String {
    let scaled = format!("Scaled deployment {} to {} replicas", report.name, report.replicas);
    if report.marked_for_removal.is_empty() {
        return scaled;
    }
    format!("{scaled}\nPods removed first: {}", report.marked_for_removal.join(", "))
}

#[derive(Args, Clone)]
pub struct DeploymentsCommand {
    #[arg(short, long, help = "Namespace to list. Defaults to the namespace of the profile.")]
    pub namespace: Option<String>,

    #[arg(short, long, help = "Only list deployments whose name contains this string")]
    pub keep_key: Option<String>,
}

impl DeploymentsCommand {
    pub async fn run<C: Cluster>(
        self,
        cluster: &C,
        context: &ProfileContext,
        templates: ManifestTemplates,
    ) -> Result<(), Error> {
        let summaries = DeploymentManager::new(cluster, context, templates)
            .list_deployments(self.namespace.as_deref(), self.keep_key.as_deref())
            .await?;
        write_stdout(&summaries.render_table()).await
    }
}
