use clap::{Args, Subcommand};
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;

use crate::{
    cli::{Error, deployment::DeploymentTarget, error, write_stdout},
    cluster::Cluster,
    config::ProfileContext,
    consts::DEFAULT_PRUNE_STATUS,
    deployment::deployment_name,
    inspector::{ContainerPhase, PodInspector, PodQuery, get_active_tasks},
    ui::table::PodSnapshotsExt,
};

#[derive(Clone, Subcommand)]
pub enum PodsCommands {
    #[command(alias = "s", about = "Show the pods of one deployment with their usage and status")]
    Summary {
        #[command(flatten)]
        target: DeploymentTarget,

        #[arg(short, long, help = "Namespace of the deployment")]
        namespace: Option<String>,
    },

    #[command(alias = "r", about = "Show usage and status of the pods in a namespace")]
    Resources(PodSelection),

    #[command(alias = "a", about = "Show the running pods that are busy computing")]
    Active(PodSelection),
}

#[derive(Args, Clone)]
pub struct PodSelection {
    #[arg(short, long, help = "Only show the pods of this deployment")]
    pub deployment: Option<String>,

    #[arg(short, long, help = "Namespace to inspect. Defaults to the namespace of the profile.")]
    pub namespace: Option<String>,

    #[arg(short, long, help = "Only show pods whose name contains this string")]
    pub keep_key: Option<String>,

    #[arg(short, long, help = "Log the state of every inspected pod")]
    pub verbose: bool,
}

impl From<PodSelection> for PodQuery {
    fn from(PodSelection { deployment, namespace, keep_key, verbose }: PodSelection) -> Self {
        Self { deployment, namespace, keep_key, verbose }
    }
}

impl PodsCommands {
    pub async fn run<C: Cluster>(self, cluster: &C, context: &ProfileContext) -> Result<(), Error> {
        let inspector = PodInspector::new(cluster, context);
        match self {
            Self::Summary { target, namespace } => {
                let name = target.resolve(context)?;
                let mut stdout = tokio::io::stdout();
                inspector.print_pods_summary(&name, namespace.as_deref(), &mut stdout).await?;
                stdout.flush().await.context(error::WriteStdoutSnafu)?;
            }
            Self::Resources(selection) => {
                let snapshots = inspector.get_pods_resource_info(&selection.into()).await?;
                let table = snapshots.into_values().collect::<Vec<_>>().render_table();
                write_stdout(&table).await?;
            }
            Self::Active(selection) => {
                let snapshots = inspector.get_pods_resource_info(&selection.into()).await?;
                let active =
                    get_active_tasks(snapshots.values()).into_iter().cloned().collect::<Vec<_>>();
                tracing::info!("{} of {} pods are active", active.len(), snapshots.len());
                write_stdout(&active.render_table()).await?;
            }
        }
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct PruneCommand {
    #[arg(
        short,
        long,
        default_value = DEFAULT_PRUNE_STATUS,
        help = "Status reason of the pods to delete, matched exactly"
    )]
    pub status: String,

    #[arg(
        long,
        conflicts_with = "status",
        help = "Delete the pods whose container is in this state (running, waiting or terminated) \
                instead of matching a status reason"
    )]
    pub state: Option<ContainerPhase>,

    #[arg(short, long, conflicts_with = "tag", help = "Only delete pods of this deployment")]
    pub deployment: Option<String>,

    #[arg(short, long, help = "Only delete pods of the deployment created with this tag")]
    pub tag: Option<String>,

    #[arg(short, long, help = "Namespace to prune. Defaults to the namespace of the profile.")]
    pub namespace: Option<String>,
}

impl PruneCommand {
    pub async fn run<C: Cluster>(self, cluster: &C, context: &ProfileContext) -> Result<(), Error> {
        let Self { status, state, deployment, tag, namespace } = self;
        let deployment = match (deployment, tag) {
            (Some(name), _) => Some(name),
            (None, Some(tag)) => Some(deployment_name(context, &tag)?),
            (None, None) => None,
        };

        let inspector = PodInspector::new(cluster, context);
        let (deployment, namespace) = (deployment.as_deref(), namespace.as_deref());
        let message = match state {
            Some(state) => {
                let deleted = inspector.delete_pods_by_state(state, deployment, namespace).await?;
                format!("Deleted {deleted} pods in state {state}")
            }
            None => {
                let deleted = inspector.delete_pods_by_status(&status, deployment, namespace).await?;
                format!("Deleted {deleted} pods with status {status}")
            }
        };
        write_stdout(&message).await
    }
}
