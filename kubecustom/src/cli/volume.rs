use std::time::Duration;

use clap::{Args, Subcommand};

use crate::{
    cli::{Error, write_stdout},
    cluster::Cluster,
    config::ProfileContext,
    consts::{DEFAULT_PVC_POLL_INTERVAL_SECS, DEFAULT_PVC_STORAGE_TB, DEFAULT_PVC_TIMEOUT_SECS},
    volume::{VolumeManager, VolumeRequest},
};

#[derive(Clone, Subcommand)]
pub enum PvcCommands {
    #[command(about = "Create a ReadWriteMany claim and wait until it is bound")]
    Create(CreatePvcCommand),

    #[command(about = "Delete a persistent volume claim")]
    Delete {
        #[arg(help = "Name of the claim")]
        name: String,

        #[arg(short, long, help = "Namespace of the claim. Defaults to the namespace of the profile.")]
        namespace: Option<String>,
    },
}

#[derive(Args, Clone)]
pub struct CreatePvcCommand {
    #[arg(help = "Name of the claim")]
    pub name: String,

    #[arg(
        short,
        long = "storage",
        default_value_t = DEFAULT_PVC_STORAGE_TB,
        help = "Requested capacity in terabytes"
    )]
    pub storage_tb: f64,

    #[arg(long, help = "Storage class. Defaults to the storage class of the profile.")]
    pub storage_class: Option<String>,

    #[arg(short, long, help = "Namespace of the claim. Defaults to the namespace of the profile.")]
    pub namespace: Option<String>,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_PVC_TIMEOUT_SECS,
        help = "Seconds to wait for the claim to be bound"
    )]
    pub timeout: u64,

    #[arg(
        long,
        default_value_t = DEFAULT_PVC_POLL_INTERVAL_SECS,
        help = "Seconds between two checks of the claim"
    )]
    pub interval: u64,
}

impl From<CreatePvcCommand> for VolumeRequest {
    fn from(command: CreatePvcCommand) -> Self {
        let CreatePvcCommand { name, storage_tb, storage_class, namespace, timeout, interval } =
            command;
        Self {
            name,
            storage_tb,
            storage_class,
            namespace,
            timeout: Duration::from_secs(timeout),
            poll_interval: Duration::from_secs(interval.max(1)),
        }
    }
}

impl PvcCommands {
    pub async fn run<C: Cluster>(self, cluster: &C, context: &ProfileContext) -> Result<(), Error> {
        let manager = VolumeManager::new(cluster, context);
        match self {
            Self::Create(cmd) => {
                let request = VolumeRequest::from(cmd);
                let _claim = manager.create_pvc(&request).await?;
                write_stdout(&format!("Persistent volume claim {} is bound", request.name)).await
            }
            Self::Delete { name, namespace } => {
                manager.delete_pvc(&name, namespace.as_deref()).await?;
                write_stdout(&format!("Deleted persistent volume claim {name}")).await
            }
        }
    }
}
