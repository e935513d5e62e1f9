//! The `kubecustom` command line.
//!
//! # Examples
//!
//! ```bash
//! # Register a profile and make it active
//! kubecustom profile add qca-xtb --username alice --cluster-user-id al \
//!     --namespace openforcefield --container-name openff-qca-qm-xtb \
//!     --container-image ghcr.io/openforcefield/qca-dataset-submission:latest \
//!     --cluster-name nrp
//!
//! # Create two replicas requesting 2 cores and 8 GB each
//! kubecustom create run1 --cpus 2 --memory 8 --replicas 2
//!
//! # Scale them down, removing idle pods first
//! kubecustom scale --tag run1 --replicas 1
//!
//! # Report how much of the requests the pods use, every 20 seconds
//! kubecustom utilization --watch
//!
//! # Claim 1 TB of shared storage and wait until it is bound
//! kubecustom pvc create scratch --storage 1
//! ```

mod deployment;
pub mod error;
mod pods;
mod profile;
mod utilization;
mod volume;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use snafu::ResultExt;
use tokio::{io::AsyncWriteExt, runtime::Runtime};

pub use self::error::Error;
use self::{
    deployment::{CreateCommand, DeleteCommand, DeploymentsCommand, NameCommand, ScaleCommand},
    pods::{PodsCommands, PruneCommand},
    profile::ProfileCommands,
    utilization::UtilizationCommand,
    volume::PvcCommands,
};
use crate::{
    CLI_PROGRAM_NAME,
    cluster::KubeCluster,
    config::{Config, ProfileContext, ProfileKind},
    shadow,
    template::ManifestTemplates,
};

/// Writes `text` and a trailing newline to stdout.
pub(crate) async fn write_stdout(text: &str) -> Result<(), Error> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await.context(error::WriteStdoutSnafu)?;
    stdout.write_u8(b'\n').await.context(error::WriteStdoutSnafu)?;
    stdout.flush().await.context(error::WriteStdoutSnafu)
}

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Create, scale, inspect and tear down per-user compute deployments on Kubernetes",
    long_about = "kubecustom manages the compute manager deployments of a user on a shared \
                  Kubernetes cluster. Each deployment is rendered from the template of a \
                  profile, paired with a secret holding the manager configuration, and named \
                  after the profile owner and a tag. It also reports how much of their \
                  requested CPU and memory the pods actually use.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(
        long = "config",
        short = 'c',
        env = "KUBECUSTOM_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/kubecustom/config.yaml or \
                KUBECUSTOM_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "KUBECUSTOM_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,

    #[clap(
        long = "profile",
        short = 'p',
        env = "KUBECUSTOM_PROFILE",
        help = "Use this profile instead of the active one"
    )]
    profile: Option<ProfileKind>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(about = "Manage the profiles of the configuration file")]
    Profile {
        #[command(subcommand)]
        commands: ProfileCommands,
    },

    #[command(about = "Print the deployment name derived from a tag")]
    Name(NameCommand),

    #[command(alias = "c", about = "Render and create a deployment together with its secret")]
    Create(CreateCommand),

    #[command(alias = "d", about = "Delete a deployment together with its secret")]
    Delete(DeleteCommand),

    #[command(about = "Change the replica count of a deployment, removing idle pods first")]
    Scale(ScaleCommand),

    #[command(alias = "l", about = "List the deployments in a namespace")]
    Deployments(DeploymentsCommand),

    #[command(about = "Inspect pods and their resource usage")]
    Pods {
        #[command(subcommand)]
        commands: PodsCommands,
    },

    #[command(about = "Delete the pods stuck with a given status or container state")]
    Prune(PruneCommand),

    #[command(
        alias = "u",
        about = "Report the CPU and memory utilization of every deployment against its requests"
    )]
    Utilization(UtilizationCommand),

    #[command(about = "Create and delete persistent volume claims shared by deployments")]
    Pvc {
        #[command(subcommand)]
        commands: PvcCommands,
    },
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config_file.clone().unwrap_or_else(Config::search_config_file_path)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }
    }

    fn profile_context(&self, config: &Config) -> Result<ProfileContext, Error> {
        Ok(match self.profile {
            Some(key) => config.context_for(key)?,
            None => config.active_context()?,
        })
    }

    /// Dispatches the parsed command and returns the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an `Error` when the configuration cannot be loaded, the
    /// Kubernetes client cannot be configured, or the command fails.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = Self::command().get_version().unwrap_or_default().to_string();
        let runtime = || Runtime::new().context(error::InitializeTokioRuntimeSnafu);

        let commands = match self.commands.clone() {
            Some(Commands::Version { client: true }) => {
                let info = format!(
                    "{}Client Version: {client_version}",
                    Self::command().render_long_version()
                );
                runtime()?.block_on(write_stdout(&info))?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                let template = String::from_utf8_lossy(Config::template_basic()).into_owned();
                runtime()?.block_on(write_stdout(template.trim_end()))?;
                return Ok(0);
            }
            Some(Commands::Profile { commands }) => {
                let path = self.config_path();
                let mut config = Config::load_or_default(&path)?;
                self.apply_overrides(&mut config);
                config.log.registry();
                runtime()?.block_on(commands.run(config, &path))?;
                return Ok(0);
            }
            Some(commands) => commands,
            None => {
                let help = Self::command().render_long_help().ansi().to_string();
                eprint!("{help}");
                return Ok(-1);
            }
        };

        let mut config = Config::load(self.config_path())?;
        self.apply_overrides(&mut config);
        config.log.registry();

        if let Commands::Name(cmd) = commands {
            let context = self.profile_context(&config)?;
            runtime()?.block_on(cmd.run(&context))?;
            return Ok(0);
        }

        let fut = async move {
            let kube_client = kube::Client::try_default().await.context(error::KubeConfigSnafu)?;
            if matches!(commands, Commands::Version { .. }) {
                let server_version = kube_client.apiserver_version().await.map_or_else(
                    |_| "unknown".to_string(),
                    |info| format!("{}.{}", info.major, info.minor),
                );
                let info = format!(
                    "{}Client Version: {client_version}\nServer Version: {server_version}",
                    Self::command().render_long_version()
                );
                write_stdout(&info).await?;
                return Ok(0);
            }

            let context = self.profile_context(&config)?;
            let cluster = KubeCluster::new(kube_client);
            let templates = || {
                ManifestTemplates::load(context.profile.key, config.template_directory.as_deref())
            };
            match commands {
                Commands::Create(cmd) => cmd.run(&cluster, &context, templates()?).await?,
                Commands::Delete(cmd) => cmd.run(&cluster, &context, templates()?).await?,
                Commands::Scale(cmd) => cmd.run(&cluster, &context, templates()?).await?,
                Commands::Deployments(cmd) => cmd.run(&cluster, &context, templates()?).await?,
                Commands::Pods { commands } => commands.run(&cluster, &context).await?,
                Commands::Prune(cmd) => cmd.run(&cluster, &context).await?,
                Commands::Utilization(cmd) => cmd.run(&cluster, &context).await?,
                Commands::Pvc { commands } => commands.run(&cluster, &context).await?,
                Commands::Version { .. }
                | Commands::Completions { .. }
                | Commands::DefaultConfig
                | Commands::Profile { .. }
                | Commands::Name(_) => {}
            }
            Ok(0)
        };

        runtime()?.block_on(fut)
    }
}
