use std::path::Path;

use clap::{Args, Subcommand};
use snafu::ResultExt;

use crate::{
    cli::{Error, error, write_stdout},
    config::{Config, Profile, ProfileKind},
    ui::table::ProfileTableExt,
};

const PASSWORD_MASK: &str = "********";

#[derive(Clone, Subcommand)]
pub enum ProfileCommands {
    #[command(alias = "l", about = "List the configured profiles and mark the active one")]
    List,

    #[command(
        alias = "a",
        about = "Add a profile, or replace the one with the same key; the first profile added \
                 becomes active"
    )]
    Add(AddCommand),

    #[command(alias = "u", about = "Make a configured profile the active one")]
    Use {
        #[arg(help = "Key of the profile, one of qca-psi4, qca-xtb, qca-ani, qca-openmm")]
        key: ProfileKind,
    },

    #[command(alias = "s", about = "Show a profile with its password masked")]
    Show {
        #[arg(help = "Key of the profile. Defaults to the active profile.")]
        key: Option<ProfileKind>,
    },
}

#[derive(Args, Clone)]
pub struct AddCommand {
    #[arg(help = "Key of the profile, one of qca-psi4, qca-xtb, qca-ani, qca-openmm")]
    pub key: ProfileKind,

    #[arg(long, help = "Username written into the manager configuration secret")]
    pub username: String,

    #[arg(
        long,
        env = "KUBECUSTOM_PASSWORD",
        hide_env_values = true,
        help = "Password written into the manager configuration secret"
    )]
    pub password: String,

    #[arg(
        long,
        help = "Short identifier of the deployment owner, part of every deployment name. Only \
                lowercase letters and digits are allowed."
    )]
    pub cluster_user_id: String,

    #[arg(long, help = "Kubernetes namespace the deployments live in")]
    pub namespace: String,

    #[arg(long, help = "Name of the worker container")]
    pub container_name: String,

    #[arg(long, help = "Image of the worker container")]
    pub container_image: String,

    #[arg(long, help = "Cluster name reported by the compute managers")]
    pub cluster_name: String,

    #[arg(long, help = "Storage class of the persistent volume claims created with this profile")]
    pub storage_class_name: Option<String>,
}

impl ProfileCommands {
    pub async fn run(self, mut config: Config, config_path: &Path) -> Result<(), Error> {
        match self {
            Self::List if config.list_available().is_empty() => {
                let supported =
                    ProfileKind::ALL.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                write_stdout(&format!(
                    "No profile configured yet, add one with `profile add <KEY>` where KEY is one \
                     of {supported}"
                ))
                .await
            }
            Self::List => write_stdout(&config.render_table()).await,
            Self::Add(cmd) => {
                let AddCommand {
                    key,
                    username,
                    password,
                    cluster_user_id,
                    namespace,
                    container_name,
                    container_image,
                    cluster_name,
                    storage_class_name,
                } = cmd;
                config.add_profile(Profile {
                    key,
                    username,
                    password,
                    cluster_user_id,
                    namespace,
                    container_name,
                    container_image,
                    cluster_name,
                    storage_class_name,
                })?;
                config.save(config_path)?;
                write_stdout(&format!("Profile {key} saved to {}", config_path.display())).await
            }
            Self::Use { key } => {
                config.set_active(key)?;
                config.save(config_path)?;
                write_stdout(&format!("Profile {key} is now active")).await
            }
            Self::Show { key } => {
                let context = match key {
                    Some(key) => config.context_for(key)?,
                    None => config.active_context()?,
                };
                let key = context.profile.key;
                let profile = Profile { password: PASSWORD_MASK.to_string(), ..context.profile };
                let yaml = serde_yaml::to_string(&profile)
                    .context(error::SerializeProfileSnafu { key: key.to_string() })?;
                let marker = if config.active_profile == Some(key) { " (active)" } else { "" };
                write_stdout(&format!("# {key}{marker}\n{}", yaml.trim_end())).await
            }
        }
    }
}
