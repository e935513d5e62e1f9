//! `kubecustom` creates, scales, inspects and tears down per-user compute
//! deployments on a Kubernetes cluster, and summarizes how much of their
//! requested CPU and memory the pods actually use.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod consts;
pub mod deployment;
pub mod inspector;
pub mod quantity;
pub mod template;
pub mod ui;
pub mod volume;

pub mod shadow {
    #![allow(clippy::needless_raw_string_hashes)]
    use shadow_rs::shadow;
    shadow!(build);

    pub use self::build::*;
}

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use directories::ProjectDirs;

pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const PROJECT_NAME: &str = "kubecustom";

pub const CLI_PROGRAM_NAME: &str = "kubecustom";
pub const CLI_CONFIG_NAME: &str = "config.yaml";

pub static PROJECT_CONFIG_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    ProjectDirs::from("", PROJECT_NAME, PROJECT_NAME)
        .expect("Creating `ProjectDirs` should always success")
        .config_dir()
        .to_path_buf()
});

#[must_use]
pub fn fallback_project_config_directories() -> Vec<PathBuf> {
    let Some(user_dirs) = directories::UserDirs::new() else {
        return Vec::new();
    };
    vec![
        [user_dirs.home_dir(), Path::new(".config"), Path::new(PROJECT_NAME)].iter().collect(),
        [user_dirs.home_dir(), Path::new(&format!(".{PROJECT_NAME}"))].iter().collect(),
    ]
}
