mod error;
mod log;
mod profile;
mod profile_kind;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

pub use self::{
    error::Error,
    log::LogConfig,
    profile::{Profile, ProfileContext, is_name_fragment, is_name_segment},
    profile_kind::{ParseProfileKindError, ProfileKind},
};
#[cfg(test)]
pub(crate) use self::profile::tests::sample_profile;
use crate::consts;

/// The persisted configuration store.
///
/// Holds every configured profile in insertion order together with the key
/// of the active one.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_deployment_prefix")]
    pub deployment_prefix: String,

    #[serde(default)]
    pub active_profile: Option<ProfileKind>,

    #[serde(default = "Vec::new")]
    pub profiles: Vec<Profile>,

    /// Directory overriding the built-in templates with
    /// `<key>/deployment.yaml` and `<key>/secret.yaml`.
    #[serde(default)]
    pub template_directory: Option<PathBuf>,

    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deployment_prefix: default_deployment_prefix(),
            active_profile: None,
            profiles: Vec::new(),
            template_directory: None,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(crate::fallback_project_config_directories().into_iter().map(|mut path| {
                path.push(crate::CLI_CONFIG_NAME);
                path
            }))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [crate::PROJECT_CONFIG_DIR.to_path_buf(), PathBuf::from(crate::CLI_CONFIG_NAME)]
            .into_iter()
            .collect()
    }

    /// A commented starting point for a configuration file.
    #[must_use]
    pub const fn template_basic() -> &'static [u8] { include_bytes!("../../templates/config.yaml") }

    /// Loads and validates the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] when no file exists at `path`, and a
    /// parse or validation error when its content is unusable.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = resolve(path.as_ref())?;
        if !path.try_exists().unwrap_or(false) {
            return error::MissingConfigSnafu { filename: path }.fail();
        }

        let mut config: Self = {
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = config.log.file_path.as_deref().map(resolve).transpose()?;
        config.template_directory = config.template_directory.as_deref().map(resolve).transpose()?;
        config.validate()?;

        Ok(config)
    }

    /// Loads the configuration file, or starts from an empty store when the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Config::load`] other than a missing file.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        match Self::load(path) {
            Err(Error::MissingConfig { .. }) => Ok(Self::default()),
            result => result,
        }
    }

    /// Writes the configuration back, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serializing or writing the file fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = resolve(path.as_ref())?;
        let data = serde_yaml::to_string(self).context(error::SerializeConfigSnafu)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(error::WriteConfigSnafu { filename: path.clone() })?;
        }
        std::fs::write(&path, data).context(error::WriteConfigSnafu { filename: path.clone() })?;
        tracing::debug!("configuration written to {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        if !is_name_segment(&self.deployment_prefix) {
            return error::InvalidDeploymentPrefixSnafu { prefix: self.deployment_prefix.clone() }
                .fail();
        }
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile.key) {
                return error::DuplicateProfileSnafu { key: profile.key.to_string() }.fail();
            }
            profile.validate()?;
        }
        if let Some(active) = self.active_profile {
            let _profile = self.find_profile(active).with_context(|| error::UnknownProfileSnafu {
                key: active.to_string(),
                available: self.available_names(),
            })?;
        }
        Ok(())
    }

    /// Appends a profile, or replaces the one with the same key in place.
    /// The first profile ever added becomes the active one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a required field is missing.
    pub fn add_profile(&mut self, profile: Profile) -> Result<(), Error> {
        profile.validate()?;
        let key = profile.key;
        match self.profiles.iter_mut().find(|existing| existing.key == key) {
            Some(existing) => {
                *existing = profile;
                tracing::info!("configuration '{key}' updated");
            }
            None => {
                self.profiles.push(profile);
                tracing::info!("configuration '{key}' added");
            }
        }
        if self.active_profile.is_none() {
            self.active_profile = Some(key);
        }
        Ok(())
    }

    /// Switches the active profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProfile`] if no profile with `key` exists.
    pub fn set_active(&mut self, key: ProfileKind) -> Result<(), Error> {
        let _profile = self.find_profile(key).with_context(|| error::UnknownProfileSnafu {
            key: key.to_string(),
            available: self.available_names(),
        })?;
        self.active_profile = Some(key);
        Ok(())
    }

    /// Keys of the configured profiles, in insertion order.
    #[must_use]
    pub fn list_available(&self) -> Vec<ProfileKind> {
        self.profiles.iter().map(|profile| profile.key).collect()
    }

    #[must_use]
    pub fn find_profile(&self, key: ProfileKind) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.key == key)
    }

    /// Builds the context used by deployment and pod operations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveProfile`] when nothing is active yet.
    pub fn active_context(&self) -> Result<ProfileContext, Error> {
        let key = self.active_profile.context(error::NoActiveProfileSnafu)?;
        self.context_for(key)
    }

    /// Builds the context for a specific profile without changing the active
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProfile`] if no profile with `key` exists.
    pub fn context_for(&self, key: ProfileKind) -> Result<ProfileContext, Error> {
        let profile = self.find_profile(key).cloned().with_context(|| {
            error::UnknownProfileSnafu { key: key.to_string(), available: self.available_names() }
        })?;
        Ok(ProfileContext { profile, deployment_prefix: self.deployment_prefix.clone() })
    }

    fn available_names(&self) -> Vec<String> {
        self.profiles.iter().map(|profile| profile.key.to_string()).collect()
    }
}

fn resolve(path: &Path) -> Result<PathBuf, Error> {
    path.try_resolve()
        .map(|path| path.to_path_buf())
        .with_context(|_| error::ResolveFilePathSnafu { file_path: path.to_path_buf() })
}

fn default_deployment_prefix() -> String { consts::DEFAULT_DEPLOYMENT_PREFIX.to_string() }
