use std::path::Path;

use snafu::ResultExt;

use crate::{
    config::ProfileKind,
    template::{Error, Template, error},
};

const DEPLOYMENT_FILE: &str = "deployment.yaml";
const SECRET_FILE: &str = "secret.yaml";

const DEPLOYMENT: &str = include_str!("../../templates/deployment.yaml");

const fn builtin_secret(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::QcaPsi4 => include_str!("../../templates/qca-psi4/secret.yaml"),
        ProfileKind::QcaXtb => include_str!("../../templates/qca-xtb/secret.yaml"),
        ProfileKind::QcaAni => include_str!("../../templates/qca-ani/secret.yaml"),
        ProfileKind::QcaOpenmm => include_str!("../../templates/qca-openmm/secret.yaml"),
    }
}

/// The deployment and secret templates of one profile kind.
#[derive(Clone, Debug)]
pub struct ManifestTemplates {
    pub deployment: Template,
    pub secret: Template,
}

impl ManifestTemplates {
    /// The templates compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if a built-in template is malformed.
    pub fn builtin(kind: ProfileKind) -> Result<Self, Error> {
        Ok(Self {
            deployment: Template::parse(format!("{kind}/{DEPLOYMENT_FILE}"), DEPLOYMENT)?,
            secret: Template::parse(format!("{kind}/{SECRET_FILE}"), builtin_secret(kind))?,
        })
    }

    /// Loads `<directory>/<key>/deployment.yaml` and
    /// `<directory>/<key>/secret.yaml` where they exist, falling back to the
    /// built-in template for each missing file.
    ///
    /// # Errors
    ///
    /// Returns an error if an override exists but cannot be read or parsed.
    pub fn load(kind: ProfileKind, directory: Option<&Path>) -> Result<Self, Error> {
        let builtin = Self::builtin(kind)?;
        let Some(directory) = directory else {
            return Ok(builtin);
        };
        let directory = directory.join(kind.as_str());
        Ok(Self {
            deployment: load_override(&directory.join(DEPLOYMENT_FILE))?
                .unwrap_or(builtin.deployment),
            secret: load_override(&directory.join(SECRET_FILE))?.unwrap_or(builtin.secret),
        })
    }
}

fn load_override(path: &Path) -> Result<Option<Template>, Error> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .context(error::ReadTemplateSnafu { path: path.to_path_buf() })?;
    tracing::debug!("using template override {}", path.display());
    Template::parse(path.display().to_string(), &text).map(Some)
}
