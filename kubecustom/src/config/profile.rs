use serde::{Deserialize, Serialize};

use crate::config::{ProfileKind, error, error::Error};

/// One named bundle of cluster, credential and image settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub key: ProfileKind,

    /// Username written into the mounted secret.
    #[serde(default)]
    pub username: String,

    /// Password written into the mounted secret.
    #[serde(default)]
    pub password: String,

    /// Short identifier of the person owning the deployments, embedded in
    /// every deployment name.
    #[serde(default)]
    pub cluster_user_id: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub container_name: String,

    #[serde(default)]
    pub container_image: String,

    #[serde(default)]
    pub cluster_name: String,

    /// Storage class of the persistent volume claims created with this
    /// profile. The cluster default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

impl Profile {
    /// Checks that every field is present and that `cluster_user_id` is a
    /// single segment of a Kubernetes object name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("username", &self.username),
            ("password", &self.password),
            ("clusterUserId", &self.cluster_user_id),
            ("namespace", &self.namespace),
            ("containerName", &self.container_name),
            ("containerImage", &self.container_image),
            ("clusterName", &self.cluster_name),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return error::ValidationSnafu {
                key: self.key.to_string(),
                field: (*field).to_string(),
                reason: "it is missing or empty",
            }
            .fail();
        }

        // Deployment names join the user id with '-', so it must not contain one.
        if !is_name_segment(&self.cluster_user_id) {
            return error::ValidationSnafu {
                key: self.key.to_string(),
                field: "clusterUserId",
                reason: "only lowercase letters and digits are allowed",
            }
            .fail();
        }

        Ok(())
    }
}

/// The profile every naming and API call of one invocation works with.
///
/// Passed explicitly to the deployment manager and the pod inspector instead
/// of being read from process-wide state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileContext {
    pub profile: Profile,
    pub deployment_prefix: String,
}

impl ProfileContext {
    #[must_use]
    pub fn namespace(&self) -> &str { &self.profile.namespace }

    /// Resolves an optional namespace override against the profile.
    #[must_use]
    pub fn namespace_or(&self, namespace: Option<String>) -> String {
        namespace.filter(|s| !s.is_empty()).unwrap_or_else(|| self.profile.namespace.clone())
    }
}

/// Returns true for non-empty strings of lowercase letters and digits, which
/// can be joined with '-' without becoming ambiguous.
#[must_use]
pub fn is_name_segment(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Returns true for strings usable inside a DNS-1123 label.
#[must_use]
pub fn is_name_fragment(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-')
}
