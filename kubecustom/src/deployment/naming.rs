use crate::{
    config::{ProfileContext, is_name_fragment, is_name_segment},
    deployment::{Error, error},
};

/// Longest name usable as a label value, which the instance label requires.
const MAX_NAME_LENGTH: usize = 63;

/// Derives `<prefix>-<cluster user id>-<profile key>-<tag>`.
///
/// The result depends only on the context and the tag, and differs between
/// users, profiles and tags sharing a namespace. Prefix and user id carry no
/// '-' and profile keys come from a closed set, so a name splits back into
/// its parts in exactly one way.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the prefix or user id contains anything
/// but lowercase letters and digits, if the tag is not a DNS-1123 label
/// fragment, or if the resulting name is too long for a label value.
pub fn deployment_name(context: &ProfileContext, tag: &str) -> Result<String, Error> {
    for (field, value) in [
        ("deploymentPrefix", &context.deployment_prefix),
        ("clusterUserId", &context.profile.cluster_user_id),
    ] {
        if !is_name_segment(value) {
            return error::ValidationSnafu {
                field,
                reason: format!("'{value}' may only contain lowercase letters and digits"),
            }
            .fail();
        }
    }
    if !is_name_fragment(tag) {
        return error::ValidationSnafu {
            field: "tag",
            reason: format!(
                "'{tag}' may only contain lowercase letters, digits and '-', and must start and \
                 end with a letter or digit"
            ),
        }
        .fail();
    }

    let name = format!(
        "{}-{}-{}-{tag}",
        context.deployment_prefix, context.profile.cluster_user_id, context.profile.key
    );
    if name.len() > MAX_NAME_LENGTH {
        return error::ValidationSnafu {
            field: "tag",
            reason: format!("deployment name '{name}' is longer than {MAX_NAME_LENGTH} characters"),
        }
        .fail();
    }
    Ok(name)
}
