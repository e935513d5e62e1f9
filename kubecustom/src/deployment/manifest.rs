use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        core::v1::{
            Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm,
            PodSpec, Secret,
        },
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};

use crate::{PROJECT_NAME, consts::k8s::labels};

fn stamp(metadata: &mut ObjectMeta, name: &str) {
    let labels = metadata.labels.get_or_insert_with(BTreeMap::new);
    let _previous = labels.insert(labels::MANAGED_BY.to_string(), PROJECT_NAME.to_string());
    let _previous = labels.insert(labels::INSTANCE.to_string(), name.to_string());
}

/// Pins name and namespace and adds the ownership labels to the secret.
pub fn stamp_secret(secret: &mut Secret, name: &str, namespace: &str) {
    secret.metadata.name = Some(name.to_string());
    secret.metadata.namespace = Some(namespace.to_string());
    stamp(&mut secret.metadata, name);
}

/// Pins name and namespace and adds the ownership labels to the deployment
/// and its pod template.
pub fn stamp_deployment(deployment: &mut Deployment, name: &str, namespace: &str) {
    deployment.metadata.name = Some(name.to_string());
    deployment.metadata.namespace = Some(namespace.to_string());
    stamp(&mut deployment.metadata, name);
    if let Some(spec) = deployment.spec.as_mut() {
        stamp(spec.template.metadata.get_or_insert_with(ObjectMeta::default), name);
    }
}

/// Keeps the pods of `deployment` off the given nodes.
pub fn exclude_nodes(deployment: &mut Deployment, nodes: &[String]) {
    if nodes.is_empty() {
        return;
    }
    let Some(spec) = deployment.spec.as_mut() else {
        return;
    };

    let requirement = NodeSelectorRequirement {
        key: labels::HOSTNAME.to_string(),
        operator: "NotIn".to_string(),
        values: Some(nodes.to_vec()),
    };
    let pod_spec = spec.template.spec.get_or_insert_with(PodSpec::default);
    let node_affinity = pod_spec
        .affinity
        .get_or_insert_with(Affinity::default)
        .node_affinity
        .get_or_insert_with(NodeAffinity::default);
    let selector = node_affinity
        .required_during_scheduling_ignored_during_execution
        .get_or_insert_with(NodeSelector::default);

    // Terms are ORed, so the exclusion has to be part of every term.
    if selector.node_selector_terms.is_empty() {
        selector.node_selector_terms.push(NodeSelectorTerm::default());
    }
    for term in &mut selector.node_selector_terms {
        term.match_expressions.get_or_insert_with(Vec::new).push(requirement.clone());
    }
}
