//! Kubernetes names used by kubecustom.

pub mod labels {
    //! Kubernetes labels stamped on deployments, secrets and pod templates.

    /// The `app.kubernetes.io/managed-by` label, set to `kubecustom`.
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";

    /// The `app.kubernetes.io/instance` label, set to the deployment name.
    /// Used to find pods of a deployment that no longer exists.
    pub const INSTANCE: &str = "app.kubernetes.io/instance";

    /// Node label matched by the exclusion affinity.
    pub const HOSTNAME: &str = "kubernetes.io/hostname";
}

pub mod annotations {
    //! Kubernetes annotations written by kubecustom.

    /// Lower cost pods are removed first when a ReplicaSet scales down.
    pub const POD_DELETION_COST: &str = "controller.kubernetes.io/pod-deletion-cost";
}

pub mod reasons {
    /// Reason reported for a container in the running state.
    pub const RUNNING: &str = "Running";
}

pub mod volumes {
    /// Access mode of every claim created by kubecustom, so the replicas of
    /// a deployment can share it.
    pub const ACCESS_MODE: &str = "ReadWriteMany";

    /// Phase of a claim that has a volume.
    pub const BOUND_PHASE: &str = "Bound";
}
