pub mod k8s;

/// Prefix placed in front of every derived deployment name unless the
/// configuration file says otherwise.
pub const DEFAULT_DEPLOYMENT_PREFIX: &str = "openff";

/// Replica count used by `create` when none is given.
pub const DEFAULT_REPLICAS: u32 = 2;

/// A running pod using less than this many cores is considered idle.
pub const ACTIVE_CPU_THRESHOLD: f64 = 0.01;

/// Upper bound on concurrent pod deletions.
pub const MAX_CONCURRENT_DELETIONS: usize = 5;

/// Deletion cost given to the pods picked for removal before scaling down.
pub const SCALE_DOWN_POD_DELETION_COST: &str = "-100";

/// Marker printed in tables where a value is unavailable.
pub const NONE_MARKER: &str = "none";

/// File names used when recording rendered manifests in the artifact
/// directory.
pub const RENDERED_DEPLOYMENT_FILE: &str = "deployment.yaml";
pub const RENDERED_SECRET_FILE: &str = "secret.yaml";

/// Seconds between two reports of `utilization --watch`.
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 20;

/// Status reason targeted by `prune` when none is given.
pub const DEFAULT_PRUNE_STATUS: &str = "ContainerCreating";

/// Storage requested by `pvc create` when none is given, in terabytes.
pub const DEFAULT_PVC_STORAGE_TB: f64 = 2.0;

/// Seconds `pvc create` waits for a claim to be bound.
pub const DEFAULT_PVC_TIMEOUT_SECS: u64 = 1000;

/// Seconds between two reads of a claim that is not bound yet.
pub const DEFAULT_PVC_POLL_INTERVAL_SECS: u64 = 5;
