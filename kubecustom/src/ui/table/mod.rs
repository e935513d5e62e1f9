//! Plain-text tables for the command-line output.

mod deployment_ext;
mod pod_snapshot_ext;
mod profile_ext;
mod utilization_ext;

pub use self::{
    deployment_ext::DeploymentSummaryExt, pod_snapshot_ext::PodSnapshotsExt,
    profile_ext::ProfileTableExt, utilization_ext::UtilizationExt,
};

fn new_table<const N: usize>(header: [&str; N]) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    let _table = table
        .load_preset(comfy_table::presets::NOTHING)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .set_header(header);
    table
}
