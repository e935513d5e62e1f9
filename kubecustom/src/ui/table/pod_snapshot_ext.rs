use comfy_table::Cell;

use crate::{
    consts::NONE_MARKER,
    inspector::{ContainerStatusSummary, PodSnapshot},
    ui::table::new_table,
};

pub trait PodSnapshotsExt {
    /// One row per pod. Missing usage and statuses show the `none` marker.
    fn render_table(&self) -> String;
}

fn amount(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| NONE_MARKER.to_string(), |value| format!("{value:.precision$}"))
}

fn phase(status: Option<&ContainerStatusSummary>) -> String {
    status.map_or_else(|| NONE_MARKER.to_string(), |status| status.phase.to_string())
}

fn reason(status: Option<&ContainerStatusSummary>) -> &str {
    status.map_or(NONE_MARKER, |status| status.reason.as_str())
}

impl PodSnapshotsExt for Vec<PodSnapshot> {
    fn render_table(&self) -> String {
        let rows = self.iter().map(|pod| {
            [
                Cell::new(&pod.pod_name),
                Cell::new(pod.restart_count),
                Cell::new(amount(pod.memory_gb, 2)),
                Cell::new(amount(pod.cpus, 3)),
                Cell::new(phase(pod.current.as_ref())),
                Cell::new(reason(pod.current.as_ref())),
                Cell::new(phase(pod.previous.as_ref())),
                Cell::new(reason(pod.previous.as_ref())),
            ]
        });

        new_table([
            "NAME",
            "RESTARTS",
            "MEMORY (GB)",
            "CPUS",
            "PHASE",
            "STATUS",
            "PREVIOUS PHASE",
            "PREVIOUS STATUS",
        ])
        .add_rows(rows)
        .to_string()
    }
}
