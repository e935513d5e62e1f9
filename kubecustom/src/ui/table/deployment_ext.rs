use comfy_table::Cell;

use crate::{consts::NONE_MARKER, deployment::DeploymentSummary, ui::table::new_table};

pub trait DeploymentSummaryExt {
    fn render_table(&self) -> String;
}

impl DeploymentSummaryExt for Vec<DeploymentSummary> {
    fn render_table(&self) -> String {
        let rows = self.iter().map(|summary| {
            let (cpus, memory) = summary.request.map_or_else(
                || (NONE_MARKER.to_string(), NONE_MARKER.to_string()),
                |request| (format!("{:.2}", request.cpus), format!("{:.1}G", request.memory_gb)),
            );
            [
                Cell::new(&summary.name),
                Cell::new(format!("{}/{}", summary.ready, summary.desired)),
                Cell::new(cpus),
                Cell::new(memory),
            ]
        });

        new_table(["NAME", "READY", "CPU REQ", "MEM REQ"]).add_rows(rows).to_string()
    }
}
