use comfy_table::Cell;

use crate::{inspector::UtilizationRecord, ui::table::new_table};

pub trait UtilizationExt {
    fn render_table(&self) -> String;
}

fn percent(value: f64) -> String { format!("{value:.1}") }

impl UtilizationExt for Vec<UtilizationRecord> {
    fn render_table(&self) -> String {
        let rows = self.iter().map(|record| {
            [
                Cell::new(&record.deployment_name),
                Cell::new(record.replicas),
                Cell::new(percent(record.memory.mean)),
                Cell::new(percent(record.memory.min)),
                Cell::new(percent(record.memory.max)),
                Cell::new(format!("{:.1}G", record.memory_request_gb)),
                Cell::new(percent(record.cpu.mean)),
                Cell::new(percent(record.cpu.min)),
                Cell::new(percent(record.cpu.max)),
                Cell::new(format!("{:.2}", record.cpu_request)),
            ]
        });

        new_table([
            "DEPLOYMENT",
            "REPLICAS",
            "AVG MEM %",
            "MIN MEM %",
            "MAX MEM %",
            "MEM REQ",
            "AVG CPU %",
            "MIN CPU %",
            "MAX CPU %",
            "CPU REQ",
        ])
        .add_rows(rows)
        .to_string()
    }
}
