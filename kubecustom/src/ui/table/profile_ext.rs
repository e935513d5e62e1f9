use comfy_table::Cell;

use crate::{config::Config, ui::table::new_table};

pub trait ProfileTableExt {
    /// Lists the configured profiles, marking the active one. Passwords are
    /// never printed.
    fn render_table(&self) -> String;
}

impl ProfileTableExt for Config {
    fn render_table(&self) -> String {
        let rows = self.profiles.iter().map(|profile| {
            let active = if self.active_profile == Some(profile.key) { "*" } else { "" };
            [
                Cell::new(active),
                Cell::new(profile.key),
                Cell::new(&profile.cluster_user_id),
                Cell::new(&profile.namespace),
                Cell::new(&profile.cluster_name),
                Cell::new(&profile.container_name),
                Cell::new(&profile.container_image),
            ]
        });

        new_table(["ACTIVE", "KEY", "USER", "NAMESPACE", "CLUSTER", "CONTAINER", "IMAGE"])
            .add_rows(rows)
            .to_string()
    }
}
