use std::time::Duration;

use clap::Args;
use snafu::ResultExt;

use crate::{
    cli::{Error, error, write_stdout},
    cluster::Cluster,
    config::ProfileContext,
    consts::DEFAULT_WATCH_INTERVAL_SECS,
    inspector::PodInspector,
    ui::table::UtilizationExt,
};

#[derive(Args, Clone)]
pub struct UtilizationCommand {
    #[arg(short, long, help = "Namespace to inspect. Defaults to the namespace of the profile.")]
    pub namespace: Option<String>,

    #[arg(short, long, help = "Only report deployments whose name contains this string")]
    pub keep_key: Option<String>,

    #[arg(short, long, help = "Log deployments that are left out of the report")]
    pub verbose: bool,

    #[arg(short, long, help = "Repeat the report until interrupted")]
    pub watch: bool,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_WATCH_INTERVAL_SECS,
        help = "Seconds between two reports when watching"
    )]
    pub interval: u64,
}

impl UtilizationCommand {
    /// Prints the report once, or repeatedly until Ctrl-C when watching.
    pub async fn run<C: Cluster>(self, cluster: &C, context: &ProfileContext) -> Result<(), Error> {
        let inspector = PodInspector::new(cluster, context);
        if !self.watch {
            return self.report(&inspector).await;
        }

        let interval = Duration::from_secs(self.interval.max(1));
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        loop {
            tokio::select! {
                result = &mut interrupt => {
                    result.context(error::ListenInterruptSnafu)?;
                    tracing::info!("Interrupted, stop watching utilization");
                    return Ok(());
                }
                result = self.report(&inspector) => result?,
            }

            tokio::select! {
                result = &mut interrupt => {
                    result.context(error::ListenInterruptSnafu)?;
                    tracing::info!("Interrupted, stop watching utilization");
                    return Ok(());
                }
                () = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn report<C: Cluster>(&self, inspector: &PodInspector<'_, C>) -> Result<(), Error> {
        let records = inspector
            .utilization_per_deployment(
                self.namespace.as_deref(),
                self.keep_key.as_deref(),
                self.verbose,
            )
            .await?;
        write_stdout(&records.render_table()).await
    }
}
