use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use rcv_receiving::check_in_waybill;
use rcv_schemas::DriverCheckIn;

use super::{batch_policy, build_service, load_config, notifier, SourceArgs};

/// What the driver reports at the dock.
#[derive(Args, Debug)]
pub struct ArrivalArgs {
    /// Seal number read off the trailer
    #[arg(long)]
    pub seal: String,

    #[arg(long, default_value_t = false)]
    pub seal_intact: bool,

    #[arg(long, default_value_t = false)]
    pub seal_decertify: bool,

    /// Arrival time (RFC 3339); defaults to now
    #[arg(long)]
    pub arrived_at: Option<DateTime<Utc>>,

    /// Reference number handed to the driver
    #[arg(long = "ref")]
    pub ref_number: Option<String>,
}

impl ArrivalArgs {
    fn to_check_in(&self) -> DriverCheckIn {
        DriverCheckIn {
            arrived_at: self.arrived_at.unwrap_or_else(Utc::now),
            seal_nbr_site: self.seal.trim().to_string(),
            seal_intact: self.seal_intact,
            seal_decertify: self.seal_decertify,
            ref_number: self.ref_number.clone(),
        }
    }
}

/// Check the driver in and print the written header fields.
pub async fn run(source: &SourceArgs, arrival: &ArrivalArgs) -> Result<()> {
    let cfg = load_config(&source.config_paths)?;
    let service = build_service(source, &cfg)?;
    let notices = notifier(&batch_policy(&cfg));

    let saved = check_in_waybill(
        service.as_ref(),
        notices.as_ref(),
        &source.store,
        &source.waybill,
        &arrival.to_check_in(),
    )
    .await
    .with_context(|| format!("check in waybill {}/{}", source.store, source.waybill))?;

    println!(
        "entry_status={} action_code={} seal_match={}",
        saved.entry_status,
        saved.action_code,
        saved.seal_matches()
    );
    if let Some(r) = arrival.ref_number.as_deref().filter(|r| !r.trim().is_empty()) {
        println!("ref_number={r}");
    }
    Ok(())
}
