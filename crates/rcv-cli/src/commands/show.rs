use anyhow::{Context, Result};
use rcv_receiving::WaybillController;

use super::{batch_policy, build_service, load_config, notifier, SourceArgs};

/// Open the waybill, load the articles of `po_nbrs` and print the screen as
/// JSON.
pub async fn run(source: &SourceArgs, po_nbrs: &[String]) -> Result<()> {
    let cfg = load_config(&source.config_paths)?;
    let service = build_service(source, &cfg)?;
    let policy = batch_policy(&cfg);
    let ctl = WaybillController::open(
        service,
        notifier(&policy),
        policy,
        &source.store,
        &source.waybill,
    )
    .await
    .with_context(|| format!("open waybill {}/{}", source.store, source.waybill))?;

    for po in po_nbrs {
        ctl.load_articles(po)
            .await
            .with_context(|| format!("load articles of PO {po}"))?;
    }

    let snapshot = ctl.snapshot().await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    ctl.close().await;
    Ok(())
}
