use anyhow::{Context, Result};
use futures_util::future::join_all;
use rcv_reconcile::Bucket;
use rcv_receiving::{CollectionId, Submission, WaybillController};
use rcv_schemas::UnitKey;
use tracing::info;

use super::{batch_policy, build_service, load_config, notifier, SourceArgs};

/// Submit every open unit of one collection concurrently and print how each
/// resolved.
///
/// Without `po_nbr` the waybill's primary collection is replayed; with it,
/// the articles of that PO.
pub async fn run(source: &SourceArgs, po_nbr: Option<&str>, include_secondary: bool) -> Result<()> {
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

    let pallet_driven = ctl.waybill().await?.is_pallet_driven();
    let id = match po_nbr {
        Some(po) => {
            ctl.load_articles(po)
                .await
                .with_context(|| format!("load articles of PO {po}"))?;
            CollectionId::Articles {
                po_nbr: po.to_string(),
            }
        }
        None if pallet_driven => CollectionId::Pallets,
        None => CollectionId::PurchaseOrders,
    };

    let snapshot = ctl.snapshot().await?;
    let collection = match &id {
        CollectionId::Pallets => snapshot.pallets,
        CollectionId::PurchaseOrders => snapshot.purchase_orders,
        CollectionId::Articles { po_nbr } => snapshot.articles.get(po_nbr).cloned(),
    }
    .with_context(|| format!("{id} not loaded"))?;

    let mut buckets = vec![Bucket::NeedsReview];
    if include_secondary {
        buckets.push(Bucket::NeedsSecondaryReview);
    }
    let targets: Vec<UnitKey> = buckets
        .iter()
        .filter_map(|b| collection.buckets.get(b))
        .flatten()
        .map(|u| u.key.clone())
        .collect();
    info!(collection = %id, units = targets.len(), "replaying submissions");

    let results = join_all(targets.iter().map(|key| ctl.submit(key))).await;
    for (key, result) in targets.iter().zip(results) {
        match result {
            Ok(Submission::Applied { report, escalation }) => {
                println!(
                    "unit={} from={} to={}",
                    key,
                    report.from.bucket(),
                    report.to.bucket()
                );
                if let Some(po) = escalation.purchase_order {
                    println!("purchase_order_complete={}", po.label());
                }
            }
            Ok(Submission::Discarded { .. }) => println!("unit={key} discarded=true"),
            Err(err) => println!("unit={key} refused={err}"),
        }
    }

    let counts = ctl.counts(&id).await?;
    println!(
        "counts all={} needs_review={} needs_secondary_review={} complete={}",
        counts.all, counts.needs_review, counts.needs_secondary_review, counts.complete
    );
    println!("waybill_complete={}", ctl.waybill().await?.is_complete());
    ctl.close().await;
    Ok(())
}
