//! Driver check-in for shipments still flagged in transit.
//!
//! Runs before a waybill screen is opened, so it works on the service
//! directly instead of through a [`crate::WaybillController`].

use rcv_schemas::{DriverCheckIn, Waybill};
use tracing::{info, warn};

use crate::controller::ReceivingError;
use crate::notice::{Notice, Notifier};
use crate::service::ReceivingService;

/// Read the waybill, record the driver's arrival and write it back.
///
/// Refused with [`ReceivingError::NotInTransit`] when the shipment was
/// already checked in; nothing is written then.
pub async fn check_in_waybill(
    service: &dyn ReceivingService,
    notifier: &dyn Notifier,
    store_id: &str,
    waybill_nbr: &str,
    check_in: &DriverCheckIn,
) -> Result<Waybill, ReceivingError> {
    let mut waybill = service
        .read_waybill(store_id, waybill_nbr)
        .await
        .map_err(ReceivingError::Remote)?;

    if !waybill.check_in(check_in) {
        info!(
            store_id,
            waybill_nbr,
            entry_status = %waybill.entry_status,
            "check-in not required"
        );
        notifier.notify(Notice::CheckInNotRequired {
            store_id: store_id.to_string(),
            waybill_nbr: waybill_nbr.to_string(),
        });
        return Err(ReceivingError::NotInTransit {
            entry_status: waybill.entry_status,
        });
    }

    let saved = match service.update_waybill(&waybill).await {
        Ok(saved) => saved,
        Err(err) => {
            warn!(store_id, waybill_nbr, error = %err, "check-in failed");
            notifier.notify(Notice::CheckInFailed {
                store_id: store_id.to_string(),
                waybill_nbr: waybill_nbr.to_string(),
                message: err.user_message(),
            });
            return Err(ReceivingError::Remote(err));
        }
    };

    info!(
        store_id,
        waybill_nbr,
        seal_match = saved.seal_matches(),
        service = service.name(),
        "driver checked in"
    );
    notifier.notify(Notice::CheckedIn {
        store_id: saved.store_id.clone(),
        waybill_nbr: saved.waybill_nbr.clone(),
        seal_match: saved.seal_matches(),
        ref_number: check_in.ref_number.clone().filter(|r| !r.trim().is_empty()),
    });
    Ok(saved)
}
