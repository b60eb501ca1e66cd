//! rcv-schemas
//!
//! Records exchanged with the receiving service and the identity types built
//! from them. No behavior beyond field-level helpers lives here.

mod exception;
pub mod format;
mod keys;
mod records;
mod unit;
mod waybill;

pub use exception::{ExceptionRecord, ExceptionType};
pub use keys::{ExceptionKey, ParentRef, UnitKey, UnitKind, UnitRef};
pub use records::{PalletHeader, PoHeader, PoItem, ReceivableRecord, UnitRecord};
pub use unit::ReceivableUnit;
pub use waybill::{
    DriverCheckIn, Waybill, ACTION_DGR, ACTION_DONE, ACTION_RETURNS, ACTION_RGR,
    ENTRY_STATUS_COMPLETE, ENTRY_STATUS_IN_TRANSIT, ENTRY_STATUS_PENDING,
};
