use serde::{Deserialize, Serialize};

use crate::keys::{ExceptionKey, ParentRef, UnitKey, UnitKind};
use crate::records::UnitRecord;

/// A receivable unit as held in a bucketed collection.
///
/// Key, parent and exception key are derived from the record once at load
/// time; `busy` is local state and never sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivableUnit {
    pub key: UnitKey,
    pub parent: ParentRef,
    pub exception_key: ExceptionKey,
    pub record: UnitRecord,
    #[serde(default)]
    pub busy: bool,
}

impl ReceivableUnit {
    pub fn kind(&self) -> UnitKind {
        self.key.kind()
    }

    pub fn status_code(&self) -> &str {
        self.record.status()
    }

    pub fn set_status_code(&mut self, code: &str) {
        self.record.set_status(code);
    }

    pub fn open_qty(&self) -> Option<i64> {
        self.record.open_qty()
    }
}

impl From<UnitRecord> for ReceivableUnit {
    fn from(record: UnitRecord) -> Self {
        Self {
            key: record.key(),
            parent: record.parent(),
            exception_key: record.exception_key(),
            record,
            busy: false,
        }
    }
}
