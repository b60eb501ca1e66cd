use rcv_schemas::{ExceptionKey, ParentRef, UnitKey, UnitKind};

pub const WAYBILL_SET: &str = "BOLSet";
pub const PURCHASE_ORDER_SET: &str = "POHeaderSet";
pub const EXCEPTION_SET: &str = "ExceptionSet";

/// `/<set>(K1='v1',K2='v2')` with embedded single quotes doubled.
pub fn key_path(entity_set: &str, fields: &[(&str, &str)]) -> String {
    let keys: Vec<String> = fields
        .iter()
        .map(|(name, value)| format!("{name}='{}'", value.replace('\'', "''")))
        .collect();
    format!("/{entity_set}({})", keys.join(","))
}

pub fn waybill_path(store_id: &str, waybill_nbr: &str) -> String {
    key_path(
        WAYBILL_SET,
        &[("StoreID", store_id), ("WayBillNbr", waybill_nbr)],
    )
}

pub fn unit_path(key: &UnitKey) -> String {
    let fields = key.key_fields();
    let borrowed: Vec<(&str, &str)> = fields.iter().map(|(n, v)| (*n, v.as_str())).collect();
    key_path(key.kind().entity_set(), &borrowed)
}

pub fn exception_path(key: &ExceptionKey) -> String {
    key_path(
        EXCEPTION_SET,
        &[
            ("StoreID", key.store_id.as_str()),
            ("WayBillNbr", key.waybill_nbr.as_str()),
            ("Pallet", key.pallet.as_str()),
            ("PONbr", key.po_nbr.as_str()),
            ("ItemID", key.item_id.as_str()),
            ("Article", key.article.as_str()),
        ],
    )
}

pub fn exceptions_path(store_id: &str, waybill_nbr: &str) -> String {
    format!("{}/Exceptions", waybill_path(store_id, waybill_nbr))
}

/// Navigation from a parent to its children of `kind`. `None` when the
/// service has no such association.
pub fn children_path(parent: &ParentRef, kind: UnitKind) -> Option<String> {
    match (parent, kind) {
        (
            ParentRef::Waybill {
                store_id,
                waybill_nbr,
            },
            UnitKind::Pallet,
        ) => Some(format!("{}/Pallets", waybill_path(store_id, waybill_nbr))),
        (
            ParentRef::Waybill {
                store_id,
                waybill_nbr,
            },
            UnitKind::PurchaseOrder,
        ) => Some(format!("{}/POHeaders", waybill_path(store_id, waybill_nbr))),
        (
            ParentRef::PurchaseOrder {
                store_id,
                waybill_nbr,
                po_nbr,
            },
            UnitKind::Article,
        ) => Some(format!(
            "{}/POItems",
            key_path(
                PURCHASE_ORDER_SET,
                &[
                    ("StoreID", store_id.as_str()),
                    ("WayBillNbr", waybill_nbr.as_str()),
                    ("PONbr", po_nbr.as_str()),
                ],
            )
        )),
        _ => None,
    }
}
