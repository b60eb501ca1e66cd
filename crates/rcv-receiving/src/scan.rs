use rcv_reconcile::{classify_code, Bucket, BucketedCollection, ReviewState};
use rcv_schemas::{UnitKey, Waybill};
use serde::Serialize;

/// Where a scanned barcode takes the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "key", rename_all = "snake_case")]
pub enum ScanRoute {
    /// Open the submit dialog for the unit.
    OpenSubmitDialog(UnitKey),
    /// Navigate to the unit's detail screen.
    NavigateToDetail(UnitKey),
    /// Open the article detail dialog.
    OpenArticle(UnitKey),
    NotFound,
}

/// Route a scan on the waybill screen.
///
/// Sealed shipments match pallets: a pallet waiting for review opens the
/// submit dialog, anything else navigates to the pallet. Otherwise POs
/// match: a PO waiting for secondary review navigates to its articles,
/// anything else opens the submit dialog.
pub fn route_waybill_scan(
    waybill: &Waybill,
    primary: &BucketedCollection,
    query: &str,
) -> ScanRoute {
    let Some(unit) = primary.find_by_label(Bucket::All, query) else {
        return ScanRoute::NotFound;
    };
    let state = classify_code(unit.status_code());
    let key = unit.key.clone();

    if waybill.is_pallet_driven() {
        match state {
            Some(ReviewState::NeedsReview) => ScanRoute::OpenSubmitDialog(key),
            _ => ScanRoute::NavigateToDetail(key),
        }
    } else {
        match state {
            Some(ReviewState::NeedsSecondaryReview) => ScanRoute::NavigateToDetail(key),
            _ => ScanRoute::OpenSubmitDialog(key),
        }
    }
}

/// Route an article scan on the PO screen: articles waiting for secondary
/// review first, then complete ones.
pub fn route_article_scan(articles: &BucketedCollection, article: &str) -> ScanRoute {
    [Bucket::NeedsSecondaryReview, Bucket::Complete]
        .into_iter()
        .find_map(|b| articles.find_by_article(b, article))
        .map(|u| ScanRoute::OpenArticle(u.key.clone()))
        .unwrap_or(ScanRoute::NotFound)
}
