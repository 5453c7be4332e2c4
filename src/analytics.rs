use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::ApiError, models::ProductCounters, repository::Repository};

/// CounterKind
///
/// The three per-product analytics counters: a detail-page view and the two outbound
/// shop clicks. Serialized lowercase in tracking payloads ("view" | "coupang" | "naver").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CounterKind {
    #[default]
    View,
    Coupang,
    Naver,
}

impl CounterKind {
    /// Wire name of the counter, as passed to the server-side increment procedure.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Coupang => "coupang",
            Self::Naver => "naver",
        }
    }

    /// apply
    ///
    /// Applies this increment to a counter snapshot. Outbound clicks also bump the
    /// aggregate `total_clicks`; views do not contribute to it.
    pub fn apply(self, counters: &mut ProductCounters) {
        match self {
            Self::View => counters.view_count += 1,
            Self::Coupang => {
                counters.coupang_clicks += 1;
                counters.total_clicks += 1;
            }
            Self::Naver => {
                counters.naver_clicks += 1;
                counters.total_clicks += 1;
            }
        }
    }
}

/// record_click
///
/// Increments one analytics counter for a product.
///
/// Primary path: a single atomic server-side increment (the `increment_product_counter`
/// procedure). Fallback path, taken when the procedure fails (e.g. it is not defined
/// on the backend): read the current counters, apply the increment, write them back.
///
/// The fallback is a plain read-modify-write with no transaction around it, so
/// concurrent increments during the fallback can lose updates. Counters are a
/// non-critical analytics approximation; lost increments are tolerated rather than
/// coordinated away.
pub async fn record_click(
    repo: &dyn Repository,
    product_id: Uuid,
    kind: CounterKind,
) -> Result<(), ApiError> {
    match repo.increment_counter_atomic(product_id, kind).await {
        Ok(true) => return Ok(()),
        // The procedure ran and found no such product.
        Ok(false) => return Err(ApiError::NotFound),
        Err(e) => {
            tracing::warn!(
                product_id = %product_id,
                "atomic counter increment unavailable, using fallback: {:?}",
                e
            );
        }
    }

    // Fallback: non-transactional read-modify-write.
    let mut counters = repo
        .get_counters(product_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    kind.apply(&mut counters);

    if repo.put_counters(product_id, counters).await? {
        Ok(())
    } else {
        // The product vanished between read and write.
        Err(ApiError::NotFound)
    }
}
