use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, SystemClock};
use tracing::{debug, instrument, warn};

use super::{Coupon, CouponError};
use crate::money::Money;
use crate::repository::CouponStore;

/// Validates coupons and keeps their usage counts.
#[derive(Clone)]
pub struct CouponLedger<C> {
    store: C,
    clock: Arc<dyn Clock>,
}

impl<C: CouponStore> CouponLedger<C> {
    pub fn new(store: C) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: C, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// Looks up a redeemable coupon. An empty or absent code means no coupon.
    #[instrument(skip(self))]
    pub async fn validate_and_fetch(
        &self,
        code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, CouponError> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let coupon = self
            .store
            .find_by_code(code)
            .await?
            .ok_or_else(|| CouponError::NotFound {
                code: code.to_string(),
            })?;

        coupon.ensure_usable(now)?;
        Ok(Some(coupon))
    }

    pub fn compute_discount(&self, coupon: &Coupon, base: Money) -> Money {
        coupon.calculate_discount(base)
    }

    pub fn can_apply(&self, coupon: &Coupon, base: Money) -> bool {
        coupon.can_apply_to(base)
    }

    /// Records one redemption in a single atomic store update. Fails with
    /// `Exhausted` rather than pass the cap.
    #[instrument(skip(self, coupon), fields(code = %coupon.code()))]
    pub async fn commit(&self, coupon: &Coupon) -> Result<Coupon, CouponError> {
        let now = self.clock.now();
        let updated = self
            .store
            .modify(coupon.code(), move |stored: &mut Coupon| {
                stored.record_usage(now)?;
                Ok(stored.clone())
            })
            .await?;

        metrics::counter!("coupon_commits_total").increment(1);
        debug!(usage_count = updated.usage_count(), "Coupon usage committed");
        Ok(updated)
    }

    /// Takes back one redemption. A coupon deleted in the meantime is not an
    /// error; the count never drops below zero.
    #[instrument(skip(self))]
    pub async fn rollback(&self, code: &str) -> Result<(), CouponError> {
        let now = self.clock.now();
        match self
            .store
            .modify(code, move |stored: &mut Coupon| Ok(stored.release_usage(now)))
            .await
        {
            Ok(true) => {
                metrics::counter!("coupon_rollbacks_total").increment(1);
                debug!("Coupon usage rolled back");
                Ok(())
            }
            Ok(false) => {
                warn!("Coupon usage already at zero, nothing to roll back");
                Ok(())
            }
            Err(CouponError::NotFound { .. }) => {
                warn!("Coupon vanished before rollback");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
