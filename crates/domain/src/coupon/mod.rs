//! Coupons and the usage ledger.

mod ledger;

pub use ledger::CouponLedger;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Errors that can occur during coupon operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon not found: {code}")]
    NotFound { code: String },

    #[error("Coupon {code} is outside its validity window")]
    Expired { code: String },

    #[error("Coupon {code} is inactive")]
    Inactive { code: String },

    #[error("Coupon {code} has reached its usage limit of {usage_limit}")]
    Exhausted { code: String, usage_limit: u32 },

    #[error("Coupon {code} requires a minimum order of {minimum}, got {actual}")]
    MinimumOrderNotMet {
        code: String,
        minimum: Money,
        actual: Money,
    },

    #[error("Invalid coupon: {reason}")]
    InvalidValue { reason: String },

    #[error("Coupon already exists: {code}")]
    AlreadyExists { code: String },
}

/// How a coupon reduces the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CouponDiscount {
    /// A flat amount off.
    Fixed(Money),
    /// A percentage (0..=100) off.
    Percentage(u32),
}

/// A discount code with a validity window and an optional usage cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    code: String,
    description: String,
    discount: CouponDiscount,
    minimum_order: Money,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    /// 0 means unlimited.
    usage_limit: u32,
    usage_count: u32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Creates an active, unlimited coupon valid for one year from `now`.
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        discount: CouponDiscount,
        now: DateTime<Utc>,
    ) -> Result<Self, CouponError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(CouponError::InvalidValue {
                reason: "code is required".into(),
            });
        }
        match discount {
            CouponDiscount::Percentage(p) if p > 100 => {
                return Err(CouponError::InvalidValue {
                    reason: format!("percentage {p} exceeds 100"),
                });
            }
            CouponDiscount::Fixed(amount) if amount.is_negative() => {
                return Err(CouponError::InvalidValue {
                    reason: format!("fixed discount {amount} is negative"),
                });
            }
            _ => {}
        }

        Ok(Self {
            code,
            description: description.into(),
            discount,
            minimum_order: Money::zero(),
            valid_from: now,
            valid_until: now + Duration::days(365),
            usage_limit: 0,
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_validity(
        mut self,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Result<Self, CouponError> {
        if valid_from > valid_until {
            return Err(CouponError::InvalidValue {
                reason: "validity window ends before it starts".into(),
            });
        }
        self.valid_from = valid_from;
        self.valid_until = valid_until;
        Ok(self)
    }

    pub fn with_usage_limit(mut self, usage_limit: u32) -> Self {
        self.usage_limit = usage_limit;
        self
    }

    pub fn with_minimum_order(mut self, minimum_order: Money) -> Self {
        self.minimum_order = minimum_order;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn discount(&self) -> CouponDiscount {
        self.discount
    }

    pub fn minimum_order(&self) -> Money {
        self.minimum_order
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    pub fn usage_limit(&self) -> u32 {
        self.usage_limit
    }

    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn is_exhausted(&self) -> bool {
        self.usage_limit > 0 && self.usage_count >= self.usage_limit
    }

    /// Checks the coupon can be redeemed at `now`: inside its window, active,
    /// and below its usage cap, checked in that order.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<(), CouponError> {
        if now < self.valid_from || now > self.valid_until {
            return Err(CouponError::Expired {
                code: self.code.clone(),
            });
        }
        if !self.is_active {
            return Err(CouponError::Inactive {
                code: self.code.clone(),
            });
        }
        if self.is_exhausted() {
            return Err(CouponError::Exhausted {
                code: self.code.clone(),
                usage_limit: self.usage_limit,
            });
        }
        Ok(())
    }

    /// Returns true if the base amount meets the minimum order.
    pub fn can_apply_to(&self, base: Money) -> bool {
        base >= self.minimum_order
    }

    /// Discount granted against `base`. Never negative, never above `base`.
    pub fn calculate_discount(&self, base: Money) -> Money {
        if !base.is_positive() {
            return Money::zero();
        }
        match self.discount {
            CouponDiscount::Fixed(amount) => amount.min(base),
            CouponDiscount::Percentage(percent) => base.percent(percent),
        }
    }

    /// Counts one redemption. Refuses to pass a positive cap.
    pub fn record_usage(&mut self, now: DateTime<Utc>) -> Result<(), CouponError> {
        if self.is_exhausted() {
            return Err(CouponError::Exhausted {
                code: self.code.clone(),
                usage_limit: self.usage_limit,
            });
        }
        self.usage_count += 1;
        self.updated_at = now;
        Ok(())
    }

    /// Takes back one redemption. Returns false if the count was already 0.
    pub fn release_usage(&mut self, now: DateTime<Utc>) -> bool {
        if self.usage_count == 0 {
            return false;
        }
        self.usage_count -= 1;
        self.updated_at = now;
        true
    }
}
