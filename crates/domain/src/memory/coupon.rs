use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::coupon::{Coupon, CouponError};
use crate::repository::CouponStore;

/// In-memory coupons keyed by code.
#[derive(Clone, Default)]
pub struct InMemoryCouponStore {
    coupons: Arc<RwLock<BTreeMap<String, Coupon>>>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn create(&self, coupon: Coupon) -> Result<(), CouponError> {
        let mut coupons = self.coupons.write().await;
        if coupons.contains_key(coupon.code()) {
            return Err(CouponError::AlreadyExists {
                code: coupon.code().to_string(),
            });
        }
        coupons.insert(coupon.code().to_string(), coupon);
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        Ok(self.coupons.read().await.get(code).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Coupon>, CouponError> {
        Ok(self.coupons.read().await.values().cloned().collect())
    }

    async fn modify<F, T>(&self, code: &str, f: F) -> Result<T, CouponError>
    where
        F: FnOnce(&mut Coupon) -> Result<T, CouponError> + Send,
        T: Send,
    {
        let mut coupons = self.coupons.write().await;
        let stored = coupons.get_mut(code).ok_or_else(|| CouponError::NotFound {
            code: code.to_string(),
        })?;

        let mut draft = stored.clone();
        let result = f(&mut draft)?;
        *stored = draft;
        Ok(result)
    }
}
