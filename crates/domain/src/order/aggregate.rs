//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderItem, OrderStatus, PricingPolicy};
use crate::money::Money;

/// Order aggregate root.
///
/// Owns its line items and keeps its price breakdown consistent: every item
/// or coupon change recomputes subtotal, tax, shipping, discount and total
/// under the order's [`PricingPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    applied_coupon: Option<String>,
    pricing: PricingPolicy,
    subtotal: Money,
    tax: Money,
    shipping_fee: Money,
    discount: Money,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates an empty pending order.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        pricing: PricingPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if user_id.is_empty() {
            return Err(OrderError::UserIdRequired);
        }

        let mut order = Self {
            id,
            user_id,
            items: Vec::new(),
            applied_coupon: None,
            pricing,
            subtotal: Money::zero(),
            tax: Money::zero(),
            shipping_fee: Money::zero(),
            discount: Money::zero(),
            total: Money::zero(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        order.recalculate()?;
        Ok(order)
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn applied_coupon(&self) -> Option<&str> {
        self.applied_coupon.as_deref()
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Amount a coupon discount is computed against: subtotal plus tax,
    /// shipping excluded.
    pub fn discount_base(&self) -> Money {
        self.subtotal + self.tax
    }

    // -- Commands --

    /// Appends a line item. Only allowed while pending.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.ensure(self.status.can_modify(), "add item")?;

        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if unit_price.is_negative() {
            return Err(OrderError::InvalidPrice {
                price: unit_price.amount(),
            });
        }

        let item = OrderItem::new(product_id, product_name, quantity, unit_price)?;
        self.items.push(item);
        if let Err(e) = self.recalculate() {
            self.items.pop();
            return Err(e);
        }
        self.touch(now);
        Ok(())
    }

    /// Records the coupon code and its discount. Only allowed while pending.
    pub fn apply_coupon(
        &mut self,
        code: impl Into<String>,
        discount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.ensure(self.status.can_modify(), "apply coupon")?;

        if discount.is_negative() {
            return Err(OrderError::InvalidDiscount {
                discount: discount.amount(),
            });
        }

        let previous = self.discount;
        self.discount = discount;
        if let Err(e) = self.recalculate() {
            self.discount = previous;
            return Err(e);
        }
        self.applied_coupon = Some(code.into());
        self.touch(now);
        Ok(())
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure(self.status.can_confirm(), "confirm")?;
        if !self.has_items() {
            return Err(OrderError::NoItems);
        }
        self.transition(OrderStatus::Confirmed, now);
        Ok(())
    }

    pub fn fail_payment(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure(self.status.can_fail_payment(), "fail payment")?;
        self.transition(OrderStatus::PaymentFailed, now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure(self.status.can_complete(), "complete")?;
        self.transition(OrderStatus::Completed, now);
        Ok(())
    }

    /// Administrative cancellation. Refused once delivered.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure(self.status.can_cancel(), "cancel")?;
        self.transition(OrderStatus::Cancelled, now);
        Ok(())
    }

    pub fn deliver(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure(self.status.can_deliver(), "deliver")?;
        self.transition(OrderStatus::Delivered, now);
        Ok(())
    }

    // -- Internals --

    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), OrderError> {
        if allowed {
            Ok(())
        } else {
            Err(OrderError::InvalidStateTransition {
                current_state: self.status,
                action,
            })
        }
    }

    fn transition(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Reprices the order. Leaves every amount untouched on overflow.
    fn recalculate(&mut self) -> Result<(), OrderError> {
        let subtotal = self
            .items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.subtotal))
            .ok_or(OrderError::AmountOverflow)?;
        let tax = self.pricing.tax_for(subtotal)?;
        let shipping_fee = self.pricing.shipping_for(subtotal);
        let base = subtotal.checked_add(tax).ok_or(OrderError::AmountOverflow)?;
        let discount = self.discount.min(base);
        let total = base
            .checked_add(shipping_fee)
            .and_then(|gross| gross.checked_sub(discount))
            .ok_or(OrderError::AmountOverflow)?;

        self.subtotal = subtotal;
        self.tax = tax;
        self.shipping_fee = shipping_fee;
        self.discount = discount;
        self.total = total;
        Ok(())
    }
}
