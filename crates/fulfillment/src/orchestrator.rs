//! Fulfillment orchestrator: the order placement saga.

use std::sync::Arc;
use std::time::Instant;

use common::{Clock, IdGenerator, OrderId, SystemClock, UuidIdGenerator};
use domain::{
    Coupon, CouponError, CouponLedger, CouponStore, InventoryStore, Order, OrderRepository,
    PricingPolicy, ProductCatalog, StockAllocator, User,
};
use tracing::{debug, error, info, instrument, warn};

use crate::compensation::CompensationLog;
use crate::config::FulfillmentConfig;
use crate::error::{FulfillmentError, Result};
use crate::request::{OrderLine, PlaceOrderRequest};
use crate::services::identity::{IdentityProvider, RequestContext};
use crate::services::payment::{PaymentError, PaymentGateway, PaymentOutcome, PaymentRequest};
use crate::steps;

/// Orchestrates order placement.
///
/// The saga prices and validates the cart, persists a pending order, charges
/// the gateway, and only then allocates stock. Any failure after payment
/// restores every allocation made so far, rolls back committed coupon usage
/// and leaves the order in `payment_failed`.
pub struct FulfillmentOrchestrator<S, C, P>
where
    S: InventoryStore,
    C: CouponStore,
    P: PaymentGateway,
{
    allocator: StockAllocator<S>,
    coupons: CouponLedger<C>,
    payment: P,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    identity: Arc<dyn IdentityProvider>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    pricing: PricingPolicy,
    config: FulfillmentConfig,
}

impl<S, C, P> FulfillmentOrchestrator<S, C, P>
where
    S: InventoryStore,
    C: CouponStore,
    P: PaymentGateway,
{
    /// Creates an orchestrator with random order ids, the system clock and
    /// default pricing.
    pub fn new(
        allocator: StockAllocator<S>,
        coupons: CouponLedger<C>,
        payment: P,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            allocator,
            coupons,
            payment,
            orders,
            catalog,
            identity,
            ids: Arc::new(UuidIdGenerator::new()),
            clock: Arc::new(SystemClock),
            pricing: PricingPolicy::default(),
            config: FulfillmentConfig::default(),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_config(mut self, config: FulfillmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn allocator(&self) -> &StockAllocator<S> {
        &self.allocator
    }

    pub fn coupons(&self) -> &CouponLedger<C> {
        &self.coupons
    }

    pub fn payment(&self) -> &P {
        &self.payment
    }

    // -- Queries --

    /// Returns an order visible to the caller (its owner or an admin).
    #[instrument(skip(self, ctx))]
    pub async fn get_order(&self, ctx: &RequestContext, order_id: &OrderId) -> Result<Order> {
        let user = self.current_user(ctx).await?;
        let order = self.load_order(order_id).await?;

        if !user.can_access(order.user_id()) {
            return Err(FulfillmentError::AccessDenied(format!(
                "order {order_id} belongs to another user"
            )));
        }
        Ok(order)
    }

    /// Returns the caller's orders, oldest first.
    #[instrument(skip(self, ctx))]
    pub async fn list_user_orders(&self, ctx: &RequestContext) -> Result<Vec<Order>> {
        let user = self.current_user(ctx).await?;
        Ok(self.orders.find_by_user(&user.id).await?)
    }

    // -- Administration --

    /// Cancels an order. Admin only; refused once delivered. Stock and coupon
    /// usage are left as they are.
    #[instrument(skip(self, ctx))]
    pub async fn cancel_order(&self, ctx: &RequestContext, order_id: &OrderId) -> Result<Order> {
        self.require_admin(ctx).await?;
        let mut order = self.load_order(order_id).await?;

        order.cancel(self.clock.now())?;
        self.orders.update(&order).await?;

        info!(%order_id, "Order cancelled");
        Ok(order)
    }

    /// Marks a completed order as delivered. Admin only.
    #[instrument(skip(self, ctx))]
    pub async fn mark_delivered(&self, ctx: &RequestContext, order_id: &OrderId) -> Result<Order> {
        self.require_admin(ctx).await?;
        let mut order = self.load_order(order_id).await?;

        order.deliver(self.clock.now())?;
        self.orders.update(&order).await?;

        info!(%order_id, "Order delivered");
        Ok(order)
    }

    // -- Saga --

    /// Places an order and returns it in `completed` state.
    ///
    /// On failure after the order was persisted, the stored order is left in
    /// `payment_failed` and every side effect has been undone.
    #[instrument(
        skip(self, ctx, request),
        fields(saga_type = steps::SAGA_TYPE, lines = request.items.len())
    )]
    pub async fn place_order(
        &self,
        ctx: &RequestContext,
        request: PlaceOrderRequest,
    ) -> Result<Order> {
        metrics::counter!("orders_placed_total").increment(1);
        let saga_start = Instant::now();

        let result = self.run_saga(ctx, request).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("fulfillment_duration_seconds").record(duration);

        match &result {
            Ok(order) => {
                metrics::counter!("orders_completed_total").increment(1);
                info!(order_id = %order.id(), total = %order.total(), duration, "Order fulfilled");
            }
            Err(e) => {
                metrics::counter!("orders_failed_total", "reason" => e.kind()).increment(1);
                warn!(error = %e, reason = e.kind(), duration, "Order placement failed");
            }
        }

        result
    }

    async fn run_saga(&self, ctx: &RequestContext, request: PlaceOrderRequest) -> Result<Order> {
        let user = self.current_user(ctx).await?;

        // 1. Price the cart against current stock. Nothing is written yet.
        info!(step = steps::STEP_BUILD_ORDER, "saga step started");
        let mut order = self.build_order(&user, &request.items).await?;

        // 2. Coupon
        info!(step = steps::STEP_APPLY_COUPON, "saga step started");
        let coupon = self
            .apply_coupon(&mut order, request.coupon_code.as_deref())
            .await?;

        // 3. Persist pending order
        info!(step = steps::STEP_PERSIST_ORDER, order_id = %order.id(), "saga step started");
        self.orders.save(&order).await?;

        // 4. Payment
        info!(step = steps::STEP_PROCESS_PAYMENT, amount = %order.total(), "saga step started");
        self.charge(ctx, &mut order).await?;

        // 5-6. Allocate, commit coupon, confirm, complete
        info!(step = steps::STEP_ALLOCATE_STOCK, "saga step started");
        let mut log = CompensationLog::new();
        match self
            .allocate_and_confirm(&order, coupon.as_ref(), &mut log)
            .await
        {
            Ok(completed) => Ok(completed),
            Err(e) => {
                warn!(order_id = %order.id(), error = %e, "Fulfillment failed after payment, compensating");
                self.compensate(&mut order, &log).await;
                Err(FulfillmentError::FulfillmentFailed {
                    order_id: order.id().clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn build_order(&self, user: &User, lines: &[OrderLine]) -> Result<Order> {
        if lines.is_empty() {
            return Err(FulfillmentError::InvalidArgument(
                "order must contain at least one item".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut order = Order::new(self.ids.next_order_id(), user.id.clone(), self.pricing, now)?;

        for line in lines {
            if line.quantity == 0 {
                return Err(FulfillmentError::InvalidArgument(format!(
                    "quantity for product {} must be greater than 0",
                    line.product_id
                )));
            }

            let product = self
                .catalog
                .find_by_id(&line.product_id)
                .await?
                .ok_or_else(|| FulfillmentError::ProductNotFound(line.product_id.clone()))?;

            let availability = self
                .allocator
                .check_availability(&product.id, line.quantity)
                .await?;
            if !availability.sufficient {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: product.id,
                    requested: u64::from(line.quantity),
                    available: availability.total_available,
                });
            }

            order.add_item(product.id, product.name, line.quantity, product.price, now)?;
        }

        Ok(order)
    }

    async fn apply_coupon(&self, order: &mut Order, code: Option<&str>) -> Result<Option<Coupon>> {
        let now = self.clock.now();
        let Some(coupon) = self.coupons.validate_and_fetch(code, now).await? else {
            return Ok(None);
        };

        let base = order.discount_base();
        if !self.coupons.can_apply(&coupon, base) {
            return Err(CouponError::MinimumOrderNotMet {
                code: coupon.code().to_string(),
                minimum: coupon.minimum_order(),
                actual: base,
            }
            .into());
        }

        let discount = self.coupons.compute_discount(&coupon, base);
        order.apply_coupon(coupon.code(), discount, now)?;
        debug!(code = coupon.code(), %discount, "Coupon applied");

        Ok(Some(coupon))
    }

    /// Charges the order total. A decline, a gateway error, a timeout or a
    /// cancelled caller all leave the order in `payment_failed`.
    async fn charge(&self, ctx: &RequestContext, order: &mut Order) -> Result<()> {
        let request = PaymentRequest {
            order_id: order.id().clone(),
            user_id: order.user_id().clone(),
            amount: order.total(),
        };
        let timeout = self.config.payment_timeout;
        let gateway_start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => Err(PaymentError::Cancelled),
            outcome = tokio::time::timeout(
                timeout,
                self.payment.process_payment(&request, &ctx.cancellation),
            ) => outcome.unwrap_or_else(|_| {
                Err(PaymentError::Unavailable(format!(
                    "no response within {}ms",
                    timeout.as_millis()
                )))
            }),
        };

        metrics::histogram!("payment_gateway_duration_seconds")
            .record(gateway_start.elapsed().as_secs_f64());

        // The caller may have given up while the gateway was answering.
        let result = match result {
            Ok(_) if ctx.is_cancelled() => Err(PaymentError::Cancelled),
            other => other,
        };

        match result {
            Ok(PaymentOutcome::Approved { transaction_id }) => {
                info!(order_id = %order.id(), %transaction_id, "Payment approved");
                Ok(())
            }
            Ok(PaymentOutcome::Declined { reason }) => {
                self.mark_payment_failed(order).await;
                Err(FulfillmentError::PaymentDeclined {
                    order_id: order.id().clone(),
                    reason,
                })
            }
            Err(e) => {
                self.mark_payment_failed(order).await;
                Err(FulfillmentError::PaymentSystemError {
                    order_id: order.id().clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Allocates every line, commits coupon usage, then confirms, completes
    /// and persists. `order` itself is left untouched so the caller can still
    /// fail it from `pending` if anything here goes wrong.
    async fn allocate_and_confirm(
        &self,
        order: &Order,
        coupon: Option<&Coupon>,
        log: &mut CompensationLog,
    ) -> Result<Order> {
        for item in order.items() {
            // Stock may have moved since the order was priced.
            let availability = self
                .allocator
                .check_availability(&item.product_id, item.quantity)
                .await?;
            if !availability.sufficient {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: u64::from(item.quantity),
                    available: availability.total_available,
                });
            }

            let allocations = self
                .allocator
                .allocate(&item.product_id, item.quantity)
                .await?;
            debug!(product_id = %item.product_id, ?allocations, "Line allocated");
            log.record_allocation(item.product_id.clone(), allocations);
        }

        info!(step = steps::STEP_CONFIRM_ORDER, "saga step started");
        if let Some(coupon) = coupon {
            self.coupons.commit(coupon).await?;
            log.record_coupon(coupon.code());
        }

        let now = self.clock.now();
        let mut completed = order.clone();
        completed.confirm(now)?;
        completed.complete(now)?;
        self.orders.update(&completed).await?;

        Ok(completed)
    }

    /// Undoes recorded side effects in reverse order. Failures are logged
    /// and counted; the caller's original error is what gets returned.
    #[instrument(skip(self, order, log), fields(order_id = %order.id()))]
    async fn compensate(&self, order: &mut Order, log: &CompensationLog) {
        if let Some(code) = log.committed_coupon()
            && let Err(e) = self.coupons.rollback(code).await
        {
            metrics::counter!("compensation_failures_total").increment(1);
            error!(%code, error = %e, "Failed to roll back coupon usage");
        }

        for (product_id, allocations) in log.allocations().iter().rev() {
            match self.allocator.restore(product_id, allocations).await {
                Ok(()) => {
                    metrics::counter!("stock_compensations_total").increment(1);
                }
                Err(e) => {
                    metrics::counter!("compensation_failures_total").increment(1);
                    error!(%product_id, ?allocations, error = %e, "Failed to restore stock");
                }
            }
        }

        self.mark_payment_failed(order).await;
    }

    async fn mark_payment_failed(&self, order: &mut Order) {
        if let Err(e) = order.fail_payment(self.clock.now()) {
            error!(order_id = %order.id(), error = %e, "Cannot mark order as payment failed");
            return;
        }
        if let Err(e) = self.orders.update(order).await {
            error!(order_id = %order.id(), error = %e, "Failed to persist payment failure");
        }
    }

    // -- Helpers --

    async fn current_user(&self, ctx: &RequestContext) -> Result<User> {
        self.identity.current_user(ctx).await.map_err(|e| {
            debug!(error = %e, "Caller could not be identified");
            FulfillmentError::AuthenticationRequired
        })
    }

    /// Resolves the caller and fails with `AccessDenied` unless they are an
    /// administrator.
    pub async fn require_admin(&self, ctx: &RequestContext) -> Result<User> {
        let user = self.current_user(ctx).await?;
        if !user.is_admin {
            return Err(FulfillmentError::AccessDenied(
                "administrator role required".to_string(),
            ));
        }
        Ok(user)
    }

    async fn load_order(&self, order_id: &OrderId) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::InMemoryIdentityProvider;
    use crate::services::payment::{InMemoryPaymentGateway, PaymentMode};
    use common::{ProductId, SequentialIdGenerator, WarehouseId};
    use domain::{
        InMemoryCouponStore, InMemoryInventoryStore, InMemoryOrderRepository,
        InMemoryProductCatalog, Money, OrderStatus, Product, Stock,
    };

    type TestOrchestrator =
        FulfillmentOrchestrator<InMemoryInventoryStore, InMemoryCouponStore, InMemoryPaymentGateway>;

    struct Fixture {
        orchestrator: TestOrchestrator,
        inventory: InMemoryInventoryStore,
        orders: InMemoryOrderRepository,
        payment: InMemoryPaymentGateway,
    }

    async fn fixture(stock: u32) -> Fixture {
        let now = chrono::Utc::now();
        let inventory = InMemoryInventoryStore::new();
        inventory
            .create(Stock::new(ProductId::new("P1"), WarehouseId::new("WH-001"), stock, now))
            .await
            .unwrap();
        inventory
            .create(Stock::new(ProductId::new("GOLD"), WarehouseId::new("WH-001"), 10, now))
            .await
            .unwrap();

        let catalog = InMemoryProductCatalog::new();
        catalog
            .create(Product::new("P1", "Widget", "", Money::from_minor(1000), "Tools", now).unwrap())
            .await
            .unwrap();
        let gold_price = Money::from_minor(4_000_000_000_000_000_000);
        catalog
            .create(Product::new("GOLD", "Gold bar", "", gold_price, "Metals", now).unwrap())
            .await
            .unwrap();

        let identity = InMemoryIdentityProvider::new();
        identity.register(User::new("user", "User")).await;
        identity.register(User::new("other", "Other")).await;
        identity.register(User::admin("admin", "Admin")).await;

        let orders = InMemoryOrderRepository::new();
        let payment = InMemoryPaymentGateway::new();

        let orchestrator = FulfillmentOrchestrator::new(
            StockAllocator::new(inventory.clone()),
            CouponLedger::new(InMemoryCouponStore::new()),
            payment.clone(),
            Arc::new(orders.clone()),
            Arc::new(catalog),
            Arc::new(identity),
        )
        .with_id_generator(Arc::new(SequentialIdGenerator::new()));

        Fixture {
            orchestrator,
            inventory,
            orders,
            payment,
        }
    }

    fn cart(quantity: u32) -> PlaceOrderRequest {
        PlaceOrderRequest::new(vec![OrderLine::new("P1", quantity)])
    }

    #[tokio::test]
    async fn test_place_order_completes() {
        let f = fixture(10).await;
        let ctx = RequestContext::for_user("user");

        let order = f.orchestrator.place_order(&ctx, cart(3)).await.unwrap();

        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.id().as_str(), "ORD-0001");
        assert_eq!(f.inventory.total_for(&ProductId::new("P1")).await, 7);
        assert_eq!(f.payment.charges().await[0].amount, order.total());
    }

    #[tokio::test]
    async fn test_anonymous_caller_rejected() {
        let f = fixture(10).await;
        let err = f
            .orchestrator
            .place_order(&RequestContext::anonymous(), cart(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn test_invalid_carts_rejected_without_side_effects() {
        let f = fixture(10).await;
        let ctx = RequestContext::for_user("user");

        let err = f
            .orchestrator
            .place_order(&ctx, PlaceOrderRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::InvalidArgument(_)));

        let err = f.orchestrator.place_order(&ctx, cart(0)).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::InvalidArgument(_)));

        let unknown = PlaceOrderRequest::new(vec![OrderLine::new("P404", 1)]);
        let err = f.orchestrator.place_order(&ctx, unknown).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ProductNotFound(_)));

        let err = f.orchestrator.place_order(&ctx, cart(11)).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::InsufficientStock {
                requested: 11,
                available: 10,
                ..
            }
        ));

        assert_eq!(f.orders.order_count().await, 0);
        assert_eq!(f.payment.charge_count().await, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_total_rejected_before_charging() {
        let f = fixture(10).await;
        let ctx = RequestContext::for_user("user");

        let request = PlaceOrderRequest::new(vec![OrderLine::new("GOLD", 3)]);
        let err = f.orchestrator.place_order(&ctx, request).await.unwrap_err();

        assert!(matches!(err, FulfillmentError::InvalidArgument(_)));
        assert_eq!(f.orders.order_count().await, 0);
        assert_eq!(f.payment.charge_count().await, 0);
        assert_eq!(f.inventory.total_for(&ProductId::new("GOLD")).await, 10);
    }

    #[tokio::test]
    async fn test_unknown_coupon_aborts_before_persisting() {
        let f = fixture(10).await;
        let ctx = RequestContext::for_user("user");

        let err = f
            .orchestrator
            .place_order(&ctx, cart(1).with_coupon("NOPE"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::CouponInvalid(CouponError::NotFound { .. })
        ));
        assert_eq!(f.orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_decline_marks_payment_failed() {
        let f = fixture(10).await;
        f.payment.set_mode(PaymentMode::Decline).await;
        let ctx = RequestContext::for_user("user");

        let err = f.orchestrator.place_order(&ctx, cart(10)).await.unwrap_err();
        let order_id = match err {
            FulfillmentError::PaymentDeclined { order_id, .. } => order_id,
            other => panic!("expected decline, got {other:?}"),
        };

        let stored = f.orders.find_by_id(&order_id).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::PaymentFailed);
        assert_eq!(f.inventory.total_for(&ProductId::new("P1")).await, 10);
    }

    #[tokio::test]
    async fn test_get_order_enforces_ownership() {
        let f = fixture(10).await;
        let order = f
            .orchestrator
            .place_order(&RequestContext::for_user("user"), cart(1))
            .await
            .unwrap();

        let own = f
            .orchestrator
            .get_order(&RequestContext::for_user("user"), order.id())
            .await
            .unwrap();
        assert_eq!(own.id(), order.id());

        assert!(f
            .orchestrator
            .get_order(&RequestContext::for_user("admin"), order.id())
            .await
            .is_ok());

        let err = f
            .orchestrator
            .get_order(&RequestContext::for_user("other"), order.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::AccessDenied(_)));

        let err = f
            .orchestrator
            .get_order(&RequestContext::for_user("user"), &OrderId::new("ORD-9999"))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_user_orders_only_returns_own() {
        let f = fixture(10).await;
        let user = RequestContext::for_user("user");
        let other = RequestContext::for_user("other");

        f.orchestrator.place_order(&user, cart(1)).await.unwrap();
        f.orchestrator.place_order(&user, cart(1)).await.unwrap();
        f.orchestrator.place_order(&other, cart(1)).await.unwrap();

        let orders = f.orchestrator.list_user_orders(&user).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user_id().as_str() == "user"));
    }

    #[tokio::test]
    async fn test_admin_cancel_and_deliver() {
        let f = fixture(10).await;
        let user = RequestContext::for_user("user");
        let admin = RequestContext::for_user("admin");

        let first = f.orchestrator.place_order(&user, cart(1)).await.unwrap();
        let err = f
            .orchestrator
            .cancel_order(&user, first.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::AccessDenied(_)));

        let delivered = f.orchestrator.mark_delivered(&admin, first.id()).await.unwrap();
        assert_eq!(delivered.status(), OrderStatus::Delivered);
        let err = f
            .orchestrator
            .cancel_order(&admin, first.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::Order(_)));

        let second = f.orchestrator.place_order(&user, cart(1)).await.unwrap();
        let cancelled = f.orchestrator.cancel_order(&admin, second.id()).await.unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        // Cancellation does not return stock.
        assert_eq!(f.inventory.total_for(&ProductId::new("P1")).await, 8);
    }
}
