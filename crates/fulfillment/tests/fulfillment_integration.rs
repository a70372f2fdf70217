//! Integration tests for the order fulfillment saga.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, SequentialIdGenerator, UserId, WarehouseId};
use domain::{
    Coupon, CouponDiscount, CouponError, CouponLedger, CouponStore, InMemoryCouponStore,
    InMemoryInventoryStore, InMemoryOrderRepository, InMemoryProductCatalog, InventoryStore, Money,
    Order, OrderRepository, OrderStatus, Product, ProductCatalog, Stock, StockAllocator, User,
};
use fulfillment::{
    FulfillmentConfig, FulfillmentError, FulfillmentOrchestrator, InMemoryIdentityProvider,
    InMemoryPaymentGateway, OrderLine, PaymentError, PaymentGateway, PaymentMode, PaymentOutcome,
    PaymentRequest, PlaceOrderRequest, RequestContext,
};
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

/// Gateway that changes shared state while "processing" the charge, then
/// approves. Simulates other orders racing this one during payment latency.
#[derive(Clone, Default)]
struct InterferingGateway {
    drain: Option<(InMemoryInventoryStore, ProductId)>,
    exhaust: Option<(InMemoryCouponStore, String)>,
}

#[async_trait]
impl PaymentGateway for InterferingGateway {
    async fn process_payment(
        &self,
        _request: &PaymentRequest,
        _cancel: &CancellationToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        if let Some((inventory, product_id)) = &self.drain {
            for stock in inventory.find_by_product(product_id).await.unwrap() {
                if stock.quantity() > 0 {
                    inventory
                        .reduce(product_id, stock.warehouse_id(), stock.quantity(), Utc::now())
                        .await
                        .unwrap();
                }
            }
        }
        if let Some((coupons, code)) = &self.exhaust {
            coupons
                .modify(code, |c: &mut Coupon| c.record_usage(Utc::now()))
                .await
                .unwrap();
        }
        Ok(PaymentOutcome::Approved {
            transaction_id: "TXN-INTERFERE".into(),
        })
    }
}

/// Gateway that holds every charge until `parties` charges are in flight,
/// then approves them all. Forces racing orders past the availability check
/// and through payment together.
#[derive(Clone)]
struct BarrierGateway {
    barrier: Arc<Barrier>,
}

impl BarrierGateway {
    fn new(parties: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

#[async_trait]
impl PaymentGateway for BarrierGateway {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
        _cancel: &CancellationToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        self.barrier.wait().await;
        Ok(PaymentOutcome::Approved {
            transaction_id: format!("TXN-{}", request.order_id),
        })
    }
}

struct TestHarness<P: PaymentGateway> {
    orchestrator: FulfillmentOrchestrator<InMemoryInventoryStore, InMemoryCouponStore, P>,
    inventory: InMemoryInventoryStore,
    coupons: InMemoryCouponStore,
    orders: InMemoryOrderRepository,
}

struct Setup {
    inventory: InMemoryInventoryStore,
    coupons: InMemoryCouponStore,
    orders: InMemoryOrderRepository,
    catalog: InMemoryProductCatalog,
    identity: InMemoryIdentityProvider,
}

impl Setup {
    async fn new(stock: &[(&str, &str, u32)]) -> Self {
        let now = Utc::now();
        let inventory = InMemoryInventoryStore::new();
        for (product, warehouse, quantity) in stock {
            inventory
                .create(Stock::new(
                    ProductId::new(*product),
                    WarehouseId::new(*warehouse),
                    *quantity,
                    now,
                ))
                .await
                .unwrap();
        }

        let catalog = InMemoryProductCatalog::new();
        for (id, name, price) in [("P1", "Widget", 1000), ("P2", "Gadget", 500)] {
            catalog
                .create(Product::new(id, name, "", Money::from_minor(price), "Tools", now).unwrap())
                .await
                .unwrap();
        }

        let coupons = InMemoryCouponStore::new();
        coupons
            .create(
                Coupon::new("SAVE10", "10% off", CouponDiscount::Percentage(10), now)
                    .unwrap()
                    .with_minimum_order(Money::from_minor(1000))
                    .with_usage_limit(100),
            )
            .await
            .unwrap();
        coupons
            .create(
                Coupon::new("ONCE", "single use", CouponDiscount::Fixed(Money::from_minor(300)), now)
                    .unwrap()
                    .with_usage_limit(1),
            )
            .await
            .unwrap();

        let identity = InMemoryIdentityProvider::new();
        identity.register(User::new("user", "Customer")).await;

        Self {
            inventory,
            coupons,
            orders: InMemoryOrderRepository::new(),
            catalog,
            identity,
        }
    }

    fn build<P: PaymentGateway>(self, payment: P) -> TestHarness<P> {
        let orchestrator = FulfillmentOrchestrator::new(
            StockAllocator::new(self.inventory.clone()),
            CouponLedger::new(self.coupons.clone()),
            payment,
            Arc::new(self.orders.clone()),
            Arc::new(self.catalog),
            Arc::new(self.identity),
        )
        .with_id_generator(Arc::new(SequentialIdGenerator::new()));

        TestHarness {
            orchestrator,
            inventory: self.inventory,
            coupons: self.coupons,
            orders: self.orders,
        }
    }
}

impl<P: PaymentGateway> TestHarness<P> {
    async fn quantities(&self, product: &str) -> Vec<u32> {
        self.inventory
            .find_by_product(&ProductId::new(product))
            .await
            .unwrap()
            .iter()
            .map(Stock::quantity)
            .collect()
    }

    async fn stored(&self, order_id: &OrderId) -> Order {
        self.orders.find_by_id(order_id).await.unwrap().unwrap()
    }

    async fn usage(&self, code: &str) -> u32 {
        self.coupons
            .find_by_code(code)
            .await
            .unwrap()
            .unwrap()
            .usage_count()
    }

    async fn only_order(&self) -> Order {
        let orders = self.orders.find_by_user(&UserId::new("user")).await.unwrap();
        assert_eq!(orders.len(), 1);
        orders.into_iter().next().unwrap()
    }
}

fn user() -> RequestContext {
    RequestContext::for_user("user")
}

fn cart(lines: &[(&str, u32)]) -> PlaceOrderRequest {
    PlaceOrderRequest::new(
        lines
            .iter()
            .map(|(product, quantity)| OrderLine::new(*product, *quantity))
            .collect(),
    )
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn successful_order_drains_warehouse() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::with_mode(PaymentMode::Approve));

        let order = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 10)]))
            .await
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(h.stored(order.id()).await.status(), OrderStatus::Completed);
        assert_eq!(h.quantities("P1").await, vec![0]);
    }

    #[tokio::test]
    async fn declined_payment_never_touches_stock() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::with_mode(PaymentMode::Decline));

        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 10)]))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::PaymentDeclined { .. }));
        assert!(!err.is_retryable());
        assert_eq!(h.only_order().await.status(), OrderStatus::PaymentFailed);
        assert_eq!(h.quantities("P1").await, vec![10]);
    }

    #[tokio::test]
    async fn allocation_spans_warehouses_in_id_order() {
        let h = Setup::new(&[("P1", "WH-B", 5), ("P1", "WH-A", 5)])
            .await
            .build(InMemoryPaymentGateway::new());

        h.orchestrator
            .place_order(&user(), cart(&[("P1", 8)]))
            .await
            .unwrap();

        assert_eq!(h.quantities("P1").await, vec![0, 2]);
    }

    #[tokio::test]
    async fn pricing_matches_policy() {
        let h = Setup::new(&[("P1", "WH-A", 10), ("P2", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::new());

        let order = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 2), ("P2", 4)]))
            .await
            .unwrap();
        assert_eq!(order.subtotal().amount(), 4000);
        assert_eq!(order.tax().amount(), 400);
        assert_eq!(order.shipping_fee().amount(), 500);
        assert_eq!(order.total().amount(), 4900);

        let order = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 5)]))
            .await
            .unwrap();
        assert_eq!(order.total().amount(), 5500);
        assert_eq!(order.shipping_fee().amount(), 0);
    }

    #[tokio::test]
    async fn gateway_error_is_retryable_system_error() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::with_mode(PaymentMode::Fail));

        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 1)]).with_coupon("SAVE10"))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::PaymentSystemError { .. }));
        assert!(err.is_retryable());
        assert_eq!(h.only_order().await.status(), OrderStatus::PaymentFailed);
        assert_eq!(h.usage("SAVE10").await, 0);
        assert_eq!(h.quantities("P1").await, vec![10]);
    }
}

mod coupons {
    use super::*;

    #[tokio::test]
    async fn coupon_usage_committed_on_success() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::new());

        let order = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 3)]).with_coupon("SAVE10"))
            .await
            .unwrap();

        // base 3000 + 300 tax = 3300, 10% = 330
        assert_eq!(order.applied_coupon(), Some("SAVE10"));
        assert_eq!(order.discount().amount(), 330);
        assert_eq!(order.total().amount(), 3000 + 300 + 500 - 330);
        assert_eq!(h.usage("SAVE10").await, 1);
    }

    #[tokio::test]
    async fn minimum_order_checked_before_anything_is_written() {
        let h = Setup::new(&[("P2", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::new());

        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P2", 1)]).with_coupon("SAVE10"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FulfillmentError::CouponInvalid(CouponError::MinimumOrderNotMet { .. })
        ));
        assert_eq!(h.orders.order_count().await, 0);
        assert_eq!(h.quantities("P2").await, vec![10]);
    }

    #[tokio::test]
    async fn exhausted_coupon_rejected_with_reason() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::new());

        h.orchestrator
            .place_order(&user(), cart(&[("P1", 1)]).with_coupon("ONCE"))
            .await
            .unwrap();
        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 1)]).with_coupon("ONCE"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FulfillmentError::CouponInvalid(CouponError::Exhausted { .. })
        ));
        assert_eq!(h.usage("ONCE").await, 1);
    }

    #[tokio::test]
    async fn declined_payment_does_not_commit_coupon() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::with_mode(PaymentMode::Decline));

        let _ = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 2)]).with_coupon("SAVE10"))
            .await;

        assert_eq!(h.usage("SAVE10").await, 0);
    }
}

mod compensation {
    use super::*;

    #[tokio::test]
    async fn later_line_failure_restores_earlier_lines() {
        let setup = Setup::new(&[("P1", "WH-A", 3), ("P1", "WH-B", 3), ("P2", "WH-A", 4)]).await;
        let gateway = InterferingGateway {
            drain: Some((setup.inventory.clone(), ProductId::new("P2"))),
            exhaust: None,
        };
        let h = setup.build(gateway);

        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 5), ("P2", 2)]).with_coupon("SAVE10"))
            .await
            .unwrap_err();

        let FulfillmentError::FulfillmentFailed { order_id, reason } = &err else {
            panic!("expected fulfillment failure, got {err:?}");
        };
        assert!(reason.contains("P2"));
        assert_eq!(h.stored(order_id).await.status(), OrderStatus::PaymentFailed);
        assert_eq!(h.quantities("P1").await, vec![3, 3]);
        assert_eq!(h.usage("SAVE10").await, 0);
    }

    #[tokio::test]
    async fn coupon_commit_failure_restores_stock() {
        let setup = Setup::new(&[("P1", "WH-A", 5)]).await;
        let gateway = InterferingGateway {
            drain: None,
            exhaust: Some((setup.coupons.clone(), "ONCE".to_string())),
        };
        let h = setup.build(gateway);

        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 4)]).with_coupon("ONCE"))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::FulfillmentFailed { .. }));
        assert_eq!(h.quantities("P1").await, vec![5]);
        assert_eq!(h.only_order().await.status(), OrderStatus::PaymentFailed);
        // The competing redemption stays; ours was never recorded.
        assert_eq!(h.usage("ONCE").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_orders_for_all_stock_one_wins() {
        let h = Arc::new(
            Setup::new(&[("P1", "WH-A", 10)])
                .await
                .build(BarrierGateway::new(2)),
        );

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let h = Arc::clone(&h);
                tokio::spawn(async move {
                    h.orchestrator
                        .place_order(&user(), cart(&[("P1", 10)]))
                        .await
                })
            })
            .collect();

        let mut completed = Vec::new();
        let mut compensated = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(order) => completed.push(order),
                Err(FulfillmentError::FulfillmentFailed { order_id, .. }) => {
                    compensated.push(order_id)
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // Both orders were charged; exactly one got the stock.
        assert_eq!(completed.len(), 1);
        assert_eq!(compensated.len(), 1);
        assert_eq!(completed[0].status(), OrderStatus::Completed);
        assert_eq!(
            h.stored(&compensated[0]).await.status(),
            OrderStatus::PaymentFailed
        );
        assert_eq!(h.quantities("P1").await, vec![0]);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn cancelled_caller_gets_system_error() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::with_mode(PaymentMode::Hang));

        let token = CancellationToken::new();
        let ctx = user().with_cancellation(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = h
            .orchestrator
            .place_order(&ctx, cart(&[("P1", 4)]).with_coupon("SAVE10"))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::PaymentSystemError { .. }));
        assert_eq!(h.only_order().await.status(), OrderStatus::PaymentFailed);
        assert_eq!(h.usage("SAVE10").await, 0);
        assert_eq!(h.quantities("P1").await, vec![10]);
    }

    #[tokio::test]
    async fn approval_after_cancellation_is_not_honoured() {
        let h = Setup::new(&[("P1", "WH-A", 10)])
            .await
            .build(InMemoryPaymentGateway::new());

        let ctx = user();
        ctx.cancellation.cancel();

        let err = h
            .orchestrator
            .place_order(&ctx, cart(&[("P1", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::PaymentSystemError { .. }));
        assert_eq!(h.quantities("P1").await, vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn gateway_timeout_is_system_error() {
        let h = {
            let setup = Setup::new(&[("P1", "WH-A", 10)]).await;
            let mut h = setup.build(InMemoryPaymentGateway::with_mode(PaymentMode::Hang));
            h.orchestrator = h.orchestrator.with_config(FulfillmentConfig {
                payment_timeout: Duration::from_millis(100),
            });
            h
        };

        let err = h
            .orchestrator
            .place_order(&user(), cart(&[("P1", 1)]))
            .await
            .unwrap_err();

        let FulfillmentError::PaymentSystemError { reason, .. } = &err else {
            panic!("expected system error, got {err:?}");
        };
        assert!(reason.contains("100ms"));
        assert_eq!(h.only_order().await.status(), OrderStatus::PaymentFailed);
    }
}
