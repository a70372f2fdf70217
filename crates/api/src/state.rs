//! Shared application state.

use std::sync::Arc;

use domain::{
    CouponLedger, InMemoryCouponStore, InMemoryInventoryStore, InMemoryOrderRepository,
    InMemoryProductCatalog, InMemoryWarehouseDirectory, PricingPolicy, StockAllocator,
};
use fulfillment::{
    FulfillmentConfig, FulfillmentOrchestrator, InMemoryIdentityProvider, PaymentGateway,
    SimulatedPaymentGateway,
};
use reporting::SalesReportService;

use crate::config::Config;

/// The orchestrator as wired by the server: in-memory stores, pluggable gateway.
pub type Orchestrator<P> =
    FulfillmentOrchestrator<InMemoryInventoryStore, InMemoryCouponStore, P>;

/// Shared application state accessible from all handlers.
///
/// The store handles share their data with the orchestrator and the report
/// service, so seeding through them is visible everywhere.
pub struct AppState<P: PaymentGateway> {
    pub orchestrator: Orchestrator<P>,
    pub reports: SalesReportService<InMemoryInventoryStore>,
    pub inventory: InMemoryInventoryStore,
    pub coupons: InMemoryCouponStore,
    pub orders: InMemoryOrderRepository,
    pub catalog: InMemoryProductCatalog,
    pub warehouses: InMemoryWarehouseDirectory,
    pub identity: InMemoryIdentityProvider,
}

impl<P: PaymentGateway> AppState<P> {
    /// Creates empty stores and wires the orchestrator around `payment`.
    pub fn new(payment: P, pricing: PricingPolicy, config: FulfillmentConfig) -> Self {
        let inventory = InMemoryInventoryStore::new();
        let coupons = InMemoryCouponStore::new();
        let orders = InMemoryOrderRepository::new();
        let catalog = InMemoryProductCatalog::new();
        let warehouses = InMemoryWarehouseDirectory::new();
        let identity = InMemoryIdentityProvider::new();

        let orchestrator = FulfillmentOrchestrator::new(
            StockAllocator::new(inventory.clone()),
            CouponLedger::new(coupons.clone()),
            payment,
            Arc::new(orders.clone()),
            Arc::new(catalog.clone()),
            Arc::new(identity.clone()),
        )
        .with_pricing(pricing)
        .with_config(config);

        let reports = SalesReportService::new(
            Arc::new(orders.clone()),
            inventory.clone(),
            Arc::new(warehouses.clone()),
        );

        Self {
            orchestrator,
            reports,
            inventory,
            coupons,
            orders,
            catalog,
            warehouses,
            identity,
        }
    }
}

/// Creates the server state with a simulated payment gateway.
pub fn create_default_state(config: &Config) -> Arc<AppState<SimulatedPaymentGateway>> {
    let payment = match config.payment_seed {
        Some(seed) => SimulatedPaymentGateway::seeded(config.payment(), seed),
        None => SimulatedPaymentGateway::from_os_rng(config.payment()),
    };
    Arc::new(AppState::new(payment, config.pricing(), config.fulfillment()))
}
