use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    db_types::{GatewaySessionId, Order},
    order_objects::PricedItem,
    traits::{CheckoutGateway, CheckoutGatewayError},
};

/// An in-memory stand-in for the payment gateway. By default every request succeeds and yields a
/// deterministic session id derived from the order number; call [`TestGateway::failing`] to get
/// one that refuses every session, for exercising the checkout rollback path.
#[derive(Clone, Default)]
pub struct TestGateway {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// The number of session requests this gateway has received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn session_id_for(order: &Order) -> GatewaySessionId {
        GatewaySessionId::from(format!("cs_test_{}", order.order_number))
    }
}

impl CheckoutGateway for TestGateway {
    async fn create_checkout_session(
        &self,
        order: &Order,
        _items: &[PricedItem],
    ) -> Result<GatewaySessionId, CheckoutGatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CheckoutGatewayError("Simulated gateway outage".to_string()));
        }
        Ok(Self::session_id_for(order))
    }
}
