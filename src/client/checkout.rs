//! Turns the cart into an order on the orders service.

use std::future::Future;

use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::order::{PaymentMethod, ShippingAddress};
use crate::domain::pricing::{OrderSummary, PricingPolicy, PromoCode};
use crate::handlers::orders::{AddressRequest, CreateOrderRequest, OrderItemRequest, OrderResponse};

use super::cart::CartStore;
use super::storage::LocalStorage;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Order rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Could not reach the orders service: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for CheckoutError {
    fn from(e: reqwest::Error) -> Self {
        CheckoutError::Transport(e.to_string())
    }
}

/// Where a checkout is sent.
pub trait OrderGateway {
    fn submit(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<OrderResponse, CheckoutError>> + Send;
}

/// Posts orders to `{base_url}/orders`.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    client: Client,
    base_url: String,
}

impl HttpOrderGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl OrderGateway for HttpOrderGateway {
    async fn submit(&self, request: &CreateOrderRequest) -> Result<OrderResponse, CheckoutError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Order submission rejected with {status}: {body}");
            return Err(CheckoutError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub user_id: Uuid,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub promo: Option<PromoCode>,
}

pub struct Checkout<G> {
    gateway: G,
    policy: PricingPolicy,
}

impl<G: OrderGateway> Checkout<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_policy(gateway, PricingPolicy::default())
    }

    pub fn with_policy(gateway: G, policy: PricingPolicy) -> Self {
        Self { gateway, policy }
    }

    /// The summary shown before confirming; `None` for an empty cart.
    pub fn summary<S: LocalStorage>(
        &self,
        cart: &CartStore<S>,
        promo: Option<&PromoCode>,
    ) -> Option<OrderSummary> {
        self.policy
            .summarize_cart(&cart.state(), promo)
            .map(|s| s.rounded())
    }

    /// Sends the cart once. The cart is cleared only after the orders
    /// service accepted the order; on any failure it is left as it was.
    pub async fn place_order<S: LocalStorage>(
        &self,
        cart: &mut CartStore<S>,
        details: &CheckoutDetails,
    ) -> Result<OrderResponse, CheckoutError> {
        let Some(summary) = self.summary(cart, details.promo.as_ref()) else {
            return Err(CheckoutError::EmptyCart);
        };
        let request = build_request(cart, details, &summary);

        let order = self.gateway.submit(&request).await?;
        cart.clear();
        log::info!("Placed order {} for user {}", order.id, details.user_id);
        Ok(order)
    }
}

/// Snapshot of the cart: every line keeps the price and discount it was
/// added with.
fn build_request<S: LocalStorage>(
    cart: &CartStore<S>,
    details: &CheckoutDetails,
    summary: &OrderSummary,
) -> CreateOrderRequest {
    let address = &details.shipping_address;
    CreateOrderRequest {
        user_id: Some(details.user_id.to_string()),
        items: Some(
            cart.items()
                .iter()
                .map(|line| OrderItemRequest {
                    product_id: Some(line.product_id.to_string()),
                    name: Some(line.name.clone()),
                    quantity: Some(i64::from(line.quantity)),
                    price: Some(line.unit_price.clone()),
                    discount_percent: Some(line.discount_percent.clone()),
                })
                .collect(),
        ),
        shipping_address: Some(AddressRequest {
            street: Some(address.street.clone()),
            city: Some(address.city.clone()),
            state: Some(address.state.clone()),
            zip_code: Some(address.zip_code.clone()),
        }),
        total_amount: Some(summary.total.clone()),
        payment_method: Some(details.payment_method.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use super::*;
    use crate::client::storage::MemoryStorage;
    use crate::domain::cart::CartLineItem;
    use crate::domain::order::{OrderStatus, RefundStatus};
    use crate::handlers::orders::{AddressResponse, OrderItemResponse};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    /// Records submissions and answers with a canned outcome.
    struct FakeGateway {
        reject: bool,
        sent: Mutex<Vec<CreateOrderRequest>>,
    }

    impl FakeGateway {
        fn accepting() -> Self {
            Self {
                reject: false,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn rejecting() -> Self {
            Self {
                reject: true,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderGateway for FakeGateway {
        async fn submit(&self, request: &CreateOrderRequest) -> Result<OrderResponse, CheckoutError> {
            self.sent.lock().unwrap().push(request.clone());
            if self.reject {
                return Err(CheckoutError::Rejected {
                    status: 400,
                    body: "{\"status\":\"fail\"}".to_string(),
                });
            }
            let now = Utc::now();
            Ok(OrderResponse {
                id: Uuid::new_v4(),
                user_id: Uuid::parse_str(request.user_id.as_deref().unwrap()).unwrap(),
                items: Vec::<OrderItemResponse>::new(),
                shipping_address: AddressResponse {
                    street: String::new(),
                    city: String::new(),
                    state: String::new(),
                    zip_code: String::new(),
                },
                total_amount: request.total_amount.clone().unwrap(),
                payment_method: PaymentMethod::Paypal,
                status: OrderStatus::Pending,
                refund_status: RefundStatus::Pending,
                cancelled_at: None,
                refunded_at: None,
                created_at: now,
                updated_at: now,
            })
        }
    }

    fn details(promo: Option<PromoCode>) -> CheckoutDetails {
        CheckoutDetails {
            user_id: Uuid::new_v4(),
            shipping_address: ShippingAddress {
                street: "5 Harbor Rd".into(),
                city: "Seattle".into(),
                state: "WA".into(),
                zip_code: "98101".into(),
            },
            payment_method: PaymentMethod::Paypal,
            promo,
        }
    }

    fn filled_cart(storage: MemoryStorage) -> CartStore<MemoryStorage> {
        let mut cart = CartStore::load(storage);
        cart.add_item(
            CartLineItem::new(Uuid::new_v4(), "Headphones", dec("40.00"), 1)
                .with_discount(BigDecimal::from(25)),
        );
        cart.add_item(CartLineItem::new(Uuid::new_v4(), "Cable", dec("5.00"), 2));
        cart
    }

    #[tokio::test]
    async fn successful_checkout_sends_snapshot_and_clears_cart() {
        let storage = MemoryStorage::new();
        let mut cart = filled_cart(storage.clone());
        let checkout = Checkout::new(FakeGateway::accepting());

        let order = checkout.place_order(&mut cart, &details(None)).await.unwrap();

        // subtotal 40, shipping 5.99, tax 3.20
        assert_eq!(order.total_amount, dec("49.19"));
        assert!(cart.is_empty());
        assert!(CartStore::load(storage).is_empty());

        let sent = checkout.gateway.sent.lock().unwrap();
        let items = sent[0].items.as_ref().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, Some(dec("40.00")));
        assert_eq!(items[0].discount_percent, Some(BigDecimal::from(25)));
        assert_eq!(sent[0].payment_method.as_deref(), Some("PAYPAL"));
    }

    #[tokio::test]
    async fn promo_lowers_the_submitted_total() {
        let mut cart = filled_cart(MemoryStorage::new());
        let checkout = Checkout::new(FakeGateway::accepting());
        let promo = PromoCode::lookup("discount20").unwrap();

        let order = checkout
            .place_order(&mut cart, &details(Some(promo)))
            .await
            .unwrap();

        // 40 + 5.99 + 3.20 - 8.00
        assert_eq!(order.total_amount, dec("41.19"));
    }

    #[tokio::test]
    async fn rejected_checkout_keeps_cart() {
        let mut cart = filled_cart(MemoryStorage::new());
        let before = cart.state();
        let checkout = Checkout::new(FakeGateway::rejecting());

        let err = checkout
            .place_order(&mut cart, &details(None))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected { status: 400, .. }));
        assert_eq!(cart.state(), before);
        assert_eq!(checkout.gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_cart_sends_nothing() {
        let mut cart = CartStore::load(MemoryStorage::new());
        let checkout = Checkout::new(FakeGateway::accepting());

        let err = checkout
            .place_order(&mut cart, &details(None))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(checkout.gateway.sent.lock().unwrap().is_empty());
    }
}
