//! Checkout - form validation and (simulated) order submission.
//!
//! The form is validated before every submission attempt, one rule at a time, and
//! only the first violated rule is reported. A valid form is turned into an
//! in-memory [`Order`], handed to an [`OrderSubmitter`], and on success the cart is
//! cleared and the flow moves to the confirmation step with a random order number.
//! Orders are not persisted anywhere.

use crate::{
    config::settings::PricingConfig,
    core::{
        cart::CartSession,
        pricing::{CatalogItem, CouponState, OrderTotals},
        storage::LocalStorage,
    },
    errors::{Error, Result, SUBMISSION_FAILURE_MESSAGE},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info, instrument};

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[allow(clippy::expect_used)]
static EXPIRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("expiry pattern is valid"));

#[allow(clippy::expect_used)]
static CVV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("cvv pattern is valid"));

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Card details are collected and validated
    #[default]
    CreditCard,
    /// Paid to the courier
    CashOnDelivery,
    /// Paid by bank transfer after the order is placed
    BankTransfer,
}

/// Everything the checkout page collects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    /// Recipient name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone, any formatting
    pub phone: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Delivery notes
    pub notes: String,
    /// Terms and conditions accepted
    pub agree_to_terms: bool,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Card number, any spacing
    pub card_number: String,
    /// Card expiry as MM/YY
    pub expiry: String,
    /// Card security code
    pub cvv: String,
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Validates the form, reporting the first violated rule.
///
/// # Errors
/// Returns [`Error::Validation`] naming the first rule that fails, in this order:
/// required fields, terms, email shape, phone length, then card details when paying
/// by card.
pub fn validate_form(form: &CheckoutForm) -> Result<()> {
    let required = [
        &form.full_name,
        &form.email,
        &form.phone,
        &form.address,
        &form.city,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(Error::validation("Please fill in all required fields"));
    }

    if !form.agree_to_terms {
        return Err(Error::validation("Please agree to the terms and conditions"));
    }

    if !EMAIL_PATTERN.is_match(form.email.trim()) {
        return Err(Error::validation("Please enter a valid email address"));
    }

    let phone_digits = digits(&form.phone).len();
    if !(9..=15).contains(&phone_digits) {
        return Err(Error::validation("Please enter a valid phone number"));
    }

    if form.payment_method == PaymentMethod::CreditCard {
        if digits(&form.card_number).len() != 16 {
            return Err(Error::validation("Please enter a valid 16-digit card number"));
        }
        if !EXPIRY_PATTERN.is_match(form.expiry.trim()) {
            return Err(Error::validation("Please enter a valid expiry date (MM/YY)"));
        }
        if !CVV_PATTERN.is_match(form.cvv.trim()) {
            return Err(Error::validation("Please enter a valid CVV"));
        }
    }

    Ok(())
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    /// Catalog id
    pub item_id: String,
    /// Name at the time of ordering
    pub name: String,
    /// Unit price at the time of ordering
    pub unit_price: f64,
    /// Quantity
    pub quantity: u32,
    /// unit price x quantity
    pub line_total: f64,
}

/// The in-memory order built at submission time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    /// Resolved cart lines
    pub lines: Vec<OrderLine>,
    /// Recipient name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Delivery notes
    pub notes: String,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Price breakdown
    pub totals: OrderTotals,
    /// When the order was built
    pub created_at: DateTime<Utc>,
}

/// Sends an order somewhere.
pub trait OrderSubmitter {
    /// Submits the order; an error means nothing was placed.
    fn submit(&self, order: &Order) -> impl Future<Output = Result<()>> + Send;
}

/// Stand-in for a payment backend: waits, then accepts every order.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSubmitter {
    latency: Duration,
}

impl SimulatedSubmitter {
    /// A submitter that takes `latency` to respond.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl OrderSubmitter for SimulatedSubmitter {
    async fn submit(&self, order: &Order) -> Result<()> {
        tokio::time::sleep(self.latency).await;
        info!(
            "Simulated order accepted: {} line(s), total {:.2}",
            order.lines.len(),
            order.totals.total
        );
        Ok(())
    }
}

/// Random display-only order number in 100000..=999999.
#[must_use]
pub fn generate_order_number() -> u32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

/// Where the checkout page is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Filling in the form
    Form,
    /// Order placed
    Confirmed {
        /// Number shown to the customer
        order_number: u32,
    },
}

/// State of the checkout page.
#[derive(Debug)]
pub struct CheckoutFlow {
    /// Form contents
    pub form: CheckoutForm,
    coupon: CouponState,
    pricing: PricingConfig,
    error: Option<String>,
    submitting: bool,
    step: CheckoutStep,
}

impl CheckoutFlow {
    /// Empty form using the given pricing constants.
    #[must_use]
    pub fn new(pricing: PricingConfig) -> Self {
        Self {
            form: CheckoutForm::default(),
            coupon: CouponState::default(),
            pricing,
            error: None,
            submitting: false,
            step: CheckoutStep::Form,
        }
    }

    /// Message for the last failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Coupon state.
    #[must_use]
    pub const fn coupon(&self) -> &CouponState {
        &self.coupon
    }

    /// Applies a coupon code against the cart's current subtotal.
    pub fn apply_coupon<S: LocalStorage>(
        &mut self,
        code: &str,
        cart: &CartSession<S>,
        items: &[CatalogItem],
    ) -> bool {
        let subtotal = cart.total_price(items);
        self.coupon.apply(code, subtotal, &self.pricing)
    }

    /// Price breakdown of the cart with the applied discount.
    #[must_use]
    pub fn totals<S: LocalStorage>(
        &self,
        cart: &CartSession<S>,
        items: &[CatalogItem],
    ) -> OrderTotals {
        OrderTotals::compute(cart.total_price(items), self.coupon.discount, &self.pricing)
    }

    /// Validates the form, recording the first failure or clearing the error.
    pub fn validate(&mut self) -> bool {
        match validate_form(&self.form) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.user_message());
                false
            }
        }
    }

    fn build_order<S: LocalStorage>(&self, cart: &CartSession<S>, items: &[CatalogItem]) -> Order {
        let lines = cart
            .line_items(items)
            .into_iter()
            .map(|line| OrderLine {
                item_id: line.item.id.clone(),
                name: line.item.name.clone(),
                unit_price: line.item.price,
                quantity: line.quantity,
                line_total: line.line_total,
            })
            .collect();

        Order {
            lines,
            full_name: self.form.full_name.trim().to_string(),
            email: self.form.email.trim().to_string(),
            phone: self.form.phone.trim().to_string(),
            address: self.form.address.trim().to_string(),
            city: self.form.city.trim().to_string(),
            notes: self.form.notes.trim().to_string(),
            payment_method: self.form.payment_method,
            totals: self.totals(cart, items),
            created_at: Utc::now(),
        }
    }

    /// Validates and submits the order.
    ///
    /// On success the cart is cleared, the flow moves to [`CheckoutStep::Confirmed`]
    /// and the order number is returned. A submission failure records a generic
    /// message and leaves the cart untouched. Nothing is retried.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The form fails validation
    /// - The cart has nothing that resolves against the catalog
    /// - The submitter fails ([`Error::Submission`])
    /// - Clearing the cart storage fails
    #[instrument(skip_all)]
    pub async fn submit<S, P>(
        &mut self,
        cart: &mut CartSession<S>,
        items: &[CatalogItem],
        submitter: &P,
    ) -> Result<u32>
    where
        S: LocalStorage,
        P: OrderSubmitter,
    {
        if let Err(e) = validate_form(&self.form) {
            self.error = Some(e.user_message());
            return Err(e);
        }

        if cart.line_items(items).is_empty() {
            let err = Error::validation("Your cart is empty");
            self.error = Some(err.user_message());
            return Err(err);
        }
        self.error = None;

        let order = self.build_order(cart, items);
        self.submitting = true;
        let submitted = submitter.submit(&order).await;
        self.submitting = false;

        if let Err(e) = submitted {
            error!("Order submission failed: {}", e);
            self.error = Some(SUBMISSION_FAILURE_MESSAGE.to_string());
            return Err(Error::Submission {
                message: e.to_string(),
            });
        }

        let order_number = generate_order_number();
        if let Err(e) = cart.clear() {
            self.error = Some(e.user_message());
            return Err(e);
        }
        self.coupon = CouponState::default();
        self.step = CheckoutStep::Confirmed { order_number };
        info!("Order {} placed", order_number);
        Ok(order_number)
    }
}
