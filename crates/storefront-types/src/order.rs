//! Order snapshot types for the storefront service.
//!
//! An [`Order`] is created by checkout in `PREPARING` and then mutated by
//! exactly three writers: the customer's cancellation, staff advancement and
//! the payment callback. Everything else in the system reads snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A placed order as persisted by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Identifier of the customer who placed the order.
	pub customer_id: String,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// How the customer pays.
	pub payment_method: PaymentMethod,
	/// When checkout created the order. Never changes.
	pub created_at: DateTime<Utc>,
	/// When the last committed mutation happened.
	pub updated_at: DateTime<Utc>,
	/// When the payment provider reported the funds as captured.
	///
	/// Set at most once and only for non-cash orders.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_completed_at: Option<DateTime<Utc>>,
	/// Ordered line items.
	#[serde(default)]
	pub items: Vec<LineItem>,
	/// Order total, fixed at placement.
	pub total_amount: Decimal,
	/// Free text left by the customer at checkout.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
	/// Record revision, bumped on every committed mutation.
	#[serde(default)]
	pub version: u64,
}

impl Order {
	/// Returns true once the order can no longer change status.
	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}

	/// Total number of units across all line items.
	///
	/// Summed in `u64`, so no number of `u32` quantities can overflow it.
	pub fn item_count(&self) -> u64 {
		self.items.iter().map(|item| u64::from(item.quantity)).sum()
	}
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
	/// Display name of the menu item.
	pub name: String,
	/// Number of units ordered.
	pub quantity: u32,
	/// Price per unit including selected options.
	pub unit_price: Decimal,
	/// Comma separated list of selected options.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub options_text: String,
}

impl LineItem {
	/// Price of this line (`unit_price * quantity`), `None` when it does not
	/// fit in a `Decimal`.
	pub fn line_total(&self) -> Option<Decimal> {
		self.unit_price.checked_mul(Decimal::from(self.quantity))
	}
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// The kitchen is working on the order.
	Preparing,
	/// Packed and waiting for a courier.
	Ready,
	/// On its way to the customer.
	Delivering,
	/// Handed over. Terminal.
	Completed,
	/// Cancelled by the customer. Terminal.
	Cancelled,
}

impl OrderStatus {
	/// Every status, in lifecycle order with the side exit last.
	pub const ALL: [OrderStatus; 5] = [
		OrderStatus::Preparing,
		OrderStatus::Ready,
		OrderStatus::Delivering,
		OrderStatus::Completed,
		OrderStatus::Cancelled,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Preparing => "PREPARING",
			OrderStatus::Ready => "READY",
			OrderStatus::Delivering => "DELIVERING",
			OrderStatus::Completed => "COMPLETED",
			OrderStatus::Cancelled => "CANCELLED",
		}
	}

	/// Returns true for `COMPLETED` and `CANCELLED`.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
	}

	/// Returns true for the statuses staff still have to work on.
	pub fn is_active_work(&self) -> bool {
		matches!(
			self,
			OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::Delivering
		)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		OrderStatus::ALL
			.into_iter()
			.find(|status| status.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("unknown order status '{}'", s))
	}
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
	Cash,
	Card,
	BankTransfer,
}

impl PaymentMethod {
	/// Returns the wire representation of the payment method.
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentMethod::Cash => "cash",
			PaymentMethod::Card => "card",
			PaymentMethod::BankTransfer => "bank_transfer",
		}
	}
}

impl fmt::Display for PaymentMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Checkout payload used to place a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
	pub customer_id: String,
	pub payment_method: PaymentMethod,
	pub items: Vec<LineItem>,
	#[serde(default)]
	pub note: Option<String>,
}

/// Compact view of an order used by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
	pub id: String,
	pub customer_id: String,
	pub status: OrderStatus,
	pub payment_method: PaymentMethod,
	pub created_at: DateTime<Utc>,
	pub total_amount: Decimal,
	pub item_count: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
}

impl From<&Order> for OrderSummary {
	fn from(order: &Order) -> Self {
		Self {
			id: order.id.clone(),
			customer_id: order.customer_id.clone(),
			status: order.status,
			payment_method: order.payment_method,
			created_at: order.created_at,
			total_amount: order.total_amount,
			item_count: order.item_count(),
			note: order.note.clone(),
		}
	}
}
