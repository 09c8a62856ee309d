//! # Domain Types
//!
//! Core domain types used throughout the cafe register.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (integer)   │   │  id (integer)   │   │  order_id (FK)  │       │
//! │  │  sku (unique)   │   │  order_no       │   │  product_id(FK) │       │
//! │  │  price          │   │  total/paid     │   │  qty/unit_price │       │
//! │  │  stock (>= 0)   │   │  payment_method │   │  subtotal       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Cart       │   │ PaymentMethod   │   │      Role       │       │
//! │  │  (transient)    │   │  cash           │   │  admin          │       │
//! │  │  lines + totals │   │  card           │   │  cashier        │       │
//! │  └─────────────────┘   │  wallet         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Entities use the store's integer row ids. Orders additionally carry a
//! human-readable `order_no` (see [`crate::OrderNumber`]).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money;

// =============================================================================
// Role
// =============================================================================

/// Role of a register user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    /// Manages products, users, settings and maintenance.
    Admin,
    /// Takes orders.
    Cashier,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "cashier" => Ok(Role::Cashier),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".to_string(), "cashier".to_string()],
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an order was paid.
///
/// The method is only a label: no payment is processed by the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Card,
    Wallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Wallet];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown on the grid and on receipts.
    pub name: String,

    /// Current list price. Orders capture their own copy.
    pub price: f64,

    /// Free-text grouping label ("Hot Drinks", "Pastries").
    pub category: String,

    /// Optional image path or URL.
    pub image: Option<String>,

    /// Unique stock keeping unit, doubles as the barcode.
    pub sku: String,

    /// Sellable units on hand. Never negative.
    pub stock: i64,

    /// Inactive products are hidden from the grid and barcode lookup.
    pub is_active: bool,

    #[ts(type = "string")]
    pub created_at: NaiveDateTime,

    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Whether `qty` units can be taken from stock.
    #[inline]
    pub fn can_fulfil(&self, qty: i64) -> bool {
        qty <= self.stock
    }
}

/// Fields for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub sku: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
}

/// Full replacement of a product's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub sku: String,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
    pub is_active: bool,
}

/// Product listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    /// Substring matched against name and SKU.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact category match.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

// =============================================================================
// User
// =============================================================================

/// A register user. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

/// Fields for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Changes to a user. A `None` password keeps the current one.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A persisted order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,

    /// Human-readable number, `ORD-NNNNNN`.
    pub order_no: String,

    /// Calendar day the order was placed.
    #[ts(type = "string")]
    pub date: NaiveDate,

    pub total: f64,
    pub discount: f64,
    pub tax: f64,
    pub paid: f64,
    pub payment_method: PaymentMethod,

    /// Cashier who took the order.
    pub user_id: i64,

    /// Cashier username, when joined.
    pub user_name: Option<String>,
}

impl Order {
    #[inline]
    pub fn change(&self) -> f64 {
        self.paid - self.total
    }
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub qty: i64,

    /// Price captured when the order was placed.
    pub unit_price: f64,

    /// `qty * unit_price`.
    pub subtotal: f64,

    /// Product name, when joined. `None` if the product row is gone.
    pub product_name: Option<String>,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order listing filter. Dates are inclusive calendar days.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    #[serde(default)]
    #[ts(type = "string | null")]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<i64>,
}

// =============================================================================
// Cart
// =============================================================================

/// One requested line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: i64,
    pub qty: i64,
    pub unit_price: f64,
}

impl CartLine {
    #[inline]
    pub fn subtotal(&self) -> f64 {
        money::line_subtotal(self.qty, self.unit_price)
    }
}

/// A validated, typed purchase request. Exists for one checkout only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub total: f64,
    pub discount: f64,
    pub tax: f64,
    pub paid: f64,
    pub payment_method: PaymentMethod,
    pub user_id: i64,
}

impl Cart {
    /// Sum of line subtotals, in line order.
    pub fn subtotal(&self) -> f64 {
        money::sum_subtotals(self.items.iter().map(|l| (l.qty, l.unit_price)))
    }

    /// `subtotal - discount + tax`, the only authoritative total.
    pub fn expected_total(&self) -> f64 {
        self.subtotal() - self.discount + self.tax
    }

    #[inline]
    pub fn change(&self) -> f64 {
        self.paid - self.total
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FulfilledOrder {
    pub order_id: i64,
    pub order_no: String,
    pub change: f64,
}

/// A cart line the store cannot satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shortage {
    pub product_id: i64,
    pub name: String,
    pub available: i64,
    pub requested: i64,
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (available: {}, requested: {})",
            self.name, self.available, self.requested
        )
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Order totals over a set of orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesTotals {
    pub orders_count: i64,
    pub total_sales: f64,
    pub avg_order_value: f64,
    pub total_discount: f64,
    pub total_tax: f64,
}

/// Revenue per payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethodTotal {
    pub payment_method: PaymentMethod,
    pub count: i64,
    pub total: f64,
}

/// A best-selling product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub quantity_sold: i64,
    pub total_revenue: f64,
    pub orders_count: i64,
}

/// Summary of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub totals: SalesTotals,
    pub total_items_sold: i64,
    pub payment_methods: Vec<PaymentMethodTotal>,
    pub top_products: Vec<TopProduct>,
}

/// Catalogue size and what it sold over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductsOverview {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_items_sold: i64,
    pub total_revenue: f64,
}

/// A payment method's share of the orders in a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethodShare {
    pub payment_method: PaymentMethod,
    pub count: i64,
    pub total: f64,
    /// Percent of the range's orders, two decimals.
    pub percentage: f64,
}

/// Sales of one category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategorySales {
    pub category: String,
    pub products_count: i64,
    pub items_sold: i64,
    pub revenue: f64,
}

/// Everything the reports dashboard shows for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesOverview {
    #[ts(type = "string")]
    pub from: NaiveDate,
    #[ts(type = "string")]
    pub to: NaiveDate,
    pub totals: SalesTotals,
    pub products: ProductsOverview,
    pub payment_methods: Vec<PaymentMethodShare>,
    pub categories: Vec<CategorySales>,
}

/// Granularity of a sales report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SalesGrouping {
    #[default]
    Day,
    Month,
    Year,
}

impl SalesGrouping {
    /// `strftime` pattern producing the period label.
    pub const fn strftime_pattern(&self) -> &'static str {
        match self {
            SalesGrouping::Day => "%Y-%m-%d",
            SalesGrouping::Month => "%Y-%m",
            SalesGrouping::Year => "%Y",
        }
    }
}

/// Sales aggregated over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesPeriod {
    /// `2024-03-01`, `2024-03` or `2024` depending on the grouping.
    pub period: String,
    pub orders_count: i64,
    pub total_sales: f64,
    pub total_discount: f64,
    pub total_tax: f64,
    pub avg_order_value: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(lines: &[(i64, i64, f64)], discount: f64, tax: f64) -> Cart {
        let items: Vec<CartLine> = lines
            .iter()
            .map(|&(product_id, qty, unit_price)| CartLine {
                product_id,
                qty,
                unit_price,
            })
            .collect();
        Cart {
            items,
            total: 0.0,
            discount,
            tax,
            paid: 0.0,
            payment_method: PaymentMethod::Cash,
            user_id: 1,
        }
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("wallet".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wallet);
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::Card).unwrap();
        assert_eq!(json, "\"card\"");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_cart_expected_total() {
        let c = cart(&[(1, 2, 10.0), (2, 1, 5.5)], 2.0, 3.0);
        assert_eq!(c.subtotal(), 25.5);
        assert_eq!(c.expected_total(), 26.5);
    }

    #[test]
    fn test_fulfilled_order_is_camel_case() {
        let result = FulfilledOrder {
            order_id: 7,
            order_no: "ORD-000007".to_string(),
            change: 1.5,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["orderId"], 7);
        assert_eq!(value["orderNo"], "ORD-000007");
        assert_eq!(value["change"], 1.5);
    }

    #[test]
    fn test_shortage_display() {
        let s = Shortage {
            product_id: 3,
            name: "Latte".to_string(),
            available: 1,
            requested: 3,
        };
        assert_eq!(s.to_string(), "Latte (available: 1, requested: 3)");
    }

    #[test]
    fn test_sales_grouping_patterns() {
        assert_eq!(SalesGrouping::default(), SalesGrouping::Day);
        assert_eq!(SalesGrouping::Month.strftime_pattern(), "%Y-%m");
        let g: SalesGrouping = serde_json::from_str("\"year\"").unwrap();
        assert_eq!(g, SalesGrouping::Year);
    }
}
