//! # Receipts
//!
//! Builds the receipt for a persisted order and renders it as fixed-width
//! text. Sending the text to a printer is somebody else's job.
//!
//! ## Layout (width 40)
//! ```text
//! ========================================
//!               Corner Cafe
//!          Welcome to Corner Cafe
//! ========================================
//! Order:   ORD-000001
//! Date:    2024-03-01
//! Cashier: admin
//! ----------------------------------------
//! Latte
//!   2 x 22.00                   44.00 EGP
//! ----------------------------------------
//! Subtotal                      44.00 EGP
//! Discount                       0.00 EGP
//! Tax                            0.00 EGP
//! TOTAL                         44.00 EGP
//! Paid                          50.00 EGP
//! Change                         6.00 EGP
//! ========================================
//!          Thank you for visiting
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{format_amount, format_currency, sum_subtotals};
use crate::types::{Order, OrderItem};

/// Narrowest width the renderer will lay out.
pub const MIN_RECEIPT_WIDTH: usize = 32;

/// Shown when an item's product row no longer exists.
const UNKNOWN_PRODUCT: &str = "(deleted product)";
const UNKNOWN_CASHIER: &str = "-";

// =============================================================================
// Settings
// =============================================================================

/// The settings a receipt reads, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptSettings {
    pub cafe_name: String,
    pub cafe_address: String,
    pub currency_symbol: String,
    pub header: String,
    pub footer: String,
}

impl ReceiptSettings {
    /// Reads receipt settings from the key/value settings table.
    ///
    /// Missing or blank values fall back to defaults; the header defaults to
    /// a greeting that names the cafe.
    pub fn from_map(settings: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| {
            settings
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let cafe_name = get("cafe_name").unwrap_or_else(|| "Cafe".to_string());
        let header = get("receipt_header").unwrap_or_else(|| format!("Welcome to {cafe_name}"));

        ReceiptSettings {
            cafe_address: get("cafe_address").unwrap_or_default(),
            currency_symbol: get("currency_symbol").unwrap_or_default(),
            footer: get("receipt_footer").unwrap_or_else(|| "Thank you for your visit".to_string()),
            header,
            cafe_name,
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// One printed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Everything printed on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub order_no: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub cashier: String,
    pub items: Vec<ReceiptLine>,
    /// Recomputed from the persisted lines, not taken from the header.
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub total: f64,
    pub paid: f64,
    pub change: f64,
    pub cafe_name: String,
    pub cafe_address: String,
    pub currency_symbol: String,
    pub receipt_header: String,
    pub receipt_footer: String,
}

impl Receipt {
    pub fn build(order: &Order, items: &[OrderItem], settings: &ReceiptSettings) -> Self {
        let lines: Vec<ReceiptLine> = items
            .iter()
            .map(|item| ReceiptLine {
                name: item
                    .product_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                quantity: item.qty,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            })
            .collect();

        Receipt {
            order_no: order.order_no.clone(),
            date: order.date,
            cashier: order
                .user_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_CASHIER.to_string()),
            subtotal: sum_subtotals(items.iter().map(|i| (i.qty, i.unit_price))),
            items: lines,
            discount: order.discount,
            tax: order.tax,
            total: order.total,
            paid: order.paid,
            change: order.change(),
            cafe_name: settings.cafe_name.clone(),
            cafe_address: settings.cafe_address.clone(),
            currency_symbol: settings.currency_symbol.clone(),
            receipt_header: settings.header.clone(),
            receipt_footer: settings.footer.clone(),
        }
    }

    /// Renders the receipt as plain text, `width` columns wide.
    pub fn render_text(&self, width: usize) -> String {
        let width = width.max(MIN_RECEIPT_WIDTH);
        let money = |v: f64| format_currency(v, &self.currency_symbol);
        let mut out = Vec::new();

        out.push("=".repeat(width));
        out.push(center(&self.cafe_name, width));
        if !self.cafe_address.is_empty() {
            out.push(center(&self.cafe_address, width));
        }
        out.push(center(&self.receipt_header, width));
        out.push("=".repeat(width));

        out.push(truncate(&format!("Order:   {}", self.order_no), width));
        out.push(format!("Date:    {}", self.date.format("%Y-%m-%d")));
        out.push(truncate(&format!("Cashier: {}", self.cashier), width));
        out.push("-".repeat(width));

        for line in &self.items {
            out.push(truncate(&line.name, width));
            let qty = format!("  {} x {}", line.quantity, format_amount(line.unit_price));
            out.push(columns(&qty, &money(line.subtotal), width));
        }
        out.push("-".repeat(width));

        out.push(columns("Subtotal", &money(self.subtotal), width));
        out.push(columns("Discount", &money(self.discount), width));
        out.push(columns("Tax", &money(self.tax), width));
        out.push(columns("TOTAL", &money(self.total), width));
        out.push(columns("Paid", &money(self.paid), width));
        out.push(columns("Change", &money(self.change), width));
        out.push("=".repeat(width));
        out.push(center(&self.receipt_footer, width));

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

// =============================================================================
// Layout helpers
// =============================================================================

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

fn center(s: &str, width: usize) -> String {
    let s = truncate(s, width);
    let pad = (width - s.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), s)
}

/// Left text and right-aligned value on one line; the value wins if they
/// do not both fit.
fn columns(left: &str, right: &str, width: usize) -> String {
    let right_len = right.chars().count();
    let room = width.saturating_sub(right_len + 1);
    let left = truncate(left, room);
    let gap = width.saturating_sub(left.chars().count() + right_len);
    format!("{}{}{}", left, " ".repeat(gap.max(1)), right)
}
