//! Invoice totals: subtotal, GST and grand total.
//!
//! This is the only place amounts are rounded. Every figure leaves here
//! rounded half-up to cents; callers format, they never re-round.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::LineItem;

/// GST applied to every invoice.
pub const TAX_RATE: f64 = 0.18;

/// Nudge applied before rounding so values such as `1.005`, stored as
/// `1.00499999...`, still round up to the next cent.
const ROUNDING_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("Invalid line item at position {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },
}

/// Derived amounts for a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub grand_total: f64,
}

impl InvoiceTotals {
    pub fn zero() -> Self {
        Self {
            subtotal: 0.0,
            tax_rate: TAX_RATE,
            tax: 0.0,
            grand_total: 0.0,
        }
    }
}

/// Round half-up to two decimal places.
pub fn round2(value: f64) -> f64 {
    ((value + ROUNDING_EPSILON) * 100.0).round() / 100.0
}

/// Compute subtotal, tax and grand total for already validated items.
pub fn compute_totals(items: &[LineItem]) -> InvoiceTotals {
    if items.is_empty() {
        return InvoiceTotals::zero();
    }

    // Tax and grand total derive from the unrounded sum; only the reported
    // subtotal is rounded.
    let raw_subtotal: f64 = items.iter().map(LineItem::total).sum();
    let tax = round2(raw_subtotal * TAX_RATE);
    let grand_total = round2(raw_subtotal + tax);

    InvoiceTotals {
        subtotal: round2(raw_subtotal),
        tax_rate: TAX_RATE,
        tax,
        grand_total,
    }
}

/// Validate raw `(name, quantity, rate)` inputs and compute their totals.
///
/// Fails on the first invalid item, reporting its position.
pub fn compute_totals_from_inputs<I>(
    inputs: I,
) -> Result<(Vec<LineItem>, InvoiceTotals), CalculationError>
where
    I: IntoIterator<Item = crate::models::LineItemInput>,
{
    let items = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| LineItem::from_input(index, input))
        .collect::<Result<Vec<_>, _>>()?;

    let totals = compute_totals(&items);
    Ok((items, totals))
}
