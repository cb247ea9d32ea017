//! Line item model.

use serde::{Deserialize, Serialize};

use crate::services::totals::CalculationError;

/// Unvalidated line item as submitted by a client.
///
/// Any `total` sent alongside is ignored; totals are always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub name: String,
    pub quantity: f64,
    pub rate: f64,
}

/// Line item on an invoice. `total` is always `quantity * rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LineItemInput")]
pub struct LineItem {
    name: String,
    quantity: f64,
    rate: f64,
    total: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: f64, rate: f64) -> Result<Self, CalculationError> {
        Self::validated(0, name.into(), quantity, rate)
    }

    /// Validate an item at position `index` of an invoice.
    pub fn from_input(index: usize, input: LineItemInput) -> Result<Self, CalculationError> {
        Self::validated(index, input.name, input.quantity, input.rate)
    }

    fn validated(
        index: usize,
        name: String,
        quantity: f64,
        rate: f64,
    ) -> Result<Self, CalculationError> {
        let invalid = |reason: &str| CalculationError::InvalidLineItem {
            index,
            reason: reason.to_string(),
        };

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(invalid("quantity must be a positive number"));
        }
        if !rate.is_finite() || rate < 0.0 {
            return Err(invalid("rate must be a non-negative number"));
        }

        Ok(Self {
            name,
            quantity,
            rate,
            total: quantity * rate,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

impl TryFrom<LineItemInput> for LineItem {
    type Error = CalculationError;

    fn try_from(input: LineItemInput) -> Result<Self, Self::Error> {
        Self::from_input(0, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_quantity_times_rate() {
        let item = LineItem::new("Consulting", 2.0, 50.0).unwrap();
        assert_eq!(item.total(), 100.0);
        assert_eq!(item.name(), "Consulting");
    }

    #[test]
    fn rejects_negative_rate() {
        let err = LineItem::new("Refund", 1.0, -5.0).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidLineItem { index: 0, .. }));
    }

    #[test]
    fn rejects_zero_quantity() {
        assert!(LineItem::new("Nothing", 0.0, 10.0).is_err());
    }

    #[test]
    fn rejects_nan() {
        assert!(LineItem::new("Broken", f64::NAN, 10.0).is_err());
        assert!(LineItem::new("Broken", 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_blank_name() {
        assert!(LineItem::new("   ", 1.0, 10.0).is_err());
    }

    #[test]
    fn deserializing_recomputes_stale_total() {
        let item: LineItem =
            serde_json::from_str(r#"{"name":"Widget","quantity":3,"rate":2.5,"total":999}"#)
                .unwrap();
        assert_eq!(item.total(), 7.5);
    }

    #[test]
    fn deserializing_rejects_invalid_item() {
        let result: Result<LineItem, _> =
            serde_json::from_str(r#"{"name":"Widget","quantity":-1,"rate":2.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serializes_derived_total() {
        let item = LineItem::new("Widget", 4.0, 2.5).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["total"], 10.0);
    }
}
