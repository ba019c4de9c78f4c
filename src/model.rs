//! Domain types stored in and returned by the tracker database.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A named item with its recorded initial material stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub initial_quantity: i64,
}

/// A requested production run for a named product.
///
/// `product_name` is free text and is not checked against the products table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionOrder {
    pub id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub delivery_date: String,
    pub status: OrderStatus,
}

/// Lifecycle state of a production order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl OrderStatus {
    /// Text stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "In progress",
            OrderStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the known labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in progress" | "in_progress" | "in-progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl ToSql for OrderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for OrderStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        // Stored values must match exactly; lenient parsing is for user input only.
        match text {
            "In progress" => Ok(OrderStatus::InProgress),
            "Completed" => Ok(OrderStatus::Completed),
            other => Err(FromSqlError::Other(Box::new(UnknownStatus(other.to_string())))),
        }
    }
}

/// Outcome of comparing a product's stock against a requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Producible { available: i64, required: i64 },
    Insufficient { available: i64, required: i64 },
    NotFound,
}

impl Availability {
    pub fn is_producible(&self) -> bool {
        matches!(self, Availability::Producible { .. })
    }
}

/// Orders grouped by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionReport {
    pub in_progress: Vec<ProductionOrder>,
    pub completed: Vec<ProductionOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_labels_leniently() {
        assert_eq!("In progress".parse(), Ok(OrderStatus::InProgress));
        assert_eq!("  completed ".parse(), Ok(OrderStatus::Completed));
        assert_eq!("IN-PROGRESS".parse(), Ok(OrderStatus::InProgress));
        assert_eq!(
            "Concluded".parse::<OrderStatus>(),
            Err(UnknownStatus("Concluded".to_string()))
        );
    }

    #[test]
    fn display_matches_stored_text() {
        assert_eq!(OrderStatus::InProgress.to_string(), "In progress");
        assert_eq!(OrderStatus::Completed.to_string(), "Completed");
    }

    #[test]
    fn availability_flag() {
        assert!(Availability::Producible { available: 5, required: 5 }.is_producible());
        assert!(!Availability::Insufficient { available: 4, required: 5 }.is_producible());
        assert!(!Availability::NotFound.is_producible());
    }
}
