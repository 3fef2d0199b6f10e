//! Calculation records and the arithmetic they are derived from.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The four supported arithmetic operations.
///
/// Wire names are the capitalized variant names (`"Add"`, `"Sub"`,
/// `"Multiply"`, `"Divide"`); anything else is rejected at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Operation {
    Add,
    Sub,
    Multiply,
    Divide,
}

/// Raised when the operands are invalid for the requested operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComputeError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,
}

impl Operation {
    /// Stable textual form used for database storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "Add",
            Operation::Sub => "Sub",
            Operation::Multiply => "Multiply",
            Operation::Divide => "Divide",
        }
    }

    /// Inverse of [`Operation::as_str`]. Returns `None` for unknown text.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Add" => Some(Operation::Add),
            "Sub" => Some(Operation::Sub),
            "Multiply" => Some(Operation::Multiply),
            "Divide" => Some(Operation::Divide),
            _ => None,
        }
    }

    /// Applies the operation to the operands.
    ///
    /// Fails before touching the store for `Divide` with `b == 0`; every
    /// persisted record therefore satisfies `result = f(op, a, b)`.
    pub fn compute(self, a: f64, b: f64) -> Result<f64, ComputeError> {
        match self {
            Operation::Add => Ok(a + b),
            Operation::Sub => Ok(a - b),
            Operation::Multiply => Ok(a * b),
            Operation::Divide => {
                if b == 0.0 {
                    Err(ComputeError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
        }
    }
}

/// A stored calculation. `result` is derived from the other fields and is
/// recomputed whenever the operands or operation change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Calculation {
    pub id: i64,
    pub a: f64,
    pub b: f64,
    #[serde(rename = "type")]
    pub op: Operation,
    pub result: f64,
}
