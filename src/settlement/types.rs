use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::SolverError;

/// Position of a person in the caller-supplied spend list.
pub type PersonIndex = usize;

/// One directed edge of the transfer graph: money flowing `from` -> `to`.
///
/// Carried structurally from the model builder through to the decoder so no
/// solver-side variable names ever have to be parsed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeVar {
    pub from: PersonIndex,
    pub to: PersonIndex,
}

impl EdgeVar {
    pub fn new(from: PersonIndex, to: PersonIndex) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for EdgeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x_{}_{}", self.from, self.to)
    }
}

/// A single transfer in the settlement plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub from: PersonIndex,
    pub to: PersonIndex,
    pub amount: f64,
}

impl Payment {
    /// Copy with `amount` rounded to `decimals` places (e.g. cents for display).
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self {
            amount: (self.amount * factor).round() / factor,
            ..*self
        }
    }
}

/// Payments plus the objective value they achieve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub payments: Vec<Payment>,
    /// Total money changing hands across all payments
    pub total_exchanged: f64,
}

impl Settlement {
    pub fn from_payments(payments: Vec<Payment>) -> Self {
        let total_exchanged = payments.iter().map(|p| p.amount).sum();
        Self {
            payments,
            total_exchanged,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

/// Per-person `outflow - inflow` over a payment list.
///
/// For a valid settlement this matches each person's balance.
pub fn net_outflows(people: usize, payments: &[Payment]) -> Vec<f64> {
    let mut net = vec![0.0; people];
    for payment in payments {
        if let Some(out) = net.get_mut(payment.from) {
            *out += payment.amount;
        }
        if let Some(inc) = net.get_mut(payment.to) {
            *inc -= payment.amount;
        }
    }
    net
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Spend for person {index} is negative ({value})")]
    NegativeSpend { index: PersonIndex, value: f64 },
    #[error("Spend for person {index} is not a finite number ({value})")]
    NonFiniteSpend { index: PersonIndex, value: f64 },
    #[error("Average spend is not representable ({average})")]
    NonFiniteBalance { average: f64 },
    #[error("Transfer graph too large (people={people}, max={max_people})")]
    ModelTooLarge { people: usize, max_people: usize },
    #[error("Solver assignment breaks {constraint} (row evaluates to {value})")]
    ConservationViolated { constraint: String, value: f64 },
    #[error("Model dimension mismatch: {balances} balances for a {rows}-row matrix")]
    DimensionMismatch { balances: usize, rows: usize },
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl SettlementError {
    /// Whether the error was caused by the caller's input rather than the solver.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SettlementError::NegativeSpend { .. }
                | SettlementError::NonFiniteSpend { .. }
                | SettlementError::NonFiniteBalance { .. }
                | SettlementError::ModelTooLarge { .. }
        )
    }
}
