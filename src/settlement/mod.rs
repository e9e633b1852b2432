//! Debt settlement optimizer
//!
//! Turns per-person trip spend into the cheapest set of transfers that
//! equalizes everyone's net contribution. The pipeline runs strictly forward:
//! - balance: raw totals to net balances
//! - model: transfer-flow matrix over the complete directed graph
//! - constraints / objective: the linear program
//! - solver: LP backend behind the [`LpSolver`] seam
//! - decode: raw assignment to payments

pub mod balance;
pub mod constraints;
pub mod decode;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod solver;
pub mod types;

pub use balance::*;
pub use constraints::*;
pub use decode::*;
pub use model::*;
pub use objective::*;
pub use optimizer::*;
pub use solver::*;
pub use types::*;
