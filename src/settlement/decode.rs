use super::{Assignment, Payment};

/// Flows at or below this are solver noise rather than transfers.
pub const DEFAULT_PAYMENT_EPSILON: f64 = 1e-9;

/// Keep edges carrying more than `epsilon`, in assignment order.
///
/// With `epsilon = 0.0` this is a strict `> 0` cut.
pub fn decode(assignment: &Assignment, epsilon: f64) -> Vec<Payment> {
    assignment
        .iter()
        .filter(|(_, amount)| *amount > epsilon)
        .map(|(var, amount)| Payment {
            from: var.from,
            to: var.to,
            amount,
        })
        .collect()
}
