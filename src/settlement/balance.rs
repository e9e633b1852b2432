use super::SettlementError;

/// Reject spend lists the optimizer must not silently coerce.
pub fn validate_total_spent(total_spent: &[f64]) -> Result<(), SettlementError> {
    for (index, &value) in total_spent.iter().enumerate() {
        if !value.is_finite() {
            return Err(SettlementError::NonFiniteSpend { index, value });
        }
        if value < 0.0 {
            return Err(SettlementError::NegativeSpend { index, value });
        }
    }
    Ok(())
}

/// Net balance per person: `mean(total_spent) - total_spent[i]`.
///
/// Positive means the person spent less than average and has to pay out.
/// The mean divides before summing so totals near `f64::MAX` stay finite.
/// The last entry absorbs the floating-point residual so the balances feed
/// the equality constraints with a sum as close to zero as `f64` allows.
pub fn balances(total_spent: &[f64]) -> Result<Vec<f64>, SettlementError> {
    if total_spent.is_empty() {
        return Ok(Vec::new());
    }

    let people = total_spent.len() as f64;
    let avg: f64 = total_spent.iter().map(|spent| spent / people).sum();
    if !avg.is_finite() {
        return Err(SettlementError::NonFiniteBalance { average: avg });
    }

    let mut balances: Vec<f64> = total_spent.iter().map(|spent| avg - spent).collect();

    if let Some((last, rest)) = balances.split_last_mut() {
        if !rest.is_empty() {
            *last = -rest.iter().sum::<f64>();
        }
    }

    Ok(balances)
}
