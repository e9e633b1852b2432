use super::{ConstraintMatrix, EdgeVar, SettlementError};

/// Bound on the value of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Lower and upper bound are both `value`
    Fixed(f64),
    /// Lower bound only
    Lower(f64),
}

impl Bound {
    pub fn is_satisfied_by(&self, value: f64, tolerance: f64) -> bool {
        match *self {
            Bound::Fixed(v) => (value - v).abs() <= tolerance,
            Bound::Lower(v) => value >= v - tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub var: EdgeVar,
    pub coef: f64,
}

impl Term {
    pub fn new(var: EdgeVar, coef: f64) -> Self {
        Self { var, coef }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<Term>,
    pub bound: Bound,
}

impl Constraint {
    /// `Some((var, lb))` when this is a plain `var >= lb` row, which solvers
    /// take as a variable bound instead of a full constraint row.
    pub fn as_variable_lower_bound(&self) -> Option<(EdgeVar, f64)> {
        match (self.bound, self.terms.as_slice()) {
            (Bound::Lower(lb), [term]) if term.coef == 1.0 => Some((term.var, lb)),
            _ => None,
        }
    }

    pub fn evaluate(&self, value_of: impl Fn(EdgeVar) -> f64) -> f64 {
        self.terms.iter().map(|t| t.coef * value_of(t.var)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }

    pub fn equalities(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints
            .iter()
            .filter(|c| matches!(c.bound, Bound::Fixed(_)))
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Flow conservation per person plus nonnegativity per edge.
///
/// Person rows come first (`person{p}`, fixed to `balances[p]`), followed by
/// one `edge{k}_nonnegative` row per matrix column.
pub fn build_constraints(
    balances: &[f64],
    matrix: &ConstraintMatrix,
) -> Result<ConstraintSet, SettlementError> {
    if balances.len() != matrix.people() {
        return Err(SettlementError::DimensionMismatch {
            balances: balances.len(),
            rows: matrix.people(),
        });
    }

    let mut set = ConstraintSet {
        constraints: Vec::with_capacity(matrix.people() + matrix.num_columns()),
    };

    for (person, &balance) in balances.iter().enumerate() {
        set.push(Constraint {
            name: format!("person{person}"),
            terms: matrix
                .row_terms(person)
                .map(|(var, coef)| Term::new(var, coef))
                .collect(),
            bound: Bound::Fixed(balance),
        });
    }

    for (edge_idx, &var) in matrix.variables().iter().enumerate() {
        set.push(Constraint {
            name: format!("edge{edge_idx}_nonnegative"),
            terms: vec![Term::new(var, 1.0)],
            bound: Bound::Lower(0.0),
        });
    }

    Ok(set)
}
