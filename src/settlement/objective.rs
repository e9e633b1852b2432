use serde::{Deserialize, Serialize};

use super::{Assignment, EdgeVar, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub name: String,
    pub direction: Direction,
    pub terms: Vec<Term>,
}

impl Objective {
    pub fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coef * assignment.get(t.var).unwrap_or(0.0))
            .sum()
    }
}

/// Minimize the total money exchanged: every edge weighs 1.
pub fn build_objective(variables: &[EdgeVar]) -> Objective {
    Objective {
        name: "totalExchanged".to_string(),
        direction: Direction::Minimize,
        terms: variables.iter().map(|&var| Term::new(var, 1.0)).collect(),
    }
}
