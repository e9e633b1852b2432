use super::{EdgeVar, PersonIndex};

/// Number of directed edges in a complete graph over `people` nodes.
pub fn num_edges(people: usize) -> usize {
    people * people.saturating_sub(1)
}

/// The "A" in `Ax = b`: one row per person, one column per directed edge.
///
/// The column for `x_{i,j}` holds `+1` in row `i` and `-1` in row `j`, so a
/// row times `x` is that person's net outflow.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintMatrix {
    rows: Vec<Vec<f64>>,
    variables: Vec<EdgeVar>,
}

impl ConstraintMatrix {
    /// Build the matrix with a fixed column order: for each `person` and each
    /// `other < person`, first `x_{person}_{other}`, then `x_{other}_{person}`.
    pub fn build(people: usize) -> Self {
        let edges = num_edges(people);
        let mut rows = vec![vec![0.0; edges]; people];
        let mut variables = Vec::with_capacity(edges);

        for person in 0..people {
            for other in 0..person {
                let col = variables.len();
                rows[person][col] = 1.0;
                rows[other][col] = -1.0;
                variables.push(EdgeVar::new(person, other));

                let col = variables.len();
                rows[person][col] = -1.0;
                rows[other][col] = 1.0;
                variables.push(EdgeVar::new(other, person));
            }
        }

        debug_assert_eq!(variables.len(), edges);
        Self { rows, variables }
    }

    pub fn people(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[EdgeVar] {
        &self.variables
    }

    pub fn row(&self, person: PersonIndex) -> Option<&[f64]> {
        self.rows.get(person).map(Vec::as_slice)
    }

    /// Nonzero `(variable, coefficient)` pairs of one row.
    pub fn row_terms(&self, person: PersonIndex) -> impl Iterator<Item = (EdgeVar, f64)> + '_ {
        self.row(person)
            .unwrap_or_default()
            .iter()
            .zip(&self.variables)
            .filter(|(coef, _)| **coef != 0.0)
            .map(|(coef, var)| (*var, *coef))
    }
}

pub fn build_matrix(people: usize) -> ConstraintMatrix {
    ConstraintMatrix::build(people)
}
