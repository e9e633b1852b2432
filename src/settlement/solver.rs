//! LP solver seam
//!
//! [`LpSolver`] is the boundary between model building and the numeric
//! backend. [`GoodLpSolver`] drives `good_lp` with the pure-Rust minilp
//! engine; its one-time initialization probes the backend with a two-person
//! settlement before the handle is marked ready.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::OnceCell;

use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use super::{
    balances, build_constraints, build_matrix, build_objective, Bound, ConstraintSet, Direction,
    EdgeVar, Objective, Term,
};

/// A fully assembled linear program over edge variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    pub name: String,
    pub variables: Vec<EdgeVar>,
    pub objective: Objective,
    pub constraints: ConstraintSet,
}

/// Optimal value per variable, in the program's variable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    values: Vec<(EdgeVar, f64)>,
}

impl Assignment {
    pub fn get(&self, var: EdgeVar) -> Option<f64> {
        self.values.iter().find(|(v, _)| *v == var).map(|(_, x)| *x)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeVar, f64)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(EdgeVar, f64)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (EdgeVar, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolverError {
    #[error("Linear program is infeasible")]
    Infeasible,
    #[error("Linear program is unbounded")]
    Unbounded,
    #[error("Solver backend failed: {0}")]
    Backend(String),
    #[error("Solver engine failed to initialize: {0}")]
    Initialization(String),
    #[error("Constraint references unknown variable {0}")]
    UnknownVariable(EdgeVar),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LpSolver: Send + Sync {
    /// Bring the engine up. Idempotent; later calls return the cached outcome.
    async fn initialize(&self) -> Result<(), SolverError>;

    fn is_ready(&self) -> bool;

    async fn solve(&self, program: &LinearProgram) -> Result<Assignment, SolverError>;
}

/// `good_lp` backed solver client.
#[derive(Debug, Default)]
pub struct GoodLpSolver {
    engine: OnceCell<()>,
}

impl GoodLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    async fn solve_blocking(program: LinearProgram) -> Result<Assignment, SolverError> {
        tokio::task::spawn_blocking(move || solve_with_good_lp(&program))
            .await
            .map_err(|e| SolverError::Backend(format!("solver task aborted: {e}")))?
    }
}

#[async_trait]
impl LpSolver for GoodLpSolver {
    async fn initialize(&self) -> Result<(), SolverError> {
        self.engine
            .get_or_try_init(|| async {
                let started = std::time::Instant::now();
                let assignment = GoodLpSolver::solve_blocking(probe_program()?)
                    .await
                    .map_err(|e| SolverError::Initialization(format!("probe solve failed: {e}")))?;

                let flow = assignment.get(EdgeVar::new(0, 1)).unwrap_or(f64::NAN);
                if (flow - PROBE_FLOW).abs() > 1e-6 {
                    return Err(SolverError::Initialization(format!(
                        "probe solve returned {flow}, expected {PROBE_FLOW}"
                    )));
                }

                tracing::info!(
                    backend = "good_lp/minilp",
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "LP solver engine ready"
                );
                Ok::<(), SolverError>(())
            })
            .await
            .map(|_| ())
    }

    fn is_ready(&self) -> bool {
        self.engine.initialized()
    }

    async fn solve(&self, program: &LinearProgram) -> Result<Assignment, SolverError> {
        self.initialize().await?;
        Self::solve_blocking(program.clone()).await
    }
}

const PROBE_FLOW: f64 = 0.5;

/// Person 0 spent 0, person 1 spent 1: the only optimum moves 0.5 from 0 to 1.
fn probe_program() -> Result<LinearProgram, SolverError> {
    let matrix = build_matrix(2);
    let constraints = balances(&[0.0, 2.0 * PROBE_FLOW])
        .and_then(|balances| build_constraints(&balances, &matrix))
        .map_err(|e| SolverError::Initialization(e.to_string()))?;
    Ok(LinearProgram {
        name: "solverProbe".to_string(),
        variables: matrix.variables().to_vec(),
        objective: build_objective(matrix.variables()),
        constraints,
    })
}

fn to_expression(
    terms: &[Term],
    columns: &HashMap<EdgeVar, Variable>,
) -> Result<Expression, SolverError> {
    let mut expr = Expression::with_capacity(terms.len());
    for term in terms {
        let column = columns
            .get(&term.var)
            .ok_or(SolverError::UnknownVariable(term.var))?;
        expr.add_mul(term.coef, *column);
    }
    Ok(expr)
}

fn solve_with_good_lp(program: &LinearProgram) -> Result<Assignment, SolverError> {
    // Single-variable `x >= lb` rows go in as variable bounds.
    let mut lower_bounds: HashMap<EdgeVar, f64> = HashMap::new();
    for constraint in &program.constraints {
        if let Some((var, lb)) = constraint.as_variable_lower_bound() {
            lower_bounds
                .entry(var)
                .and_modify(|b| *b = b.max(lb))
                .or_insert(lb);
        }
    }

    let mut vars = ProblemVariables::new();
    let mut columns: HashMap<EdgeVar, Variable> = HashMap::with_capacity(program.variables.len());
    let mut order: Vec<(EdgeVar, Variable)> = Vec::with_capacity(program.variables.len());
    for &var in &program.variables {
        let definition = match lower_bounds.get(&var) {
            Some(&lb) => variable().min(lb),
            None => variable(),
        };
        let column = vars.add(definition);
        columns.insert(var, column);
        order.push((var, column));
    }

    let objective = to_expression(&program.objective.terms, &columns)?;
    let unsolved = match program.objective.direction {
        Direction::Minimize => vars.minimise(objective),
        Direction::Maximize => vars.maximise(objective),
    };
    let mut problem = unsolved.using(default_solver);

    for constraint in &program.constraints {
        if constraint.as_variable_lower_bound().is_some() {
            continue;
        }
        let expr = to_expression(&constraint.terms, &columns)?;
        problem = match constraint.bound {
            Bound::Fixed(value) => problem.with(expr.eq(value)),
            Bound::Lower(value) => problem.with(expr.geq(value)),
        };
    }

    let solution = problem.solve().map_err(|err| match err {
        ResolutionError::Infeasible => SolverError::Infeasible,
        ResolutionError::Unbounded => SolverError::Unbounded,
        other => SolverError::Backend(other.to_string()),
    })?;

    Ok(order
        .into_iter()
        .map(|(var, column)| (var, solution.value(column)))
        .collect())
}
