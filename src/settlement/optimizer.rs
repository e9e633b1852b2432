use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    balances, build_constraints, build_matrix, build_objective, decode, validate_total_spent,
    Assignment, EdgeVar, LinearProgram, LpSolver, Payment, Settlement, SettlementError,
    DEFAULT_PAYMENT_EPSILON,
};
use crate::config::SolverConfig;

/// Relative slack allowed on each person's flow-conservation row.
const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Assemble the settlement LP for one spend list.
///
/// Callers are expected to have validated `total_spent` already.
pub fn build_linear_program(total_spent: &[f64]) -> Result<LinearProgram, SettlementError> {
    let balances = balances(total_spent)?;
    let matrix = build_matrix(total_spent.len());
    let constraints = build_constraints(&balances, &matrix)?;
    let objective = build_objective(matrix.variables());

    Ok(LinearProgram {
        name: "tripExpenseLinearProgram".to_string(),
        variables: matrix.variables().to_vec(),
        objective,
        constraints,
    })
}

/// Reject an assignment that breaks any person's flow-conservation row.
pub fn verify_conservation(
    program: &LinearProgram,
    assignment: &Assignment,
) -> Result<(), SettlementError> {
    let values: HashMap<EdgeVar, f64> = assignment.iter().collect();
    for constraint in program.constraints.equalities() {
        let value = constraint.evaluate(|var| values.get(&var).copied().unwrap_or(0.0));
        let tolerance = CONSERVATION_TOLERANCE * value.abs().max(1.0);
        if !constraint.bound.is_satisfied_by(value, tolerance) {
            return Err(SettlementError::ConservationViolated {
                constraint: constraint.name.clone(),
                value,
            });
        }
    }
    Ok(())
}

/// Computes the cheapest set of transfers that equalizes everyone's spend.
///
/// Holds a shared solver handle only; every call builds its own model.
pub struct DebtSettlementOptimizer {
    solver: Arc<dyn LpSolver>,
    payment_epsilon: f64,
    max_people: Option<usize>,
}

impl DebtSettlementOptimizer {
    pub fn new(solver: Arc<dyn LpSolver>) -> Self {
        Self {
            solver,
            payment_epsilon: DEFAULT_PAYMENT_EPSILON,
            max_people: None,
        }
    }

    pub fn from_config(cfg: &SolverConfig, solver: Arc<dyn LpSolver>) -> Self {
        Self::new(solver)
            .with_payment_epsilon(cfg.payment_epsilon)
            .with_max_people(cfg.max_people)
    }

    pub fn with_payment_epsilon(mut self, epsilon: f64) -> Self {
        self.payment_epsilon = epsilon.max(0.0);
        self
    }

    pub fn with_max_people(mut self, max_people: usize) -> Self {
        self.max_people = Some(max_people);
        self
    }

    pub fn solver(&self) -> &Arc<dyn LpSolver> {
        &self.solver
    }

    /// Transfers settling `total_spent`, one entry per edge with positive flow.
    ///
    /// Empty input and single-person groups return no payments without
    /// touching the solver. Solver failures are returned as-is.
    pub async fn solve_payments(&self, total_spent: &[f64]) -> Result<Vec<Payment>, SettlementError> {
        validate_total_spent(total_spent)?;

        let people = total_spent.len();
        if let Some(max_people) = self.max_people {
            if people > max_people {
                return Err(SettlementError::ModelTooLarge { people, max_people });
            }
        }
        if people <= 1 {
            return Ok(Vec::new());
        }

        let program = build_linear_program(total_spent)?;
        debug!(
            people,
            variables = program.variables.len(),
            constraints = program.constraints.len(),
            "solving settlement program"
        );

        let assignment = match self.solver.solve(&program).await {
            Ok(assignment) => assignment,
            Err(e) => {
                warn!(error = %e, people, "settlement solve failed");
                return Err(e.into());
            }
        };

        if let Err(e) = verify_conservation(&program, &assignment) {
            warn!(error = %e, people, "solver assignment rejected");
            return Err(e);
        }

        let payments = decode(&assignment, self.payment_epsilon);
        info!(
            people,
            payments = payments.len(),
            total_exchanged = program.objective.evaluate(&assignment),
            "settlement solved"
        );
        Ok(payments)
    }

    pub async fn settle(&self, total_spent: &[f64]) -> Result<Settlement, SettlementError> {
        self.solve_payments(total_spent)
            .await
            .map(Settlement::from_payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::{Assignment, EdgeVar, MockLpSolver, SolverError};

    fn optimizer_with(mock: MockLpSolver) -> DebtSettlementOptimizer {
        DebtSettlementOptimizer::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn empty_input_skips_solver() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve().never();
        let payments = optimizer_with(mock).solve_payments(&[]).await.unwrap();
        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn single_person_skips_solver() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve().never();
        let settlement = optimizer_with(mock).settle(&[99.0]).await.unwrap();
        assert!(settlement.is_empty());
        assert_eq!(settlement.total_exchanged, 0.0);
    }

    #[tokio::test]
    async fn invalid_input_skips_solver() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve().never();
        let err = optimizer_with(mock)
            .solve_payments(&[10.0, -1.0])
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::NegativeSpend { index: 1, .. }));
    }

    #[tokio::test]
    async fn oversized_group_is_rejected() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve().never();
        let err = optimizer_with(mock)
            .with_max_people(2)
            .solve_payments(&[1.0, 2.0, 3.0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::ModelTooLarge { people: 3, max_people: 2 }
        ));
    }

    #[tokio::test]
    async fn solver_failure_propagates() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve()
            .times(1)
            .returning(|_| Err(SolverError::Infeasible));
        let err = optimizer_with(mock)
            .solve_payments(&[1.0, 2.0])
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::Solver(SolverError::Infeasible)));
    }

    #[tokio::test]
    async fn decodes_solver_assignment() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve()
            .withf(|program| program.variables.len() == 2 && program.constraints.len() == 4)
            .returning(|program| {
                Ok(program
                    .variables
                    .iter()
                    .map(|&var| (var, if var == EdgeVar::new(0, 1) { 5.0 } else { 1e-13 }))
                    .collect::<Assignment>())
            });
        let settlement = optimizer_with(mock).settle(&[0.0, 10.0]).await.unwrap();
        assert_eq!(
            settlement.payments,
            vec![Payment { from: 0, to: 1, amount: 5.0 }]
        );
        assert_eq!(settlement.total_exchanged, 5.0);
    }

    #[tokio::test]
    async fn assignment_breaking_conservation_is_rejected() {
        let mut mock = MockLpSolver::new();
        mock.expect_solve().returning(|program| {
            Ok(program
                .variables
                .iter()
                .map(|&var| (var, 0.0))
                .collect::<Assignment>())
        });
        let err = optimizer_with(mock)
            .solve_payments(&[0.0, 10.0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::ConservationViolated { ref constraint, .. } if constraint == "person0"
        ));
    }

    #[test]
    fn conserving_assignment_passes_verification() {
        let program = build_linear_program(&[1.0, 2.0, 3.0]).unwrap();
        let assignment: Assignment = program
            .variables
            .iter()
            .map(|&var| (var, if var == EdgeVar::new(0, 2) { 1.0 } else { 0.0 }))
            .collect();
        assert!(verify_conservation(&program, &assignment).is_ok());
    }

    #[test]
    fn program_has_full_model() {
        let program = build_linear_program(&[53.54, 50.23, 113.41]).unwrap();
        assert_eq!(program.variables.len(), 6);
        assert_eq!(program.constraints.len(), 9);
        assert_eq!(program.objective.terms.len(), 6);
    }
}
