use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::settlement::{DebtSettlementOptimizer, GoodLpSolver, LpSolver};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub optimizer: Arc<DebtSettlementOptimizer>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let solver: Arc<dyn LpSolver> = Arc::new(GoodLpSolver::new());

        if cfg.solver.warm_up_on_start {
            solver
                .initialize()
                .await
                .context("LP solver engine failed to start")?;
        } else {
            info!("solver warm-up skipped, engine starts on first request");
        }

        Ok(Self::with_solver(cfg, solver))
    }

    pub fn with_solver(cfg: Config, solver: Arc<dyn LpSolver>) -> Self {
        let optimizer = Arc::new(DebtSettlementOptimizer::from_config(&cfg.solver, solver));
        Self { cfg, optimizer }
    }
}
