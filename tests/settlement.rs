//! End-to-end settlement runs against the real LP backend.

use proptest::prelude::*;
use rstest::rstest;
use roadtrip_settlement::settlement::{
    balances, net_outflows, DebtSettlementOptimizer, GoodLpSolver, LpSolver, Payment,
};
use std::sync::Arc;

fn optimizer() -> DebtSettlementOptimizer {
    DebtSettlementOptimizer::new(Arc::new(GoodLpSolver::new()))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn positive_balance_total(total_spent: &[f64]) -> f64 {
    balances(total_spent).unwrap().iter().filter(|b| **b > 0.0).sum()
}

#[tokio::test]
async fn settles_reference_trip() {
    let payments = optimizer()
        .solve_payments(&[53.54, 50.23, 113.41])
        .await
        .unwrap();

    let rounded: Vec<Payment> = payments.iter().map(|p| p.rounded(2)).collect();
    assert_eq!(
        rounded,
        vec![
            Payment { from: 0, to: 2, amount: 18.85 },
            Payment { from: 1, to: 2, amount: 22.16 },
        ]
    );
    assert!(payments
        .iter()
        .all(|p| !matches!((p.from, p.to), (0, 1) | (1, 0))));
}

#[tokio::test]
async fn empty_trip_has_no_payments() {
    let optimizer = optimizer();
    assert!(optimizer.solve_payments(&[]).await.unwrap().is_empty());
    assert!(!optimizer.solver().is_ready());
}

#[tokio::test]
async fn even_spend_needs_no_transfers() {
    let settlement = optimizer().settle(&[20.0, 20.0, 20.0, 20.0]).await.unwrap();
    assert!(settlement.is_empty());
}

#[rstest]
#[case::at_max(vec![f64::MAX, f64::MAX])]
#[case::near_max(vec![1e308, 1e308])]
#[tokio::test]
async fn huge_equal_spend_needs_no_transfers(#[case] spent: Vec<f64>) {
    let payments = optimizer().solve_payments(&spent).await.unwrap();
    assert!(payments.is_empty(), "got {payments:?}");
}

#[tokio::test]
async fn two_people_settle_directly() {
    let payments = optimizer().solve_payments(&[0.0, 100.0]).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].rounded(2), Payment { from: 0, to: 1, amount: 50.0 });
}

#[tokio::test]
async fn re_solving_gives_same_total() {
    let spent = [12.0, 80.5, 3.25, 44.0, 61.75];
    let optimizer = optimizer();
    let first = optimizer.settle(&spent).await.unwrap();
    let second = optimizer.settle(&spent).await.unwrap();
    assert!((first.total_exchanged - second.total_exchanged).abs() < 1e-6);
    assert!((first.total_exchanged - positive_balance_total(&spent)).abs() < 1e-6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_solves_share_one_engine() {
    let optimizer = Arc::new(optimizer());
    let trips: Vec<Vec<f64>> = (0..8)
        .map(|i| (0..4).map(|p| ((i * 7 + p * 13) % 50) as f64).collect())
        .collect();

    let handles: Vec<_> = trips
        .iter()
        .cloned()
        .map(|spent| {
            let optimizer = optimizer.clone();
            tokio::spawn(async move { optimizer.settle(&spent).await })
        })
        .collect();

    for (spent, handle) in trips.iter().zip(handles) {
        let settlement = handle.await.unwrap().unwrap();
        assert!((settlement.total_exchanged - positive_balance_total(spent)).abs() < 1e-6);
    }
    assert!(optimizer.solver().is_ready());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn payments_conserve_flow(spent in prop::collection::vec(0.0f64..1_000.0, 2..=6)) {
        let settlement = runtime().block_on(optimizer().settle(&spent)).unwrap();

        prop_assert!(settlement.payments.iter().all(|p| p.amount > 0.0 && p.from != p.to));

        let expected = balances(&spent).unwrap();
        let net = net_outflows(spent.len(), &settlement.payments);
        for (person, (got, want)) in net.iter().zip(&expected).enumerate() {
            prop_assert!((got - want).abs() < 1e-5, "person {}: {} vs {}", person, got, want);
        }

        let optimum = positive_balance_total(&spent);
        prop_assert!((settlement.total_exchanged - optimum).abs() < 1e-5);
    }
}
