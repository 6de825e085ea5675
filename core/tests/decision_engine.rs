use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use retention_core::{
    decision, value, CustomerRecord, CustomerTable, DecisionParams, Segment,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(id: usize, tenure: i64, monthly: f64) -> CustomerRecord {
    CustomerRecord {
        customer_id:     format!("CUST-{id:05}"),
        tenure,
        monthly_charges: monthly,
        total_charges:   monthly * tenure.max(0) as f64,
        churn:           None,
        extras:          Vec::new(),
    }
}

/// Random table plus one probability per row, fully determined by `seed`.
fn random_batch(seed: u64) -> (CustomerTable, Vec<f64>) {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let n = rng.gen_range(1..200);
    let records = (0..n)
        .map(|i| customer(i, rng.gen_range(0..73), rng.gen_range(0.0..120.0)))
        .collect();
    let probs = (0..n).map(|_| rng.gen::<f64>()).collect();
    (CustomerTable::new(vec![], records), probs)
}

fn random_params(rng: &mut Pcg64Mcg) -> DecisionParams {
    DecisionParams::default()
        .with_cost(rng.gen_range(0.0..200.0))
        .with_threshold(rng.gen::<f64>())
        .with_margin(rng.gen_range(0.05..=1.0))
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Worked example: tenure=10, monthly=100, margin=0.3, p=0.8, cost=20
/// → CLV=30, saved=24, net=4, Saveable.
#[test]
fn single_customer_worked_example() {
    let table = CustomerTable::new(vec![], vec![customer(1, 10, 100.0)]);
    let params = DecisionParams::default().with_cost(20.0).with_threshold(0.5).with_margin(0.3);

    let saveable = decision::decide(&table, &[0.8], &params).unwrap();
    assert!((saveable[0].clv - 30.0).abs() < 1e-9);
    assert!((saveable[0].expected_revenue_saved - 24.0).abs() < 1e-9);
    assert!((saveable[0].net_gain - 4.0).abs() < 1e-9);
    assert_eq!(saveable[0].segment, Segment::Saveable);

    let loyal = decision::decide(&table, &[0.3], &params).unwrap();
    assert_eq!(loyal[0].segment, Segment::Loyal);
}

/// Segment is exactly the three-way rule, for every row of many random batches.
#[test]
fn segment_rule_holds_for_random_batches() {
    let mut param_rng = Pcg64Mcg::seed_from_u64(0x5E6_0001);
    for seed in 0..50u64 {
        let (table, probs) = random_batch(seed);
        let params = random_params(&mut param_rng);
        let out = decision::decide(&table, &probs, &params).unwrap();

        assert_eq!(out.len(), table.len());
        for (d, r) in out.iter().zip(&table.records) {
            assert_eq!(d.customer_id, r.customer_id, "row order must be preserved");
            if d.churn_probability < params.churn_threshold {
                assert_eq!(d.segment, Segment::Loyal);
            } else if d.net_gain > 0.0 {
                assert_eq!(d.segment, Segment::Saveable);
            } else {
                assert_eq!(d.segment, Segment::NotWorthSaving);
            }
        }
    }
}

/// Predicted non-churners are Loyal even when the intervention would lose money.
#[test]
fn loyal_regardless_of_net_gain_sign() {
    let table = CustomerTable::new(vec![], vec![customer(1, 1, 5.0), customer(2, 60, 500.0)]);
    let params = DecisionParams::default().with_cost(1_000.0).with_threshold(0.6);
    let out = decision::decide(&table, &[0.59, 0.1], &params).unwrap();
    assert!(out.iter().all(|d| d.net_gain < 0.0));
    assert!(out.iter().all(|d| d.segment == Segment::Loyal));
}

/// CLV ≥ 0 (indeed ≥ monthly × margin) for any non-negative monthly charge
/// and any tenure distribution.
#[test]
fn clv_is_never_negative() {
    let mut rng = Pcg64Mcg::seed_from_u64(0xC1_F00D);
    for _ in 0..100 {
        let n = rng.gen_range(1..100);
        let skew_high = rng.gen_bool(0.5);
        let records: Vec<_> = (0..n)
            .map(|i| {
                let tenure = if skew_high && i > 0 { 72 } else { rng.gen_range(-5..200) };
                customer(i, tenure, rng.gen_range(0.0..150.0))
            })
            .collect();
        let table = CustomerTable::new(vec![], records);
        let margin = rng.gen_range(0.01..=1.0);
        let clv = value::compute_clv(&table, margin);
        for (c, r) in clv.iter().zip(&table.records) {
            assert!(*c >= 0.0, "CLV {c} negative");
            assert!(*c >= r.monthly_charges * margin - 1e-9);
        }
    }
}

/// Decisions are pure: deciding twice over the same inputs gives identical output,
/// and deciding with other params in between does not leak state.
#[test]
fn decisions_are_repeatable() {
    let (table, probs) = random_batch(0xABCD);
    let base = DecisionParams::default();
    let first = decision::decide(&table, &probs, &base).unwrap();
    let _other = decision::decide(&table, &probs, &base.with_cost(5.0)).unwrap();
    let again = decision::decide(&table, &probs, &base).unwrap();
    assert_eq!(first, again);
}

#[test]
fn boundary_probabilities_are_accepted() {
    let table = CustomerTable::new(vec![], vec![customer(1, 3, 10.0), customer(2, 3, 10.0)]);
    let out = decision::decide(&table, &[0.0, 1.0], &DecisionParams::default()).unwrap();
    assert_eq!(out[0].segment, Segment::Loyal);
    assert_eq!(out[1].segment, Segment::NotWorthSaving);
}
