use retention_core::{
    loader, train::{train_logistic, TrainConfig},
    ChurnPredictor, CustomerTable, DecisionParams, DecisionPipeline, LogisticPredictor,
    ModelArtifact, RetentionError, RetentionResult, RunConfig, Segment,
};
use std::io::Write;
use std::{cell::Cell, rc::Rc};
use tempfile::NamedTempFile;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Returns canned probabilities and counts how often it is asked.
struct FixedPredictor {
    probs: Vec<f64>,
    calls: Rc<Cell<usize>>,
}

impl FixedPredictor {
    fn new(probs: Vec<f64>) -> Self {
        Self { probs, calls: Rc::new(Cell::new(0)) }
    }
}

impl ChurnPredictor for FixedPredictor {
    fn name(&self) -> &str { "fixed" }

    fn predict(&self, _table: &CustomerTable) -> RetentionResult<Vec<f64>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.probs.clone())
    }
}

fn telco_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "customerID,gender,SeniorCitizen,Contract,PaymentMethod,tenure,MonthlyCharges,TotalCharges,Churn").unwrap();
    for i in 0..60 {
        let churner = i % 3 == 0;
        let (contract, tenure, monthly) = if churner {
            ("Month-to-month", 1 + i % 6, 85.0 + (i % 10) as f64)
        } else {
            (if i % 2 == 0 { "One year" } else { "Two year" }, 30 + i % 40, 40.0 + (i % 15) as f64)
        };
        let payment = if i % 4 == 0 { "Electronic check" } else { "Mailed check" };
        let total = format!("{:.2}", monthly * tenure as f64);
        let churn = if churner { "Yes" } else { "No" };
        let gender = if i % 2 == 0 { "Female" } else { "Male" };
        writeln!(
            file,
            "{i:04}-ABCDE,{gender},{},{contract},{payment},{tenure},{monthly},{total},{churn}",
            u8::from(i % 5 == 0)
        )
        .unwrap();
    }
    // Brand-new customers with blank total charges, as in the raw telco export.
    writeln!(file, "9999-NEWAA,Male,0,Two year,Mailed check,0,20.25, ,No").unwrap();
    writeln!(file, "9999-NEWAB,Female,0,Two year,Mailed check,0,19.70, ,No").unwrap();
    file
}

fn small_table() -> CustomerTable {
    let csv = "customerID,tenure,MonthlyCharges,TotalCharges\nA,10,100,1000\nB,2,80,160\nC,30,60,1800\n";
    loader::load_customers_from_reader(csv.as_bytes()).unwrap().0
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn pipeline_scores_once_and_reports_every_customer() {
    let predictor = FixedPredictor::new(vec![0.9, 0.2, 0.6]);
    let pipeline = DecisionPipeline::new(Box::new(predictor));
    let outcome = pipeline.run(small_table(), &RunConfig::default()).unwrap();

    assert_eq!(outcome.decisions.len(), 3);
    assert_eq!(outcome.summary.total_customers, 3);
    assert_eq!(outcome.decisions[1].segment, Segment::Loyal);
    assert_eq!(outcome.sensitivity.len(), 3);
    let ids: Vec<_> = outcome.decisions.iter().map(|d| d.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[test]
fn sweep_reuses_the_scored_table() {
    let predictor = FixedPredictor::new(vec![0.9, 0.2, 0.6]);
    let calls = Rc::clone(&predictor.calls);
    let pipeline = DecisionPipeline::new(Box::new(predictor));

    let scored = pipeline.score(small_table()).unwrap();
    let a = scored.decide(&DecisionParams::default()).unwrap();
    let sweep = scored.sensitivity(&[10.0, 50.0, 150.0], &DecisionParams::default()).unwrap();
    let b = scored.decide(&DecisionParams::default()).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(a, b);
    assert_eq!(sweep[1].total_net_gain, retention_core::summary::summarize(&a).total_expected_net_gain);
}

#[test]
fn predictor_is_called_exactly_once_per_run() {
    let predictor = FixedPredictor::new(vec![0.75; 3]);
    let calls = Rc::clone(&predictor.calls);
    let pipeline = DecisionPipeline::new(Box::new(predictor));
    let config = RunConfig { sensitivity_costs: vec![10.0, 20.0, 30.0, 40.0], ..RunConfig::default() };
    pipeline.run(small_table(), &config).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn predictor_row_count_violation_is_fatal() {
    let pipeline = DecisionPipeline::new(Box::new(FixedPredictor::new(vec![0.5, 0.5])));
    let err = pipeline.run(small_table(), &RunConfig::default()).unwrap_err();
    assert!(matches!(err, RetentionError::PredictionCountMismatch { expected: 3, actual: 2 }));
}

#[test]
fn predictor_range_violation_is_fatal_and_not_clamped() {
    let pipeline = DecisionPipeline::new(Box::new(FixedPredictor::new(vec![0.5, -0.01, 0.5])));
    let err = pipeline.run(small_table(), &RunConfig::default()).unwrap_err();
    match err {
        RetentionError::ProbabilityOutOfRange { row, customer_id, value } => {
            assert_eq!(row, 1);
            assert_eq!(customer_id, "B");
            assert_eq!(value, -0.01);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_params_fail_before_scoring() {
    let predictor = FixedPredictor::new(vec![0.5, 0.5, 0.5]);
    let calls = Rc::clone(&predictor.calls);
    let pipeline = DecisionPipeline::new(Box::new(predictor));
    let config = RunConfig {
        decision: DecisionParams::default().with_threshold(2.0),
        ..RunConfig::default()
    };
    assert!(matches!(
        pipeline.run(small_table(), &config),
        Err(RetentionError::InvalidConfig(_))
    ));
    assert_eq!(calls.get(), 0);
}

/// Train offline, persist the artifact, reload it, and run the full pipeline.
/// The scaler used at inference is the one persisted at training time.
#[test]
fn trained_model_round_trips_through_disk() {
    let _ = env_logger::builder().is_test(true).try_init();

    let data = telco_csv();
    let (table, report) = loader::load_customers(data.path()).unwrap();
    assert_eq!(report.rows_excluded, 2);
    assert_eq!(table.len(), 60);

    let artifact = train_logistic(&table, &TrainConfig::default()).unwrap();
    let model_file = NamedTempFile::new().unwrap();
    artifact.save(model_file.path()).unwrap();
    let reloaded = ModelArtifact::load(model_file.path()).unwrap();
    assert_eq!(reloaded.scaler, artifact.scaler);
    assert_eq!(reloaded.schema, artifact.schema);

    let predictor = LogisticPredictor::load(model_file.path()).unwrap();
    let probs = predictor.predict(&table).unwrap();
    assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));

    // Scoring a single customer alone gives the same probability as in the batch:
    // nothing is refitted per batch.
    let single = CustomerTable::new(table.extra_columns.clone(), vec![table.records[7].clone()]);
    let alone = predictor.predict(&single).unwrap();
    assert!((alone[0] - probs[7]).abs() < 1e-12);

    // The model separates the synthetic churners from the stayers.
    let mean = |want: u8| {
        let v: Vec<f64> = table
            .records
            .iter()
            .zip(&probs)
            .filter(|(r, _)| r.churn == Some(want))
            .map(|(_, p)| *p)
            .collect();
        v.iter().sum::<f64>() / v.len() as f64
    };
    assert!(mean(1) > mean(0));

    let pipeline = DecisionPipeline::new(Box::new(predictor));
    let outcome = pipeline.run(table, &RunConfig::default()).unwrap();
    assert_eq!(outcome.summary.total_customers, 60);
}
