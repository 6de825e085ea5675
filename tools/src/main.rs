//! retention: command-line runner for churn intervention decisions.
//!
//! Usage:
//!   retention train  --input "data/Customer Churn.csv" --output models/churn_model.json
//!   retention decide --input "data/Customer Churn.csv" --model models/churn_model.json
//!   retention decide ... --cost 80 --threshold 0.4 --output decisions.csv --db runs.db
//!   retention runs   --db runs.db

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, DecideArgs, TrainArgs};
use retention_core::{
    decision::write_decisions_csv,
    loader,
    store::{RunMeta, RunStore},
    train::{train_logistic, TrainConfig},
    DecisionPipeline, LogisticPredictor, RunOutcome, Segment,
};
use std::{fs::File, io::BufWriter};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Decide(args) => run_decide(&args, cli.json),
        Commands::Train(args)  => run_train(&args),
        Commands::Runs { db }  => run_list(&db, cli.json),
    }
}

fn run_decide(args: &DecideArgs, json: bool) -> Result<()> {
    let config = args.resolve_config()?;

    // The predictor is built once from the artifact and handed to the pipeline.
    let predictor = LogisticPredictor::load(&args.model)
        .with_context(|| format!("loading model artifact {}", args.model.display()))?;
    let pipeline = DecisionPipeline::new(Box::new(predictor));

    let (table, load) = loader::load_customers(&args.input)
        .with_context(|| format!("loading customers from {}", args.input.display()))?;

    let outcome = pipeline.run(table, &config)?;

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        write_decisions_csv(BufWriter::new(file), &outcome.decisions)?;
        log::info!("wrote {} decisions to {}", outcome.decisions.len(), path.display());
    }

    let run_id = match &args.db {
        Some(db) => {
            let store = RunStore::open(db)?;
            store.migrate()?;
            let meta = RunMeta {
                input_path: args.input.display().to_string(),
                predictor:  pipeline.predictor_name().to_string(),
                load,
            };
            Some(store.record_run(&meta, &outcome)?)
        }
        None => None,
    };

    if json {
        let payload = serde_json::json!({
            "run_id":      run_id,
            "params":      outcome.params,
            "rows_read":   load.rows_read,
            "rows_excluded": load.rows_excluded,
            "summary":     outcome.summary,
            "sensitivity": outcome.sensitivity,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_report(&outcome, load.rows_excluded, args.sample);
        if let Some(id) = run_id {
            println!();
            println!("Run recorded: {id}");
        }
    }
    Ok(())
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let (table, load) = loader::load_customers(&args.input)
        .with_context(|| format!("loading training data from {}", args.input.display()))?;
    log::info!("train: {} rows kept, {} excluded", load.rows_kept(), load.rows_excluded);

    let config = TrainConfig {
        epochs:        args.epochs,
        learning_rate: args.learning_rate,
        l2:            args.l2,
        batch_size:    args.batch_size,
        seed:          args.seed,
    };
    let artifact = train_logistic(&table, &config)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    artifact.save(&args.output)?;

    println!(
        "Model trained on {} customers ({} features) and saved to {}",
        artifact.trained_rows,
        artifact.weights.len(),
        args.output.display()
    );
    Ok(())
}

fn run_list(db: &std::path::Path, json: bool) -> Result<()> {
    let store = RunStore::open(db)?;
    store.migrate()?;
    let runs = store.list_runs()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }
    if runs.is_empty() {
        println!("(no runs recorded)");
        return Ok(());
    }
    for r in &runs {
        println!(
            "{} | {} | cost={} threshold={} | customers={} saveable={} | net gain={:.2}",
            r.run_id,
            r.created_at,
            r.intervention_cost,
            r.churn_threshold,
            r.total_customers,
            r.saveable_customers,
            r.total_expected_net_gain,
        );
    }
    Ok(())
}

fn print_report(outcome: &RunOutcome, rows_excluded: usize, sample: usize) {
    let s = &outcome.summary;
    let p = &outcome.params;

    println!("=== DECISION PARAMETERS ===");
    println!("  intervention cost: {}", p.intervention_cost);
    println!("  churn threshold:   {}", p.churn_threshold);
    println!("  margin:            {}", p.margin);
    println!("  rows excluded:     {rows_excluded}");

    println!();
    println!("=== BUSINESS IMPACT SUMMARY ===");
    println!("  Total Customers:         {}", s.total_customers);
    println!("  Saveable Customers:      {}", s.saveable_customers);
    println!("  Not Worth Saving:        {}", s.not_worth_saving);
    println!("  Loyal Customers:         {}", s.loyal_customers);
    println!("  Total Expected Net Gain: {:.2}", s.total_expected_net_gain);

    println!();
    println!("=== SEGMENT DISTRIBUTION ===");
    for segment in Segment::ALL {
        println!(
            "  {:<18} {:>7} ({:.1}%)",
            segment.label(),
            s.count(segment),
            s.share(segment)
        );
    }

    println!();
    println!("=== SENSITIVITY ANALYSIS ===");
    if outcome.sensitivity.is_empty() {
        println!("  (no sweep costs configured)");
    }
    for point in &outcome.sensitivity {
        println!(
            "  Cost {}: Net Gain = {:.2} ({} saveable)",
            point.intervention_cost, point.total_net_gain, point.saveable_customers
        );
    }

    if sample > 0 {
        println!();
        println!("=== SAMPLE DECISIONS ===");
        println!(
            "  {:<12} {:>7} {:>9} {:>10} {:>9}  Segment",
            "customerID", "P_churn", "CLV", "ExpSaved", "NetGain"
        );
        for d in outcome.decisions.iter().take(sample) {
            println!(
                "  {:<12} {:>7.3} {:>9.2} {:>10.2} {:>9.2}  {}",
                d.customer_id, d.churn_probability, d.clv, d.expected_revenue_saved, d.net_gain, d.segment
            );
        }
    }
}
