//! rgm-runner: headless runner for the pricing/promotion analytics core.
//!
//! Usage:
//!   rgm-runner --data-dir ./data
//!   rgm-runner --data-dir ./data --ipc-mode
//!
//! One-shot mode prints a dataset summary. IPC mode serves newline-delimited
//! JSON requests over stdin/stdout so any transport (HTTP layer, UI shell)
//! can drive the core without linking against it.

use anyhow::Result;
use rgm_core::{
    elasticity::GroupField,
    engine::AnalyticsEngine,
    error::AnalyticsError,
    filter::FilterCriteria,
    promotion::PromotionEvent,
    simulator::SimulationAdjustment,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    Options {
        #[serde(default)]
        criteria: FilterCriteria,
    },
    Elasticity {
        #[serde(default)]
        criteria: FilterCriteria,
    },
    RevenueShare {
        #[serde(default)]
        criteria: FilterCriteria,
        group_by: String,
    },
    Simulate {
        #[serde(default)]
        criteria: FilterCriteria,
        #[serde(default)]
        adjustment: SimulationAdjustment,
    },
    SimulatePromotions {
        #[serde(default)]
        criteria: FilterCriteria,
        #[serde(default)]
        events: Vec<PromotionEvent>,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    let engine = AnalyticsEngine::load(data_dir)?;

    if ipc_mode {
        run_ipc_loop(&engine)?;
    } else {
        print_summary(&engine);
    }

    Ok(())
}

fn run_ipc_loop(engine: &AnalyticsEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match request {
            IpcRequest::Quit => break,
            IpcRequest::Options { criteria } => {
                serde_json::to_string(&engine.build_options(&criteria))?
            }
            IpcRequest::Elasticity { criteria } => {
                serde_json::to_string(&engine.compute_elasticity(&criteria))?
            }
            IpcRequest::RevenueShare { criteria, group_by } => {
                match GroupField::from_str(&group_by) {
                    Ok(field) => {
                        let (selection, benchmark) = engine.revenue_share(&criteria, field);
                        serde_json::to_string(&serde_json::json!({
                            "selection": selection,
                            "benchmark": benchmark,
                        }))?
                    }
                    Err(AnalyticsError::InvalidGrouping(column)) => {
                        serde_json::json!({ "error": format!("unknown grouping column: {column}") })
                            .to_string()
                    }
                    Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
                }
            }
            IpcRequest::Simulate {
                criteria,
                adjustment,
            } => serde_json::to_string(&engine.simulate(&criteria, &adjustment))?,
            IpcRequest::SimulatePromotions { criteria, events } => {
                serde_json::to_string(&engine.simulate_promotions(&criteria, &events))?
            }
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(engine: &AnalyticsEngine) {
    let options = engine.build_options(&FilterCriteria::default());

    println!("=== DATASET SUMMARY ===");
    println!("  records:       {}", engine.records().len());
    println!("  manufacturers: {}", options.manufacturers.len());
    println!("  brands:        {}", options.brands.len());
    println!("  ppgs:          {}", options.ppgs.len());
    println!("  retailers:     {}", options.retailers.len());
    println!("  years:         {:?}", options.years);
    println!("  tactics:       {:?}", options.tactics);

    let comparison = engine.compute_elasticity(&FilterCriteria::default());
    println!();
    println!("=== CATEGORY ELASTICITY BENCHMARK ===");
    for pair in comparison.pairs() {
        match pair.benchmark {
            Some(value) => println!("  {:<17} {value:+.3}", pair.driver),
            None => println!("  {:<17} (no data)", pair.driver),
        }
    }
}
