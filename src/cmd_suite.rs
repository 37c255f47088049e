use std::fs::OpenOptions;
use std::io::Write;
use std::process;

use argh::FromArgs;
use soundlaw::builtin_rules::{all_builtin_scenarios, run_scenario, Scenario};

#[derive(FromArgs)]
/// Run the built-in scenario suite
#[argh(subcommand, name = "suite")]
pub struct RunSuite {
    /// optional name filter (substring match)
    #[argh(positional)]
    filter: Option<String>,

    /// output file for results (default: scenario-results.txt)
    #[argh(option, short = 'o', default = "String::from(\"scenario-results.txt\")")]
    output: String,
}

enum SuiteOutcome {
    Pass,
    Fail { input: String, expected: String, actual: String },
    Error(String),
}

fn run_single(scenario: &Scenario) -> SuiteOutcome {
    match run_scenario(scenario) {
        Err(e) => SuiteOutcome::Error(e.to_string()),
        Ok(cases) => {
            for (input, expected, actual) in cases {
                if expected != actual {
                    return SuiteOutcome::Fail { input, expected, actual };
                }
            }
            SuiteOutcome::Pass
        }
    }
}

impl RunSuite {
    pub fn run(self) {
        let scenarios: Vec<Scenario> = all_builtin_scenarios()
            .into_iter()
            .filter(|s| match &self.filter {
                Some(f) => s.name.contains(f.as_str()),
                None => true,
            })
            .collect();
        println!("Running {} scenarios", scenarios.len());
        println!("Writing results to: {}", self.output);

        let mut file = match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.output)
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Could not create {}: {e}", self.output);
                process::exit(3);
            }
        };

        writeln!(file, "=== Sound-change scenario results ===").unwrap();
        writeln!(file, "Filter: {:?}", self.filter).unwrap();
        writeln!(file).unwrap();

        let mut stats = std::collections::HashMap::new();
        for scenario in &scenarios {
            print!("🧪 {} ... ", scenario.name);
            let outcome = run_single(scenario);
            let category = match &outcome {
                SuiteOutcome::Pass => "pass",
                SuiteOutcome::Fail { .. } => "fail",
                SuiteOutcome::Error(_) => "error",
            };
            *stats.entry(category).or_insert(0) += 1;

            match &outcome {
                SuiteOutcome::Pass => {
                    println!("✅ PASS");
                    writeln!(file, "PASS {}", scenario.name).unwrap();
                }
                SuiteOutcome::Fail { input, expected, actual } => {
                    println!("❌ FAIL");
                    writeln!(file, "FAIL {}", scenario.name).unwrap();
                    writeln!(file, "  Input:    {input}").unwrap();
                    writeln!(file, "  Expected: {expected}").unwrap();
                    writeln!(file, "  Actual:   {actual}").unwrap();
                    writeln!(file).unwrap();
                }
                SuiteOutcome::Error(e) => {
                    println!("🔥 ERROR");
                    writeln!(file, "ERROR {}", scenario.name).unwrap();
                    writeln!(file, "  Error: {e}").unwrap();
                    writeln!(file).unwrap();
                }
            }
        }

        writeln!(file).unwrap();
        writeln!(file, "=== SUMMARY ===").unwrap();
        println!();
        println!("=== SUMMARY ===");
        for (category, count) in &stats {
            writeln!(file, "{category}: {count}").unwrap();
            println!("{category}: {count}");
        }
        if stats.get("fail").copied().unwrap_or(0) + stats.get("error").copied().unwrap_or(0) > 0 {
            process::exit(1);
        }
    }
}
