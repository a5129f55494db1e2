use std::process::ExitCode;

use outbreak::runner::run_with_args;

fn main() -> ExitCode {
    let outcome = match run_with_args(|_, _, _| Ok(())) {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("outbreak: {error}");
            return ExitCode::FAILURE;
        }
    };

    let summary = &outcome.summary;
    println!(
        "Stopped after {} day(s): {}",
        summary.days_simulated, summary.stop_reason
    );
    println!(
        "Exposed: {} of {}",
        summary.exposed_count, outcome.parameters.population_size
    );
    println!("Total infected: {}", summary.counters.total_ever_infected);
    println!("Currently infected: {}", summary.counters.currently_infected);
    println!("Recovered: {}", summary.counters.recovered);
    println!("Dead: {}", summary.counters.dead);
    if let Some(report_dir) = &outcome.report_dir {
        println!("Reports written to {}", report_dir.display());
    }
    ExitCode::SUCCESS
}
