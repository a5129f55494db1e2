use std::path::PathBuf;

use crate::clock::{RunSummary, SimulationClock};
use crate::engine::EpidemicEngine;
use crate::error::OutbreakError;
use crate::log::{apply_log_spec, info, level_for_verbosity, set_log_level};
use crate::parameters::Parameters;
use crate::report::{ReportOptions, SimulationReports};
use crate::schedule::Day;
use clap::{ArgAction, Args, Command, FromArgMatches as _};

/// Default cli arguments for the outbreak runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file. The COVID-19 preset is used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for the daily_counts and transitions CSV reports. No reports are
    /// written when omitted
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix for report file names
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Overwrite existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Stop after this many days even if the epidemic is still running
    #[arg(short = 't', long)]
    pub max_days: Option<Day>,

    /// Log level or module filters, e.g. `info` or `info,outbreak::schedule=off`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Args)]
pub struct PlaceholderCustom {}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub parameters: Parameters,
    /// The directory the reports were written to, if any.
    pub report_dir: Option<PathBuf>,
}

fn create_outbreak_cli() -> Command {
    let cli = Command::new("outbreak")
        .about("Simulates the day-by-day spread of an epidemic through a fixed population");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation with custom cli arguments.
///
/// This function allows you to define custom arguments and a setup function
///
/// # Parameters
/// - `setup_fn`: A function that takes a mutable reference to the loaded `Parameters`, the
///   `BaseArgs` and an `Option<A>` where A is the custom cli arguments struct. It runs before
///   the parameters are validated.
///
/// # Errors
/// Returns an error if argument parsing, the setup function or the run fails
pub fn run_with_custom_args<A, F>(setup_fn: F) -> Result<RunOutcome, Box<dyn std::error::Error>>
where
    A: Args,
    F: Fn(&mut Parameters, &BaseArgs, Option<A>) -> Result<(), OutbreakError>,
{
    let mut cli = create_outbreak_cli();
    cli = A::augment_args(cli);
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    let custom_matches = A::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches, Some(custom_matches), setup_fn)
}

/// Runs a simulation with default cli arguments
///
/// # Errors
/// Returns an error if argument parsing, the setup function or the run fails
pub fn run_with_args<F>(setup_fn: F) -> Result<RunOutcome, Box<dyn std::error::Error>>
where
    F: Fn(&mut Parameters, &BaseArgs, Option<PlaceholderCustom>) -> Result<(), OutbreakError>,
{
    let cli = create_outbreak_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches, None, setup_fn)
}

fn configure_logging(args: &BaseArgs) -> Result<(), OutbreakError> {
    if let Some(spec) = &args.log_level {
        apply_log_spec(spec)?;
    } else if args.verbose > 0 {
        set_log_level(level_for_verbosity(args.verbose));
    }
    Ok(())
}

fn report_options(args: &BaseArgs, output_dir: PathBuf) -> ReportOptions {
    let mut options = ReportOptions::new();
    options
        .directory(output_dir)
        .file_prefix(args.prefix.clone())
        .overwrite(args.force_overwrite);
    options
}

fn run_with_args_internal<A, F>(
    args: BaseArgs,
    custom_args: Option<A>,
    setup_fn: F,
) -> Result<RunOutcome, Box<dyn std::error::Error>>
where
    F: Fn(&mut Parameters, &BaseArgs, Option<A>) -> Result<(), OutbreakError>,
{
    configure_logging(&args)?;

    let mut parameters = match &args.config {
        Some(path) => {
            info!("Loading parameters from: {}", path.display());
            Parameters::from_json_file(path)?
        }
        None => Parameters::covid19(),
    };

    // Run the provided Fn
    setup_fn(&mut parameters, &args, custom_args)?;

    let engine = EpidemicEngine::new(parameters.clone(), args.random_seed)?;
    let mut reports = match &args.output_dir {
        Some(output_dir) => Some(SimulationReports::create(
            report_options(&args, output_dir.clone()),
            engine.layout().clone(),
        )?),
        None => None,
    };

    let mut clock = SimulationClock::new(engine);
    if let Some(max_days) = args.max_days {
        clock = clock.with_max_days(max_days);
    }

    let summary = clock.run(|snapshot| match reports.as_mut() {
        Some(reports) => reports.record(snapshot),
        None => Ok(()),
    })?;
    let report_dir = reports.map(SimulationReports::finish).transpose()?;

    Ok(RunOutcome {
        summary,
        parameters,
        report_dir,
    })
}
