use clap::Args;
use outbreak::runner::run_with_custom_args;

#[derive(Args, Debug)]
struct Extra {
    /// Overrides the population size
    #[arg(short, long)]
    population: Option<usize>,
}

fn main() {
    let outcome = run_with_custom_args(|parameters, _args, extra: Option<Extra>| {
        if let Some(population) = extra.and_then(|extra| extra.population) {
            parameters.population_size = population;
        }
        Ok(())
    })
    .unwrap();
    println!("{}", outcome.parameters.population_size);
}
