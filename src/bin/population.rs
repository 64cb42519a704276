use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use covid_density::{init_logging, no_args, CanonicalNames, CliError, Config, PopulationReference};


static USAGE: &'static str = "usage: population\n\nList the latest known population per country.";


fn run(argv: &[String]) -> Result<(), CliError> {
	no_args(argv)?;
	let config = Config::from_env()?;
	let population = PopulationReference::new(&config, Arc::new(CanonicalNames::builtin()))?;
	let mut records = population.latest_population_count()?;
	// keep the last record per country, as the join does
	records.reverse();
	let mut seen = std::collections::HashSet::new();
	records.retain(|r| seen.insert(r.country_name.clone()));
	records.sort_by(|a, b| a.country_name.cmp(&b.country_name));

	let stdout = io::stdout();
	let mut out = stdout.lock();
	for r in records.iter() {
		writeln!(out, "{}\t{}", r.country_code, r)?;
	}
	Ok(())
}

fn main() {
	init_logging();
	let argv: Vec<String> = env::args().collect();
	if let Err(e) = run(&argv) {
		process::exit(e.report("population", USAGE))
	}
}
