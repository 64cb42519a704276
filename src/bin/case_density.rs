use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use covid_density::{
	case_density_from, init_logging, source_args, sum_days,
	CanonicalNames, CliError, Config, PopulationReference,
};


static USAGE: &'static str = "usage: case_density SOURCE [COUNTRY...]

Print `country cases deaths density` for each COUNTRY, or for every
country with population data if none is given.

SOURCE is one of: ecdc, jhucsse";


fn run(argv: &[String]) -> Result<(), CliError> {
	let (kind, countries) = source_args(argv, None)?;
	let config = Config::from_env()?;
	let names = Arc::new(CanonicalNames::builtin());
	let source = kind.open(&config, names.clone())?;
	let population = PopulationReference::new(&config, names)?;

	let stats: Vec<_> = source.daily_stats()?.collect();
	let popcount = population.latest_population_count()?;
	let deaths: std::collections::HashMap<_, _> = sum_days(stats.iter().cloned())
		.into_iter()
		.map(|t| (t.country, t.deaths))
		.collect();

	let stdout = io::stdout();
	let mut out = stdout.lock();
	for r in case_density_from(stats, &popcount, countries)? {
		let d = deaths.get(&r.country_name).copied().unwrap_or(0);
		writeln!(out, "{} {} {} {:.3}", r.country_name, r.total_new_cases, d, r.cases_per_million)?;
	}
	Ok(())
}

fn main() {
	init_logging();
	let argv: Vec<String> = env::args().collect();
	if let Err(e) = run(&argv) {
		process::exit(e.report("case_density", USAGE))
	}
}
