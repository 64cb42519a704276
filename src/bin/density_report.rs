use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io;
use std::process;
use std::sync::Arc;

use log::{info, warn};

use covid_density::{
	case_density, exclude_countries, init_logging, naive_today, source_args, write_report,
	CanonicalNames, ChoroplethRenderer, CliError, Config, PopulationReference,
};


static USAGE: &'static str = "usage: density_report SOURCE [TEMPLATE]

Render the case density map into TEMPLATE (or the template read from
standard input) and write the report to standard output.

SOURCE is one of: ecdc, jhucsse";


fn run(argv: &[String]) -> Result<(), CliError> {
	let (kind, rest) = source_args(argv, Some(1))?;
	let template = rest.first();
	let config = Config::from_env()?;
	let names = Arc::new(CanonicalNames::builtin());
	let source = kind.open(&config, names.clone())?;
	let population = PopulationReference::new(&config, names)?;

	info!("computing case density from {}", source.name());
	let all: &[&str] = &[];
	let records = exclude_countries(case_density(&*source, &population, all)?, &config.excluded);
	info!("rendering {} countries", records.len());

	let mut extra = HashMap::new();
	extra.insert("source".to_string(), source.name().to_string());
	extra.insert("source-url".to_string(), source.info_url().to_string());
	extra.insert("population-url".to_string(), population.info_url().to_string());
	extra.insert("date".to_string(), naive_today().to_string());

	let renderer = ChoroplethRenderer::default();
	let stdout = io::stdout();
	let out = stdout.lock();
	match template {
		Some(path) => write_report(File::open(path)?, out, &records, &renderer, extra)?,
		None => {
			if isatty::stdin_isatty() {
				warn!("reading report template from terminal, end input with ^D");
			}
			let stdin = io::stdin();
			write_report(stdin.lock(), out, &records, &renderer, extra)?
		},
	}
	Ok(())
}

fn main() {
	init_logging();
	let argv: Vec<String> = env::args().collect();
	if let Err(e) = run(&argv) {
		process::exit(e.report("density_report", USAGE))
	}
}
