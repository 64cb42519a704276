use chrono::{NaiveDate, Utc};

use tracing_subscriber::EnvFilter;

mod records;
mod error;
mod config;
mod ioutil;
mod fetch;
mod canonical;
mod convert;
mod source;
mod ecdc;
mod jhucsse;
mod population;
mod density;
mod report;
mod cli;

pub use records::*;
pub use error::*;
pub use config::*;
pub use ioutil::{magic_open, is_expired, CachePolicy};
pub use fetch::*;
pub use canonical::*;
pub use convert::*;
pub use source::*;
pub use ecdc::{EcdcSource, ECDC_ENDPOINT, ECDC_HEADER, ECDC_SHEET};
pub use jhucsse::{JhuCsseSource, casedays_from_reader, JHUCSSE_ENDPOINT, JHUCSSE_FIXED_HEADER};
pub use population::{PopulationReference, WORLDBANK_ENDPOINT, WORLDBANK_HEADER, supplemental_data};
pub use density::*;
pub use report::*;
pub use cli::*;


pub fn naive_today() -> NaiveDate {
	Utc::now().date_naive()
}

/// Send log output to stderr, filtered through `RUST_LOG` (default `info`).
/// Records emitted through the `log` macros are picked up as well.
pub fn init_logging() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("info"));
	// a subscriber may already be installed, e.g. by a test harness
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init();
}
