use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono;

use super::error::{Error, Result};
use super::ioutil::CachePolicy;
use super::records::CountryName;


pub static DEFAULT_CACHE_DIR: &'static str = "cache";
pub static DEFAULT_POPULATION_MAX_AGE_DAYS: i64 = 7;
pub static DEFAULT_CASES_MAX_AGE_HOURS: i64 = 12;
pub static DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
// extreme outlier which flattens the colour scale of the map
pub static DEFAULT_EXCLUDED: &'static [&'static str] = &["San Marino"];


#[derive(Debug, Clone)]
pub struct Config {
	pub cache_dir: PathBuf,
	pub population_max_age: chrono::Duration,
	pub cases_max_age: chrono::Duration,
	pub fetch_timeout: Duration,
	pub population_supplement: Option<PathBuf>,
	pub excluded: Vec<CountryName>,
}

impl Default for Config {
	fn default() -> Self {
		Self{
			cache_dir: DEFAULT_CACHE_DIR.into(),
			population_max_age: chrono::Duration::days(DEFAULT_POPULATION_MAX_AGE_DAYS),
			cases_max_age: chrono::Duration::hours(DEFAULT_CASES_MAX_AGE_HOURS),
			fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
			population_supplement: None,
			excluded: DEFAULT_EXCLUDED.iter().map(|s| (*s).into()).collect(),
		}
	}
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
	where T::Err: std::fmt::Display
{
	match env::var(name) {
		Ok(v) => match v.trim().parse::<T>() {
			Ok(v) => Ok(Some(v)),
			Err(e) => Err(Error::Config(format!("{}={:?}: {}", name, v, e))),
		},
		Err(env::VarError::NotPresent) => Ok(None),
		Err(e) => Err(Error::Config(format!("{}: {}", name, e))),
	}
}

pub fn parse_country_list(s: &str) -> Vec<CountryName> {
	s.split(',')
		.map(|v| v.trim())
		.filter(|v| v.len() > 0)
		.map(|v| v.into())
		.collect()
}

impl Config {
	pub fn from_env() -> Result<Self> {
		let mut result = Self::default();
		if let Some(dir) = parse_var::<PathBuf>("COVID_CACHE_DIR")? {
			result.cache_dir = dir;
		}
		if let Some(days) = parse_var::<i64>("COVID_POPULATION_MAX_AGE_DAYS")? {
			result.population_max_age = chrono::Duration::days(days);
		}
		if let Some(hours) = parse_var::<i64>("COVID_CASES_MAX_AGE_HOURS")? {
			result.cases_max_age = chrono::Duration::hours(hours);
		}
		if let Some(secs) = parse_var::<u64>("COVID_FETCH_TIMEOUT_SECS")? {
			result.fetch_timeout = Duration::from_secs(secs);
		}
		result.population_supplement = parse_var::<PathBuf>("COVID_POPULATION_SUPPLEMENT")?;
		if let Some(list) = parse_var::<String>("COVID_EXCLUDE")? {
			result.excluded = parse_country_list(&list);
		}
		if result.population_max_age < chrono::Duration::zero() || result.cases_max_age < chrono::Duration::zero() {
			return Err(Error::Config("cache max-age must not be negative".into()))
		}
		Ok(result)
	}

	pub fn population_cache(&self) -> CachePolicy {
		CachePolicy::new(self.cache_dir.join("pop.zip"), self.population_max_age)
	}

	pub fn ecdc_cache(&self) -> CachePolicy {
		CachePolicy::new(self.cache_dir.join("cases.xls"), self.cases_max_age)
	}
}
