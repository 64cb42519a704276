use std::fmt;

use serde::{Deserialize, Serialize};

use smartstring::alias::{String as SmartString};

use chrono::naive::NaiveDate;

pub type CountryName = SmartString;
pub type IsoCode = SmartString;


/// One row of a cumulative-count feed: one province (or a whole country if
/// the province is empty) with its running case total per date.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCaseRecord {
	pub province: Option<CountryName>,
	pub country: CountryName,
	pub lat: Option<f64>,
	pub long: Option<f64>,
	pub cumulative_cases: Vec<(NaiveDate, i64)>,
}


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseDayRecord {
	pub report_date: NaiveDate,
	pub country: CountryName,
	// may be negative when the upstream data is inconsistent
	pub new_confirmed_cases: i64,
	pub new_deaths: i64,
	pub geo_id: Option<SmartString>,
	pub is_eu_member: Option<bool>,
}

impl CaseDayRecord {
	/// A record as produced from a cases-only feed: no deaths, no geo
	/// metadata.
	pub fn cases_only(report_date: NaiveDate, country: CountryName, new_confirmed_cases: i64) -> Self {
		Self{
			report_date,
			country,
			new_confirmed_cases,
			new_deaths: 0,
			geo_id: None,
			is_eu_member: None,
		}
	}
}


#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationRecord {
	pub country_name: CountryName,
	pub country_code: IsoCode,
	pub year: i32,
	pub population: u64,
}

impl fmt::Display for PopulationRecord {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}: {} people (as of {})", self.country_name, self.population, self.year)
	}
}


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryTotals {
	pub country: CountryName,
	pub cases: i64,
	pub deaths: i64,
}


#[derive(Debug, Clone, PartialEq)]
pub struct DensityRecord {
	pub country_name: CountryName,
	pub country_code: IsoCode,
	pub total_new_cases: i64,
	pub cases_per_million: f64,
}
