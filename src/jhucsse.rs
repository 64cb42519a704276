use std::io;
use std::sync::Arc;

use chrono::NaiveDate;

use log::info;

use super::canonical::{CanonicalNames, Vocabulary};
use super::convert::casedays_from_cumulative;
use super::error::{Error, FetchError, Result};
use super::fetch::{read_failure, Fetcher};
use super::records::{CaseDayRecord, RawCaseRecord};
use super::source::{CaseDays, CaseSource};


pub static JHUCSSE_ENDPOINT: &'static str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";
pub static JHUCSSE_FIXED_HEADER: [&'static str; 4] = ["Province/State", "Country/Region", "Lat", "Long"];

static ORIGIN: &'static str = "JHU CSSE";


fn parse_american_date(s: &str) -> Option<NaiveDate> {
	NaiveDate::parse_from_str(s, "%m/%d/%y").ok()
}

fn invalid(row: usize, column: &str, value: &str) -> Error {
	Error::InvalidCell{
		origin: ORIGIN,
		row,
		column: column.into(),
		value: value.into(),
	}
}

fn parse_coordinate(row: usize, column: &str, value: &str) -> Result<Option<f64>> {
	if value.is_empty() {
		return Ok(None)
	}
	match value.parse::<f64>() {
		Ok(v) => Ok(Some(v)),
		Err(_) => Err(invalid(row, column, value)),
	}
}

/// Parse the wide cumulative-count table: four fixed columns followed by
/// one column per report date. Empty count cells leave the date out of
/// that row's series.
pub fn parse_stream<R: io::Read>(r: R) -> Result<Vec<RawCaseRecord>> {
	let mut r = csv::Reader::from_reader(r);
	let header = r.headers()?.clone();
	let fixed: Vec<&str> = header.iter().take(JHUCSSE_FIXED_HEADER.len()).collect();
	if fixed[..] != JHUCSSE_FIXED_HEADER[..] {
		return Err(Error::SchemaMismatch{
			origin: ORIGIN,
			expected: JHUCSSE_FIXED_HEADER.iter().map(|s| (*s).into()).collect(),
			found: header.iter().map(|s| s.into()).collect(),
		})
	}

	let mut date_columns = Vec::new();
	for (i, name) in header.iter().enumerate().skip(JHUCSSE_FIXED_HEADER.len()) {
		if !name.starts_with(|c: char| c.is_ascii_digit()) {
			continue
		}
		match parse_american_date(name) {
			Some(date) => date_columns.push((i, date)),
			None => return Err(invalid(0, name, name)),
		}
	}

	let mut result = Vec::new();
	for (i, row) in r.records().enumerate() {
		let row = row?;
		let lineno = i + 2;
		let field = |index: usize| row.get(index).unwrap_or("");
		let country = field(1);
		if country.is_empty() {
			return Err(invalid(lineno, JHUCSSE_FIXED_HEADER[1], country))
		}
		let province = field(0);
		let mut cumulative_cases = Vec::with_capacity(date_columns.len());
		for (index, date) in date_columns.iter() {
			let v = field(*index);
			if v.is_empty() {
				continue
			}
			match v.parse::<i64>() {
				Ok(n) => cumulative_cases.push((*date, n)),
				Err(_) => return Err(invalid(lineno, &header[*index], v)),
			}
		}
		result.push(RawCaseRecord{
			province: if province.is_empty() { None } else { Some(province.into()) },
			country: country.into(),
			lat: parse_coordinate(lineno, JHUCSSE_FIXED_HEADER[2], field(2))?,
			long: parse_coordinate(lineno, JHUCSSE_FIXED_HEADER[3], field(3))?,
			cumulative_cases,
		});
	}
	Ok(result)
}

pub fn casedays_from_records<I: IntoIterator<Item = RawCaseRecord>>(records: I, names: &CanonicalNames) -> Result<Vec<CaseDayRecord>> {
	let days = casedays_from_cumulative(records);
	names.canonicalizer(Vocabulary::JhuCsse).canonicalize(days)
}

pub fn casedays_from_reader<R: io::Read>(r: R, names: &CanonicalNames) -> Result<Vec<CaseDayRecord>> {
	casedays_from_records(parse_stream(r)?, names)
}

fn stream_failure(url: &str, err: Error) -> Error {
	let err = match err {
		Error::Csv(e) if e.is_io_error() => e,
		other => return other,
	};
	// the io error is moved out whole so a wrapped reqwest error survives
	match err.into_kind() {
		csv::ErrorKind::Io(e) => read_failure(url, e).into(),
		kind => FetchError::Io(io::Error::new(io::ErrorKind::Other, format!("{:?}", kind))).into(),
	}
}


pub struct JhuCsseSource {
	fetcher: Fetcher,
	url: String,
	names: Arc<CanonicalNames>,
}

impl JhuCsseSource {
	pub fn new(fetcher: Fetcher, names: Arc<CanonicalNames>) -> Self {
		Self::with_url(fetcher, JHUCSSE_ENDPOINT, names)
	}

	pub fn with_url<S: Into<String>>(fetcher: Fetcher, url: S, names: Arc<CanonicalNames>) -> Self {
		Self{
			fetcher,
			url: url.into(),
			names,
		}
	}
}

impl CaseSource for JhuCsseSource {
	fn name(&self) -> &'static str {
		"Johns Hopkins University Center for Systems Science and Engineering"
	}

	fn info_url(&self) -> &'static str {
		"https://github.com/CSSEGISandData/COVID-19"
	}

	fn daily_stats(&self) -> Result<CaseDays> {
		let records = {
			let resp = self.fetcher.open(&self.url)?;
			parse_stream(resp).map_err(|e| stream_failure(&self.url, e))?
		};
		info!("read {} province records from {}", records.len(), ORIGIN);
		let days = casedays_from_records(records, &self.names)?;
		Ok(Box::new(days.into_iter()))
	}
}
