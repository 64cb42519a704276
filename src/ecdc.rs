use std::path::Path;
use std::sync::Arc;

use calamine::{Data, DataType, Reader};

use chrono::NaiveDate;

use log::{debug, info};

use regex::Regex;

use reqwest::Url;

use super::canonical::{CanonicalNames, Vocabulary};
use super::error::{Error, FetchError, Result};
use super::fetch::Fetcher;
use super::ioutil::CachePolicy;
use super::records::{CaseDayRecord, CountryName};
use super::source::{CaseDays, CaseSource};


pub static ECDC_ENDPOINT: &'static str = "https://www.ecdc.europa.eu/en/geographical-distribution-2019-ncov-cases";
pub static ECDC_SHEET: &'static str = "CSV_4_COMS";
pub static ECDC_HEADER: [&'static str; 6] = ["DateRep", "CountryExp", "NewConfCases", "NewDeaths", "GeoId", "EU"];

static ORIGIN: &'static str = "ECDC";
static EMPTY: Data = Data::Empty;


/// Find the spreadsheet download link on the ECDC distribution page. This
/// is extraction from a known page, not HTML parsing.
pub fn scrape_for_data_url(page: &str, page_url: &str) -> Option<String> {
	let re = Regex::new(r#"<a href="([^"]+\.xls)"[^<]*Download[^<]*</a>"#).ok()?;
	let href = re.captures(page)?.get(1)?.as_str();
	let base = Url::parse(page_url).ok()?;
	Some(base.join(href).ok()?.to_string())
}


fn cell_text(cell: &Data) -> String {
	match cell {
		Data::String(s) => s.trim().into(),
		Data::Empty => String::new(),
		other => other.to_string(),
	}
}

fn invalid(row: usize, column: usize, cell: &Data) -> Error {
	Error::InvalidCell{
		origin: ORIGIN,
		row,
		column: ECDC_HEADER[column].into(),
		value: cell_text(cell),
	}
}

fn parse_date(cell: &Data) -> Option<NaiveDate> {
	match cell {
		Data::String(s) => {
			let s = s.trim();
			NaiveDate::parse_from_str(s, "%Y-%m-%d")
				.or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
				.ok()
		},
		other => other.as_date(),
	}
}

fn parse_count(cell: &Data) -> Option<i64> {
	match cell {
		Data::Int(v) => Some(*v),
		Data::Float(v) if v.fract() == 0.0 => Some(*v as i64),
		Data::String(s) => s.trim().parse::<i64>().ok(),
		_ => None,
	}
}

fn parse_geo_id(cell: &Data) -> Option<CountryName> {
	let s = cell_text(cell);
	if s.is_empty() {
		None
	} else {
		Some(s.into())
	}
}

fn parse_eu_flag(cell: &Data) -> Option<bool> {
	match cell_text(cell).as_str() {
		"EU" => Some(true),
		"Non-EU" | "Non EU" => Some(false),
		"" => None,
		other => {
			debug!("unrecognized EU flag {:?}", other);
			None
		},
	}
}

/// Parse the rows of the per-day sheet. The first row is the header and
/// must match `ECDC_HEADER` exactly; fully empty rows are skipped.
pub fn parse_rows<'a, I: IntoIterator<Item = &'a [Data]>>(rows: I) -> Result<Vec<CaseDayRecord>> {
	let mut rows = rows.into_iter();
	let mut found: Vec<String> = rows.next()
		.map(|header| header.iter().map(cell_text).collect())
		.unwrap_or_default();
	while found.last().map(|s| s.is_empty()).unwrap_or(false) {
		found.pop();
	}
	if found[..] != ECDC_HEADER[..] {
		return Err(Error::SchemaMismatch{
			origin: ORIGIN,
			expected: ECDC_HEADER.iter().map(|s| (*s).into()).collect(),
			found,
		})
	}

	let mut result = Vec::new();
	for (i, row) in rows.enumerate() {
		let lineno = i + 2;
		if row.iter().all(|c| *c == Data::Empty) {
			continue
		}
		let cell = |index: usize| row.get(index).unwrap_or(&EMPTY);
		let country = cell_text(cell(1));
		if country.is_empty() {
			return Err(invalid(lineno, 1, cell(1)))
		}
		result.push(CaseDayRecord{
			report_date: parse_date(cell(0)).ok_or_else(|| invalid(lineno, 0, cell(0)))?,
			country: country.into(),
			new_confirmed_cases: parse_count(cell(2)).ok_or_else(|| invalid(lineno, 2, cell(2)))?,
			new_deaths: parse_count(cell(3)).ok_or_else(|| invalid(lineno, 3, cell(3)))?,
			geo_id: parse_geo_id(cell(4)),
			is_eu_member: parse_eu_flag(cell(5)),
		});
	}
	Ok(result)
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<CaseDayRecord>> {
	let mut book = calamine::open_workbook_auto(path)?;
	let sheets = book.sheet_names();
	if !sheets.iter().any(|s| s == ECDC_SHEET) {
		return Err(Error::SchemaMismatch{
			origin: ORIGIN,
			expected: vec![ECDC_SHEET.into()],
			found: sheets,
		})
	}
	let range = book.worksheet_range(ECDC_SHEET)?;
	parse_rows(range.rows())
}


pub struct EcdcSource {
	fetcher: Fetcher,
	cache: CachePolicy,
	page_url: String,
	names: Arc<CanonicalNames>,
}

impl EcdcSource {
	pub fn new(fetcher: Fetcher, cache: CachePolicy, names: Arc<CanonicalNames>) -> Self {
		Self{
			fetcher,
			cache,
			page_url: ECDC_ENDPOINT.into(),
			names,
		}
	}

	fn fetch_into(&self, f: &mut std::fs::File) -> Result<()> {
		let page = self.fetcher.get_text(&self.page_url)?;
		let url = scrape_for_data_url(&page, &self.page_url)
			.ok_or_else(|| FetchError::LinkNotFound(self.page_url.clone()))?;
		info!("downloading {}", url);
		self.fetcher.download(&url, f)?;
		Ok(())
	}
}

impl CaseSource for EcdcSource {
	fn name(&self) -> &'static str {
		"European Centre for Disease Prevention and Control"
	}

	fn info_url(&self) -> &'static str {
		ECDC_ENDPOINT
	}

	fn daily_stats(&self) -> Result<CaseDays> {
		let path = self.cache.refresh(|f| self.fetch_into(f))?;
		let days = read_file(path)?;
		info!("read {} daily records from {}", days.len(), ORIGIN);
		let days = self.names.canonicalizer(Vocabulary::Ecdc).canonicalize(days)?;
		Ok(Box::new(days.into_iter()))
	}
}
