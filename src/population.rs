use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use super::canonical::{CanonicalNames, Vocabulary};
use super::config::Config;
use super::error::{Error, Result};
use super::fetch::Fetcher;
use super::ioutil::{magic_open, CachePolicy};
use super::records::PopulationRecord;


pub static WORLDBANK_ENDPOINT: &'static str = "https://api.worldbank.org/v2/en/indicator/SP.POP.TOTL?downloadformat=csv";
pub static WORLDBANK_HEADER: [&'static str; 4] = ["Country Name", "Country Code", "Indicator Name", "Indicator Code"];

static ORIGIN: &'static str = "World Bank";

// Countries and territories the World Bank does not list, already in
// canonical spelling.
static SUPPLEMENTAL_DATA: &'static [(&'static str, &'static str, i32, u64)] = &[
	("Guernsey", "GGY", 2019, 63_155),
	("Holy See", "VAT", 2019, 825),
	("Jersey", "JEY", 2019, 107_800),
	("Taiwan", "TWN", 2020, 23_561_236),
];


pub fn supplemental_data() -> Vec<PopulationRecord> {
	SUPPLEMENTAL_DATA.iter().map(|(name, code, year, population)| PopulationRecord{
		country_name: (*name).into(),
		country_code: (*code).into(),
		year: *year,
		population: *population,
	}).collect()
}


fn trim_trailing_empty(values: &[String]) -> &[String] {
	let mut end = values.len();
	while end > 0 && values[end - 1].trim().is_empty() {
		end -= 1;
	}
	&values[..end]
}

fn parse_year(s: &str) -> Option<i32> {
	match s.trim().parse::<i32>() {
		Ok(y) if 0 < y && y < 10000 => Some(y),
		_ => None,
	}
}

pub fn is_header(values: &[String]) -> bool {
	let values = trim_trailing_empty(values);
	if values.len() < WORLDBANK_HEADER.len() {
		return false
	}
	let (fixed, years) = values.split_at(WORLDBANK_HEADER.len());
	if !fixed.iter().zip(WORLDBANK_HEADER.iter()).all(|(a, b)| a.trim() == *b) {
		return false
	}
	years.iter().all(|y| parse_year(y).is_some())
}

fn parse_population(s: &str) -> Option<u64> {
	let s = s.trim();
	if s.is_empty() {
		return None
	}
	if let Ok(v) = s.parse::<u64>() {
		return Some(v)
	}
	match s.parse::<f64>() {
		Ok(v) if v.is_finite() && v >= 0.0 => Some(v.round() as u64),
		_ => None,
	}
}

/// Pick the right-most populated year of every row after the header.
///
/// Everything before the header row is preamble and ignored. Rows without
/// any populated year column do not produce a record.
pub fn latest_from_rows<I: IntoIterator<Item = Vec<String>>>(rows: I) -> Result<Vec<PopulationRecord>> {
	let mut rows = rows.into_iter();
	let mut skipped = 0usize;
	let header = loop {
		match rows.next() {
			Some(row) if is_header(&row) => break row,
			Some(_) => skipped += 1,
			None => return Err(Error::SchemaMismatch{
				origin: ORIGIN,
				expected: WORLDBANK_HEADER.iter().map(|s| (*s).into()).collect(),
				found: Vec::new(),
			}),
		}
	};
	debug!("found {} header after {} preamble rows", ORIGIN, skipped);
	let header = trim_trailing_empty(&header);

	let mut result = Vec::new();
	let mut dropped = 0usize;
	for row in rows {
		let end = row.len().min(header.len());
		let latest = (WORLDBANK_HEADER.len()..end).rev()
			.filter_map(|i| Some((i, parse_population(&row[i])?)))
			.next();
		let (index, population) = match latest {
			Some(v) => v,
			None => {
				dropped += 1;
				continue
			},
		};
		// the header has been validated to contain only years past the
		// fixed columns
		let year = match parse_year(&header[index]) {
			Some(y) => y,
			None => continue,
		};
		result.push(PopulationRecord{
			country_name: row[0].trim().into(),
			country_code: row[1].trim().into(),
			year,
			population,
		});
	}
	debug!("dropped {} {} rows without population data", dropped, ORIGIN);
	Ok(result)
}

pub fn read_csv<R: io::Read>(r: R) -> Result<Vec<PopulationRecord>> {
	let mut r = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.from_reader(r);
	let mut rows = Vec::new();
	for row in r.records() {
		let row = row?;
		rows.push(row.iter().map(|s| s.trim_start_matches('\u{feff}').to_string()).collect());
	}
	latest_from_rows(rows)
}

/// Read the indicator table from the downloaded archive. The archive also
/// carries metadata tables; only the `API_*.csv` member holds the data.
pub fn read_archive<P: AsRef<Path>>(path: P) -> Result<Vec<PopulationRecord>> {
	let f = fs::File::open(path)?;
	let mut archive = zip::ZipArchive::new(f)?;
	let member = archive.file_names()
		.find(|n| n.starts_with("API_") && n.ends_with(".csv"))
		.map(|n| n.to_string());
	let member = match member {
		Some(n) => n,
		None => return Err(Error::SchemaMismatch{
			origin: ORIGIN,
			expected: vec!["API_*.csv".into()],
			found: archive.file_names().map(|n| n.to_string()).collect(),
		}),
	};
	debug!("reading {} from archive", member);
	let result = read_csv(archive.by_name(&member)?);
	result
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<PopulationRecord>> {
	let path = path.as_ref();
	match path.extension() {
		Some(x) if x == "zip" => read_archive(path),
		_ => read_csv(magic_open(path)?),
	}
}

/// Override records in `country_name,country_code,year,population` form.
pub fn read_supplement<R: io::Read>(r: R) -> Result<Vec<PopulationRecord>> {
	let mut r = csv::Reader::from_reader(r);
	let mut result = Vec::new();
	for row in r.deserialize() {
		let rec: PopulationRecord = row?;
		result.push(rec);
	}
	Ok(result)
}

/// Canonicalize the primary records and append the supplements after them.
///
/// Order is significant: lookups built from the result are last-write-wins,
/// so the built-in supplement overrides the primary source and the user
/// override file overrides both.
pub fn combine(
		primary: Vec<PopulationRecord>,
		names: &CanonicalNames,
		overrides: Vec<PopulationRecord>,
) -> Result<Vec<PopulationRecord>> {
	let mut result = names.canonicalizer(Vocabulary::WorldBank).canonicalize(primary)?;
	result.extend(supplemental_data());
	result.extend(overrides);
	Ok(result)
}


pub struct PopulationReference {
	fetcher: Fetcher,
	cache: CachePolicy,
	url: String,
	supplement_file: Option<PathBuf>,
	names: Arc<CanonicalNames>,
}

impl PopulationReference {
	pub fn new(config: &Config, names: Arc<CanonicalNames>) -> Result<Self> {
		Ok(Self{
			fetcher: Fetcher::new(config.fetch_timeout)?,
			cache: config.population_cache(),
			url: WORLDBANK_ENDPOINT.into(),
			supplement_file: config.population_supplement.clone(),
			names,
		})
	}

	pub fn info_url(&self) -> &'static str {
		"https://data.worldbank.org/indicator/SP.POP.TOTL"
	}

	fn overrides(&self) -> Result<Vec<PopulationRecord>> {
		let path = match self.supplement_file.as_ref() {
			Some(p) => p,
			None => return Ok(Vec::new()),
		};
		let records = read_supplement(magic_open(path)?)?;
		info!("read {} population overrides from {}", records.len(), path.display());
		Ok(records)
	}

	pub fn latest_population_count(&self) -> Result<Vec<PopulationRecord>> {
		let path = self.cache.refresh(|f| {
			self.fetcher.download(&self.url, f)?;
			Ok(())
		})?;
		let primary = read_file(path)?;
		if primary.is_empty() {
			warn!("{} population table contains no data", ORIGIN);
		}
		info!("read {} population records from {}", primary.len(), ORIGIN);
		combine(primary, &self.names, self.overrides()?)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	use std::io::Write;

	fn row(values: &[&str]) -> Vec<String> {
		values.iter().map(|s| s.to_string()).collect()
	}

	fn header() -> Vec<String> {
		row(&["Country Name", "Country Code", "Indicator Name", "Indicator Code", "2017", "2018", "2019", ""])
	}

	fn pop(name: &str, code: &str, year: i32, population: u64) -> PopulationRecord {
		PopulationRecord{
			country_name: name.into(),
			country_code: code.into(),
			year,
			population,
		}
	}

	static SAMPLE_CSV: &'static str = "\u{feff}\"Data Source\",\"World Development Indicators\",
\"Last Updated Date\",\"2020-03-18\",

\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2017\",\"2018\",\"2019\",
\"Aruba\",\"ABW\",\"Population, total\",\"SP.POP.TOTL\",\"105366\",\"105845\",\"\",
\"Korea, Rep.\",\"KOR\",\"Population, total\",\"SP.POP.TOTL\",\"51361911\",\"51635256\",\"\",
\"Not classified\",\"INX\",\"Population, total\",\"SP.POP.TOTL\",\"\",\"\",\"\",
";

	#[test]
	fn detects_header() {
		assert!(is_header(&header()));
		assert!(!is_header(&row(&["Data Source", "World Development Indicators", ""])));
		assert!(!is_header(&row(&["Country Name", "Country Code", "Indicator Name", "Indicator Code", "Notes"])));
	}

	#[test]
	fn selects_latest_populated_year() {
		let out = latest_from_rows(vec![
			header(),
			row(&["A", "AAA", "Population, total", "SP.POP.TOTL", "1", "2", "3", ""]),
			row(&["B", "BBB", "Population, total", "SP.POP.TOTL", "10", "20", "", ""]),
		]).unwrap();
		assert_eq!(out, vec![pop("A", "AAA", 2019, 3), pop("B", "BBB", 2018, 20)]);
	}

	#[test]
	fn selects_early_year_when_later_ones_are_empty() {
		let out = latest_from_rows(vec![
			header(),
			row(&["A", "AAA", "Population, total", "SP.POP.TOTL", "1000", "", "", ""]),
		]).unwrap();
		assert_eq!(out, vec![pop("A", "AAA", 2017, 1000)]);
	}

	#[test]
	fn drops_rows_without_data() {
		let out = latest_from_rows(vec![
			header(),
			row(&["A", "AAA", "Population, total", "SP.POP.TOTL", "", "", "", ""]),
			row(&["B", "BBB", "Population, total", "SP.POP.TOTL"]),
		]).unwrap();
		assert!(out.is_empty());
	}

	#[test]
	fn skips_preamble_before_header() {
		let out = latest_from_rows(vec![
			row(&["Data Source", "World Development Indicators"]),
			row(&[]),
			header(),
			row(&["A", "AAA", "Population, total", "SP.POP.TOTL", "5", "", "", ""]),
		]).unwrap();
		assert_eq!(out, vec![pop("A", "AAA", 2017, 5)]);
	}

	#[test]
	fn fails_without_header() {
		let result = latest_from_rows(vec![row(&["Data Source", "World Development Indicators"])]);
		assert!(matches!(result, Err(Error::SchemaMismatch{origin: "World Bank", ..})));
	}

	#[test]
	fn accepts_float_formatted_counts() {
		let out = latest_from_rows(vec![
			header(),
			row(&["A", "AAA", "Population, total", "SP.POP.TOTL", "", "1.5E6", "", ""]),
		]).unwrap();
		assert_eq!(out, vec![pop("A", "AAA", 2018, 1_500_000)]);
	}

	#[test]
	fn reads_exported_csv() {
		let out = read_csv(SAMPLE_CSV.as_bytes()).unwrap();
		assert_eq!(out, vec![
			pop("Aruba", "ABW", 2018, 105_845),
			pop("Korea, Rep.", "KOR", 2018, 51_635_256),
		]);
	}

	#[test]
	fn reads_data_member_of_archive() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("pop.zip");
		{
			let f = fs::File::create(&path).unwrap();
			let mut zw = zip::ZipWriter::new(f);
			let options = zip::write::SimpleFileOptions::default();
			zw.start_file("Metadata_Country_API_SP.POP.TOTL_DS2_en_csv_v2.csv", options).unwrap();
			zw.write_all(b"\"Country Code\",\"Region\"\n").unwrap();
			zw.start_file("API_SP.POP.TOTL_DS2_en_csv_v2.csv", options).unwrap();
			zw.write_all(SAMPLE_CSV.as_bytes()).unwrap();
			zw.finish().unwrap();
		}
		let out = read_file(&path).unwrap();
		assert_eq!(out.len(), 2);
		assert_eq!(out[1].country_code.as_str(), "KOR");
	}

	#[test]
	fn appends_supplemental_data() {
		let out = combine(Vec::new(), &CanonicalNames::builtin(), Vec::new()).unwrap();
		for rec in supplemental_data() {
			assert!(out.contains(&rec));
		}
	}

	#[test]
	fn canonicalizes_primary_and_keeps_override_order() {
		let primary = vec![pop("Korea, Rep.", "KOR", 2018, 51_635_256)];
		let overrides = vec![pop("South Korea", "KOR", 2020, 51_780_579)];
		let out = combine(primary, &CanonicalNames::builtin(), overrides).unwrap();
		assert_eq!(out.first().unwrap(), &pop("South Korea", "KOR", 2018, 51_635_256));
		assert_eq!(out.last().unwrap(), &pop("South Korea", "KOR", 2020, 51_780_579));
	}

	#[test]
	fn rejects_ambiguous_primary_names() {
		let primary = vec![
			pop("United States", "USA", 2018, 327_167_434),
			pop("United States of America", "USA", 2018, 327_167_434),
		];
		let result = combine(primary, &CanonicalNames::builtin(), Vec::new());
		assert!(matches!(result, Err(Error::AmbiguousCanonicalization{vocabulary: Vocabulary::WorldBank, ..})));
	}

	#[test]
	fn reads_supplement_file() {
		let data = "country_name,country_code,year,population\nTaiwan,TWN,2021,23375314\n";
		assert_eq!(read_supplement(data.as_bytes()).unwrap(), vec![pop("Taiwan", "TWN", 2021, 23_375_314)]);
	}
}
