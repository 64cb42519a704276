use std::fmt;
use std::io;

use reqwest;

use super::canonical::Vocabulary;
use super::records::CountryName;


#[derive(Debug)]
pub enum FetchError {
	Request(reqwest::Error),
	Timeout(String),
	Status{url: String, status: reqwest::StatusCode},
	LinkNotFound(String),
	Io(io::Error),
}

impl fmt::Display for FetchError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Request(e) => fmt::Display::fmt(e, f),
			Self::Timeout(url) => write!(f, "timed out while fetching {}", url),
			Self::Status{url, status} => write!(f, "fetching {} failed with status {}", url, status),
			Self::LinkNotFound(url) => write!(f, "no download link found on {}", url),
			Self::Io(e) => write!(f, "I/O error during fetch: {}", e),
		}
	}
}

impl From<reqwest::Error> for FetchError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			let url = err.url().map(|u| u.to_string()).unwrap_or_else(|| "<unknown>".into());
			return Self::Timeout(url)
		}
		Self::Request(err)
	}
}


#[derive(Debug)]
pub enum Error {
	SchemaMismatch{
		origin: &'static str,
		expected: Vec<String>,
		found: Vec<String>,
	},
	AmbiguousCanonicalization{
		vocabulary: Vocabulary,
		raw: CountryName,
		canonical: CountryName,
	},
	MissingPopulation(CountryName),
	ZeroPopulation(CountryName),
	InvalidCell{
		origin: &'static str,
		row: usize,
		column: String,
		value: String,
	},
	Fetch(FetchError),
	Config(String),
	Io(io::Error),
	Csv(csv::Error),
	Sheet(calamine::Error),
	Archive(zip::result::ZipError),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::SchemaMismatch{origin, expected, found} => write!(
				f, "unexpected header in {} data: expected {:?}, found {:?}",
				origin, expected, found,
			),
			Self::AmbiguousCanonicalization{vocabulary, raw, canonical} => write!(
				f, "{:?} name {:?} maps to {:?}, which is already present as a distinct country",
				vocabulary, raw, canonical,
			),
			Self::MissingPopulation(country) => write!(f, "no population data for {:?}", country),
			Self::ZeroPopulation(country) => write!(f, "population of {:?} is zero", country),
			Self::InvalidCell{origin, row, column, value} => write!(
				f, "invalid value {:?} in column {:?} of {} row {}",
				value, column, origin, row,
			),
			Self::Fetch(e) => fmt::Display::fmt(e, f),
			Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
			Self::Io(e) => fmt::Display::fmt(e, f),
			Self::Csv(e) => fmt::Display::fmt(e, f),
			Self::Sheet(e) => fmt::Display::fmt(e, f),
			Self::Archive(e) => fmt::Display::fmt(e, f),
		}
	}
}

impl std::error::Error for Error {}

impl From<FetchError> for Error {
	fn from(err: FetchError) -> Self {
		Self::Fetch(err)
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Self::Fetch(err.into())
	}
}

impl From<io::Error> for Error {
	fn from(err: io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<csv::Error> for Error {
	fn from(err: csv::Error) -> Self {
		Self::Csv(err)
	}
}

impl From<calamine::Error> for Error {
	fn from(err: calamine::Error) -> Self {
		Self::Sheet(err)
	}
}

impl From<zip::result::ZipError> for Error {
	fn from(err: zip::result::ZipError) -> Self {
		Self::Archive(err)
	}
}

pub type Result<T> = std::result::Result<T, Error>;
