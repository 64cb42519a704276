use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::canonical::CanonicalNames;
use super::config::Config;
use super::ecdc::EcdcSource;
use super::error::Result;
use super::fetch::Fetcher;
use super::jhucsse::JhuCsseSource;
use super::records::CaseDayRecord;


pub type CaseDays = Box<dyn Iterator<Item = CaseDayRecord>>;


/// A feed of daily case counts per country. Implementations fetch their
/// backing data on every call to `daily_stats` and yield records with
/// canonical country names, in no particular order.
pub trait CaseSource {
	fn name(&self) -> &'static str;
	fn info_url(&self) -> &'static str;
	fn daily_stats(&self) -> Result<CaseDays>;
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
	Ecdc,
	JhuCsse,
}

#[derive(Debug, Clone)]
pub struct UnknownSource(pub String);

impl fmt::Display for UnknownSource {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "unknown case source {:?} (expected one of: {})", self.0, SourceKind::NAMES.join(", "))
	}
}

impl std::error::Error for UnknownSource {}

impl SourceKind {
	pub const ALL: [SourceKind; 2] = [SourceKind::Ecdc, SourceKind::JhuCsse];
	pub const NAMES: [&'static str; 2] = ["ecdc", "jhucsse"];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Ecdc => "ecdc",
			Self::JhuCsse => "jhucsse",
		}
	}

	pub fn open(&self, config: &Config, names: Arc<CanonicalNames>) -> Result<Box<dyn CaseSource>> {
		let fetcher = Fetcher::new(config.fetch_timeout)?;
		Ok(match self {
			Self::Ecdc => Box::new(EcdcSource::new(fetcher, config.ecdc_cache(), names)),
			Self::JhuCsse => Box::new(JhuCsseSource::new(fetcher, names)),
		})
	}
}

impl fmt::Display for SourceKind {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SourceKind {
	type Err = UnknownSource;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"ecdc" | "ecdc_source" => Ok(Self::Ecdc),
			"jhucsse" | "jhucsse_source" => Ok(Self::JhuCsse),
			other => Err(UnknownSource(other.into())),
		}
	}
}
