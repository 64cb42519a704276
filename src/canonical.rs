use std::collections::{BTreeMap, HashSet};

use enum_map::{Enum, EnumMap};

use log::debug;

use super::error::{Error, Result};
use super::records::{CaseDayRecord, CountryName, PopulationRecord};


/// The naming scheme a country name was written in. ECDC names are the
/// canonical vocabulary every other source is rewritten into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Vocabulary {
	Ecdc,
	JhuCsse,
	WorldBank,
}

pub type CountryNameMap = BTreeMap<CountryName, CountryName>;


static JHUCSSE_NAMES: &'static [(&'static str, &'static str)] = &[
	("Burma", "Myanmar"),
	("Cabo Verde", "Cape Verde"),
	("Congo (Brazzaville)", "Congo"),
	("Congo (Kinshasa)", "Democratic Republic of the Congo"),
	("Czechia", "Czech Republic"),
	("Diamond Princess", "Cases on an international conveyance Japan"),
	("Korea, South", "South Korea"),
	("Taiwan*", "Taiwan"),
	("US", "United States of America"),
	("West Bank and Gaza", "Palestine"),
];

static WORLDBANK_NAMES: &'static [(&'static str, &'static str)] = &[
	("Bahamas, The", "Bahamas"),
	("Brunei Darussalam", "Brunei"),
	("Cabo Verde", "Cape Verde"),
	("Congo, Dem. Rep.", "Democratic Republic of the Congo"),
	("Congo, Rep.", "Congo"),
	("Czechia", "Czech Republic"),
	("Egypt, Arab Rep.", "Egypt"),
	("Gambia, The", "Gambia"),
	("Hong Kong SAR, China", "Hong Kong"),
	("Iran, Islamic Rep.", "Iran"),
	("Korea, Dem. People's Rep.", "North Korea"),
	("Korea, Rep.", "South Korea"),
	("Kyrgyz Republic", "Kyrgyzstan"),
	("Lao PDR", "Laos"),
	("Macao SAR, China", "Macao"),
	("Micronesia, Fed. Sts.", "Micronesia"),
	("Russian Federation", "Russia"),
	("Slovak Republic", "Slovakia"),
	("St. Kitts and Nevis", "Saint Kitts and Nevis"),
	("St. Lucia", "Saint Lucia"),
	("St. Vincent and the Grenadines", "Saint Vincent and the Grenadines"),
	("Syrian Arab Republic", "Syria"),
	("Turkiye", "Turkey"),
	("United States", "United States of America"),
	("Venezuela, RB", "Venezuela"),
	("Viet Nam", "Vietnam"),
	("West Bank and Gaza", "Palestine"),
	("Yemen, Rep.", "Yemen"),
];


/// Read-only name tables for every vocabulary. Built once at startup and
/// handed to whoever needs to canonicalize.
#[derive(Debug, Clone, Default)]
pub struct CanonicalNames {
	maps: EnumMap<Vocabulary, CountryNameMap>,
}

impl CanonicalNames {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn builtin() -> Self {
		let mut result = Self::empty();
		for (raw, canonical) in JHUCSSE_NAMES.iter() {
			result.insert(Vocabulary::JhuCsse, *raw, *canonical);
		}
		for (raw, canonical) in WORLDBANK_NAMES.iter() {
			result.insert(Vocabulary::WorldBank, *raw, *canonical);
		}
		result
	}

	pub fn with_mapping(mut self, vocabulary: Vocabulary, raw: &str, canonical: &str) -> Self {
		self.insert(vocabulary, raw, canonical);
		self
	}

	fn insert(&mut self, vocabulary: Vocabulary, raw: &str, canonical: &str) {
		self.maps[vocabulary].insert(raw.into(), canonical.into());
	}

	pub fn map(&self, vocabulary: Vocabulary) -> &CountryNameMap {
		&self.maps[vocabulary]
	}

	pub fn canonicalizer(&self, vocabulary: Vocabulary) -> Canonicalizer<'_> {
		Canonicalizer{
			vocabulary,
			map: &self.maps[vocabulary],
		}
	}
}


pub trait CountryKeyed {
	fn country(&self) -> &CountryName;
	fn country_mut(&mut self) -> &mut CountryName;
}

impl CountryKeyed for CaseDayRecord {
	fn country(&self) -> &CountryName {
		&self.country
	}

	fn country_mut(&mut self) -> &mut CountryName {
		&mut self.country
	}
}

impl CountryKeyed for PopulationRecord {
	fn country(&self) -> &CountryName {
		&self.country_name
	}

	fn country_mut(&mut self) -> &mut CountryName {
		&mut self.country_name
	}
}


pub struct Canonicalizer<'m> {
	vocabulary: Vocabulary,
	map: &'m CountryNameMap,
}

impl<'m> Canonicalizer<'m> {
	pub fn vocabulary(&self) -> Vocabulary {
		self.vocabulary
	}

	/// Canonical spelling of `raw`; names without a mapping are returned
	/// unchanged.
	pub fn canonical<'a>(&'a self, raw: &'a CountryName) -> &'a CountryName {
		self.map.get(raw).unwrap_or(raw)
	}

	/// Reject a batch in which a raw name is already the canonical form of
	/// a different raw name. Merging the two would silently fold distinct
	/// entities into one key.
	pub fn check_batch<'a, I: IntoIterator<Item = &'a CountryName>>(&self, names: I) -> Result<()> {
		let surfaced: HashSet<&CountryName> = names.into_iter()
			.filter(|name| match self.map.get(*name) {
				Some(canonical) => canonical == *name,
				None => true,
			})
			.collect();
		for (raw, canonical) in self.map.iter() {
			if raw == canonical {
				continue
			}
			if surfaced.contains(canonical) {
				return Err(Error::AmbiguousCanonicalization{
					vocabulary: self.vocabulary,
					raw: raw.clone(),
					canonical: canonical.clone(),
				})
			}
		}
		Ok(())
	}

	pub fn canonicalize<R: CountryKeyed>(&self, mut records: Vec<R>) -> Result<Vec<R>> {
		self.check_batch(records.iter().map(|r| r.country()))?;
		let mut renamed = 0usize;
		for rec in records.iter_mut() {
			if let Some(canonical) = self.map.get(rec.country()) {
				if canonical != rec.country() {
					*rec.country_mut() = canonical.clone();
					renamed += 1;
				}
			}
		}
		debug!("canonicalized {} of {} {:?} records", renamed, records.len(), self.vocabulary);
		Ok(records)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	use chrono::NaiveDate;

	fn caseday(country: &str) -> CaseDayRecord {
		CaseDayRecord::cases_only(NaiveDate::from_ymd(1970, 1, 1), country.into(), 10)
	}

	fn countries(records: &[CaseDayRecord]) -> Vec<&str> {
		records.iter().map(|r| r.country.as_str()).collect()
	}

	#[test]
	fn unmapped_name_is_identity() {
		let names = CanonicalNames::builtin();
		let c = names.canonicalizer(Vocabulary::JhuCsse);
		let germany: CountryName = "Germany".into();
		assert_eq!(c.canonical(&germany), &germany);
		let out = c.canonicalize(vec![caseday("Germany"), caseday("Mainland China")]).unwrap();
		assert_eq!(countries(&out), vec!["Germany", "Mainland China"]);
	}

	#[test]
	fn rewrites_mapped_names() {
		let names = CanonicalNames::builtin();
		let out = names.canonicalizer(Vocabulary::JhuCsse)
			.canonicalize(vec![caseday("US"), caseday("Germany")])
			.unwrap();
		assert_eq!(countries(&out), vec!["United States of America", "Germany"]);
	}

	#[test]
	fn rejects_raw_name_equal_to_canonical_form() {
		let names = CanonicalNames::builtin();
		let result = names.canonicalizer(Vocabulary::JhuCsse)
			.canonicalize(vec![caseday("United States of America")]);
		match result {
			Err(Error::AmbiguousCanonicalization{vocabulary, raw, canonical}) => {
				assert_eq!(vocabulary, Vocabulary::JhuCsse);
				assert_eq!(raw.as_str(), "US");
				assert_eq!(canonical.as_str(), "United States of America");
			},
			other => panic!("unexpected result {:?}", other),
		}
	}

	#[test]
	fn rejects_both_spellings_in_one_batch() {
		let names = CanonicalNames::empty()
			.with_mapping(Vocabulary::WorldBank, "Korea, Rep.", "South Korea");
		let result = names.canonicalizer(Vocabulary::WorldBank)
			.canonicalize(vec![caseday("Korea, Rep."), caseday("South Korea")]);
		assert!(matches!(result, Err(Error::AmbiguousCanonicalization{..})));
	}

	#[test]
	fn identity_entries_do_not_conflict() {
		let names = CanonicalNames::empty()
			.with_mapping(Vocabulary::Ecdc, "Italy", "Italy");
		let out = names.canonicalizer(Vocabulary::Ecdc)
			.canonicalize(vec![caseday("Italy")])
			.unwrap();
		assert_eq!(countries(&out), vec!["Italy"]);
	}

	#[test]
	fn renamed_raw_names_do_not_count_as_surfaced() {
		// B is present, but is itself rewritten to C, so A -> B does not
		// collide with anything left in the batch
		let names = CanonicalNames::empty()
			.with_mapping(Vocabulary::JhuCsse, "A", "B")
			.with_mapping(Vocabulary::JhuCsse, "B", "C");
		let out = names.canonicalizer(Vocabulary::JhuCsse)
			.canonicalize(vec![caseday("A"), caseday("B")])
			.unwrap();
		assert_eq!(countries(&out), vec!["B", "C"]);
	}

	#[test]
	fn vocabularies_are_independent() {
		let names = CanonicalNames::builtin();
		// "United States" is a World Bank spelling only
		let out = names.canonicalizer(Vocabulary::JhuCsse)
			.canonicalize(vec![caseday("United States")])
			.unwrap();
		assert_eq!(countries(&out), vec!["United States"]);
	}

	#[test]
	fn canonicalizes_population_records() {
		let names = CanonicalNames::builtin();
		let rec = PopulationRecord{
			country_name: "Korea, Rep.".into(),
			country_code: "KOR".into(),
			year: 2018,
			population: 51_635_256,
		};
		let out = names.canonicalizer(Vocabulary::WorldBank).canonicalize(vec![rec]).unwrap();
		assert_eq!(out[0].country_name.as_str(), "South Korea");
		assert_eq!(out[0].country_code.as_str(), "KOR");
	}

	#[test]
	fn builtin_tables_have_no_chains_or_merges() {
		let names = CanonicalNames::builtin();
		for vocabulary in [Vocabulary::Ecdc, Vocabulary::JhuCsse, Vocabulary::WorldBank].iter() {
			let map = names.map(*vocabulary);
			let mut seen = HashSet::new();
			for (raw, canonical) in map.iter() {
				assert!(!map.contains_key(canonical), "{:?} -> {:?} is chained", raw, canonical);
				assert!(seen.insert(canonical), "{:?} has two spellings", canonical);
			}
		}
	}
}
