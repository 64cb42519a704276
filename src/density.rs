use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

use super::error::{Error, Result};
use super::population::PopulationReference;
use super::records::{CaseDayRecord, CountryName, CountryTotals, DensityRecord, IsoCode, PopulationRecord};
use super::source::CaseSource;


/// Total cases and deaths per country over the whole series, ordered by
/// country name.
pub fn sum_days<I: IntoIterator<Item = CaseDayRecord>>(stats: I) -> Vec<CountryTotals> {
	let mut totals = BTreeMap::<CountryName, (i64, i64)>::new();
	for r in stats {
		let entry = totals.entry(r.country).or_insert((0, 0));
		entry.0 += r.new_confirmed_cases;
		entry.1 += r.new_deaths;
	}
	totals.into_iter().map(|(country, (cases, deaths))| CountryTotals{
		country,
		cases,
		deaths,
	}).collect()
}

/// Later records replace earlier ones for the same country.
pub fn population_by_country(popcount: &[PopulationRecord]) -> HashMap<CountryName, u64> {
	popcount.iter().map(|p| (p.country_name.clone(), p.population)).collect()
}

pub fn iso_alpha3_codes(popcount: &[PopulationRecord]) -> HashMap<CountryName, IsoCode> {
	popcount.iter().map(|p| (p.country_name.clone(), p.country_code.clone())).collect()
}

fn lower(s: &str) -> String {
	s.to_lowercase()
}


/// Joined density records, computed as the iterator is advanced. All
/// lookups have been validated when this is handed out.
#[derive(Debug)]
pub struct DensityRecords {
	inner: std::vec::IntoIter<(CountryTotals, IsoCode, u64)>,
}

impl Iterator for DensityRecords {
	type Item = DensityRecord;

	fn next(&mut self) -> Option<Self::Item> {
		let (totals, country_code, population) = self.inner.next()?;
		Some(DensityRecord{
			cases_per_million: 1_000_000.0 * totals.cases as f64 / population as f64,
			country_name: totals.country,
			country_code,
			total_new_cases: totals.cases,
		})
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}


/// Join case totals with population counts.
///
/// With an empty `countries` list, every country present in both inputs is
/// joined. Otherwise only the listed countries (compared case-insensitively)
/// are, and each of them must have population data.
pub fn case_density_from<I, S>(stats: I, popcount: &[PopulationRecord], countries: &[S]) -> Result<DensityRecords>
	where I: IntoIterator<Item = CaseDayRecord>,
	      S: AsRef<str>
{
	let totals = sum_days(stats);
	let pop_by_country = population_by_country(popcount);
	let country_codes = iso_alpha3_codes(popcount);

	let requested: HashSet<String> = countries.iter().map(|s| lower(s.as_ref())).collect();
	if !requested.is_empty() {
		let known: HashSet<String> = pop_by_country.keys().map(|k| lower(k)).collect();
		for name in countries.iter() {
			if !known.contains(&lower(name.as_ref())) {
				return Err(Error::MissingPopulation(name.as_ref().into()))
			}
		}
	}

	let selected: HashSet<String> = if requested.is_empty() {
		totals.iter()
			.filter(|t| pop_by_country.contains_key(&t.country))
			.map(|t| lower(&t.country))
			.collect()
	} else {
		requested
	};

	let mut joined = Vec::with_capacity(selected.len());
	let mut skipped = 0usize;
	for t in totals {
		if !selected.contains(&lower(&t.country)) {
			skipped += 1;
			continue
		}
		let population = match pop_by_country.get(&t.country) {
			Some(v) => *v,
			// requested with a different spelling than the population data uses
			None => return Err(Error::MissingPopulation(t.country)),
		};
		if population == 0 {
			return Err(Error::ZeroPopulation(t.country))
		}
		let code = country_codes.get(&t.country).cloned().unwrap_or_default();
		joined.push((t, code, population));
	}
	debug!("joined {} countries, skipped {}", joined.len(), skipped);
	Ok(DensityRecords{inner: joined.into_iter()})
}

pub fn case_density<S: AsRef<str>>(
		source: &dyn CaseSource,
		population: &PopulationReference,
		countries: &[S],
) -> Result<DensityRecords> {
	let stats = source.daily_stats()?;
	let popcount = population.latest_population_count()?;
	case_density_from(stats, &popcount, countries)
}


#[cfg(test)]
mod tests {
	use super::*;

	use chrono::NaiveDate;

	fn day(country: &str, d: u32, cases: i64) -> CaseDayRecord {
		CaseDayRecord::cases_only(NaiveDate::from_ymd(2020, 3, d), country.into(), cases)
	}

	fn pop(name: &str, code: &str, population: u64) -> PopulationRecord {
		PopulationRecord{
			country_name: name.into(),
			country_code: code.into(),
			year: 2019,
			population,
		}
	}

	fn sample_stats() -> Vec<CaseDayRecord> {
		vec![day("A", 1, 4), day("A", 2, 6), day("B", 1, 0)]
	}

	fn sample_population() -> Vec<PopulationRecord> {
		vec![pop("A", "AAA", 1_000_000), pop("B", "BBB", 500_000)]
	}

	const ALL: &[&str] = &[];

	#[test]
	fn sums_cases_and_deaths_per_country() {
		let mut death = day("A", 3, 1);
		death.new_deaths = 2;
		let mut stats = sample_stats();
		stats.push(death);
		assert_eq!(sum_days(stats), vec![
			CountryTotals{country: "A".into(), cases: 11, deaths: 2},
			CountryTotals{country: "B".into(), cases: 0, deaths: 0},
		]);
	}

	#[test]
	fn computes_cases_per_million() {
		let out: Vec<_> = case_density_from(sample_stats(), &sample_population(), ALL).unwrap().collect();
		assert_eq!(out, vec![
			DensityRecord{country_name: "A".into(), country_code: "AAA".into(), total_new_cases: 10, cases_per_million: 10.0},
			DensityRecord{country_name: "B".into(), country_code: "BBB".into(), total_new_cases: 0, cases_per_million: 0.0},
		]);
	}

	#[test]
	fn omits_countries_without_population() {
		let mut stats = sample_stats();
		stats.push(day("C", 1, 100));
		let names: Vec<String> = case_density_from(stats, &sample_population(), ALL).unwrap()
			.map(|r| r.country_name.to_string())
			.collect();
		assert_eq!(names, vec!["A", "B"]);
	}

	#[test]
	fn requested_country_without_population_fails() {
		let mut stats = sample_stats();
		stats.push(day("C", 1, 100));
		match case_density_from(stats, &sample_population(), &["A", "C"]) {
			Err(Error::MissingPopulation(name)) => assert_eq!(name.as_str(), "C"),
			Err(other) => panic!("unexpected error {:?}", other),
			Ok(_) => panic!("missing population was not reported"),
		}
	}

	#[test]
	fn requested_country_without_cases_or_population_fails() {
		let result = case_density_from(sample_stats(), &sample_population(), &["Atlantis"]);
		assert!(matches!(result, Err(Error::MissingPopulation(_))));
	}

	#[test]
	fn restricts_to_requested_countries_ignoring_case() {
		let out: Vec<_> = case_density_from(sample_stats(), &sample_population(), &["b"]).unwrap().collect();
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].country_name.as_str(), "B");
	}

	#[test]
	fn join_is_idempotent() {
		let first: Vec<_> = case_density_from(sample_stats(), &sample_population(), ALL).unwrap().collect();
		let second: Vec<_> = case_density_from(sample_stats(), &sample_population(), ALL).unwrap().collect();
		assert_eq!(first, second);
	}

	#[test]
	fn zero_population_is_an_error() {
		let popcount = vec![pop("A", "AAA", 0)];
		match case_density_from(sample_stats(), &popcount, ALL) {
			Err(Error::ZeroPopulation(name)) => assert_eq!(name.as_str(), "A"),
			Err(other) => panic!("unexpected error {:?}", other),
			Ok(_) => panic!("zero population was not reported"),
		}
	}

	#[test]
	fn later_population_records_win() {
		let mut popcount = sample_population();
		popcount.push(pop("A", "XAA", 2_000_000));
		let out: Vec<_> = case_density_from(sample_stats(), &popcount, &["A"]).unwrap().collect();
		assert_eq!(out[0].country_code.as_str(), "XAA");
		assert_eq!(out[0].cases_per_million, 5.0);
	}

	#[test]
	fn keeps_negative_totals() {
		let stats = vec![day("A", 1, 10), day("A", 2, -20)];
		let out: Vec<_> = case_density_from(stats, &sample_population(), ALL).unwrap().collect();
		assert_eq!(out[0].total_new_cases, -10);
		assert_eq!(out[0].cases_per_million, -10.0);
	}
}
