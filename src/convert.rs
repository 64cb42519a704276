use std::collections::BTreeMap;

use chrono::NaiveDate;

use log::{debug, warn};

use super::records::{CaseDayRecord, CountryName, RawCaseRecord};


/// Turn per-province cumulative counts into per-country daily counts.
///
/// Provinces of the same country are summed per date first. Each country's
/// series is then differenced against its previous date, starting from a
/// baseline of zero, so the emitted counts of a country always add up to
/// its last cumulative total. Regressions in the upstream totals come out
/// as negative counts and are not clamped.
///
/// Output is ordered by country, then date.
pub fn casedays_from_cumulative<I: IntoIterator<Item = RawCaseRecord>>(records: I) -> Vec<CaseDayRecord> {
	let mut totals: BTreeMap<(CountryName, NaiveDate), i64> = BTreeMap::new();
	for rec in records {
		for (date, cumulative) in rec.cumulative_cases {
			*totals.entry((rec.country.clone(), date)).or_insert(0) += cumulative;
		}
	}

	let mut result = Vec::with_capacity(totals.len());
	let mut current: Option<CountryName> = None;
	let mut prev_total = 0i64;
	let mut regressions = 0usize;
	for ((country, date), total) in totals {
		if current.as_ref() != Some(&country) {
			current = Some(country.clone());
			prev_total = 0;
		}
		let delta = total - prev_total;
		if delta < 0 {
			regressions += 1;
		}
		prev_total = total;
		result.push(CaseDayRecord::cases_only(date, country, delta));
	}
	if regressions > 0 {
		warn!("{} cumulative totals decreased from one day to the next", regressions);
	}
	debug!("converted cumulative counts into {} daily records", result.len());
	result
}
