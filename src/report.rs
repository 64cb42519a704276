use std::collections::HashMap;
use std::io;

use log::debug;

use regex::{Captures, Regex};

use serde_json::json;

use super::error::{Error, Result};
use super::records::{CountryName, DensityRecord};


static INSERT_MARKER: &'static str = r"<!--\s*INSERT\s+([A-Za-z0-9_-]+)\s*-->";

// https://plot.ly/javascript/reference/choropleth/
static PLOTLY_COLORSCALE: &'static str = "YlOrRd";


/// Copy `r` to `w`, substituting `<!-- INSERT NAME -->` markers with the
/// replacement stored under `name` (case-insensitive). Markers without a
/// replacement and ordinary comments are copied verbatim.
pub fn process_template<R: io::Read, W: io::Write>(mut r: R, mut w: W, replacements: &HashMap<String, String>) -> Result<()> {
	let replacements: HashMap<String, &str> = replacements.iter()
		.map(|(k, v)| (k.to_lowercase(), v.as_str()))
		.collect();
	let re = Regex::new(INSERT_MARKER).map_err(|e| Error::Config(e.to_string()))?;

	let mut template = String::new();
	r.read_to_string(&mut template)?;
	let result = re.replace_all(&template, |caps: &Captures| {
		let name = caps[1].to_lowercase();
		match replacements.get(&name) {
			Some(v) => (*v).to_string(),
			None => {
				debug!("no replacement for template marker {:?}", name);
				caps[0].to_string()
			},
		}
	});
	w.write_all(result.as_bytes())?;
	Ok(())
}


/// Drop excluded countries (exact canonical names) from the report data.
pub fn exclude_countries<I: IntoIterator<Item = DensityRecord>>(records: I, excluded: &[CountryName]) -> Vec<DensityRecord> {
	records.into_iter()
		.filter(|r| !excluded.contains(&r.country_name))
		.collect()
}


pub trait ReportRenderer {
	fn render(&self, records: &[DensityRecord], w: &mut dyn io::Write) -> Result<()>;
}


/// World map coloured by case density. Expects the Plotly library to be
/// loaded by the surrounding page.
pub struct ChoroplethRenderer {
	div_id: String,
}

impl ChoroplethRenderer {
	pub fn new<S: Into<String>>(div_id: S) -> Self {
		Self{div_id: div_id.into()}
	}

	pub fn figure(&self, records: &[DensityRecord]) -> serde_json::Value {
		let locations: Vec<&str> = records.iter().map(|r| r.country_code.as_str()).collect();
		let names: Vec<&str> = records.iter().map(|r| r.country_name.as_str()).collect();
		let density: Vec<f64> = records.iter().map(|r| r.cases_per_million).collect();
		let cases: Vec<i64> = records.iter().map(|r| r.total_new_cases).collect();
		json!({
			"data": [{
				"type": "choropleth",
				"locationmode": "ISO-3",
				"locations": locations,
				"z": density,
				"text": names,
				"customdata": cases,
				"hovertemplate": "<b>%{text}</b><br>cases: %{customdata}<br>per million: %{z:.1f}<extra></extra>",
				"colorscale": PLOTLY_COLORSCALE,
				"reversescale": true,
				"colorbar": {"title": {"text": "cases per million"}},
			}],
			"layout": {
				"geo": {
					"showframe": false,
					"projection": {"type": "natural earth"},
				},
				"margin": {"l": 0, "r": 0, "t": 0, "b": 0},
			},
		})
	}
}

impl Default for ChoroplethRenderer {
	fn default() -> Self {
		Self::new("density-map")
	}
}

impl ReportRenderer for ChoroplethRenderer {
	fn render(&self, records: &[DensityRecord], w: &mut dyn io::Write) -> Result<()> {
		let figure = self.figure(records);
		// keep the payload from terminating the script element early
		let data = figure["data"].to_string().replace("</", "<\\/");
		let layout = figure["layout"].to_string().replace("</", "<\\/");
		let div_id = serde_json::Value::from(self.div_id.as_str()).to_string();
		writeln!(w, "<div id={}></div>", div_id)?;
		writeln!(w, "<script>")?;
		writeln!(w, "Plotly.newPlot({}, {}, {});", div_id, data, layout)?;
		writeln!(w, "</script>")?;
		Ok(())
	}
}


/// Render `records` and substitute the fragment for the `MAP` marker, next
/// to any further `extra` replacements.
pub fn write_report<R: io::Read, W: io::Write>(
		template: R,
		out: W,
		records: &[DensityRecord],
		renderer: &dyn ReportRenderer,
		mut extra: HashMap<String, String>,
) -> Result<()> {
	let mut fragment = Vec::new();
	renderer.render(records, &mut fragment)?;
	let fragment = String::from_utf8(fragment)
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
	extra.insert("map".into(), fragment);
	process_template(template, out, &extra)
}
