//! Query filters exchanged with the query form and the backend.
//!
//! The backend and the page URL use sentinel strings (`'__any'`, and `'0'`
//! for the port) to mean "no filter". [`GraphFilters::from_raw`] is the one
//! place those sentinels are recognized; everywhere else an unset filter is
//! simply `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{Url, form_urlencoded};

/// A filterable query dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterField {
	/// `cluster`
	Cluster,
	/// `namespace`
	Namespace,
	/// `service`
	Service,
	/// `protocol`
	Protocol,
	/// `port`
	Port,
	/// `endpoint`
	Endpoint,
}

impl FilterField {
	/// Every field, in form order.
	pub const ALL: [FilterField; 6] = [
		FilterField::Cluster,
		FilterField::Namespace,
		FilterField::Service,
		FilterField::Protocol,
		FilterField::Port,
		FilterField::Endpoint,
	];

	/// Key in the `filters` JSON object.
	pub fn key(self) -> &'static str {
		match self {
			FilterField::Cluster => "cluster",
			FilterField::Namespace => "namespace",
			FilterField::Service => "service",
			FilterField::Protocol => "protocol",
			FilterField::Port => "port",
			FilterField::Endpoint => "endpoint",
		}
	}

	fn is_sentinel(self, value: &str) -> bool {
		match value {
			"" | "__any" | "'__any'" => true,
			"0" | "'0'" => self == FilterField::Port,
			_ => false,
		}
	}
}

/// Filter values as the backend expects them (string literals are quoted,
/// e.g. `'checkout'`). `None` means the dimension is unfiltered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFilters {
	/// Cluster filter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cluster: Option<String>,
	/// Namespace filter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
	/// Service filter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub service: Option<String>,
	/// Protocol filter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub protocol: Option<String>,
	/// Port filter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub port: Option<String>,
	/// Endpoint filter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
}

impl GraphFilters {
	/// Build filters from a raw key/value map, translating sentinels to `None`.
	/// Unknown keys are ignored.
	pub fn from_raw<'a, I>(entries: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut filters = GraphFilters::default();
		for (key, value) in entries {
			let Some(field) = FilterField::ALL.into_iter().find(|f| f.key() == key) else {
				continue;
			};
			let value = value.trim();
			if !field.is_sentinel(value) {
				*filters.slot_mut(field) = Some(value.to_string());
			}
		}
		filters
	}

	/// Parse a JSON filter object. Non-string values are ignored.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		Ok(Self::from_map(&serde_json::from_str(json)?))
	}

	/// Parse the page's `filters` query parameter, which may carry an extra
	/// layer of percent-encoding.
	pub fn from_query_value(value: &str) -> Result<Self, serde_json::Error> {
		Ok(Self::from_map(&decode_filters_param(value)?))
	}

	fn from_map(raw: &BTreeMap<String, Value>) -> Self {
		Self::from_raw(
			raw.iter()
				.filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s))),
		)
	}

	/// Current value of `field`.
	pub fn get(&self, field: FilterField) -> Option<&str> {
		match field {
			FilterField::Cluster => self.cluster.as_deref(),
			FilterField::Namespace => self.namespace.as_deref(),
			FilterField::Service => self.service.as_deref(),
			FilterField::Protocol => self.protocol.as_deref(),
			FilterField::Port => self.port.as_deref(),
			FilterField::Endpoint => self.endpoint.as_deref(),
		}
	}

	/// Filter on an exact value, quoting it as a string literal.
	pub fn set_literal(&mut self, field: FilterField, value: &str) {
		*self.slot_mut(field) = Some(format!("'{}'", value));
	}

	fn slot_mut(&mut self, field: FilterField) -> &mut Option<String> {
		match field {
			FilterField::Cluster => &mut self.cluster,
			FilterField::Namespace => &mut self.namespace,
			FilterField::Service => &mut self.service,
			FilterField::Protocol => &mut self.protocol,
			FilterField::Port => &mut self.port,
			FilterField::Endpoint => &mut self.endpoint,
		}
	}
}

/// Database queried when none is given.
pub const DEFAULT_DB: &str = "flow_log";
/// Table queried when none is given.
pub const DEFAULT_TABLE: &str = "service_graph";
/// Granularity used when none is given.
pub const DEFAULT_GRANULARITY: &str = "service";

/// Parameters of one graph query, as supplied by the query form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
	/// Filter values.
	pub filters: GraphFilters,
	/// `service` or an API-level granularity.
	pub granularity: String,
	/// Start of the time range (ISO-8601).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_time: Option<String>,
	/// End of the time range (ISO-8601).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_time: Option<String>,
	/// Database name.
	pub db: String,
	/// Table name.
	pub table: String,
	/// `endpoint` form field, sent only when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
}

impl Default for QueryParams {
	fn default() -> Self {
		Self {
			filters: GraphFilters::default(),
			granularity: DEFAULT_GRANULARITY.into(),
			start_time: None,
			end_time: None,
			db: DEFAULT_DB.into(),
			table: DEFAULT_TABLE.into(),
			endpoint: None,
		}
	}
}

impl QueryParams {
	/// Read query parameters from a page URL. Missing parameters fall back
	/// to defaults; an unparsable `filters` value yields no filters.
	pub fn from_url(url: &Url) -> Self {
		let mut params = QueryParams::default();
		for (key, value) in url.query_pairs() {
			match &*key {
				"filters" => match GraphFilters::from_query_value(&value) {
					Ok(filters) => params.filters = filters,
					Err(e) => log::warn!("ignoring malformed filters parameter: {}", e),
				},
				"granularity" if !value.is_empty() => params.granularity = value.into_owned(),
				"start_time" if !value.is_empty() => params.start_time = Some(value.into_owned()),
				"end_time" if !value.is_empty() => params.end_time = Some(value.into_owned()),
				"endpoint" if !value.is_empty() => params.endpoint = Some(value.into_owned()),
				_ => {}
			}
		}
		params
	}

	/// Flatten into the form fields posted to the backend. Filters travel as a
	/// JSON object in a single field; unset filters are sent as empty strings.
	pub fn form_fields(&self) -> Vec<(&'static str, String)> {
		let filters: BTreeMap<&str, &str> = FilterField::ALL
			.into_iter()
			.map(|f| (f.key(), self.filters.get(f).unwrap_or("")))
			.collect();
		let mut fields = vec![
			(
				"filters",
				serde_json::to_string(&filters).unwrap_or_else(|_| "{}".into()),
			),
			("granularity", self.granularity.clone()),
			("start_time", self.start_time.clone().unwrap_or_default()),
			("end_time", self.end_time.clone().unwrap_or_default()),
			("db", self.db.clone()),
			("table", self.table.clone()),
		];
		if let Some(endpoint) = &self.endpoint {
			fields.push(("endpoint", endpoint.clone()));
		}
		fields
	}
}

/// Decode the JSON object in a `filters` query parameter.
///
/// The query form percent-encodes the JSON itself before the URL encodes it
/// again, so a value that is not JSON as-is gets one more decoding pass.
/// That encoding escapes `&`, `=`, and `+`, so form decoding is exact here.
fn decode_filters_param(value: &str) -> Result<BTreeMap<String, Value>, serde_json::Error> {
	serde_json::from_str(value).or_else(|err| {
		match form_urlencoded::parse(value.as_bytes()).next() {
			Some((decoded, _)) => serde_json::from_str(&decoded),
			None => Err(err),
		}
	})
}

/// Link that re-runs the current page's query with `field` pinned to `value`.
///
/// Existing filters from the page URL are kept; only `field` changes. The
/// result is a plain URL string; following it is up to the caller.
pub fn deep_link(page: &Url, field: FilterField, value: &str) -> String {
	let mut filters = page
		.query_pairs()
		.find(|(k, _)| k == "filters")
		.and_then(|(_, v)| decode_filters_param(&v).ok())
		.unwrap_or_default();
	filters.insert(field.key().to_string(), Value::String(format!("'{}'", value)));
	let encoded = serde_json::to_string(&filters).unwrap_or_else(|_| "{}".into());

	let others: Vec<(String, String)> = page
		.query_pairs()
		.filter(|(k, _)| k != "filters")
		.map(|(k, v)| (k.into_owned(), v.into_owned()))
		.collect();

	let mut link = page.clone();
	link.set_fragment(None);
	{
		let mut query = link.query_pairs_mut();
		query.clear();
		for (k, v) in &others {
			query.append_pair(k, v);
		}
		query.append_pair("filters", &encoded);
	}
	link.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sentinels_become_unset() {
		let filters = GraphFilters::from_raw([
			("cluster", "'__any'"),
			("namespace", "__any"),
			("service", "'checkout'"),
			("protocol", ""),
			("port", "'0'"),
			("endpoint", "0"),
			("colour", "blue"),
		]);
		assert_eq!(
			filters,
			GraphFilters {
				service: Some("'checkout'".into()),
				endpoint: Some("0".into()),
				..Default::default()
			}
		);
	}

	#[test]
	fn parses_filters_json_from_url() {
		let url = Url::parse(
			"http://localhost:3000/?granularity=api&filters=%7B%22service%22%3A%22'cart'%22%2C%22port%22%3A%22'0'%22%7D",
		)
		.unwrap();
		let params = QueryParams::from_url(&url);
		assert_eq!(params.granularity, "api");
		assert_eq!(params.filters.get(FilterField::Service), Some("'cart'"));
		assert_eq!(params.filters.get(FilterField::Port), None);
		assert_eq!(params.db, DEFAULT_DB);
		assert_eq!(params.table, DEFAULT_TABLE);
	}

	#[test]
	fn malformed_filters_fall_back_to_none() {
		let url = Url::parse("http://localhost/?filters=not-json").unwrap();
		let params = QueryParams::from_url(&url);
		assert_eq!(params.filters, GraphFilters::default());
		assert_eq!(params.granularity, DEFAULT_GRANULARITY);
	}

	#[test]
	fn form_fields_send_unset_filters_as_empty() {
		let mut params = QueryParams::default();
		params.filters.set_literal(FilterField::Service, "cart");
		let fields = params.form_fields();
		let filters = &fields.iter().find(|(k, _)| *k == "filters").unwrap().1;
		let decoded: BTreeMap<String, String> = serde_json::from_str(filters).unwrap();
		assert_eq!(decoded["service"], "'cart'");
		assert_eq!(decoded["port"], "");
		assert!(fields.iter().all(|(k, _)| *k != "endpoint"));
	}

	#[test]
	fn deep_link_overrides_one_filter_and_keeps_the_rest() {
		let page = Url::parse(
			"http://localhost:3000/graph?granularity=service&filters=%7B%22cluster%22%3A%22'prod'%22%2C%22service%22%3A%22'old'%22%7D#top",
		)
		.unwrap();
		let link = Url::parse(&deep_link(&page, FilterField::Service, "payments")).unwrap();

		assert_eq!(link.path(), "/graph");
		assert_eq!(link.fragment(), None);
		let pairs: BTreeMap<String, String> = link.query_pairs().into_owned().collect();
		assert_eq!(pairs["granularity"], "service");
		let filters: BTreeMap<String, String> = serde_json::from_str(&pairs["filters"]).unwrap();
		assert_eq!(filters["cluster"], "'prod'");
		assert_eq!(filters["service"], "'payments'");
	}

	// `encodeURIComponent(JSON.stringify(..))` inside `URLSearchParams`.
	const FORM_WRITTEN_PAGE: &str = concat!(
		"http://localhost:3000/?granularity=service&filters=",
		"%257B%2522cluster%2522%253A%2522'prod'%2522%252C",
		"%2522port%2522%253A%2522'0'%2522%252C",
		"%2522service%2522%253A%2522'old'%2522%257D",
	);

	#[test]
	fn reads_filters_written_by_the_query_form() {
		let params = QueryParams::from_url(&Url::parse(FORM_WRITTEN_PAGE).unwrap());
		assert_eq!(params.filters.get(FilterField::Cluster), Some("'prod'"));
		assert_eq!(params.filters.get(FilterField::Service), Some("'old'"));
		assert_eq!(params.filters.get(FilterField::Port), None);
		assert_eq!(params.granularity, "service");
	}

	#[test]
	fn deep_link_keeps_filters_written_by_the_query_form() {
		let page = Url::parse(FORM_WRITTEN_PAGE).unwrap();
		let link = Url::parse(&deep_link(&page, FilterField::Service, "payments")).unwrap();
		let (_, value) = link.query_pairs().find(|(k, _)| k == "filters").unwrap();
		let filters: BTreeMap<String, String> = serde_json::from_str(&value).unwrap();
		assert_eq!(filters["cluster"], "'prod'");
		assert_eq!(filters["service"], "'payments'");
		assert_eq!(filters["port"], "'0'");
	}

	#[test]
	fn deep_link_without_existing_filters() {
		let page = Url::parse("http://localhost:3000/").unwrap();
		let link = Url::parse(&deep_link(&page, FilterField::Endpoint, "/v1/cart")).unwrap();
		let (_, value) = link.query_pairs().find(|(k, _)| k == "filters").unwrap();
		assert_eq!(value, r#"{"endpoint":"'/v1/cart'"}"#);
	}
}
