//! Google Maps, Google Jobs, YouTube and Walmart results through SerpAPI.
//!
//! Requires `SERP_API_KEY`, either as a context secret or in the environment.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Map, Value};
use tool_core::{
    resolve_secret, InputParameter, Param, Tool, ToolArgs, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, ToolSecretRequirement, Toolkit,
};
use tracing::debug;

use crate::http::{build_client, ensure_success, join_url, json_body};

pub const SERP_API_URL: &str = "https://serpapi.com";
pub const SERP_API_KEY: &str = "SERP_API_KEY";

const DEFAULT_LANGUAGE: &str = "en";
const MAX_WALMART_PAGE: i64 = 100;

pub struct SerpClient {
    http: reqwest::Client,
    base_url: String,
}

impl SerpClient {
    pub fn new() -> Self {
        Self::with_base_url(SERP_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    /// Run one search against `engine`. Parameters are sent as query strings.
    pub async fn search(
        &self,
        context: &ToolContext,
        engine: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ToolError> {
        let api_key = resolve_secret(context, SERP_API_KEY)?;
        let url = join_url(&self.base_url, "search.json");
        debug!("SerpAPI {} search", engine);

        let response = self
            .http
            .get(&url)
            .query(&[("engine", engine), ("api_key", api_key.as_str())])
            .query(params)
            .send()
            .await?;
        let results = json_body(ensure_success(response, "SerpAPI").await?).await?;

        match results["error"].as_str() {
            // SerpAPI reports an empty result page as an error.
            Some(message) if message.contains("hasn't returned any results") => Ok(json!({})),
            Some(message) => Err(ToolError::execution(format!("SerpAPI error: {}", message))),
            None => Ok(results),
        }
    }
}

impl Default for SerpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn serp_requirements() -> ToolRequirements {
    ToolRequirements {
        authorization: None,
        secrets: vec![ToolSecretRequirement {
            key: SERP_API_KEY.to_string(),
        }],
    }
}

/// ISO 639-1 code with an optional region, e.g. `en` or `pt-br`.
pub fn check_language(raw: &str) -> Result<String, ToolError> {
    let language = raw.trim().to_lowercase();
    let (base, region) = match language.split_once('-') {
        Some((base, region)) => (base, Some(region)),
        None => (language.as_str(), None),
    };
    let letters = |s: &str, range: std::ops::RangeInclusive<usize>| {
        range.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_lowercase())
    };
    let valid = letters(base, 2..=3) && region.map_or(true, |r| letters(r, 2..=4));
    if !valid {
        return Err(ToolError::retryable(format!("Invalid language: {}", raw))
            .with_additional_prompt_content(
                "Languages are two-letter ISO 639-1 codes, optionally with a region, \
                 such as 'en', 'es' or 'pt-br'.",
            ));
    }
    Ok(language)
}

/// Two-letter ISO 3166-1 country code.
pub fn check_country(raw: &str) -> Result<String, ToolError> {
    let country = raw.trim().to_lowercase();
    if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(ToolError::retryable(format!("Invalid country: {}", raw))
            .with_additional_prompt_content(
                "Countries are two-letter ISO 3166-1 codes such as 'us', 'gb' or 'br'.",
            ));
    }
    Ok(country)
}

fn locale_params(args: &ToolArgs) -> Result<Vec<(&'static str, String)>, ToolError> {
    let language = args
        .get_string_opt("language")
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let mut params = vec![("hl", check_language(&language)?)];
    if let Some(country) = args.get_string_opt("country").filter(|c| !c.trim().is_empty()) {
        params.push(("gl", check_country(&country)?));
    }
    Ok(params)
}

fn language_param(engine: &str) -> InputParameter {
    Param::of::<String>(
        "language",
        format!("2-letter language code to use in the {} search. Defaults to 'en'.", engine),
    )
    .with_default()
}

fn country_param(engine: &str) -> InputParameter {
    Param::of::<Option<String>>(
        "country",
        format!("2-letter country code to use in the {} search.", engine),
    )
}

fn next_page_token(results: &Value) -> Value {
    results["serpapi_pagination"]["next_page_token"].clone()
}

// Google Maps

pub const TRAVEL_MODES: [(&str, u8); 7] = [
    ("best", 6),
    ("driving", 0),
    ("two_wheel", 9),
    ("transit", 3),
    ("walking", 2),
    ("cycling", 1),
    ("flight", 4),
];

pub const DISTANCE_UNITS: [(&str, u8); 2] = [("km", 0), ("mi", 1)];

fn lookup(table: &[(&str, u8)], name: &str, param: &str) -> Result<u8, ToolError> {
    table
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, code)| *code)
        .ok_or_else(|| ToolError::invalid_parameter(param, format!("unknown value '{}'", name)))
}

/// Turn `arrive_around` epoch seconds into `{datetime, timestamp}`.
pub fn enrich_directions(mut results: Value) -> Value {
    if let Some(directions) = results["directions"].as_array_mut() {
        for direction in directions {
            if let Some(timestamp) = direction["arrive_around"].as_i64() {
                let datetime = DateTime::from_timestamp(timestamp, 0)
                    .map(|dt| Value::String(dt.to_rfc3339()))
                    .unwrap_or(Value::Null);
                direction["arrive_around"] = json!({"datetime": datetime, "timestamp": timestamp});
            }
        }
    }
    results
}

fn routing_params() -> Vec<InputParameter> {
    vec![
        language_param("Google Maps"),
        country_param("Google Maps"),
        Param::of::<String>("distance_unit", "Distance unit. Defaults to 'km' (kilometers).")
            .one_of(DISTANCE_UNITS.iter().map(|(name, _)| *name))
            .with_default(),
        Param::of::<String>("travel_mode", "Travel mode. Defaults to 'best'.")
            .one_of(TRAVEL_MODES.iter().map(|(name, _)| *name))
            .with_default(),
    ]
}

async fn directions(
    client: &SerpClient,
    context: &ToolContext,
    args: &ToolArgs,
    endpoints: [(&'static str, String); 2],
) -> Result<Value, ToolError> {
    let distance_unit = args
        .get_string_opt("distance_unit")
        .unwrap_or_else(|| "km".to_string());
    let travel_mode = args
        .get_string_opt("travel_mode")
        .unwrap_or_else(|| "best".to_string());

    let mut params = locale_params(args)?;
    params.extend(endpoints);
    params.push((
        "distance_unit",
        lookup(&DISTANCE_UNITS, &distance_unit, "distance_unit")?.to_string(),
    ));
    params.push((
        "travel_mode",
        lookup(&TRAVEL_MODES, &travel_mode, "travel_mode")?.to_string(),
    ));

    let results = client
        .search(context, "google_maps_directions", &params)
        .await?;
    Ok(enrich_directions(results))
}

pub struct GetDirectionsByAddress {
    client: Arc<SerpClient>,
}

#[async_trait]
impl Tool for GetDirectionsByAddress {
    fn name(&self) -> &str {
        "GetDirectionsByAddress"
    }

    fn description(&self) -> &str {
        "Get directions between two addresses from Google Maps."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        let mut params = vec![
            Param::of::<String>("origin_address", "The origin address"),
            Param::of::<String>("destination_address", "The destination address"),
        ];
        params.extend(routing_params());
        params
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Directions from Google Maps")
    }

    fn requirements(&self) -> ToolRequirements {
        serp_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let endpoints = [
            ("start_addr", args.get_string("origin_address")?),
            ("end_addr", args.get_string("destination_address")?),
        ];
        directions(&self.client, context, &args, endpoints).await
    }
}

pub struct GetDirectionsByCoordinates {
    client: Arc<SerpClient>,
}

fn coordinate(args: &ToolArgs, key: &str, limit: f64) -> Result<f64, ToolError> {
    let value = args.get_f64(key)?;
    if !(-limit..=limit).contains(&value) {
        return Err(ToolError::invalid_parameter(
            key,
            format!("must be between -{} and {}", limit, limit),
        ));
    }
    Ok(value)
}

#[async_trait]
impl Tool for GetDirectionsByCoordinates {
    fn name(&self) -> &str {
        "GetDirectionsByCoordinates"
    }

    fn description(&self) -> &str {
        "Get directions between two latitude/longitude points from Google Maps."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        let mut params = vec![
            Param::of::<f64>("origin_latitude", "The origin latitude"),
            Param::of::<f64>("origin_longitude", "The origin longitude"),
            Param::of::<f64>("destination_latitude", "The destination latitude"),
            Param::of::<f64>("destination_longitude", "The destination longitude"),
        ];
        params.extend(routing_params());
        params
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Directions from Google Maps")
    }

    fn requirements(&self) -> ToolRequirements {
        serp_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let start = format!(
            "{},{}",
            coordinate(&args, "origin_latitude", 90.0)?,
            coordinate(&args, "origin_longitude", 180.0)?
        );
        let end = format!(
            "{},{}",
            coordinate(&args, "destination_latitude", 90.0)?,
            coordinate(&args, "destination_longitude", 180.0)?
        );
        directions(
            &self.client,
            context,
            &args,
            [("start_coords", start), ("end_coords", end)],
        )
        .await
    }
}

// Google Jobs

pub struct SearchJobs {
    client: Arc<SerpClient>,
}

#[async_trait]
impl Tool for SearchJobs {
    fn name(&self) -> &str {
        "SearchJobs"
    }

    fn description(&self) -> &str {
        "Search Google Jobs."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("query", "Search query, e.g. 'rust developer'"),
            Param::of::<Option<String>>(
                "location",
                "Simulates a user searching for jobs in this specific location",
            ),
            language_param("Google Jobs"),
            Param::of::<i64>("limit", "Number of results to retrieve").with_default(),
            Param::of::<Option<String>>("next_page_token", "Next page token to paginate results"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Google Jobs results")
    }

    fn requirements(&self) -> ToolRequirements {
        serp_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let limit = args.get_i64_or("limit", 10)?.max(0) as usize;
        let mut params = vec![("q", args.get_string("query")?)];
        params.extend(locale_params(&args)?);
        for key in ["location", "next_page_token"] {
            if let Some(value) = args.get_string_opt(key) {
                params.push((key, value));
            }
        }

        let results = self.client.search(context, "google_jobs", &params).await?;
        let jobs: Vec<Value> = results["jobs_results"]
            .as_array()
            .map(|jobs| jobs.iter().take(limit).cloned().collect())
            .unwrap_or_default();

        Ok(json!({
            "jobs": jobs,
            "next_page_token": next_page_token(&results),
        }))
    }
}

// YouTube

/// The `v` query value of a watch URL.
fn video_id(link: &str) -> Option<String> {
    let url = url::Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
}

fn video_summary(video: &Value) -> Value {
    let link = video["link"].as_str().unwrap_or_default();
    json!({
        "id": video_id(link),
        "title": video.get("title"),
        "description": video.get("description"),
        "link": video.get("link"),
        "published_date": video.get("published_date"),
        "duration": video.get("length"),
        "views": video.get("views"),
        "channel": {
            "name": video["channel"].get("name"),
            "link": video["channel"].get("link"),
        },
    })
}

pub struct SearchYoutubeVideos {
    client: Arc<SerpClient>,
}

#[async_trait]
impl Tool for SearchYoutubeVideos {
    fn name(&self) -> &str {
        "SearchYoutubeVideos"
    }

    fn description(&self) -> &str {
        "Search for YouTube videos related to a query."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("keywords", "The keywords to search for, e.g. 'rust async'"),
            language_param("YouTube"),
            country_param("YouTube"),
            Param::of::<Option<String>>("next_page_token", "Next page token to paginate results"),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("YouTube videos related to the query")
    }

    fn requirements(&self) -> ToolRequirements {
        serp_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut params = vec![("search_query", args.get_string("keywords")?)];
        params.extend(locale_params(&args)?);
        if let Some(token) = args.get_string_opt("next_page_token") {
            params.push(("sp", token));
        }

        let results = self.client.search(context, "youtube", &params).await?;
        let videos: Vec<Value> = results["video_results"]
            .as_array()
            .map(|videos| videos.iter().map(video_summary).collect())
            .unwrap_or_default();

        Ok(json!({
            "videos": videos,
            "next_page_token": next_page_token(&results),
        }))
    }
}

// Walmart

/// Sort options and their SerpAPI values. Relevance sends no `sort`.
pub const WALMART_SORTS: [(&str, Option<&str>); 5] = [
    ("relevance", None),
    ("price_low_to_high", Some("price_low")),
    ("price_high_to_low", Some("price_high")),
    ("best_seller", Some("best_seller")),
    ("rating_high", Some("rating_high")),
];

fn walmart_product(item: &Value) -> Value {
    let offer = &item["primary_offer"];
    json!({
        "item_id": item.get("us_item_id"),
        "title": item.get("title"),
        "description": item.get("description"),
        "rating": item.get("rating"),
        "reviews_count": item.get("reviews"),
        "seller": {"id": item.get("seller_id"), "name": item.get("seller_name")},
        "price": {
            "value": offer.get("offer_price"),
            "currency": offer.get("currency"),
        },
        "link": item.get("product_page_url"),
        "thumbnail": item.get("thumbnail"),
    })
}

/// Highest page number SerpAPI offers, or the current page when none is listed.
fn walmart_total_pages(results: &Value, current: i64) -> i64 {
    results["serpapi_pagination"]["other_pages"]
        .as_object()
        .map(|pages| {
            pages
                .keys()
                .filter_map(|page| page.parse::<i64>().ok())
                .fold(current, i64::max)
        })
        .unwrap_or(current)
}

pub struct SearchWalmartProducts {
    client: Arc<SerpClient>,
}

#[async_trait]
impl Tool for SearchWalmartProducts {
    fn name(&self) -> &str {
        "SearchWalmartProducts"
    }

    fn description(&self) -> &str {
        "Search Walmart products."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>(
                "keywords",
                "Keywords to search for, e.g. 'apple iphone' or 'samsung galaxy'",
            ),
            Param::of::<String>("sort_by", "Sort order. Defaults to 'relevance'.")
                .one_of(WALMART_SORTS.iter().map(|(name, _)| *name))
                .with_default(),
            Param::of::<Option<f64>>("min_price", "Minimum price, e.g. 100.00"),
            Param::of::<Option<f64>>("max_price", "Maximum price, e.g. 100.00"),
            Param::of::<bool>(
                "next_day_delivery",
                "Only products eligible for next day delivery",
            )
            .with_default(),
            Param::of::<i64>("page", "Page number to fetch (1-100). Defaults to 1.")
                .with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("Walmart products matching the query")
    }

    fn requirements(&self) -> ToolRequirements {
        serp_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let page = args.get_i64_or("page", 1)?;
        if page > MAX_WALMART_PAGE {
            return Err(ToolError::execution(format!(
                "The maximum page value for Walmart search is 100, got {}.",
                page
            )));
        }
        if page < 1 {
            return Err(ToolError::invalid_parameter("page", "must be at least 1"));
        }

        let sort_by = args
            .get_string_opt("sort_by")
            .unwrap_or_else(|| "relevance".to_string());
        let sort = WALMART_SORTS
            .iter()
            .find(|(name, _)| *name == sort_by)
            .map(|(_, value)| *value)
            .ok_or_else(|| ToolError::invalid_parameter("sort_by", "unknown sort order"))?;

        let mut params = vec![
            ("query", args.get_string("keywords")?),
            ("soft_sort", sort.is_none().to_string()),
            ("nd_en", args.get_bool_or("next_day_delivery", false).to_string()),
            ("page", page.to_string()),
            ("include_filters", "false".to_string()),
        ];
        if let Some(sort) = sort {
            params.push(("sort", sort.to_string()));
        }
        if let Some(min) = args.get_opt::<f64>("min_price")? {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = args.get_opt::<f64>("max_price")? {
            params.push(("max_price", max.to_string()));
        }

        let results = self.client.search(context, "walmart", &params).await?;
        let products: Vec<Value> = results["organic_results"]
            .as_array()
            .map(|items| items.iter().map(walmart_product).collect())
            .unwrap_or_default();

        Ok(json!({
            "products": products,
            "current_page": page,
            "total_pages": walmart_total_pages(&results, page),
        }))
    }
}

/// Add the SerpAPI tools to `toolkit`.
pub fn register(toolkit: Toolkit, client: SerpClient) -> Toolkit {
    let client = Arc::new(client);
    toolkit
        .tool(GetDirectionsByAddress {
            client: Arc::clone(&client),
        })
        .tool(GetDirectionsByCoordinates {
            client: Arc::clone(&client),
        })
        .tool(SearchJobs {
            client: Arc::clone(&client),
        })
        .tool(SearchYoutubeVideos {
            client: Arc::clone(&client),
        })
        .tool(SearchWalmartProducts { client })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_and_country_checks() {
        assert_eq!(check_language("EN").unwrap(), "en");
        assert_eq!(check_language("pt-BR").unwrap(), "pt-br");
        let err = check_language("english").unwrap_err();
        assert!(err.can_retry());
        assert_eq!(err.to_string(), "Invalid language: english");

        assert_eq!(check_country("US").unwrap(), "us");
        assert_eq!(
            check_country("usa").unwrap_err().to_string(),
            "Invalid country: usa"
        );
    }

    #[test]
    fn test_enrich_directions() {
        let results = enrich_directions(json!({
            "directions": [{"arrive_around": 1735732800}, {"duration": 60}]
        }));
        assert_eq!(
            results["directions"][0]["arrive_around"],
            json!({"datetime": "2025-01-01T12:00:00+00:00", "timestamp": 1735732800})
        );
        assert_eq!(results["directions"][1], json!({"duration": 60}));
    }

    #[test]
    fn test_walmart_total_pages() {
        let results = json!({"serpapi_pagination": {"other_pages": {"2": "u", "3": "u", "7": "u"}}});
        assert_eq!(walmart_total_pages(&results, 1), 7);
        assert_eq!(walmart_total_pages(&json!({}), 4), 4);
    }

    #[test]
    fn test_video_id() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(video_id("not a link"), None);
    }
}
