//! Open-Meteo forecast client.
//!
//! Fetches current conditions plus one day of daily aggregates for a
//! coordinate pair. The client is infallible from the caller's point of
//! view: transport failures render every field as `"Unavailable"`, a
//! malformed payload renders every field as `"Error"`, and individually
//! missing values become `"N/A"`. The snapshot only ever feeds prompt text,
//! so placeholders beat errors.

use serde::Deserialize;

/// Default Open-Meteo endpoint.
const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

/// Current and daily weather for one request, pre-rendered for prompt use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSnapshot {
    /// Current temperature in °C.
    pub temperature: String,
    /// Human label for the current weather code.
    pub condition: String,
    /// Precipitation sum for today in mm.
    pub rain_today_mm: String,
    /// Today's maximum temperature in °C.
    pub temp_max: String,
    /// Today's minimum temperature in °C.
    pub temp_min: String,
}

impl WeatherSnapshot {
    /// Snapshot used when the provider could not be reached.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::uniform("Unavailable")
    }

    /// Snapshot used when the provider payload could not be processed.
    #[must_use]
    pub fn error() -> Self {
        Self::uniform("Error")
    }

    fn uniform(value: &str) -> Self {
        Self {
            temperature: value.to_string(),
            condition: value.to_string(),
            rain_today_mm: value.to_string(),
            temp_max: value.to_string(),
            temp_min: value.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
    daily: Option<DailyAggregates>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
    weathercode: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyAggregates {
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

/// Client for the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    /// Create a client against the public Open-Meteo endpoint.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint.
    #[must_use]
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch current weather and today's aggregates for the coordinates.
    ///
    /// Never fails; every failure class degrades into placeholder text.
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> WeatherSnapshot {
        let url = format!("{}/v1/forecast", self.base_url.trim_end_matches('/'));

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
                ),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "weather request failed");
                return WeatherSnapshot::unavailable();
            }
        };

        match resp.json::<ForecastResponse>().await {
            Ok(forecast) => snapshot_from_forecast(&forecast),
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "weather payload malformed");
                WeatherSnapshot::error()
            }
        }
    }
}

/// Map a provider weather code to a human label.
#[must_use]
pub fn condition_label(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Light rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Light snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        80 => "Light showers",
        81 => "Moderate showers",
        82 => "Heavy showers",
        95 => "Thunderstorms",
        96 => "Thunderstorms with hail",
        _ => "Unknown",
    }
}

/// Render an optional numeric field, normalizing missing values to `"N/A"`.
fn render_field(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn snapshot_from_forecast(forecast: &ForecastResponse) -> WeatherSnapshot {
    let current = forecast.current_weather.as_ref();
    let daily = forecast.daily.as_ref();

    let first = |values: Option<&Vec<Option<f64>>>| values.and_then(|v| v.first().copied()).flatten();

    WeatherSnapshot {
        temperature: render_field(current.and_then(|c| c.temperature)),
        condition: current
            .and_then(|c| c.weathercode)
            .map_or("Unknown", condition_label)
            .to_string(),
        rain_today_mm: render_field(first(daily.map(|d| &d.precipitation_sum))),
        temp_max: render_field(first(daily.map(|d| &d.temperature_2m_max))),
        temp_min: render_field(first(daily.map(|d| &d.temperature_2m_min))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_labels() {
        assert_eq!(condition_label(0), "Clear sky");
        assert_eq!(condition_label(96), "Thunderstorms with hail");
    }

    #[test]
    fn unknown_code_maps_to_unknown() {
        assert_eq!(condition_label(999), "Unknown");
        assert_eq!(condition_label(-1), "Unknown");
    }

    #[test]
    fn full_payload_renders_all_fields() {
        let raw = r#"{
            "current_weather": {"temperature": 27.3, "weathercode": 2},
            "daily": {
                "precipitation_sum": [1.5],
                "temperature_2m_max": [31.0],
                "temperature_2m_min": [22.4]
            }
        }"#;
        let forecast: ForecastResponse = serde_json::from_str(raw).unwrap();
        let snapshot = snapshot_from_forecast(&forecast);

        assert_eq!(snapshot.temperature, "27.3");
        assert_eq!(snapshot.condition, "Partly cloudy");
        assert_eq!(snapshot.rain_today_mm, "1.5");
        assert_eq!(snapshot.temp_max, "31");
        assert_eq!(snapshot.temp_min, "22.4");
    }

    #[test]
    fn missing_fields_normalize_independently() {
        let raw = r#"{
            "current_weather": {"temperature": null, "weathercode": 0},
            "daily": {"precipitation_sum": [null], "temperature_2m_max": [], "temperature_2m_min": [30.1]}
        }"#;
        let forecast: ForecastResponse = serde_json::from_str(raw).unwrap();
        let snapshot = snapshot_from_forecast(&forecast);

        assert_eq!(snapshot.temperature, "N/A");
        assert_eq!(snapshot.condition, "Clear sky");
        assert_eq!(snapshot.rain_today_mm, "N/A");
        assert_eq!(snapshot.temp_max, "N/A");
        assert_eq!(snapshot.temp_min, "30.1");
    }

    #[test]
    fn empty_payload_is_all_placeholders() {
        let forecast: ForecastResponse = serde_json::from_str("{}").unwrap();
        let snapshot = snapshot_from_forecast(&forecast);

        assert_eq!(snapshot.temperature, "N/A");
        assert_eq!(snapshot.condition, "Unknown");
        assert_eq!(snapshot.rain_today_mm, "N/A");
    }

    #[tokio::test]
    async fn unreachable_provider_degrades_to_unavailable() {
        let client = WeatherClient::with_base_url(reqwest::Client::new(), "http://127.0.0.1:1");
        let snapshot = client.fetch(17.6868, 83.2185).await;
        assert_eq!(snapshot, WeatherSnapshot::unavailable());
    }
}
