//! Weather tool — current conditions from Open-Meteo.
//!
//! Two requests: the geocoding API turns the city into coordinates, then
//! the forecast API returns `current_weather` for them.

use crate::http;
use async_trait::async_trait;
use parley_config::ToolsConfig;
use parley_core::error::ToolError;
use parley_core::tool::{ArgType, ArgumentSchema, Tool};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct WeatherTool {
    geocoding_url: String,
    forecast_url: String,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            geocoding_url: geocoding_url.into().trim_end_matches('/').to_string(),
            forecast_url: forecast_url.into().trim_end_matches('/').to_string(),
            client: http::client("get_weather", timeout_secs)?,
        })
    }

    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        Self::new(&config.geocoding_url, &config.forecast_url, config.timeout_secs)
    }

    async fn lookup(&self, city: &str) -> Result<serde_json::Value, String> {
        let geo = http::get_json(
            &self.client,
            &format!("{}/v1/search", self.geocoding_url),
            &[("name", city), ("count", "1")],
        )
        .await?;

        let geo: GeocodingResponse =
            serde_json::from_value(geo).map_err(|e| format!("unexpected geocoding response: {e}"))?;
        let Some(place) = geo.results.into_iter().next() else {
            return Ok(http::error_payload(format!(
                "Could not find location for '{city}'"
            )));
        };
        debug!(city = %city, latitude = place.latitude, longitude = place.longitude, "Geocoded city");

        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();
        let forecast = http::get_json(
            &self.client,
            &format!("{}/v1/forecast", self.forecast_url),
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current_weather", "true"),
            ],
        )
        .await?;

        let forecast: ForecastResponse = serde_json::from_value(forecast)
            .map_err(|e| format!("unexpected forecast response: {e}"))?;
        let Some(current) = forecast.current_weather else {
            return Ok(http::error_payload(format!(
                "Weather data not available for '{city}'"
            )));
        };

        let report = WeatherReport {
            city: city.to_string(),
            latitude: place.latitude,
            longitude: place.longitude,
            temperature_c: current.temperature,
            windspeed_kmh: current.windspeed,
            weather_code: current.weathercode,
            description: describe(current.weathercode).to_string(),
        };
        serde_json::to_value(report).map_err(|e| e.to_string())
    }
}

/// Human description for a WMO weather code.
pub fn describe(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        61 => "Light rain",
        71 => "Light snow",
        80 => "Rain showers",
        _ => "Unknown conditions",
    }
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Deserialize)]
struct Place {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i64,
}

#[derive(Serialize)]
struct WeatherReport {
    city: String,
    latitude: f64,
    longitude: f64,
    temperature_c: f64,
    windspeed_kmh: f64,
    weather_code: i64,
    description: String,
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Fetch current weather for a given city using Open-Meteo. Returns city, coordinates, temperature, windspeed, weather code and description."
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new().required("city", ArgType::String, "The city to look up")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))?;

        match self.lookup(city).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(city = %city, error = %e, "Weather lookup failed");
                Ok(http::error_payload(e))
            }
        }
    }
}
