//! Weather tool
//!
//! Current conditions from OpenWeatherMap. A missing API key answers with
//! a configuration hint instead of an error so the model can relay it.

use super::ToolInput;
use std::time::Duration;

const WEATHER_TIMEOUT_SECS: u64 = 10;

pub struct WeatherTool {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(WEATHER_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    pub async fn invoke(&self, input: &ToolInput) -> String {
        let Some(location) = input.free_text() else {
            return "Weather error: expected a location".to_string();
        };

        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return format!(
                "Weather information for {}: API key not configured. Please set the \
                 OPENWEATHER_API_KEY environment variable.",
                location
            );
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return format!("Weather error: {}", e),
        };

        if !response.status().is_success() {
            return format!("Weather data not available for {}", location);
        }

        let data: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return format!("Weather error: {}", e),
        };

        let temp = data.pointer("/main/temp").and_then(|v| v.as_f64());
        let description = data
            .pointer("/weather/0/description")
            .and_then(|v| v.as_str());
        let humidity = data.pointer("/main/humidity").and_then(|v| v.as_f64());

        match (temp, description, humidity) {
            (Some(temp), Some(description), Some(humidity)) => format!(
                "Weather in {}: {}°C, {}, Humidity: {}%",
                location, temp, description, humidity
            ),
            _ => format!("Weather data not available for {}", location),
        }
    }
}
