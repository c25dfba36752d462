//! Hevy API client
//!
//! Pulls workout events page by page and saves them, stripped of null
//! values, in the same event-file shape the importer reads.

use chrono::{Duration, SecondsFormat, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ApiSettings;
use crate::error::{ExportError, FetchError, Result};
use crate::export::write_file;

/// Environment variable holding the API credential
pub const API_KEY_VAR: &str = "HEVY_API_KEY";

/// The events endpoint refuses larger pages
const MAX_PAGE_SIZE: u32 = 10;

/// One page of the workout events feed
#[derive(Debug, Deserialize)]
pub struct EventPage {
    #[serde(default = "first_page")]
    pub page_count: u32,
    #[serde(default)]
    pub events: Vec<Value>,
}

fn first_page() -> u32 {
    1
}

pub struct HevyClient {
    client: Client,
    api_key: String,
    settings: ApiSettings,
}

impl HevyClient {
    pub fn new(api_key: impl Into<String>, settings: ApiSettings) -> std::result::Result<Self, FetchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            settings,
        })
    }

    /// Build a client from `HEVY_API_KEY`
    pub fn from_env(settings: ApiSettings) -> std::result::Result<Self, FetchError> {
        let api_key = env::var(API_KEY_VAR).map_err(|_| FetchError::MissingApiKey)?;
        Self::new(api_key, settings)
    }

    fn events_url(&self) -> String {
        format!(
            "{}/v1/workouts/events",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Fetch a single page of events changed since `since` (RFC3339)
    pub async fn events_page(&self, page: u32, since: &str) -> std::result::Result<EventPage, FetchError> {
        let page_size = self.settings.page_size.clamp(1, MAX_PAGE_SIZE);

        let response = self
            .client
            .get(self.events_url())
            .header("api-key", &self.api_key)
            .query(&[
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
                ("since", since.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<EventPage>().await?)
    }

    /// Fetch every event from the last `days` days
    pub async fn fetch_recent_events(&self, days: u32) -> std::result::Result<Vec<Value>, FetchError> {
        let since = (Utc::now() - Duration::days(i64::from(days)))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));

        let mut events = Vec::new();
        let mut page = 1;
        loop {
            spinner.set_message(format!("Fetching page {} ({} events so far)", page, events.len()));
            let batch = match self.events_page(page, &since).await {
                Ok(batch) => batch,
                Err(e) => {
                    spinner.abandon_with_message("Fetch failed");
                    return Err(e);
                }
            };

            if batch.events.is_empty() {
                break;
            }

            debug!(page, page_count = batch.page_count, events = batch.events.len(), "Fetched page");
            events.extend(batch.events);

            if page >= batch.page_count {
                break;
            }
            page += 1;
        }

        spinner.finish_with_message(format!("Fetched {} events", events.len()));
        info!(events = events.len(), days, "Fetched workout events");
        Ok(events)
    }
}

/// Recursively drop null values, then any object or array left empty
pub fn clean_null_values(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(key, value)| prune(value).map(|value| (key, value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().filter_map(prune).collect()),
        other => other,
    }
}

fn prune(value: Value) -> Option<Value> {
    if value.is_null() {
        return None;
    }

    match clean_null_values(value) {
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        cleaned => Some(cleaned),
    }
}

/// Save fetched events as a cleaned, pretty-printed JSON array
pub fn save_events(events: Vec<Value>, path: &Path) -> Result<usize> {
    let count = events.len();
    let cleaned = clean_null_values(Value::Array(events));
    let json = serde_json::to_string_pretty(&cleaned)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;

    write_file(path, json.as_bytes())?;
    info!(path = %path.display(), events = count, "Saved workout events");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_clean_null_values_nested() {
        let raw = json!({
            "type": "updated",
            "deleted_at": null,
            "workout": {
                "title": "Day 1 - Upper (Push)",
                "description": null,
                "exercises": [
                    {"title": "Bench Press (Barbell)", "notes": null, "sets": [
                        {"weight_kg": 60.0, "rpe": null, "distance_meters": null}
                    ]},
                    {"superset_id": null}
                ],
                "meta": {"a": null, "b": []}
            }
        });

        let cleaned = clean_null_values(raw);
        assert_eq!(
            cleaned,
            json!({
                "type": "updated",
                "workout": {
                    "title": "Day 1 - Upper (Push)",
                    "exercises": [
                        {"title": "Bench Press (Barbell)", "sets": [{"weight_kg": 60.0}]}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_clean_keeps_falsy_scalars() {
        let cleaned = clean_null_values(json!({"reps": 0, "done": false, "note": ""}));
        assert_eq!(cleaned, json!({"reps": 0, "done": false, "note": ""}));
    }

    #[test]
    fn test_event_page_defaults() {
        let page: EventPage = serde_json::from_str("{}").unwrap();
        assert_eq!(page.page_count, 1);
        assert!(page.events.is_empty());

        let page: EventPage =
            serde_json::from_str(r#"{"page": 1, "page_count": 3, "events": [{"type": "deleted"}]}"#)
                .unwrap();
        assert_eq!(page.page_count, 3);
        assert_eq!(page.events.len(), 1);
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            HevyClient::new("  ", ApiSettings::default()),
            Err(FetchError::MissingApiKey)
        ));
    }

    #[test]
    fn test_events_url_trims_trailing_slash() {
        let settings = ApiSettings {
            base_url: "https://api.example.test/".to_string(),
            ..ApiSettings::default()
        };
        let client = HevyClient::new("key", settings).unwrap();
        assert_eq!(client.events_url(), "https://api.example.test/v1/workouts/events");
    }

    #[test]
    fn test_save_events_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hevy_events.json");

        let count = save_events(vec![json!({"type": "updated", "id": null})], &path).unwrap();
        assert_eq!(count, 1);

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, json!([{"type": "updated"}]));
    }
}
