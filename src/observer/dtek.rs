//! Observer for the DTEK shutdowns page.
//!
//! Outage data comes straight from the site's ajax endpoint, the snapshot
//! image from a headless Chromium run over the public page. Both run
//! concurrently and the whole fetch is bounded by one timeout, so the core
//! sees a single blocking call.

use std::{collections::HashMap, path::PathBuf, process::Stdio, sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use url::Url;

use super::{Observation, Observer, ObserverError};
use crate::models::OutageRecord;

/// Per-address outage details in the ajax payload.
#[derive(Debug, Deserialize)]
struct OutageStatsDto {
    start_date: String,
    end_date: String,
    sub_type: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Top-level ajax payload.
#[derive(Debug, Deserialize)]
struct AjaxResponseDto {
    #[serde(rename = "updateTimestamp")]
    update_timestamp: String,
    #[serde(rename = "showCurOutageParam", default)]
    show_cur_outage: bool,
    #[serde(default)]
    data: HashMap<String, OutageStatsDto>,
}

/// Fetches outage state and a snapshot image for one street/house address.
pub struct DtekObserver {
    http: Arc<ClientWithMiddleware>,
    shutdowns_url: Url,
    ajax_url: Url,
    street: String,
    house: String,
    snapshot_path: PathBuf,
    browser_binary: String,
    fetch_timeout: Duration,
    source_time_format: String,
    source_time_zone: Tz,
}

impl DtekObserver {
    /// Creates an observer. `source_time_format` and `source_time_zone`
    /// describe how the site renders its wall-clock timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: Arc<ClientWithMiddleware>,
        shutdowns_url: Url,
        ajax_url: Url,
        street: impl Into<String>,
        house: impl Into<String>,
        snapshot_path: PathBuf,
        browser_binary: impl Into<String>,
        fetch_timeout: Duration,
        source_time_format: impl Into<String>,
        source_time_zone: Tz,
    ) -> Self {
        Self {
            http,
            shutdowns_url,
            ajax_url,
            street: street.into(),
            house: house.into(),
            snapshot_path,
            browser_binary: browser_binary.into(),
            fetch_timeout,
            source_time_format: source_time_format.into(),
            source_time_zone,
        }
    }

    /// Parses a source wall-clock string into a UTC instant.
    fn parse_timestamp(&self, value: &str) -> Result<DateTime<Utc>, ObserverError> {
        let naive = NaiveDateTime::parse_from_str(value, &self.source_time_format).map_err(
            |e| ObserverError::InvalidTimestamp { value: value.to_string(), reason: e.to_string() },
        )?;
        naive
            .and_local_timezone(self.source_time_zone)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| ObserverError::InvalidTimestamp {
                value: value.to_string(),
                reason: format!(
                    "ambiguous or nonexistent local time in {}",
                    self.source_time_zone
                ),
            })
    }

    /// Normalizes the ajax payload into an [`OutageRecord`].
    fn normalize(&self, dto: AjaxResponseDto) -> Result<OutageRecord, ObserverError> {
        let updated_at = self.parse_timestamp(&dto.update_timestamp)?;

        let mut record = OutageRecord {
            active: dto.show_cur_outage,
            text: String::new(),
            start_time: updated_at,
            end_time: updated_at,
            updated_at,
            kind: String::new(),
        };

        if record.active {
            match dto.data.get(&self.house) {
                Some(stats) => {
                    record.start_time = self.parse_timestamp(&stats.start_date)?;
                    record.end_time = self.parse_timestamp(&stats.end_date)?;
                    record.text = stats.sub_type.clone();
                    record.kind = stats.kind.clone();
                }
                None => {
                    tracing::warn!(house = %self.house, "House not present in source data.");
                }
            }
        }

        Ok(record)
    }

    /// Requests the current outage data from the ajax endpoint.
    async fn fetch_record(&self) -> Result<OutageRecord, ObserverError> {
        let form = [
            ("method", "getHomeNum"),
            ("data[0][name]", "street"),
            ("data[0][value]", self.street.as_str()),
            ("data[1][name]", "house_num"),
            ("data[1][value]", self.house.as_str()),
        ];

        let response = self
            .http
            .post(self.ajax_url.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", self.shutdowns_url.as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ObserverError::Status(status.as_u16()));
        }

        let dto: AjaxResponseDto = response.json().await?;
        self.normalize(dto)
    }

    /// Renders the snapshot image by screenshotting the shutdowns page with a
    /// headless browser.
    async fn capture_snapshot(&self) -> Result<(), ObserverError> {
        let screenshot_arg = format!("--screenshot={}", self.snapshot_path.display());

        let output = tokio::process::Command::new(&self.browser_binary)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--window-size=1280,1600")
            .arg(&screenshot_arg)
            .arg(self.shutdowns_url.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ObserverError::Snapshot(format!(
                "{} exited with {}: {}",
                self.browser_binary,
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(path = %self.snapshot_path.display(), "Snapshot rendered.");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Observer for DtekObserver {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch(&self) -> Result<Observation, ObserverError> {
        let fetch = async {
            let (record, ()) = tokio::try_join!(self.fetch_record(), self.capture_snapshot())?;
            Ok::<_, ObserverError>(record)
        };

        let record = tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| ObserverError::Timeout)??;

        Ok(Observation { record: Some(record), snapshot_path: self.snapshot_path.clone() })
    }
}
