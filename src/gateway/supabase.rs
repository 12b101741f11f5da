//! REST client for the hosted relational store.
//!
//! Tables: `novos_leads` (read-only lead projection), `leads_consultores`
//! (count-only proxy), `system_logs` (insert + bulk select),
//! `company_settings` (select by username + upsert).

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::GatewayError;
use crate::types::{AccessLogEntry, CompanySettings, Config, DateFilter, Lead};

/// Most-recent-first window fetched from `system_logs`.
pub const LOG_WINDOW: usize = 500;

/// A `system_logs` insert. `created_at` is set client-side so the row
/// carries the event time, not the arrival time.
#[derive(Debug, Clone, Serialize)]
pub struct LogInsert {
    pub username: String,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct SupabaseClient {
    http: reqwest::Client,
    base: Url,
    key: String,
}

impl SupabaseClient {
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        if config.supabase_url.is_empty() || config.supabase_key.is_empty() {
            return Err(GatewayError::Configuration(
                "supabaseUrl and supabaseKey must be set in ~/.automatize/config.json".to_string(),
            ));
        }
        let base = Url::parse(&config.supabase_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            key: config.supabase_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Configuration("Supabase URL cannot be a base".to_string()))?
            .extend(["rest", "v1", table]);
        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        let resp = self.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// All `novos_leads` rows, newest first, optionally bounded to a
    /// local-time calendar range converted to store instants.
    pub async fn fetch_leads(&self, range: Option<&DateFilter>) -> Result<Vec<Lead>, GatewayError> {
        let mut bounds: Vec<(String, String)> = Vec::new();
        if let Some(range) = range {
            if !range.start.is_empty() {
                let start = local_day_start_utc(&range.start)?;
                bounds.push(("created_at".to_string(), format!("gte.{}", start.to_rfc3339())));
            }
            if !range.end.is_empty() {
                let end = local_day_end_utc(&range.end)?;
                bounds.push(("created_at".to_string(), format!("lte.{}", end.to_rfc3339())));
            }
        }

        let mut url = self.table_url("novos_leads")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            query.append_pair("order", "created_at.desc");
            for (key, value) in &bounds {
                query.append_pair(key, value);
            }
        }
        self.fetch_json(url).await
    }

    /// Exact row count of `leads_consultores` — a proxy statistic, not
    /// the roster itself.
    pub async fn count_consultant_assignments(&self) -> Result<u64, GatewayError> {
        let mut url = self.table_url("leads_consultores")?;
        url.query_pairs_mut().append_pair("select", "id");

        let resp = self
            .get(url)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let header = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GatewayError::Decode("missing content-range header".to_string()))?;
        parse_content_range_total(header)
            .ok_or_else(|| GatewayError::Decode(format!("unparseable content-range: {}", header)))
    }

    /// The most recent `system_logs` rows, newest first, capped at
    /// [`LOG_WINDOW`].
    pub async fn fetch_logs(&self) -> Result<Vec<AccessLogEntry>, GatewayError> {
        let mut url = self.table_url("system_logs")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            query.append_pair("order", "created_at.desc");
            query.append_pair("limit", &LOG_WINDOW.to_string());
        }
        self.fetch_json(url).await
    }

    /// Append one access-log row.
    pub async fn insert_log(&self, entry: &LogInsert) -> Result<(), GatewayError> {
        let url = self.table_url("system_logs")?;
        let resp = self
            .post(url)
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(())
    }

    /// The settings row for a username, if one exists.
    pub async fn fetch_company_settings(
        &self,
        username: &str,
    ) -> Result<Option<CompanySettings>, GatewayError> {
        let mut url = self.table_url("company_settings")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            query.append_pair("username", &format!("eq.{}", username));
            query.append_pair("limit", "1");
        }
        let rows: Vec<CompanySettings> = self.fetch_json(url).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert-or-update a settings row, keyed on username.
    pub async fn upsert_company_settings(
        &self,
        settings: &CompanySettings,
    ) -> Result<(), GatewayError> {
        let mut url = self.table_url("company_settings")?;
        url.query_pairs_mut().append_pair("on_conflict", "username");

        let resp = self
            .post(url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(settings)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(())
    }

    /// Content digest of the full lead table, used by the change feed to
    /// detect inserts, updates and deletes with a single read.
    pub async fn leads_digest(&self) -> Result<String, GatewayError> {
        let mut url = self.table_url("novos_leads")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            query.append_pair("order", "id.asc");
        }
        let resp = self.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(hex::encode(Sha256::digest(body.as_bytes())))
    }
}

/// First instant of a local calendar day, as a store instant.
pub fn local_day_start_utc(date: &str) -> Result<DateTime<Utc>, GatewayError> {
    let day = parse_date(date)?;
    let naive = day.and_time(NaiveTime::MIN);
    local_to_utc(naive)
}

/// Last instant of a local calendar day (23:59:59.999), inclusive bound.
pub fn local_day_end_utc(date: &str) -> Result<DateTime<Utc>, GatewayError> {
    let day = parse_date(date)?;
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| GatewayError::Validation("invalid end-of-day time".to_string()))?;
    local_to_utc(day.and_time(end))
}

fn parse_date(date: &str) -> Result<NaiveDate, GatewayError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| GatewayError::Validation(format!("Invalid date: {}", date)))
}

fn local_to_utc(naive: chrono::NaiveDateTime) -> Result<DateTime<Utc>, GatewayError> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| GatewayError::Validation(format!("Unrepresentable local time: {}", naive)))
}

/// Total from a PostgREST `content-range` header (`0-0/42`). A `*` total
/// means the server declined to count.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let total = header.rsplit('/').next()?;
    if total == "*" {
        return None;
    }
    total.trim().parse().ok()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{}…", cut)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn content_range_total_parses() {
        assert_eq!(parse_content_range_total("0-0/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-0/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn day_bounds_cover_the_whole_local_day() {
        let start = local_day_start_utc("2024-03-15").expect("start");
        let end = local_day_end_utc("2024-03-15").expect("end");
        assert!(start < end);

        let local_start = start.with_timezone(&Local);
        assert_eq!(local_start.date_naive().to_string(), "2024-03-15");
        assert_eq!(local_start.time(), NaiveTime::MIN);

        let local_end = end.with_timezone(&Local);
        assert_eq!(local_end.date_naive().to_string(), "2024-03-15");
        assert_eq!(local_end.hour(), 23);
        assert_eq!(local_end.minute(), 59);
        assert_eq!(local_end.second(), 59);
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        let err = local_day_start_utc("15/03/2024").unwrap_err();
        assert!(err.is_validation());
    }
}
