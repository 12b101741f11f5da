//! Clients for the three external webhook endpoints: consultant roster
//! (GET), date-filtered roster (POST) and improvement submission (POST).
//!
//! Roster payloads arrive either as a bare JSON array or wrapped as
//! `{ "data": [...] }`; anything else is a decode error, surfaced rather
//! than silently treated as empty.

use chrono::Utc;
use serde_json::Value;

use crate::error::GatewayError;
use crate::types::{Config, ConsultantLead, ImprovementRequest};

pub struct WebhookClient {
    http: reqwest::Client,
    roster_url: String,
    roster_range_url: String,
    improvements_url: String,
}

impl WebhookClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            roster_url: config.webhooks.roster_url.clone(),
            roster_range_url: config.webhooks.roster_range_url.clone(),
            improvements_url: config.webhooks.improvements_url.clone(),
        }
    }

    /// Full consultant roster.
    pub async fn fetch_roster(&self) -> Result<Vec<ConsultantLead>, GatewayError> {
        let resp = self
            .http
            .get(&self.roster_url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        let value: Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        decode_roster(value)
    }

    /// Roster restricted to an inclusive calendar range. Both bounds are
    /// required; the request is rejected locally otherwise.
    pub async fn fetch_roster_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<ConsultantLead>, GatewayError> {
        if start.is_empty() || end.is_empty() {
            return Err(GatewayError::Validation(
                "Por favor, selecione a data de início e fim para filtrar.".to_string(),
            ));
        }

        let resp = self
            .http
            .post(&self.roster_range_url)
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "inicio": start, "fim": end }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        let value: Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        decode_roster(value)
    }

    /// Submit an improvement request. The submission timestamp is stamped
    /// here; field validation happens in the improvements service before
    /// this is called.
    pub async fn submit_improvement(
        &self,
        request: &ImprovementRequest,
    ) -> Result<(), GatewayError> {
        let payload = serde_json::json!({
            "solicitante": request.solicitante,
            "tipo": request.tipo,
            "descricao": request.descricao,
            "processos_manuais": request.processos_manuais,
            "prioridade": request.prioridade,
            "data_solicitacao": Utc::now().to_rfc3339(),
        });

        let resp = self.http.post(&self.improvements_url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }
}

/// Decode a roster payload: a bare array, or `{ "data": [...] }`.
pub fn decode_roster(value: Value) -> Result<Vec<ConsultantLead>, GatewayError> {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(GatewayError::Decode(
                    "roster payload is neither an array nor {data: [...]}".to_string(),
                ))
            }
        },
        other => {
            return Err(GatewayError::Decode(format!(
                "roster payload is not an array: {}",
                other
            )))
        }
    };

    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<ConsultantLead>(row)
                .map_err(|e| GatewayError::Decode(e.to_string()))
        })
        .collect()
}
