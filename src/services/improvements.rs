//! Improvement request submission.
//!
//! Validation runs entirely client-side before the webhook call; an
//! invalid form never produces network traffic.

use serde::Serialize;

use crate::state::AppState;
use crate::types::ImprovementRequest;

/// Minimum meaningful description length, counted in characters (not
/// bytes; accented text must not be penalized).
pub const MIN_DESCRIPTION_CHARS: usize = 20;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitResult {
    Success,
    /// Rejected before any network call.
    Invalid { message: String },
    Error { message: String },
}

/// Check the form. All fields are required; the description additionally
/// has a length floor.
pub fn validate(request: &ImprovementRequest) -> Result<(), String> {
    if request.tipo.trim().is_empty()
        || request.descricao.trim().is_empty()
        || request.processos_manuais.trim().is_empty()
        || request.prioridade.trim().is_empty()
    {
        return Err("Por favor, preencha todos os campos obrigatórios.".to_string());
    }
    if request.descricao.trim().chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(format!(
            "A descrição deve ter pelo menos {} caracteres.",
            MIN_DESCRIPTION_CHARS
        ));
    }
    Ok(())
}

/// Validate, then send to the improvements webhook.
pub async fn submit(state: &AppState, request: ImprovementRequest) -> SubmitResult {
    if let Err(message) = validate(&request) {
        return SubmitResult::Invalid { message };
    }

    let client = match state.webhooks() {
        Ok(client) => client,
        Err(e) => {
            return SubmitResult::Error {
                message: e.to_string(),
            }
        }
    };

    match client.submit_improvement(&request).await {
        Ok(()) => SubmitResult::Success,
        Err(e) => SubmitResult::Error {
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(descricao: &str) -> ImprovementRequest {
        ImprovementRequest {
            solicitante: "Pulseenergy".to_string(),
            tipo: "automacao".to_string(),
            descricao: descricao.to_string(),
            processos_manuais: "planilha diária".to_string(),
            prioridade: "alta".to_string(),
        }
    }

    #[test]
    fn short_description_is_rejected() {
        let err = validate(&request("muito curta")).unwrap_err();
        assert!(err.contains("20"));
    }

    #[test]
    fn exactly_twenty_characters_passes() {
        assert!(validate(&request(&"x".repeat(MIN_DESCRIPTION_CHARS))).is_ok());
    }

    #[test]
    fn length_is_counted_in_characters_not_bytes() {
        // 20 characters, more than 20 bytes.
        assert!(validate(&request(&"ã".repeat(MIN_DESCRIPTION_CHARS))).is_ok());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut req = request(&"x".repeat(30));
        req.prioridade = "  ".to_string();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn whitespace_padding_does_not_satisfy_the_floor() {
        let padded = format!("{}{}", "curta", " ".repeat(40));
        assert!(validate(&request(&padded)).is_err());
    }
}
