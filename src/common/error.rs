use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // O conteúdo existe mas não é uma lista. Fatal para a carga.
    #[error("Dados de '{key}' em formato inválido: {reason}")]
    ParseError { key: String, reason: String },

    #[error("Cliente '{0}' não encontrado")]
    CustomerNotFound(String),

    #[error("ID de cliente inválido")]
    InvalidCustomerId,

    #[error("Falha ao ler '{key}': {source}")]
    StoreReadError {
        key: String,
        #[source]
        source: StoreError,
    },

    // Reportado por coleção; nunca desfaz um resultado já devolvido.
    #[error("Falha ao gravar '{key}': {source}")]
    StoreWriteError {
        key: String,
        #[source]
        source: StoreError,
    },

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn parse(key: &str, reason: impl ToString) -> Self {
        AppError::ParseError { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn store_read(key: &str, source: StoreError) -> Self {
        AppError::StoreReadError { key: key.to_string(), source }
    }

    pub fn store_write(key: &str, source: StoreError) -> Self {
        AppError::StoreWriteError { key: key.to_string(), source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            // A tela oferece "recarregar"; por isso o `retryable`.
            ref e @ AppError::ParseError { .. } => {
                tracing::warn!("Coleção ilegível: {}", e);
                let body = Json(json!({
                    "error": e.to_string(),
                    "retryable": true,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "Cliente não encontrado."),
            AppError::InvalidCustomerId => (StatusCode::BAD_REQUEST, "ID de cliente inválido."),
            ref e @ AppError::StoreReadError { .. } => {
                tracing::error!("Armazenamento indisponível: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Armazenamento indisponível, tente novamente.")
            }

            // Todos os outros erros viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_is_unprocessable() {
        let response = AppError::parse("customers", "esperava uma lista").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn not_found_and_invalid_id_map_to_client_errors() {
        assert_eq!(
            AppError::CustomerNotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::InvalidCustomerId.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn write_error_message_names_the_key() {
        let err = AppError::store_write("repairs", StoreError::Unavailable("disco cheio".into()));
        assert!(err.to_string().contains("repairs"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
