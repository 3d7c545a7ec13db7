// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::customer::{CustomerDetail, CustomerFilter, CustomerPage, DeleteOutcome},
};

// O núcleo é síncrono (lê e grava arquivos); roda fora do executor do tokio.
async fn run_blocking<T, F>(job: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))?
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCustomersQuery {
    /// Trecho do nome do condomínio (diferencia maiúsculas)
    #[validate(length(max = 100, message = "O filtro de condomínio deve ter no máximo 100 caracteres"))]
    #[param(example = "阳光")]
    pub community: Option<String>,

    /// Trecho do endereço (diferencia maiúsculas)
    #[validate(length(max = 100, message = "O filtro de endereço deve ter no máximo 100 caracteres"))]
    #[param(example = "5-3")]
    pub address: Option<String>,
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(ListCustomersQuery),
    responses(
        (status = 200, description = "Clientes migrados que passam no filtro", body = CustomerPage),
        (status = 400, description = "Filtro inválido"),
        (status = 422, description = "Coleção gravada ilegível (pode tentar de novo)")
    )
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<impl IntoResponse, AppError> {

    query.validate()?;

    let filter = CustomerFilter::new(query.community, query.address);
    let service = app_state.customer_service.clone();

    let page = run_blocking(move || service.list_customers(&filter)).await?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(
        ("id" = String, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Cliente com os tickets na ordem de exibição", body = CustomerDetail),
        (status = 400, description = "ID inválido"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 422, description = "Coleção gravada ilegível (pode tentar de novo)")
    )
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {

    let service = app_state.customer_service.clone();

    let detail = run_blocking(move || service.find_customer(&customer_id)).await?;

    Ok((StatusCode::OK, Json(detail)))
}

// DELETE /api/customers/{id}
// A confirmação ("tem certeza?") é da tela; aqui só executa.
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(
        ("id" = String, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Resultado da exclusão (falhas parciais em `errors`)", body = DeleteOutcome),
        (status = 400, description = "ID inválido"),
        (status = 422, description = "Coleção de clientes ilegível")
    )
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {

    let service = app_state.customer_service.clone();

    let outcome = run_blocking(move || service.delete_customer(&customer_id)).await?;

    Ok((StatusCode::OK, Json(outcome)))
}
