// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use utoipa::ToSchema;

use crate::{common::error::AppError, models::repair::RepairRow};

// --- CLIENTE (O Dado canônico, depois da migração) ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    // Sempre no formato canônico (UUID v4 com hífens)
    #[schema(example = "3f2b8c1e-9a4d-4e7f-8b21-6c0d5e9a1f34")]
    pub id: String,

    // Texto livre. Valores que não são texto ficam em `extra`, intocados.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "张先生")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "13800138000")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[schema(example = "阳光花园")]
    pub community: String,

    #[schema(example = "5-3-502")]
    pub address: String,

    // Derivados: recalculados em toda passada, nunca editados à mão
    #[schema(example = "阳光花园 5-3-502")]
    pub full_address: String,
    pub repair_count: usize,
    pub last_repair_date: Option<DateTime<Utc>>,

    // Os tickets ficam crus aqui; quem filtra é o RepairIndex.
    #[schema(value_type = Vec<Object>)]
    pub repairs: Vec<Value>,

    // Campos que não conhecemos (ex: "createdBy") voltam para o store como vieram.
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

impl Customer {
    /// `trim(community + " " + address)`
    pub fn compose_full_address(community: &str, address: &str) -> String {
        format!("{community} {address}").trim().to_string()
    }
}

// --- AVISOS DE MIGRAÇÃO ---

// Não é erro: a carga continua e o aviso vai junto na resposta.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationWarning {
    // Posição do registro na coleção gravada
    pub index: usize,
    pub customer_id: String,
    #[schema(example = "campo 'community' vazio; usado '未指定小区'")]
    pub message: String,
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registro #{} ({}): {}", self.index, self.customer_id, self.message)
    }
}

/// Resultado de uma carga: a coleção migrada mais os avisos acumulados.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub customers: Vec<Customer>,
    pub warnings: Vec<NormalizationWarning>,
}

// --- FILTRO DA LISTAGEM ---

/// Filtros por substring (com distinção de maiúsculas), combinados com AND.
/// Filtro vazio conta como "sem filtro".
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub community: Option<String>,
    pub address: Option<String>,
}

impl CustomerFilter {
    pub fn new(community: Option<String>, address: Option<String>) -> Self {
        Self {
            community: community.filter(|c| !c.is_empty()),
            address: address.filter(|a| !a.is_empty()),
        }
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        let community_match = self
            .community
            .as_deref()
            .is_none_or(|needle| customer.community.contains(needle));
        let address_match = self
            .address
            .as_deref()
            .is_none_or(|needle| customer.address.contains(needle));

        community_match && address_match
    }
}

// --- RESPOSTAS ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    // Total na coleção, antes do filtro
    pub total: usize,
    pub matched: usize,
    pub warnings: Vec<NormalizationWarning>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    pub customer: Customer,
    // Tickets válidos, já na ordem de exibição
    pub repairs: Vec<RepairRow>,
    pub warnings: Vec<NormalizationWarning>,
}

/// Resultado da exclusão em cascata. Falhas parciais vêm em `errors`;
/// quem chama decide se isso vira aviso ou erro.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub customer_removed: bool,
    pub repairs_removed: usize,
    #[serde(serialize_with = "serialize_errors")]
    #[schema(value_type = Vec<String>)]
    pub errors: Vec<AppError>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

fn serialize_errors<S: Serializer>(errors: &[AppError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}
