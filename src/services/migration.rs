// src/services/migration.rs

use serde_json::{Map, Value};
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;

use crate::{
    config::Placeholders,
    models::customer::{Customer, LoadReport, NormalizationWarning},
    services::{
        id_allocator::{is_canonical_id, IdAllocator},
        repair_index,
    },
};

// Campos que a migração reescreve; o resto do registro passa intocado.
const DERIVED_FIELDS: [&str; 3] = ["fullAddress", "repairCount", "lastRepairDate"];

#[derive(Debug, Error)]
pub enum CollectionParseError {
    #[error("JSON ilegível: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("esperava uma lista, encontrou {0}")]
    NotASequence(&'static str),
}

/// Texto gravado -> lista de registros ainda não confiáveis.
/// Chave ausente não é erro: vira coleção vazia.
pub fn parse_collection(raw: Option<&str>) -> Result<Vec<Value>, CollectionParseError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Value>(raw)? {
        Value::Array(entries) => Ok(entries),
        other => Err(CollectionParseError::NotASequence(kind_of(&other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "número",
        Value::String(_) => "texto",
        Value::Array(_) => "lista",
        Value::Object(_) => "objeto",
    }
}

// Leva qualquer coisa que estava gravada para o formato canônico de Customer.
// Nunca falha: registro estragado vira cliente novo + aviso.
#[derive(Clone)]
pub struct MigrationEngine {
    allocator: Arc<dyn IdAllocator>,
    placeholders: Placeholders,
}

impl MigrationEngine {
    pub fn new(allocator: Arc<dyn IdAllocator>, placeholders: Placeholders) -> Self {
        Self { allocator, placeholders }
    }

    pub fn parse(&self, raw: Option<&str>) -> Result<Vec<Value>, CollectionParseError> {
        parse_collection(raw)
    }

    /// Aplica `parse` e `normalize` em cada registro, juntando os avisos.
    ///
    /// Também garante IDs únicos na coleção: a segunda ocorrência de um ID
    /// ganha um novo. Rodar de novo sobre o resultado não muda nada.
    pub fn migrate_collection(&self, raw: Option<&str>) -> Result<LoadReport, CollectionParseError> {
        let entries = self.parse(raw)?;

        let mut report = LoadReport {
            customers: Vec::with_capacity(entries.len()),
            warnings: Vec::new(),
        };
        let mut seen_ids = HashSet::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let (mut customer, mut messages) = self.normalize(entry);

            if !seen_ids.insert(customer.id.to_ascii_lowercase()) {
                let fresh = self.allocator.allocate();
                messages.push(format!("ID duplicado '{}' substituído por '{}'", customer.id, fresh));
                seen_ids.insert(fresh.to_ascii_lowercase());
                customer.id = fresh;
            }

            for message in messages {
                tracing::warn!("⚠️ Migração do registro #{}: {}", index, message);
                report.warnings.push(NormalizationWarning {
                    index,
                    customer_id: customer.id.clone(),
                    message,
                });
            }

            report.customers.push(customer);
        }

        Ok(report)
    }

    /// Um registro cru -> (Customer canônico, avisos).
    pub fn normalize(&self, entry: Value) -> (Customer, Vec<String>) {
        let mut warnings = Vec::new();

        // 1. Tem que ser um objeto
        let mut fields = match entry {
            Value::Object(fields) => fields,
            other => {
                warnings.push(format!(
                    "registro não estruturado ({}) substituído por um cliente vazio",
                    kind_of(&other)
                ));
                return (self.synthesize(), warnings);
            }
        };

        // 2. Texto livre: só o que já é texto vira campo tipado
        let name = take_text(&mut fields, "name");
        let phone = take_text(&mut fields, "phone");
        let unit = take_text(&mut fields, "unit");

        // 3. Obrigatórios: nunca vazios
        let community = self.required_text(
            &mut fields,
            "community",
            &self.placeholders.community,
            &mut warnings,
        );
        let address = self.required_text(
            &mut fields,
            "address",
            &self.placeholders.address,
            &mut warnings,
        );

        // 4. ID: ausente, igual ao telefone (formato antigo) ou fora do padrão
        let id = match fields.remove("id") {
            Some(Value::String(id)) if !reuses_phone(&id, phone.as_deref()) && is_canonical_id(&id) => id,
            legacy => {
                let fresh = self.allocator.allocate();
                tracing::debug!("ID {:?} migrado para {}", legacy, fresh);
                fresh
            }
        };

        // 5. Tickets: só garante que é uma lista. Filtrar é com o RepairIndex.
        let repairs = match fields.remove("repairs") {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                warnings.push(format!(
                    "campo 'repairs' não é uma lista ({}); substituído por lista vazia",
                    kind_of(&other)
                ));
                Vec::new()
            }
        };

        // 6. Derivados: sempre recalculados
        for derived in DERIVED_FIELDS {
            fields.remove(derived);
        }
        let aggregates = repair_index::derive_aggregates(&repairs);

        let customer = Customer {
            id,
            name,
            phone,
            unit,
            full_address: Customer::compose_full_address(&community, &address),
            community,
            address,
            repair_count: aggregates.repair_count,
            last_repair_date: aggregates.last_repair_date,
            repairs,
            extra: fields,
        };

        (customer, warnings)
    }

    fn synthesize(&self) -> Customer {
        let community = self.placeholders.community.clone();
        let address = self.placeholders.address.clone();

        Customer {
            id: self.allocator.allocate(),
            name: None,
            phone: None,
            unit: None,
            full_address: Customer::compose_full_address(&community, &address),
            community,
            address,
            repair_count: 0,
            last_repair_date: None,
            repairs: Vec::new(),
            extra: Map::new(),
        }
    }

    fn required_text(
        &self,
        fields: &mut Map<String, Value>,
        key: &str,
        placeholder: &str,
        warnings: &mut Vec<String>,
    ) -> String {
        let problem = match fields.remove(key) {
            Some(Value::String(text)) if !text.is_empty() => return text,
            // Número ou booleano foi digitado pelo usuário: vira texto, sem aviso
            Some(Value::Number(number)) => return number.to_string(),
            Some(Value::Bool(flag)) => return flag.to_string(),
            Some(Value::String(_)) => "vazio".to_string(),
            None | Some(Value::Null) => "ausente".to_string(),
            Some(other) => format!("com tipo inválido ({})", kind_of(&other)),
        };

        warnings.push(format!("campo '{key}' {problem}; usado '{placeholder}'"));
        placeholder.to_string()
    }
}

// Registros antigos usavam o telefone como ID
fn reuses_phone(id: &str, phone: Option<&str>) -> bool {
    phone == Some(id)
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(text)) => Some(text),
        // Número, null etc. é conteúdo do usuário: volta para o registro como está
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::id_allocator::{testing::SequenceAllocator, UuidAllocator};
    use serde_json::json;

    const VALID_ID: &str = "3f2b8c1e-9a4d-4e7f-8b21-6c0d5e9a1f34";

    fn engine() -> MigrationEngine {
        MigrationEngine::new(Arc::new(SequenceAllocator::default()), Placeholders::default())
    }

    fn renormalize(engine: &MigrationEngine, customers: &[Customer]) -> LoadReport {
        let text = serde_json::to_string(customers).unwrap();
        engine.migrate_collection(Some(&text)).unwrap()
    }

    #[test]
    fn parse_treats_absent_text_as_empty_collection() {
        assert!(parse_collection(None).unwrap().is_empty());
    }

    #[test]
    fn parse_fails_when_text_is_not_a_sequence() {
        assert!(matches!(
            parse_collection(Some(r#"{"id":"x"}"#)),
            Err(CollectionParseError::NotASequence("objeto"))
        ));
        assert!(matches!(parse_collection(Some("[{")), Err(CollectionParseError::Malformed(_))));
    }

    #[test]
    fn scenario_missing_community_and_phone_only_legacy_record() {
        let engine = MigrationEngine::new(Arc::new(UuidAllocator), Placeholders::default());
        let raw = r#"[{"phone":"13800138000","community":"","address":"5-3-502"}]"#;

        let report = engine.migrate_collection(Some(raw)).unwrap();
        let customer = &report.customers[0];

        assert_eq!(customer.community, "未指定小区");
        assert_eq!(customer.address, "5-3-502");
        assert_eq!(customer.full_address, "未指定小区 5-3-502");
        assert!(is_canonical_id(&customer.id));
        assert_ne!(customer.id, "13800138000");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].customer_id, customer.id);
    }

    #[test]
    fn scalar_community_and_address_are_kept_as_text() {
        let (customer, warnings) = engine().normalize(json!({
            "id": VALID_ID, "community": 12, "address": "a"
        }));
        assert_eq!(customer.community, "12");
        assert_eq!(customer.full_address, "12 a");
        assert!(warnings.is_empty());

        let (customer, warnings) = engine().normalize(json!({
            "id": VALID_ID, "community": "c", "address": 5.5
        }));
        assert_eq!(customer.address, "5.5");
        assert!(warnings.is_empty());

        // estruturas não têm forma de texto: placeholder + aviso
        let (customer, warnings) = engine().normalize(json!({
            "id": VALID_ID, "community": {"nome": "x"}, "address": "a"
        }));
        assert_eq!(customer.community, "未指定小区");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn non_object_entries_become_fresh_customers_with_a_warning() {
        let report = engine().migrate_collection(Some(r#"[42, "x", null]"#)).unwrap();

        assert_eq!(report.customers.len(), 3);
        assert_eq!(report.warnings.len(), 3);
        for customer in &report.customers {
            assert!(is_canonical_id(&customer.id));
            assert_eq!(customer.full_address, "未指定小区 未指定地址");
            assert!(customer.repairs.is_empty());
            assert_eq!(customer.last_repair_date, None);
        }
    }

    #[test]
    fn phone_reused_as_id_is_replaced_even_if_well_formed() {
        let (customer, warnings) = engine().normalize(json!({
            "id": VALID_ID, "phone": VALID_ID, "community": "阳光花园", "address": "1-1"
        }));
        assert_ne!(customer.id, VALID_ID);
        assert!(warnings.is_empty());
    }

    #[test]
    fn canonical_ids_are_kept() {
        let (customer, _) = engine().normalize(json!({
            "id": VALID_ID, "phone": "139", "community": "c", "address": "a"
        }));
        assert_eq!(customer.id, VALID_ID);
    }

    #[test]
    fn derived_fields_are_recomputed_not_trusted() {
        let (customer, _) = engine().normalize(json!({
            "id": VALID_ID, "community": "阳光花园", "address": "5-3-502",
            "fullAddress": "outra coisa", "repairCount": 99, "lastRepairDate": "1999-01-01",
            "repairs": [{"id": "r1", "date": "2024-01-01"}]
        }));
        assert_eq!(customer.full_address, "阳光花园 5-3-502");
        assert_eq!(customer.repair_count, 1);
        assert!(customer.extra.is_empty());
    }

    #[test]
    fn repairs_that_are_not_a_list_become_empty_with_a_warning() {
        let (customer, warnings) = engine().normalize(json!({
            "id": VALID_ID, "community": "c", "address": "a", "repairs": "r1,r2"
        }));
        assert!(customer.repairs.is_empty());
        assert_eq!(warnings.len(), 1);

        let (customer, warnings) = engine().normalize(json!({
            "id": VALID_ID, "community": "c", "address": "a"
        }));
        assert!(customer.repairs.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_fields_and_non_text_scalars_survive_the_round_trip() {
        let (customer, _) = engine().normalize(json!({
            "id": VALID_ID, "phone": 13800138000_u64, "community": "c", "address": "a",
            "createdBy": "wizard"
        }));
        assert_eq!(customer.phone, None);

        let value = serde_json::to_value(&customer).unwrap();
        assert_eq!(value["phone"], json!(13800138000_u64));
        assert_eq!(value["createdBy"], json!("wizard"));
    }

    #[test]
    fn duplicate_ids_are_reallocated_with_a_warning() {
        let raw = json!([
            {"id": VALID_ID, "community": "c", "address": "a"},
            {"id": VALID_ID.to_uppercase(), "community": "c", "address": "b"}
        ])
        .to_string();
        let report = engine().migrate_collection(Some(&raw)).unwrap();

        assert_eq!(report.customers[0].id, VALID_ID);
        assert_ne!(report.customers[1].id.to_lowercase(), VALID_ID);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].index, 1);
    }

    #[test]
    fn normalization_is_idempotent() {
        let engine = engine();
        let raw = json!([
            {"phone": "138", "community": "", "address": "5-3-502"},
            7,
            {"id": "13900000000", "phone": "13900000000", "community": "花园", "address": " ",
             "repairs": [{"id": "r1", "date": "2024-01-01"}, {"id": ""}], "note": {"k": [1, 2]}},
            {"id": VALID_ID, "community": "c", "address": "a", "repairs": {"bad": true}},
        ])
        .to_string();

        let first = engine.migrate_collection(Some(&raw)).unwrap();
        assert!(!first.warnings.is_empty());

        let second = renormalize(&engine, &first.customers);
        assert_eq!(second.customers, first.customers);
        assert!(second.warnings.is_empty());

        // nenhuma alocação nova na segunda passada
        let third = renormalize(&engine, &second.customers);
        assert_eq!(third.customers, first.customers);
    }

    #[test]
    fn full_address_invariant_holds_for_every_shape() {
        let raw = json!([
            {"community": "c"},
            {"address": "a"},
            {},
            {"community": "  c  ", "address": "a  "},
        ])
        .to_string();
        let report = engine().migrate_collection(Some(&raw)).unwrap();

        for customer in &report.customers {
            assert!(!customer.community.is_empty());
            assert!(!customer.address.is_empty());
            assert_eq!(
                customer.full_address,
                format!("{} {}", customer.community, customer.address).trim()
            );
        }
    }
}
