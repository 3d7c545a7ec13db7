// src/services/repair_index.rs
//
// Tudo aqui é puro: recebe a lista crua de tickets de um cliente e deriva
// contagem, última data e ordem de exibição. Ticket inválido (não é objeto,
// ou não tem `id` texto não vazio) é ignorado em silêncio, sem aviso.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::repair::{RepairRow, RepairTicket, TicketStamp};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregates {
    pub repair_count: usize,
    // `None` quando não há ticket válido (ou nenhum tem data legível)
    pub last_repair_date: Option<DateTime<Utc>>,
}

/// Filtra os tickets válidos, preservando a ordem original.
pub fn valid_tickets(repairs: &[Value]) -> Vec<RepairTicket> {
    repairs.iter().filter_map(ticket_from_value).collect()
}

/// Conta os tickets válidos e pega a maior `date` entre eles.
/// Data ilegível sai do máximo mas o ticket continua contando.
pub fn derive_aggregates(repairs: &[Value]) -> Aggregates {
    let tickets = valid_tickets(repairs);
    let last_repair_date = tickets.iter().filter_map(|t| t.date.at()).max();

    Aggregates { repair_count: tickets.len(), last_repair_date }
}

/// Tickets válidos do mais recente para o mais antigo, pela data efetiva.
///
/// A ordenação é estável: empates mantêm a ordem original, senão dois tickets
/// atualizados no mesmo lote trocariam de lugar entre uma tela e outra.
/// Data efetiva ilegível vai para o fim.
pub fn display_order(repairs: &[Value]) -> Vec<RepairTicket> {
    let mut tickets = valid_tickets(repairs);
    // `None < Some(_)`, então comparar ao contrário joga os ilegíveis pro fim
    tickets.sort_by(|a, b| b.effective_date().cmp(&a.effective_date()));
    tickets
}

pub fn display_rows(repairs: &[Value]) -> Vec<RepairRow> {
    display_order(repairs).iter().map(RepairRow::from).collect()
}

/// Aceita RFC 3339, data/hora sem fuso (lida como UTC), só a data, e
/// milissegundos desde a época (o que um `Date` vira quando salvo como número).
pub fn parse_ticket_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_date_text(text.trim()),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(moment) = DateTime::parse_from_rfc3339(text) {
        return Some(moment.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(moment) = NaiveDateTime::parse_from_str(text, format) {
            return Some(moment.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(text, format) {
            return day.and_hms_opt(0, 0, 0).map(|moment| moment.and_utc());
        }
    }

    None
}

fn ticket_from_value(value: &Value) -> Option<RepairTicket> {
    let fields = value.as_object()?;
    let id = fields.get("id")?.as_str().filter(|id| !id.is_empty())?;

    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(RepairTicket {
        id: id.to_string(),
        kind: text("type"),
        status: text("status"),
        priority: text("priority"),
        date: stamp_from(fields.get("date")),
        updated_at: stamp_from(fields.get("updatedAt")),
    })
}

// Ausente = não existe, é null ou é texto vazio
fn stamp_from(value: Option<&Value>) -> TicketStamp {
    match value {
        None | Some(Value::Null) => TicketStamp::Missing,
        Some(Value::String(text)) if text.trim().is_empty() => TicketStamp::Missing,
        Some(other) => parse_ticket_date(other).map_or(TicketStamp::Invalid, TicketStamp::At),
    }
}
