// src/models/repair.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

// Rótulos de exibição (mesmo texto que a tela de cadastro já usa)
pub const UNKNOWN_DATE_LABEL: &str = "未知日期";
pub const UNKNOWN_STATUS_LABEL: &str = "未知";
pub const DEFAULT_PRIORITY_LABEL: &str = "中";
pub const MISSING_TYPE_LABEL: &str = "-";

// --- DATA DE UM TICKET ---

// Distingue "campo ausente" de "campo presente mas ilegível":
// um `updatedAt` ilegível ainda ganha do `date` na ordenação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStamp {
    Missing,
    Invalid,
    At(DateTime<Utc>),
}

impl TicketStamp {
    pub fn is_present(&self) -> bool {
        !matches!(self, TicketStamp::Missing)
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            TicketStamp::At(moment) => Some(*moment),
            _ => None,
        }
    }
}

// --- TICKET (visão tipada de um ticket válido) ---

#[derive(Debug, Clone, PartialEq)]
pub struct RepairTicket {
    pub id: String,
    pub kind: Option<String>, // "type" no JSON
    pub status: Option<String>,
    pub priority: Option<String>,
    pub date: TicketStamp,
    pub updated_at: TicketStamp,
}

impl RepairTicket {
    /// `updatedAt` quando presente, senão `date`.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        if self.updated_at.is_present() {
            self.updated_at.at()
        } else {
            self.date.at()
        }
    }
}

// Mapeia os status conhecidos para a cor do "badge" na tela
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Completed,
    InProgress,
    Pending,
    Attention,
}

impl StatusTone {
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some("已完成") => StatusTone::Completed,
            Some("处理中") => StatusTone::InProgress,
            Some("待处理") => StatusTone::Pending,
            _ => StatusTone::Attention,
        }
    }
}

// --- LINHA DE EXIBIÇÃO ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairRow {
    #[schema(example = "r1")]
    pub id: String,
    #[serde(rename = "type")]
    #[schema(example = "水管")]
    pub kind: String,
    #[schema(example = "处理中")]
    pub status: String,
    pub status_tone: StatusTone,
    #[schema(example = "2024-01-01")]
    pub date: String,
    #[schema(example = "中")]
    pub priority: String,
}

impl From<&RepairTicket> for RepairRow {
    fn from(ticket: &RepairTicket) -> Self {
        Self {
            id: ticket.id.clone(),
            kind: ticket.kind.clone().unwrap_or_else(|| MISSING_TYPE_LABEL.to_string()),
            status: ticket.status.clone().unwrap_or_else(|| UNKNOWN_STATUS_LABEL.to_string()),
            status_tone: StatusTone::from_status(ticket.status.as_deref()),
            date: ticket
                .date
                .at()
                .map(|moment| moment.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| UNKNOWN_DATE_LABEL.to_string()),
            priority: ticket.priority.clone().unwrap_or_else(|| DEFAULT_PRIORITY_LABEL.to_string()),
        }
    }
}
