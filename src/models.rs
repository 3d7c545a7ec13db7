pub mod customer;
pub use customer::{Customer, CustomerDetail, CustomerFilter, CustomerPage, DeleteOutcome, LoadReport, NormalizationWarning};
pub mod repair;
pub use repair::{RepairRow, RepairTicket, StatusTone, TicketStamp};
