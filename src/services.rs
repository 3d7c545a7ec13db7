pub mod id_allocator;
pub use id_allocator::{IdAllocator, UuidAllocator};
pub mod migration;
pub use migration::MigrationEngine;
pub mod repair_index;
pub mod cascade;
pub use cascade::CascadeDeleter;
pub mod customer_service;
pub use customer_service::CustomerService;
