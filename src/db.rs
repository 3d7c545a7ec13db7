pub mod record_store;
pub use record_store::{FileStore, MemoryStore, RecordStore, StoreError};
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
