pub mod repo;

#[cfg(test)]
pub use repo::MemoryServiceCatalog;
pub use repo::{PgServiceCatalog, Service, ServiceCatalog};
