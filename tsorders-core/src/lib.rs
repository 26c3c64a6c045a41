pub mod models;
pub mod schemas;
pub mod grouping;
pub mod repository;
pub mod carrier;
pub mod services;
pub mod memory;

pub use models::{OrderFlag, OrderView, Row, ShipmentColumn, ShipmentType};
pub use repository::OrderRepository;
pub use carrier::{CarrierGateway, CarrierResponse};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Carrier error: {0}")]
    CarrierError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
