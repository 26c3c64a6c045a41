//! Client for the GLS (ASM) `GrabaServicios` SOAP web service.

pub mod client;
pub mod envelope;
pub mod errors;
pub mod response;

pub use client::GlsClient;
