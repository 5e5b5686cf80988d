//! Application layer - Use cases over the domain model
//!
//! - Ports: async traits the infrastructure implements
//! - Services: equipment, progression, battle and character use cases
//! - DTOs: request/response shapes for the HTTP adapter

pub mod dto;
pub mod ports;
pub mod services;
