//! Core data types for telematics scoring and pricing

pub mod quote;
pub mod risk;
pub mod telemetry;
