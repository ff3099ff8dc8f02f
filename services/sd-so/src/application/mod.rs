//! Application layer

pub mod commands;
pub mod handler;
pub mod quote;
pub mod settings;
pub mod vat_verification;

pub use commands::*;
pub use handler::OrderHandler;
pub use quote::*;
pub use vat_verification::*;
