//! 值对象

mod country;
mod ids;
mod price_breakdown;
mod pricing_settings;
mod vat_number;

pub use country::*;
pub use ids::*;
pub use price_breakdown::*;
pub use pricing_settings::*;
pub use vat_number::*;
