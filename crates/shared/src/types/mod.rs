//! Common types used across the application.

pub mod amount;
pub mod date;
pub mod id;

pub use amount::{BALANCE_TOLERANCE, is_material, round_display, within_tolerance};
pub use date::{InvalidDate, format_iso_date, parse_iso_date, parse_optional_date};
pub use id::*;
