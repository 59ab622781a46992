//! Data model for simulation output
//!
//! Contains the tabular containers, the declared table schemas,
//! per-scenario settings and the geometric context (zones, CRS).

pub mod column;
pub mod crs;
pub mod settings;
pub mod specification;
pub mod table;
pub mod zone;

pub use column::{Column, ColumnType};
pub use crs::Crs;
pub use settings::{ModeRuleset, Settings};
pub use specification::{ColumnSpec, TableKind, TableSpecification};
pub use table::Table;
pub use zone::{OperatingZone, RelationType, Zone};
