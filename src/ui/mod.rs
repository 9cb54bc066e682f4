//! Terminal output for the `formcraft` binary.

pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, section, storage_ready, success, warn};
pub use table::{TableBuilder, forms_table, stats_table};
pub use theme::{theme, Theme};
