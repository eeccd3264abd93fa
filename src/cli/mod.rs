//! CLI output formatting
//!
//! Provides human-readable terminal display for routes, permission
//! matrices, role selections and diagnostics.

pub mod display;

pub use display::render_diagnostic_report;
pub use display::render_history;
pub use display::render_matrix;
pub use display::render_routes;
pub use display::render_selection;
