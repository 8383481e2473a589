//! HTTP handlers for maf-web

pub mod buildinfo;
pub mod health;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use ui::ui_routes;
