// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub mod config;

// Re-export commonly used handler functions for convenience
pub use handlers::{render_report, resolve_crawl_id, resolve_db_path, run_crawl};
