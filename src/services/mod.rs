pub mod admin_auth_service;
pub mod draw_service;
pub mod entry_service;
pub mod export_service;

pub use admin_auth_service::*;
pub use draw_service::*;
pub use entry_service::*;
pub use export_service::*;
