pub mod admin;
pub mod auth;
pub mod draw;
pub mod entry;

pub use admin::admin_config;
pub use auth::auth_config;
pub use entry::entry_config;
