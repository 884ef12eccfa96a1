pub mod admin;
pub mod common;
pub mod draw;
pub mod entry;

pub use admin::*;
pub use common::*;
pub use draw::*;
pub use entry::*;
