pub mod content_hash;
pub mod device;
pub mod jwt;
pub mod pagination;
pub mod phone;

pub use content_hash::*;
pub use device::*;
pub use jwt::*;
pub use pagination::*;
pub use phone::*;
