pub mod cloudinary;
pub mod google;
pub mod turnstile;

pub use cloudinary::*;
pub use google::*;
pub use turnstile::*;
