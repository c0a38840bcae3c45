pub mod config;
pub mod crypto;
pub mod renderer;
pub mod repository;

pub use config::*;
pub use crypto::*;
pub use renderer::*;
pub use repository::*;
