pub mod account;
pub mod document;

pub use account::*;
pub use document::*;
