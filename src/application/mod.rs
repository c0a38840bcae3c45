pub mod accounts;
pub mod generation;
pub mod ledger;
pub mod plan;
pub mod quota;

pub use accounts::*;
pub use generation::*;
pub use ledger::*;
pub use plan::*;
pub use quota::*;
