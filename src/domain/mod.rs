mod account;
mod ledger;
mod limit;
mod money;
mod transaction;

pub use account::*;
pub use ledger::*;
pub use limit::*;
pub use money::*;
pub use transaction::*;
