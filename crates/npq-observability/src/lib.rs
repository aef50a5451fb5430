mod broker;
mod hash_registry;
mod triple_store;

pub use broker::*;
pub use hash_registry::*;
pub use triple_store::*;
