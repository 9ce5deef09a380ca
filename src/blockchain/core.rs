// core.rs splits responsibilities into submodules: the block and its
// proof-of-work, the chain itself, and chain-wide validation.
pub mod block;
pub mod chain;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use validation::*;
