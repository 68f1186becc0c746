//! Fee structure resolution.

pub mod resolver;
pub mod store;
pub mod types;

pub use resolver::FeeResolver;
pub use store::FeeStructureStore;
pub use types::{FeeResolution, FeeRule};
