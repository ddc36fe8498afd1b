mod descriptor;
mod errors;
mod node;

pub mod bytestore;
pub mod fixtures;
pub mod lock;
pub mod path;
pub mod provider;
pub mod refresh;
pub mod subscriber;

pub use descriptor::{ByteDescriptor, CacheEntry};
pub use errors::Error;
pub use node::{Depth, LocalNode, NodeKind};

#[cfg(test)]
mod tests;

// rstest_reuse templates expand to `$crate::rstest_reuse`, so it must be
// reachable from the crate root.
#[cfg(test)]
use rstest_reuse;
