mod compaction;
mod log_store;
mod stable_store;
mod store;

#[cfg(test)]
mod store_test;

#[doc(hidden)]
pub use log_store::*;
#[doc(hidden)]
pub use stable_store::*;
#[doc(hidden)]
pub use store::*;
