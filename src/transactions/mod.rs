//! Pre-made transactions.

mod return_dispatch;

pub use return_dispatch::*;
