//! Dispatches a GitHub Actions workflow and finds the run it created.
//!
//! GitHub answers a dispatch without saying which run it started. Each invocation therefore
//! sends a [`marker::DistinctMarker`] along with the dispatch, and polls recent runs with
//! exponential backoff until one whose name carries the marker shows up. The remote workflow
//! has to put the marker into its `run-name` for this to work.
//!
//! See: [`transactions::return_dispatch`]

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod framework;
pub mod marker;
pub mod transactions;
pub mod workflow;

pub use error::{Error, Result};

/// A shorthand to define a statically allocated variable using a [`std::sync::LazyLock`].
///
/// # Examples
///
/// ```rust
/// # use return_dispatch::static_lazy_lock;
/// # use std::sync::LazyLock;
/// static_lazy_lock!{
///     pub VAR_1: String = String::from("a static variable");
/// }
/// // ...equals to...
/// pub static VAR_2: LazyLock<String> = LazyLock::new(|| String::from("a static variable"));
/// ```
#[macro_export]
macro_rules! static_lazy_lock {
    ($(#[$meta:meta])* $vis:vis $name:ident: $type:ty = $expr:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::__priv_macro_use::LazyLock<$type> =
            $crate::__priv_macro_use::LazyLock::new(|| $expr);
    };
}

#[doc(hidden)]
pub mod __priv_macro_use {
    pub use std::sync::LazyLock;
}
