pub mod concurrency;

pub use concurrency::{concurrency_limit, ConcurrencyLimit};
