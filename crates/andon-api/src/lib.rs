pub mod client;
pub mod dedupe;
pub mod watcher;

pub use client::*;
pub use dedupe::*;
pub use watcher::*;
