pub mod alarm;
pub mod draft;
pub mod summary;
pub mod timefmt;
pub mod types;

pub use alarm::*;
pub use draft::*;
pub use summary::*;
pub use timefmt::*;
pub use types::*;
