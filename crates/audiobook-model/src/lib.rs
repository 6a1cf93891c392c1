pub mod config;
pub mod input;
pub mod record;
pub mod summary;

pub use config::*;
pub use input::*;
pub use record::*;
pub use summary::*;
