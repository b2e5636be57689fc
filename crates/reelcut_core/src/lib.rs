pub mod active;
pub mod error;
pub mod library;
pub mod payload;
pub mod resolve;
pub mod ruler;
pub mod settings;
pub mod surface;
pub mod timeline;
pub mod transport;
pub mod types;

pub use error::{CoreError, Result};
