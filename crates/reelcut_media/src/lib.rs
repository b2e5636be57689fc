pub mod error;
pub mod probe;
pub mod resolver;

pub use resolver::FfprobeResolver;
