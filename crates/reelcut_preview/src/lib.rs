pub mod clock;
pub mod error;
#[cfg(unix)]
pub mod mpv;
pub mod output;
pub mod session;
pub mod sync;

pub use error::{PreviewError, Result};
pub use session::EditorSession;
