use reelcut_core::types::TimeUs;

use crate::error::Result;

/// A media output the synchronizer drives: a video surface or an audio sink.
///
/// Only the `PlaybackSynchronizer` should call the mutating methods.
pub trait OutputElement {
    /// Media reference currently loaded, if any.
    fn source(&self) -> Option<&str>;

    fn load(&mut self, media_ref: &str) -> Result<()>;

    fn position(&self) -> Result<TimeUs>;

    fn seek(&mut self, position: TimeUs) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn is_paused(&self) -> bool;
}
