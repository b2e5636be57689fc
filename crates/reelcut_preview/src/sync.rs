//! Reconciles the output elements with (active clip, run state, offset).
//!
//! `reconcile` is called after every state change. It works out what each
//! element should be doing and only issues the commands that differ from what
//! the element reports, so repeated passes over unchanged state are silent.

use reelcut_core::active::ActiveClip;
use reelcut_core::types::{MediaKind, TimeUs};

use crate::output::OutputElement;

/// Which output is live after a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Blank,
    /// A still image shown statically.
    Still(String),
    Video,
    Audio,
}

pub struct PlaybackSynchronizer<V, A> {
    video: V,
    audio: A,
    still: Option<String>,
    drift_tolerance: TimeUs,
}

impl<V: OutputElement, A: OutputElement> PlaybackSynchronizer<V, A> {
    pub fn new(video: V, audio: A, drift_tolerance: TimeUs) -> Self {
        Self {
            video,
            audio,
            still: None,
            drift_tolerance,
        }
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    #[cfg(test)]
    pub(crate) fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn still(&self) -> Option<&str> {
        self.still.as_deref()
    }

    pub fn drift_tolerance(&self) -> TimeUs {
        self.drift_tolerance
    }

    /// Bring both elements in line with `active` and `running`. Element
    /// failures are logged and never propagate.
    pub fn reconcile(&mut self, active: Option<&ActiveClip<'_>>, running: bool) -> OutputTarget {
        let Some(active) = active else {
            pause_if_playing(&mut self.video, "video");
            pause_if_playing(&mut self.audio, "audio");
            self.still = None;
            return OutputTarget::Blank;
        };

        match active.kind() {
            MediaKind::Image => {
                pause_if_playing(&mut self.audio, "audio");
                pause_if_playing(&mut self.video, "video");
                let media_ref = active.media_ref();
                if self.video.source() != Some(media_ref) {
                    match self.video.load(media_ref) {
                        Ok(()) => tracing::debug!(media = media_ref, "Showing still"),
                        Err(e) => tracing::warn!(media = media_ref, error = %e, "Output failed to load still"),
                    }
                }
                self.still = Some(media_ref.to_string());
                OutputTarget::Still(media_ref.to_string())
            }
            MediaKind::Video => {
                self.still = None;
                pause_if_playing(&mut self.audio, "audio");
                drive(&mut self.video, "video", active, running, self.drift_tolerance);
                OutputTarget::Video
            }
            MediaKind::Audio => {
                self.still = None;
                pause_if_playing(&mut self.video, "video");
                drive(&mut self.audio, "audio", active, running, self.drift_tolerance);
                OutputTarget::Audio
            }
        }
    }
}

fn drive<E: OutputElement>(
    element: &mut E,
    role: &str,
    active: &ActiveClip<'_>,
    running: bool,
    tolerance: TimeUs,
) {
    let media_ref = active.media_ref();
    if element.source() != Some(media_ref) {
        if let Err(e) = element.load(media_ref) {
            tracing::warn!(role, media = media_ref, error = %e, "Output failed to load media");
            // The old source must not keep running in place of the new one.
            pause_if_playing(element, role);
            return;
        }
    }

    if let Some(target) = active.source_offset() {
        let drifted = match element.position() {
            Ok(position) => (position - target).abs() > tolerance,
            Err(_) => true,
        };
        if drifted {
            if let Err(e) = element.seek(target) {
                tracing::warn!(role, target = %target, error = %e, "Output seek failed");
            }
        }
    }

    if running {
        if element.is_paused() {
            if let Err(e) = element.play() {
                tracing::warn!(role, error = %e, "Output refused to play");
            }
        }
    } else {
        pause_if_playing(element, role);
    }
}

fn pause_if_playing<E: OutputElement>(element: &mut E, role: &str) {
    if !element.is_paused() {
        if let Err(e) = element.pause() {
            tracing::warn!(role, error = %e, "Output failed to pause");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::{PreviewError, Result};

    /// In-memory element that records every command it receives.
    #[derive(Debug, Default)]
    pub struct FakeOutput {
        pub source: Option<String>,
        pub position: TimeUs,
        pub paused: bool,
        pub refuse_play: bool,
        pub fail_load: bool,
        pub fail_seek: bool,
        pub fail_position: bool,
        pub log: Vec<String>,
    }

    impl FakeOutput {
        pub fn new() -> Self {
            Self {
                paused: true,
                ..Self::default()
            }
        }

        pub fn take_log(&mut self) -> Vec<String> {
            std::mem::take(&mut self.log)
        }
    }

    impl OutputElement for FakeOutput {
        fn source(&self) -> Option<&str> {
            self.source.as_deref()
        }

        fn load(&mut self, media_ref: &str) -> Result<()> {
            self.log.push(format!("load {media_ref}"));
            if self.fail_load {
                return Err(PreviewError::Rejected(format!("cannot open {media_ref}")));
            }
            self.source = Some(media_ref.to_string());
            self.position = TimeUs::ZERO;
            Ok(())
        }

        fn position(&self) -> Result<TimeUs> {
            if self.fail_position {
                return Err(PreviewError::Ipc("property unavailable".into()));
            }
            Ok(self.position)
        }

        fn seek(&mut self, position: TimeUs) -> Result<()> {
            self.log.push(format!("seek {}", position.as_seconds()));
            if self.fail_seek {
                return Err(PreviewError::Rejected("seek failed".into()));
            }
            self.position = position;
            Ok(())
        }

        fn play(&mut self) -> Result<()> {
            self.log.push("play".into());
            if self.refuse_play {
                return Err(PreviewError::Rejected("autoplay blocked".into()));
            }
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            self.log.push("pause".into());
            self.paused = true;
            Ok(())
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeOutput;
    use super::*;
    use reelcut_core::types::Clip;
    use uuid::Uuid;

    fn secs(s: f64) -> TimeUs {
        TimeUs::from_seconds(s)
    }

    fn clip(kind: MediaKind, media_ref: &str) -> Clip {
        Clip {
            timeline_id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            kind,
            media_ref: media_ref.into(),
            intrinsic_duration: secs(10.0),
            start_time: TimeUs::ZERO,
            trim_start: TimeUs::ZERO,
            trim_end: TimeUs::ZERO,
        }
    }

    fn synchronizer() -> PlaybackSynchronizer<FakeOutput, FakeOutput> {
        PlaybackSynchronizer::new(FakeOutput::new(), FakeOutput::new(), secs(0.2))
    }

    fn at(clip: &Clip, offset: f64) -> ActiveClip<'_> {
        ActiveClip::Playhead {
            clip,
            source_offset: secs(offset),
        }
    }

    #[test]
    fn running_video_loads_seeks_and_plays() {
        let mut sync = synchronizer();
        let c = clip(MediaKind::Video, "/a.mp4");

        let target = sync.reconcile(Some(&at(&c, 5.0)), true);

        assert_eq!(target, OutputTarget::Video);
        assert_eq!(sync.video.take_log(), vec!["load /a.mp4", "seek 5", "play"]);
        assert!(sync.audio.take_log().is_empty());
    }

    #[test]
    fn unchanged_state_issues_no_commands() {
        let mut sync = synchronizer();
        let c = clip(MediaKind::Video, "/a.mp4");
        sync.reconcile(Some(&at(&c, 5.0)), true);
        sync.video.take_log();

        sync.reconcile(Some(&at(&c, 5.0)), true);
        assert!(sync.video.take_log().is_empty());
    }

    #[test]
    fn drift_within_tolerance_is_left_alone() {
        let mut sync = synchronizer();
        let c = clip(MediaKind::Video, "/a.mp4");
        sync.reconcile(Some(&at(&c, 1.0)), true);
        sync.video.take_log();

        sync.video.position = secs(1.15);
        sync.reconcile(Some(&at(&c, 1.0)), true);
        assert!(sync.video.take_log().is_empty());

        sync.video.position = secs(1.3);
        sync.reconcile(Some(&at(&c, 1.0)), true);
        assert_eq!(sync.video.take_log(), vec!["seek 1"]);
    }

    #[test]
    fn stopping_pauses_the_element() {
        let mut sync = synchronizer();
        let c = clip(MediaKind::Video, "/a.mp4");
        sync.reconcile(Some(&at(&c, 0.0)), true);
        sync.video.take_log();

        sync.reconcile(Some(&at(&c, 0.0)), false);
        assert_eq!(sync.video.take_log(), vec!["pause"]);
        assert!(sync.video.is_paused());
    }

    #[test]
    fn switching_kind_pauses_the_other_element() {
        let mut sync = synchronizer();
        let v = clip(MediaKind::Video, "/a.mp4");
        let a = clip(MediaKind::Audio, "/b.wav");
        sync.reconcile(Some(&at(&v, 4.9)), true);
        sync.video.take_log();

        let target = sync.reconcile(Some(&at(&a, 0.0)), true);

        assert_eq!(target, OutputTarget::Audio);
        assert_eq!(sync.video.take_log(), vec!["pause"]);
        assert_eq!(sync.audio.take_log(), vec!["load /b.wav", "play"]);
    }

    #[test]
    fn switching_source_reloads() {
        let mut sync = synchronizer();
        let first = clip(MediaKind::Video, "/a.mp4");
        let second = clip(MediaKind::Video, "/c.mp4");
        sync.reconcile(Some(&at(&first, 2.0)), true);
        sync.video.take_log();

        sync.reconcile(Some(&at(&second, 2.0)), true);
        assert_eq!(sync.video.take_log(), vec!["load /c.mp4", "seek 2"]);
    }

    #[test]
    fn images_are_static() {
        let mut sync = synchronizer();
        let v = clip(MediaKind::Video, "/a.mp4");
        let img = clip(MediaKind::Image, "/still.png");
        sync.reconcile(Some(&at(&v, 0.0)), true);
        sync.video.take_log();

        let target = sync.reconcile(Some(&at(&img, 3.0)), true);

        assert_eq!(target, OutputTarget::Still("/still.png".into()));
        assert_eq!(sync.still(), Some("/still.png"));
        assert_eq!(sync.video.take_log(), vec!["pause", "load /still.png"]);
        assert!(sync.video.is_paused());
        assert!(sync.audio.take_log().is_empty());

        // Later frames over the same still are silent and never seek.
        sync.reconcile(Some(&at(&img, 4.0)), true);
        assert!(sync.video.take_log().is_empty());
    }

    #[test]
    fn still_that_fails_to_load_leaves_video_paused() {
        let mut sync = synchronizer();
        let v = clip(MediaKind::Video, "/a.mp4");
        let img = clip(MediaKind::Image, "/missing.png");
        sync.reconcile(Some(&at(&v, 0.0)), true);
        sync.video.fail_load = true;

        let target = sync.reconcile(Some(&at(&img, 0.0)), true);
        assert_eq!(target, OutputTarget::Still("/missing.png".into()));
        assert!(sync.video.is_paused());
        assert_eq!(sync.video.source.as_deref(), Some("/a.mp4"));
    }

    #[test]
    fn nothing_active_blanks_output() {
        let mut sync = synchronizer();
        let a = clip(MediaKind::Audio, "/b.wav");
        sync.reconcile(Some(&at(&a, 0.0)), true);

        assert_eq!(sync.reconcile(None, true), OutputTarget::Blank);
        assert!(sync.audio.is_paused());
        assert_eq!(sync.still(), None);
    }

    #[test]
    fn selected_clip_is_not_seeked() {
        let mut sync = synchronizer();
        let c = clip(MediaKind::Video, "/a.mp4");
        sync.reconcile(Some(&ActiveClip::Selected(&c)), false);
        assert_eq!(sync.video.take_log(), vec!["load /a.mp4"]);
    }

    #[test]
    fn failed_load_pauses_previous_media_when_stopped() {
        let mut sync = synchronizer();
        let good = clip(MediaKind::Video, "/a.mp4");
        let broken = clip(MediaKind::Video, "/broken.mp4");
        sync.reconcile(Some(&at(&good, 1.0)), true);
        sync.video.fail_load = true;
        sync.video.take_log();

        sync.reconcile(Some(&at(&broken, 0.0)), false);
        assert_eq!(sync.video.take_log(), vec!["load /broken.mp4", "pause"]);
        assert!(sync.video.is_paused());
        assert_eq!(sync.video.source.as_deref(), Some("/a.mp4"));
    }

    #[test]
    fn failed_load_pauses_previous_media_while_running() {
        let mut sync = synchronizer();
        let good = clip(MediaKind::Video, "/a.mp4");
        let broken = clip(MediaKind::Video, "/broken.mp4");
        sync.reconcile(Some(&at(&good, 1.0)), true);
        sync.video.fail_load = true;

        assert_eq!(sync.reconcile(Some(&at(&broken, 0.0)), true), OutputTarget::Video);
        assert!(sync.video.is_paused());

        // Recovers once the media becomes loadable.
        sync.video.fail_load = false;
        sync.video.take_log();
        sync.reconcile(Some(&at(&broken, 0.5)), true);
        assert_eq!(sync.video.take_log(), vec!["load /broken.mp4", "seek 0.5", "play"]);
        assert!(!sync.video.is_paused());
    }

    #[test]
    fn failed_seek_still_follows_run_state() {
        let mut sync = synchronizer();
        sync.video.fail_seek = true;
        let c = clip(MediaKind::Video, "/a.mp4");

        sync.reconcile(Some(&at(&c, 5.0)), true);
        assert_eq!(sync.video.take_log(), vec!["load /a.mp4", "seek 5", "play"]);
        assert!(!sync.video.is_paused());

        sync.reconcile(Some(&at(&c, 5.0)), false);
        assert_eq!(sync.video.take_log(), vec!["seek 5", "pause"]);
        assert!(sync.video.is_paused());
    }

    #[test]
    fn unreadable_position_forces_seek() {
        let mut sync = synchronizer();
        let c = clip(MediaKind::Audio, "/b.wav");
        sync.reconcile(Some(&at(&c, 1.0)), true);
        sync.audio.take_log();

        sync.audio.fail_position = true;
        sync.reconcile(Some(&at(&c, 1.0)), true);
        assert_eq!(sync.audio.take_log(), vec!["seek 1"]);
        assert!(!sync.audio.is_paused());
    }

    #[test]
    fn refused_play_is_not_fatal() {
        let mut sync = synchronizer();
        sync.video.refuse_play = true;
        let c = clip(MediaKind::Video, "/a.mp4");

        assert_eq!(sync.reconcile(Some(&at(&c, 0.0)), true), OutputTarget::Video);
        assert_eq!(sync.video.take_log(), vec!["load /a.mp4", "play"]);

        // Retried on the next pass.
        sync.reconcile(Some(&at(&c, 0.0)), true);
        assert_eq!(sync.video.take_log(), vec!["play"]);
    }
}
