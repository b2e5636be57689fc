//! The editor session: sole owner of the timeline, library, transport,
//! editing surface and output elements.
//!
//! Every mutating entry point finishes with a reconciliation pass, so the
//! outputs always reflect the state a reader would observe.

use reelcut_core::active::{resolve_active, ActiveClip};
use reelcut_core::library::AssetPool;
use reelcut_core::resolve::{DurationResolver, PlaceRequest, ResolvedPlacement};
use reelcut_core::ruler::{ruler_ticks, RulerTicks};
use reelcut_core::settings::EditorSettings;
use reelcut_core::surface::{clip_geometry, reposition, ClipGeometry, DropAction, EditingSurface, TimeScale, TrimEdge};
use reelcut_core::timeline::Timeline;
use reelcut_core::transport::{TickOutcome, Transport};
use reelcut_core::types::{Asset, Clip, TimeUs};
use reelcut_core::Result;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::clock::{FrameClock, Tick};
use crate::output::OutputElement;
use crate::sync::{OutputTarget, PlaybackSynchronizer};

struct ClockBinding {
    clock: FrameClock,
    tx: UnboundedSender<Tick>,
}

pub struct EditorSession<V, A> {
    timeline: Timeline,
    library: AssetPool,
    transport: Transport,
    surface: EditingSurface,
    selected_clip: Option<Uuid>,
    library_preview: Option<Uuid>,
    sync: PlaybackSynchronizer<V, A>,
    clock: Option<ClockBinding>,
    output: OutputTarget,
}

impl<V: OutputElement, A: OutputElement> EditorSession<V, A> {
    pub fn new(settings: &EditorSettings, video: V, audio: A) -> Self {
        let mut session = Self {
            timeline: Timeline::new(),
            library: AssetPool::new(),
            transport: Transport::with_frame_rate(settings.frame_rate),
            surface: EditingSurface::new(TimeScale::new(settings.pixels_per_second, settings.initial_zoom)),
            selected_clip: None,
            library_preview: None,
            sync: PlaybackSynchronizer::new(video, audio, settings.drift_tolerance()),
            clock: None,
            output: OutputTarget::Blank,
        };
        session.refresh();
        session
    }

    // -- read access ---------------------------------------------------------

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn library(&self) -> &AssetPool {
        &self.library
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn surface(&self) -> &EditingSurface {
        &self.surface
    }

    pub fn synchronizer(&self) -> &PlaybackSynchronizer<V, A> {
        &self.sync
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub fn selected_clip(&self) -> Option<Uuid> {
        self.selected_clip
    }

    pub fn is_selected(&self, timeline_id: Uuid) -> bool {
        self.selected_clip == Some(timeline_id)
    }

    pub fn active(&self) -> Option<ActiveClip<'_>> {
        let preview = self.library_preview.and_then(|id| self.library.get(id));
        resolve_active(
            self.transport.playhead(),
            self.timeline.clips(),
            self.selected_clip,
            preview,
        )
    }

    /// Ruler ticks for the current zoom and timeline length.
    pub fn ruler(&self) -> RulerTicks {
        ruler_ticks(self.transport.total_duration(), self.surface.scale())
    }

    /// Where each clip is drawn, in timeline order.
    pub fn clip_layout(&self) -> impl Iterator<Item = (&Clip, ClipGeometry)> + '_ {
        let scale = *self.surface.scale();
        self.timeline.clips().iter().map(move |c| (c, clip_geometry(c, &scale)))
    }

    pub fn playhead_x(&self) -> f64 {
        self.surface.scale().time_to_x(self.transport.playhead())
    }

    // -- clock ---------------------------------------------------------------

    /// Hand the session a clock. It runs exactly while the transport does.
    pub fn attach_clock(&mut self, clock: FrameClock, tx: UnboundedSender<Tick>) {
        self.clock = Some(ClockBinding { clock, tx });
        self.sync_clock();
    }

    /// Process a clock tick. Ticks from a run that has since been stopped are
    /// dropped, so a queued tick can never revive playback.
    pub fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        if let Some(binding) = &self.clock {
            if !binding.clock.is_current(tick) {
                return TickOutcome::Idle;
            }
        }
        self.advance_frame()
    }

    /// Advance one frame and reconcile.
    pub fn advance_frame(&mut self) -> TickOutcome {
        let outcome = self.transport.tick();
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Advanced => self.reconcile(),
            TickOutcome::ReachedEnd => {
                self.sync_clock();
                self.reconcile();
            }
        }
        outcome
    }

    fn sync_clock(&mut self) {
        let running = self.transport.is_running();
        if let Some(binding) = &mut self.clock {
            if running && !binding.clock.is_running() {
                binding.clock.start(binding.tx.clone());
            } else if !running && binding.clock.is_running() {
                binding.clock.stop();
            }
        }
    }

    // -- transport -----------------------------------------------------------

    pub fn toggle_play(&mut self) {
        self.transport.toggle_play();
        self.sync_clock();
        self.reconcile();
    }

    pub fn seek(&mut self, t: TimeUs) {
        self.transport.seek(t);
        self.reconcile();
    }

    // -- selection -----------------------------------------------------------

    /// Pick a timeline clip for inspection, or clear the pick.
    pub fn select_clip(&mut self, timeline_id: Option<Uuid>) {
        self.selected_clip = timeline_id.filter(|id| self.timeline.clip(*id).is_some());
        self.reconcile();
    }

    /// Preview a library asset whenever nothing on the timeline is active.
    pub fn preview_library_asset(&mut self, asset_id: Option<Uuid>) {
        self.library_preview = asset_id.filter(|id| self.library.get(*id).is_some());
        self.reconcile();
    }

    // -- library -------------------------------------------------------------

    pub fn add_asset(&mut self, asset: Asset) -> Uuid {
        self.library.add(asset)
    }

    /// Remove a library asset. Clips already placed from it stay.
    pub fn remove_asset(&mut self, asset_id: Uuid) -> Option<Asset> {
        let removed = self.library.remove(asset_id);
        if self.library_preview == Some(asset_id) {
            self.library_preview = None;
            self.reconcile();
        }
        removed
    }

    // -- drops ---------------------------------------------------------------

    /// Handle a drop at viewport x. Repositions apply immediately and return
    /// `None`; a library drop returns the placement to resolve. Malformed
    /// payloads and unknown ids are logged and ignored.
    pub fn accept_drop(&mut self, raw_payload: &str, x: f64) -> Option<PlaceRequest> {
        match self.surface.drop_action(raw_payload, x)? {
            DropAction::Place { source_id, start_time } => match self.library.get(source_id) {
                Some(asset) => Some(PlaceRequest {
                    asset: asset.clone(),
                    start_time,
                }),
                None => {
                    tracing::warn!(asset = %source_id, "Dropped asset is not in the library");
                    None
                }
            },
            DropAction::Reposition { timeline_id, start_time } => {
                match reposition(&mut self.timeline, timeline_id, start_time) {
                    Ok(()) => self.refresh(),
                    Err(e) => tracing::warn!(error = %e, "Ignoring reposition"),
                }
                None
            }
        }
    }

    /// Commit a resolved placement. A failed resolution is returned to the
    /// caller for display; nothing is placed.
    pub fn commit_placement(&mut self, placement: Result<ResolvedPlacement>) -> Result<Uuid> {
        let placement = placement.map_err(|e| {
            tracing::warn!(error = %e, "Placement failed");
            e
        })?;
        self.library.record_duration(placement.asset.id, placement.duration);
        let id = self
            .timeline
            .place(&placement.asset, placement.duration, placement.start_time)
            .timeline_id;
        tracing::info!(clip = %id, asset = %placement.asset.name, start = %placement.start_time, "Placed on timeline");
        self.refresh();
        Ok(id)
    }

    /// `accept_drop`, resolve and commit in one go. `Ok(None)` when the drop
    /// placed nothing new.
    pub async fn drop_payload<R: DurationResolver>(&mut self, resolver: &R, raw_payload: &str, x: f64) -> Result<Option<Uuid>> {
        let Some(request) = self.accept_drop(raw_payload, x) else {
            return Ok(None);
        };
        let placement = request.resolve(resolver).await;
        self.commit_placement(placement).map(Some)
    }

    // -- clip editing --------------------------------------------------------

    pub fn remove_clip(&mut self, timeline_id: Uuid) -> Option<Clip> {
        let removed = self.timeline.remove(timeline_id)?;
        if self.selected_clip == Some(timeline_id) {
            self.selected_clip = None;
        }
        self.refresh();
        Some(removed)
    }

    /// Pointer-down on a clip edge. Returns false for an unknown clip.
    pub fn begin_trim(&mut self, timeline_id: Uuid, edge: TrimEdge, x: f64) -> bool {
        match self.timeline.clip(timeline_id) {
            Some(clip) => {
                self.surface.begin_trim(clip, edge, x);
                true
            }
            None => false,
        }
    }

    /// Pointer-down on the playhead.
    pub fn begin_scrub(&mut self, x: f64) {
        self.surface.begin_scrub(x, &mut self.transport);
        self.reconcile();
    }

    pub fn pointer_move(&mut self, x: f64) {
        if self.surface.pointer_move(x, &mut self.timeline, &mut self.transport) {
            self.refresh();
        }
    }

    pub fn pointer_up(&mut self, x: f64) {
        if self.surface.pointer_up(x, &mut self.timeline, &mut self.transport) {
            self.refresh();
        }
    }

    /// The editing surface is going away: close any open gesture.
    pub fn teardown(&mut self) {
        self.surface.cancel();
    }

    // -- view ----------------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.surface.scale_mut().zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.surface.scale_mut().zoom_out();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.surface.scale_mut().set_zoom(zoom);
    }

    pub fn set_scroll_offset(&mut self, px: f64) {
        self.surface.scale_mut().set_scroll_offset(px);
    }

    // -- reconciliation ------------------------------------------------------

    fn refresh(&mut self) {
        self.transport.set_total_duration(self.timeline.total_duration());
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let preview = self.library_preview.and_then(|id| self.library.get(id));
        let active = resolve_active(
            self.transport.playhead(),
            self.timeline.clips(),
            self.selected_clip,
            preview,
        );
        self.output = self.sync.reconcile(active.as_ref(), self.transport.is_running());
    }
}
