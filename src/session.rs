//! Session wiring
//!
//! A [`Session`] owns the shared orientation buffer, the caption model and
//! the two worker threads. Each rendering context gets its own
//! [`FrameDriver`], which carries the filter, projection and jiggle state
//! for that context.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::captions::{CaptionModel, CaptionScript, CaptionStream, CaptionStreamReport};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::orientation::{
    bind_socket, DatagramSource, IngestHandle, IngestReport, OrientationBuffer, OrientationFilter,
    OrientationIngest,
};
use crate::presenter::{CaptionSurface, Placement, Presenter};
use crate::projection::{FovBounds, Projector};
use crate::signal::{StartGate, StopFlag};

/// Per-frame pipeline: filter, project, place, draw
#[derive(Debug)]
pub struct FrameDriver {
    filter: OrientationFilter,
    presenter: Presenter,
    model: Arc<CaptionModel>,
    horizontal: Projector,
    horizontal_bounds: FovBounds,
    vertical: Option<Projector>,
    vertical_bounds: FovBounds,
    frames: u64,
}

impl FrameDriver {
    pub fn new(
        config: &SessionConfig,
        buffer: Arc<OrientationBuffer>,
        model: Arc<CaptionModel>,
    ) -> Self {
        let projection = &config.projection;
        let vertical = projection
            .vertical_tracking
            .then(|| Projector::new(projection.jiggle_threshold_px));
        Self {
            filter: OrientationFilter::new(
                buffer,
                config.filter.policy,
                config.filter.exponential,
            ),
            presenter: Presenter::from_config(config),
            model,
            horizontal: Projector::new(projection.jiggle_threshold_px),
            horizontal_bounds: projection.horizontal_bounds(),
            vertical,
            vertical_bounds: projection.vertical_bounds(),
            frames: 0,
        }
    }

    /// Run one frame against `surface`.
    ///
    /// Only the orientation lock is taken; returns the placement drawn, or
    /// `None` when there is no caption to show.
    pub fn on_frame<S: CaptionSurface + ?Sized>(&mut self, surface: &mut S) -> Option<Placement> {
        self.frames += 1;
        let caption = self.model.current();

        if !self.presenter.method().follows_orientation() {
            return self.presenter.present(surface, caption, None, None);
        }

        let (width, height) = surface.size();
        let ppr = self.horizontal.pixels_per_radian(self.horizontal_bounds, width);
        let center = self
            .horizontal
            .bounds()
            .unwrap_or(self.horizontal_bounds)
            .midpoint();
        let azimuth = self.filter.azimuth(center, ppr);
        let x = self.horizontal.project(azimuth, self.horizontal_bounds, width);

        let y = match self.vertical.as_mut() {
            Some(vertical) if self.filter.buffer().has_pitch() => {
                Some(vertical.project(self.filter.pitch(), self.vertical_bounds, height))
            }
            _ => None,
        };

        self.presenter.present(surface, caption, Some(x), y)
    }

    /// Frames processed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn horizontal(&self) -> &Projector {
        &self.horizontal
    }
}

/// Exit status of both workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub ingest: IngestReport,
    pub captions: CaptionStreamReport,
}

/// A running caption session
pub struct Session {
    config: SessionConfig,
    buffer: Arc<OrientationBuffer>,
    model: Arc<CaptionModel>,
    gate: Arc<StartGate>,
    stop: StopFlag,
    local_addr: Option<SocketAddr>,
    ingest: IngestHandle,
    captions: CaptionStream,
}

impl Session {
    /// Validate `config`, load the caption script, bind the orientation
    /// socket and start both workers.
    pub fn start(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let script_path = config.script_path();
        let script = CaptionScript::from_file(&script_path)?;
        tracing::info!(
            "Loaded {} captions from {}",
            script.len(),
            script_path.display()
        );

        let socket = bind_socket(
            config.orientation.socket_addr()?,
            config.orientation.poll_interval(),
        )?;
        let local_addr = socket.local_addr()?;

        let mut session = Self::with_source(config, socket, &script)?;
        session.local_addr = Some(local_addr);
        tracing::info!(
            "{}:{} {}",
            local_addr.ip(),
            local_addr.port(),
            session.config.presentation.id()
        );
        tracing::info!(
            "Video for section {}: {}",
            session.config.video_section,
            session.config.video_path().display()
        );
        Ok(session)
    }

    /// Start a session reading orientation from `source`
    pub fn with_source<S>(config: SessionConfig, source: S, script: &CaptionScript) -> Result<Self>
    where
        S: DatagramSource + 'static,
    {
        let buffer = Arc::new(OrientationBuffer::new(config.orientation.window_capacity));

        let model = if config.captions.use_bitmaps {
            CaptionModel::with_bitmaps(script, &config.bitmap_dir(), config.captions.blur_level)
        } else {
            CaptionModel::from_script(script)
        };
        let model = Arc::new(model);

        let mut delays = script.inter_caption_delays();
        delays.truncate(model.len());

        let stop = StopFlag::new();
        let gate = Arc::new(StartGate::new());

        let ingest = IngestHandle::spawn(OrientationIngest::new(
            source,
            Arc::clone(&buffer),
            stop.clone(),
        ))?;
        let captions = match CaptionStream::spawn(Arc::clone(&gate), delays, Arc::clone(&model)) {
            Ok(captions) => captions,
            Err(e) => {
                // don't leave the ingest worker running
                if let Err(join_err) = ingest.stop_and_join() {
                    tracing::warn!("{}", join_err);
                }
                return Err(e);
            }
        };

        Ok(Self {
            config,
            buffer,
            model,
            gate,
            stop,
            local_addr: None,
            ingest,
            captions,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn buffer(&self) -> &Arc<OrientationBuffer> {
        &self.buffer
    }

    pub fn model(&self) -> &Arc<CaptionModel> {
        &self.model
    }

    /// Bound orientation address, when listening on a socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// New render pipeline with its own projection state
    pub fn frame_driver(&self) -> FrameDriver {
        FrameDriver::new(&self.config, Arc::clone(&self.buffer), Arc::clone(&self.model))
    }

    /// Signal that playback has started. Returns false if it already had.
    pub fn start_playback(&self) -> bool {
        let opened = self.gate.open();
        if opened {
            tracing::info!("Playback started");
        }
        opened
    }

    pub fn ingest_finished(&self) -> bool {
        self.ingest.is_finished()
    }

    pub fn captions_finished(&self) -> bool {
        self.captions.is_finished()
    }

    /// Stop both workers and wait for them
    pub fn shutdown(self) -> Result<SessionReport> {
        tracing::info!("Shutting down session");
        self.stop.stop();
        // join both before reporting either failure
        let captions = self.captions.cancel_and_join();
        let ingest = self.ingest.stop_and_join();
        let (captions, ingest) = match (captions, ingest) {
            (Ok(captions), Ok(ingest)) => (captions, ingest),
            (Err(e), ingest) => {
                if let Ok(ingest) = ingest {
                    tracing::warn!(
                        accepted = ingest.stats.accepted,
                        dropped = ingest.stats.dropped,
                        "Orientation ingest stopped: {:?}",
                        ingest.exit
                    );
                }
                return Err(e);
            }
            (Ok(_), Err(e)) => return Err(e),
        };
        tracing::info!(
            accepted = ingest.stats.accepted,
            dropped = ingest.stats.dropped,
            captions = captions.advanced,
            "Session stopped"
        );
        Ok(SessionReport { ingest, captions })
    }
}
