//! The compression panel: one explicit session state struct and the
//! operations the UI drives it with.
//!
//! State machine: `Idle -> FileSelected -> (quality/format adjusted)* ->
//! Compressing -> Compressed`, with `FileSelected` re-enterable from anywhere
//! by selecting a new file. Quality and format changes only move the
//! *estimated* readout; a real compression replaces it with the encoder's
//! measured output size.
//!
//! The session is only ever mutated from the driving context. The real
//! encode runs on the blocking pool and reports back through a
//! [`CompressOutcome`] that the driver hands to [`PanelSession::finish_compress`];
//! a selection epoch makes sure an outcome that raced a newer selection is
//! discarded instead of clobbering it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::blob::{BlobStore, BlobUrl};
use crate::config::{PanelConfig, QUALITY_MAX, QUALITY_MIN, REVEAL_DELAY_MS};
use crate::encoder::{Canvas, Encoder, SystemEncoder};
use crate::error::PanelError;
use crate::estimate::{estimate_bytes, savings_percent, to_kb};
use crate::format::TargetFormat;

/// How the file reached the panel. The picker enforces the configured media
/// type filter; a drop admits anything and lets the decoder sort it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    Picker,
    Drop,
}

/// A file as handed over by the picker or a drop event.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    FileSelected,
    Compressing,
    Compressed,
}

/// The single size display: either a pre-encode estimate or the measured
/// output of a real compression. Keeping this one value mirrors the UI's one
/// readout and keeps the estimate/actual distinction explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeReadout {
    Estimated { bytes: f64, savings_percent: i32 },
    Actual { bytes: u64, savings_percent: i32 },
}

#[derive(Debug)]
pub struct OriginalImage {
    pub url: BlobUrl,
    pub name: String,
    pub media_type: String,
    pub size_bytes: u64,
}

#[derive(Debug)]
pub struct CompressedImage {
    pub url: BlobUrl,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
    pub download_name: String,
}

/// Progress notifications for whatever is rendering the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PanelEvent {
    FileSelected {
        name: String,
        size_kb: f64,
        format: TargetFormat,
    },
    EstimateUpdated {
        quality: u8,
        estimated_kb: f64,
        savings_percent: i32,
    },
    CompressStarted {
        quality: u8,
        format: TargetFormat,
    },
    CompressFinished {
        actual_kb: f64,
        savings_percent: i32,
        download_name: String,
    },
    CompressFailed {
        reason: String,
    },
    CompressCanceled,
    RevealResult,
}

/// Cancellation handle shared between the session and a running job.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    async fn canceled(&self) {
        if self.is_canceled() {
            return;
        }
        self.notify.notified().await;
    }
}

pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A compression that has been started but not yet applied to the session.
pub struct CompressJob {
    bytes: Arc<Vec<u8>>,
    format: TargetFormat,
    quality: u8,
    epoch: u64,
    cancel: CancelToken,
    encoder: Arc<dyn Encoder>,
}

pub struct CompressOutcome {
    epoch: u64,
    result: Result<EncodedImage, PanelError>,
}

impl CompressJob {
    /// Decode, paint and re-encode off the driving context.
    ///
    /// The cancel flag is checked once, between decode and encode; the
    /// surrounding select also bails out as soon as the token fires so the
    /// driver is not stuck behind a long encode it no longer wants.
    pub async fn run(self) -> CompressOutcome {
        let CompressJob {
            bytes,
            format,
            quality,
            epoch,
            cancel,
            encoder,
        } = self;

        let flag = cancel.clone();
        let work = tokio::task::spawn_blocking(move || {
            let canvas = Canvas::from_encoded(&bytes)?;
            if flag.is_canceled() {
                return Err(PanelError::Canceled);
            }
            let encoded = encoder.encode(&canvas, format, quality)?;
            Ok(EncodedImage {
                width: canvas.width(),
                height: canvas.height(),
                bytes: encoded,
            })
        });

        let result = tokio::select! {
            res = work => match res {
                Ok(inner) => inner,
                Err(err) => Err(PanelError::Task(err.to_string())),
            },
            _ = cancel.canceled() => Err(PanelError::Canceled),
        };

        CompressOutcome { epoch, result }
    }
}

pub struct PanelSession {
    config: PanelConfig,
    encoder: Arc<dyn Encoder>,
    blobs: BlobStore,
    quality: u8,
    target: TargetFormat,
    original: Option<OriginalImage>,
    compressed: Option<CompressedImage>,
    readout: Option<SizeReadout>,
    in_flight: bool,
    drag_active: bool,
    epoch: u64,
    cancel: Option<CancelToken>,
    reveal_timer: Option<JoinHandle<()>>,
    events: UnboundedSender<PanelEvent>,
}

impl PanelSession {
    /// Build a session around a custom encoder. Events are delivered over the
    /// returned receiver. Compression and the reveal timer need a Tokio
    /// runtime.
    pub fn new(
        config: PanelConfig,
        encoder: Arc<dyn Encoder>,
    ) -> (Self, UnboundedReceiver<PanelEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let quality = config.default_quality;
        let session = Self {
            config,
            encoder,
            blobs: BlobStore::new(),
            quality,
            target: TargetFormat::Jpeg,
            original: None,
            compressed: None,
            readout: None,
            in_flight: false,
            drag_active: false,
            epoch: 0,
            cancel: None,
            reveal_timer: None,
            events,
        };
        (session, rx)
    }

    pub fn with_system_encoder(config: PanelConfig) -> (Self, UnboundedReceiver<PanelEvent>) {
        Self::new(config, Arc::new(SystemEncoder))
    }

    pub fn state(&self) -> PanelState {
        if self.in_flight {
            PanelState::Compressing
        } else if self.compressed.is_some() {
            PanelState::Compressed
        } else if self.original.is_some() {
            PanelState::FileSelected
        } else {
            PanelState::Idle
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn target_format(&self) -> TargetFormat {
        self.target
    }

    pub fn original(&self) -> Option<&OriginalImage> {
        self.original.as_ref()
    }

    pub fn compressed(&self) -> Option<&CompressedImage> {
        self.compressed.as_ref()
    }

    pub fn readout(&self) -> Option<SizeReadout> {
        self.readout
    }

    pub fn is_compression_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn set_drag_active(&mut self, active: bool) {
        self.drag_active = active;
    }

    /// Resolve a blob handle to its bytes.
    pub fn blob(&self, url: &BlobUrl) -> Option<Arc<Vec<u8>>> {
        self.blobs.get(url)
    }

    /// Bytes of the compressed artifact, if one exists.
    pub fn compressed_bytes(&self) -> Option<Arc<Vec<u8>>> {
        self.compressed.as_ref().and_then(|c| self.blobs.get(&c.url))
    }

    /// Take a file in and make it the session's source image.
    ///
    /// Supersedes anything still running: an in-flight job is canceled and a
    /// pending reveal timer aborted. The previous original and any compressed
    /// result are revoked before the new estimate is computed.
    pub fn select_file(&mut self, intake: Intake, file: SelectedFile) -> Result<(), PanelError> {
        if intake == Intake::Picker && !self.config.accepts_media_type(&file.media_type) {
            return Err(PanelError::RejectedByPicker(file.media_type));
        }
        if file.bytes.len() > self.config.max_file_size {
            return Err(PanelError::FileTooLarge {
                size: file.bytes.len(),
                limit: self.config.max_file_size,
            });
        }

        self.abort_reveal();
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.in_flight = false;
        self.epoch += 1;
        self.drag_active = false;

        if let Some(prev) = self.original.take() {
            self.blobs.revoke(&prev.url);
        }
        // The compressed result must be gone before the new estimate shows.
        if let Some(prev) = self.compressed.take() {
            self.blobs.revoke(&prev.url);
        }
        self.readout = None;

        self.target = TargetFormat::from_media_type(&file.media_type);
        let size_bytes = file.bytes.len() as u64;
        let url = self.blobs.create(file.bytes);
        info!(
            "selected '{}' ({:.2} KB, target {})",
            file.name,
            to_kb(size_bytes as f64),
            self.target
        );
        self.original = Some(OriginalImage {
            url,
            name: file.name.clone(),
            media_type: file.media_type,
            size_bytes,
        });
        self.emit(PanelEvent::FileSelected {
            name: file.name,
            size_kb: to_kb(size_bytes as f64),
            format: self.target,
        });
        self.refresh_estimate();
        Ok(())
    }

    /// Move the quality slider. Only the estimate follows; a previously
    /// compressed artifact stays untouched until the next real compression.
    pub fn set_quality(&mut self, quality: u8) -> Result<(), PanelError> {
        if !(QUALITY_MIN..=QUALITY_MAX).contains(&quality) {
            return Err(PanelError::QualityOutOfRange(quality));
        }
        self.quality = quality;
        self.refresh_estimate();
        Ok(())
    }

    /// Switch the output format and re-estimate.
    pub fn set_target_format(&mut self, format: TargetFormat) {
        self.target = format;
        self.refresh_estimate();
    }

    /// Start a compression. A silent no-op when nothing is selected or a job
    /// is already in flight (the UI disables the control in both cases).
    pub fn begin_compress(&mut self) -> Option<CompressJob> {
        let original = self.original.as_ref()?;
        if self.in_flight {
            debug!("compress requested while a job is in flight");
            return None;
        }
        let bytes = self.blobs.get(&original.url)?;

        self.abort_reveal();
        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        self.in_flight = true;
        self.emit(PanelEvent::CompressStarted {
            quality: self.quality,
            format: self.target,
        });
        Some(CompressJob {
            bytes,
            format: self.target,
            quality: self.quality,
            epoch: self.epoch,
            cancel,
            encoder: self.encoder.clone(),
        })
    }

    /// Request cancellation of the in-flight job, if any.
    pub fn cancel_compress(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }

    /// Apply a finished job. Outcomes from before the latest file selection
    /// are dropped. On success the measured size replaces the estimate and
    /// the reveal timer is armed; on decode failure nothing but the in-flight
    /// flag changes.
    pub fn finish_compress(&mut self, outcome: CompressOutcome) {
        if outcome.epoch != self.epoch {
            debug!("dropping stale compression outcome");
            return;
        }
        self.in_flight = false;
        self.cancel = None;

        match outcome.result {
            Ok(encoded) => {
                let Some(original) = &self.original else { return };
                let actual = encoded.bytes.len() as u64;
                let savings = savings_percent(original.size_bytes, actual as f64);

                if let Some(prev) = self.compressed.take() {
                    self.blobs.revoke(&prev.url);
                }
                let download_name = self.target.download_name();
                let url = self.blobs.create(encoded.bytes);
                self.compressed = Some(CompressedImage {
                    url,
                    size_bytes: actual,
                    width: encoded.width,
                    height: encoded.height,
                    download_name: download_name.clone(),
                });
                self.readout = Some(SizeReadout::Actual {
                    bytes: actual,
                    savings_percent: savings,
                });
                info!(
                    "compressed to {:.2} KB ({}% saved)",
                    to_kb(actual as f64),
                    savings
                );
                self.emit(PanelEvent::CompressFinished {
                    actual_kb: to_kb(actual as f64),
                    savings_percent: savings,
                    download_name,
                });
                self.schedule_reveal();
            }
            Err(PanelError::Canceled) => {
                info!("compression canceled");
                self.emit(PanelEvent::CompressCanceled);
            }
            Err(err) => {
                // Surfaced by the UI as a blocking alert; prior state stays.
                error!("compression failed: {}", err);
                self.emit(PanelEvent::CompressFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn refresh_estimate(&mut self) {
        let Some(original) = &self.original else { return };
        let estimated = estimate_bytes(
            &self.config.estimator,
            original.size_bytes,
            self.quality,
            self.target,
        );
        let savings = savings_percent(original.size_bytes, estimated);
        self.readout = Some(SizeReadout::Estimated {
            bytes: estimated,
            savings_percent: savings,
        });
        self.emit(PanelEvent::EstimateUpdated {
            quality: self.quality,
            estimated_kb: to_kb(estimated),
            savings_percent: savings,
        });
    }

    /// Arm the timer that brings the result into view. The handle is kept so
    /// a superseding compression or selection aborts the pending timer
    /// instead of racing it.
    fn schedule_reveal(&mut self) {
        self.abort_reveal();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(REVEAL_DELAY_MS)).await;
            let _ = events.send(PanelEvent::RevealResult);
        });
        self.reveal_timer = Some(handle);
    }

    fn abort_reveal(&mut self) {
        if let Some(handle) = self.reveal_timer.take() {
            handle.abort();
        }
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.events.send(event);
    }
}
