//! Command dispatch for an interactive import surface.
//!
//! `App` ties the importer, history view and scanner together and keeps a
//! single status line, the way a paste/scan/clear screen would.

use crate::capture::{BarcodeDecoder, Camera, CaptureError, Handoff, ScanEnd, Scanner};
use crate::history::{self, HistoryRow};
use crate::pipeline::Importer;
use crate::status::Status;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Import pasted or scanned packet text.
    Import(String),
    /// Delete every stored record.
    Clear,
    /// Reload the history view from the store.
    Refresh,
    /// Start capture when idle, stop it when capturing.
    ToggleScan,
}

pub struct App {
    importer: Importer,
    camera: Option<Arc<dyn Camera>>,
    decoder: Option<Arc<dyn BarcodeDecoder>>,
    scanner: Scanner,
    status: Status,
    history: Vec<HistoryRow>,
}

impl App {
    pub fn new(importer: Importer) -> Self {
        Self {
            importer,
            camera: None,
            decoder: None,
            scanner: Scanner::new(),
            status: Status::default(),
            history: Vec::new(),
        }
    }

    /// Enable QR capture with the given camera and decoder.
    pub fn with_capture(
        mut self,
        camera: Arc<dyn Camera>,
        decoder: Arc<dyn BarcodeDecoder>,
    ) -> Self {
        self.camera = Some(camera);
        self.decoder = Some(decoder);
        self
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn history(&self) -> &[HistoryRow] {
        &self.history
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub async fn dispatch(&mut self, command: Command) -> &Status {
        self.settle_scan().await;
        match command {
            Command::Import(text) => self.import(&text).await,
            Command::Clear => self.clear().await,
            Command::Refresh => {
                if let Err(status) = self.refresh().await {
                    self.status = status;
                }
            }
            Command::ToggleScan => self.toggle_scan().await,
        }
        &self.status
    }

    /// Wait for the running capture to finish on its own and report its outcome.
    pub async fn complete_scan(&mut self) -> &Status {
        let end = self.scanner.decoded().await;
        self.apply_scan_end(end).await;
        &self.status
    }

    /// Pick up the outcome of a capture loop that ended since the last command.
    async fn settle_scan(&mut self) {
        if self.scanner.is_finished() {
            let end = self.scanner.decoded().await;
            self.apply_scan_end(end).await;
        }
    }

    async fn apply_scan_end(&mut self, end: Result<ScanEnd, CaptureError>) {
        match end {
            Ok(ScanEnd::Stopped) => self.status = Status::muted("Scanner stopped."),
            Ok(ScanEnd::Decoded {
                handoff: Some(status),
                ..
            }) => {
                self.status = status;
                if !self.status.is_err() {
                    if let Err(status) = self.refresh().await {
                        self.status = status;
                    }
                }
            }
            Ok(ScanEnd::Decoded {
                text,
                handoff: None,
            }) => self.import(&text).await,
            Err(err) => self.status = use_paste(&err),
        }
    }

    async fn import(&mut self, text: &str) {
        match self.importer.import_text(text).await {
            Ok(_) => {
                self.status = Status::ok("Imported");
                if let Err(status) = self.refresh().await {
                    self.status = status;
                }
            }
            Err(err) => self.status = Status::from_error(&err),
        }
    }

    async fn clear(&mut self) {
        match self.importer.store().clear_all_async().await {
            Ok(removed) => {
                info!(target: "insight::store", removed, "local data cleared");
                self.status = match self.refresh().await {
                    Ok(()) => Status::ok("Cleared local data"),
                    Err(status) => status,
                };
            }
            Err(err) => self.status = Status::from_error(&err),
        }
    }

    async fn refresh(&mut self) -> Result<(), Status> {
        let records = self
            .importer
            .store()
            .list_all_async()
            .await
            .map_err(|err| Status::from_error(&err))?;
        self.history = history::render(&records);
        Ok(())
    }

    async fn toggle_scan(&mut self) {
        if self.scanner.is_capturing() {
            let end = self.scanner.stop().await;
            self.apply_scan_end(end).await;
            return;
        }
        let (Some(camera), Some(decoder)) = (self.camera.clone(), self.decoder.clone()) else {
            self.status = use_paste(&CaptureError::Unsupported("no camera available".into()));
            return;
        };
        let handoff: Arc<dyn Handoff> = Arc::new(self.importer.clone());
        match self
            .scanner
            .start_with_handoff(camera.as_ref(), decoder, Some(handoff))
            .await
        {
            Ok(()) => self.status = Status::muted("Scanning… aim camera at QR"),
            Err(err) => {
                warn!(target: "insight::capture", error = %err, "capture failed to start");
                self.status = use_paste(&err);
            }
        }
    }
}

/// Scanned packets are imported from the capture task as soon as they decode.
#[async_trait]
impl Handoff for Importer {
    async fn deliver(&self, text: String) -> Status {
        match self.import_text(&text).await {
            Ok(_) => Status::ok("Imported"),
            Err(err) => Status::from_error(&err),
        }
    }
}

fn use_paste(err: &CaptureError) -> Status {
    Status::err(format!("{err}. Use paste."))
}
