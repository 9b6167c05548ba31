//! QR capture from a line-oriented decoder feed.
//!
//! Tools such as `zbarcam --raw` print one decoded code per line; each line
//! is treated as one frame and an empty line as a frame with no code.

use super::util::{runtime, Context};
use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use insight_core::{
    App, BarcodeDecoder, Camera, CaptureError, Command, Frame, FrameSource, Status,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

#[derive(Args)]
pub struct ScanArgs {
    /// Decoder output to read; `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: String,
}

enum FeedInput {
    Stdin,
    File(PathBuf),
}

struct LineCamera {
    input: FeedInput,
}

impl LineCamera {
    fn new(input: &str) -> Self {
        let input = match input {
            "-" => FeedInput::Stdin,
            path => FeedInput::File(PathBuf::from(path)),
        };
        Self { input }
    }
}

#[async_trait]
impl Camera for LineCamera {
    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = match &self.input {
            FeedInput::Stdin => Box::new(BufReader::new(tokio::io::stdin())),
            FeedInput::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        CaptureError::Denied(path.display().to_string())
                    }
                    _ => CaptureError::Device(format!("{}: {e}", path.display())),
                })?;
                Box::new(BufReader::new(file))
            }
        };
        Ok(Box::new(LineFeed {
            lines: reader.lines(),
        }))
    }
}

struct LineFeed {
    lines: Lines<Box<dyn AsyncBufRead + Send + Unpin>>,
}

#[async_trait]
impl FrameSource for LineFeed {
    async fn grab_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(Some(Frame {
                width: line.len() as u32,
                height: 1,
                data: line.into_bytes(),
            })),
            Ok(None) => Err(CaptureError::Device(
                "feed ended before a code was decoded".into(),
            )),
            Err(e) => Err(CaptureError::Device(e.to_string())),
        }
    }

    fn release(&mut self) {
        debug!(target: "insight::capture", "line feed closed");
    }
}

/// The feed already carries decoded text.
struct PassthroughDecoder;

impl BarcodeDecoder for PassthroughDecoder {
    fn decode(&self, frame: &Frame) -> Result<Option<String>, CaptureError> {
        let text = std::str::from_utf8(&frame.data)
            .map_err(|e| CaptureError::Frame(e.to_string()))?
            .trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

pub fn run(ctx: &Context, args: ScanArgs) -> Result<()> {
    let importer = ctx.importer()?;
    let mut app = App::new(importer).with_capture(
        Arc::new(LineCamera::new(&args.input)),
        Arc::new(PassthroughDecoder),
    );
    let rt = runtime()?;
    let status = rt.block_on(async move {
        let started = app.dispatch(Command::ToggleScan).await.clone();
        if started.is_err() {
            return started;
        }
        eprintln!("{started}");
        tokio::select! {
            status = app.complete_scan() => return status.clone(),
            _ = tokio::signal::ctrl_c() => {}
        }
        app.dispatch(Command::ToggleScan).await.clone()
    });
    // A pending stdin read would otherwise hold the runtime open.
    rt.shutdown_background();
    report(status)
}

fn report(status: Status) -> Result<()> {
    if status.is_err() {
        bail!("{}", status.message.trim_start_matches("Error: "));
    }
    println!("{status}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_trims_and_skips_blank_lines() {
        let frame = |s: &str| Frame {
            width: s.len() as u32,
            height: 1,
            data: s.as_bytes().to_vec(),
        };
        let decoder = PassthroughDecoder;
        assert_eq!(decoder.decode(&frame("  ")).unwrap(), None);
        assert_eq!(
            decoder.decode(&frame(" {\"a\":1}\r")).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(matches!(
            decoder.decode(&Frame { width: 1, height: 1, data: vec![0xff] }),
            Err(CaptureError::Frame(_))
        ));
    }

    #[tokio::test]
    async fn missing_feed_file_is_a_device_error() {
        let camera = LineCamera::new("/nonexistent/insight-feed.txt");
        let err = camera.open().await.err().unwrap();
        assert!(matches!(err, CaptureError::Device(_)));
    }
}
