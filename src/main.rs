use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use imagesqueeze::estimate::to_kb;
use imagesqueeze::{
    CompressOutcome, Intake, PanelConfig, PanelEvent, PanelSession, SelectedFile, QUALITY_MAX,
    QUALITY_MIN,
};

/// What the picker would report for a file at this path.
fn media_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let path_arg = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("Usage: imagesqueeze <image-file> [--drop]");
            std::process::exit(2);
        }
    };
    // --drop bypasses the picker's media type filter, like a drag-and-drop.
    let intake = if args.any(|a| a == "--drop") {
        Intake::Drop
    } else {
        Intake::Picker
    };

    let config = PanelConfig::from_env();
    let (mut panel, mut events) = PanelSession::with_system_encoder(config);

    let path = Path::new(&path_arg);
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    panel.select_file(
        intake,
        SelectedFile {
            name,
            media_type: media_type_for(path),
            bytes,
        },
    )?;

    info!("🎛️ Controls: ←/→ quality ±1, ↑/↓ ±10, 'f' format, 'c' compress, 'x' cancel, 'q' quit");

    terminal::enable_raw_mode()?;
    let result = run_panel(&mut panel, &mut events).await;
    terminal::disable_raw_mode()?;
    result
}

async fn run_panel(
    panel: &mut PanelSession,
    events: &mut UnboundedReceiver<PanelEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut job: Option<JoinHandle<CompressOutcome>> = None;

    loop {
        // Render panel events as one JSON line each.
        while let Ok(ev) = events.try_recv() {
            match serde_json::to_string(&ev) {
                Ok(line) => info!("{}", line),
                Err(err) => error!("could not serialize event: {}", err),
            }
            if matches!(ev, PanelEvent::CompressFinished { .. }) {
                save_download(panel)?;
            }
        }

        // Apply a finished compression, if one is pending.
        if let Some(handle) = job.take() {
            if handle.is_finished() {
                match handle.await {
                    Ok(outcome) => panel.finish_compress(outcome),
                    Err(err) => error!("compression task failed: {}", err),
                }
            } else {
                job = Some(handle);
            }
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') => {
                panel.cancel_compress();
                info!("Received 'q' key. Shutting down...");
                break;
            }
            KeyCode::Left => nudge_quality(panel, -1),
            KeyCode::Right => nudge_quality(panel, 1),
            KeyCode::Down => nudge_quality(panel, -10),
            KeyCode::Up => nudge_quality(panel, 10),
            KeyCode::Char('f') => {
                let next = panel.target_format().toggled();
                panel.set_target_format(next);
            }
            KeyCode::Char('c') | KeyCode::Enter => {
                if let Some(started) = panel.begin_compress() {
                    job = Some(tokio::spawn(started.run()));
                }
            }
            KeyCode::Char('x') => panel.cancel_compress(),
            _ => {}
        }
    }

    Ok(())
}

/// Move the quality slider, clamped to its bounds.
fn nudge_quality(panel: &mut PanelSession, delta: i16) {
    let current = i16::from(panel.quality());
    let next = (current + delta).clamp(i16::from(QUALITY_MIN), i16::from(QUALITY_MAX)) as u8;
    if next != panel.quality() {
        if let Err(err) = panel.set_quality(next) {
            error!("{}", err);
        }
    }
}

/// Write the compressed artifact into the working directory, the download
/// link equivalent.
fn save_download(panel: &PanelSession) -> std::io::Result<()> {
    if let (Some(compressed), Some(bytes)) = (panel.compressed(), panel.compressed_bytes()) {
        fs::write(&compressed.download_name, bytes.as_slice())?;
        info!(
            "💾 Wrote {} ({:.2} KB)",
            compressed.download_name,
            to_kb(compressed.size_bytes as f64)
        );
    }
    Ok(())
}
