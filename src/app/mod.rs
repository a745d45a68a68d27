mod preview;
mod state;
mod theme;
mod ui;

use crate::error::{Result, SplitterError};
use crate::processing::{self, Dispatcher, ImageSource, ProcessingService};
use eframe::{egui, App};
use preview::PreviewCache;
use state::{WorkflowState, WorkflowStatus};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self as std_mpsc, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
const ARCHIVE_FILE_NAME: &str = "tiles.zip";

pub struct TileSplitter {
    state: WorkflowState,
    service: Arc<dyn ProcessingService>,
    previews: PreviewCache,
    last_saved: Option<PathBuf>,
}

impl TileSplitter {
    pub fn new(_cc: &eframe::CreationContext<'_>, dispatcher: Dispatcher) -> Self {
        info!("Initializing image splitter for {}", dispatcher.api_url());
        Self::with_service(Arc::new(dispatcher))
    }

    pub fn with_service(service: Arc<dyn ProcessingService>) -> Self {
        Self {
            state: WorkflowState::default(),
            service,
            previews: PreviewCache::default(),
            last_saved: None,
        }
    }

    pub fn reset(&mut self) {
        info!("Resetting application state");
        self.state.clear();
        self.previews.clear();
        self.last_saved = None;
    }

    pub fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.load_image_path(path);
        }
    }

    /// Reads and decodes the file off the UI thread.
    pub fn load_image_path(&mut self, path: PathBuf) {
        info!("Loading image from {:?}", path);
        self.load_image_with(move || ImageSource::from_path(&path));
    }

    pub fn load_image_bytes(&mut self, name: String, bytes: Arc<[u8]>) {
        info!("Loading dropped image '{}'", name);
        self.load_image_with(move || Ok(ImageSource::from_bytes(name, bytes)));
    }

    fn load_image_with<F>(&mut self, load: F)
    where
        F: FnOnce() -> Result<ImageSource> + Send + 'static,
    {
        let (sender, receiver) = std_mpsc::channel();
        self.state.image_receiver = Some(receiver);
        std::thread::spawn(move || {
            let _ = sender.send(load());
        });
    }

    pub fn start_processing(&mut self) {
        let (image, params) = match self.state.begin_submit() {
            Ok(input) => input,
            Err(e) => {
                warn!("Not processing: {}", e);
                return;
            }
        };

        let (sender, receiver) = std_mpsc::channel();
        self.state.outcome_receiver = Some(receiver);
        let service = self.service.clone();

        std::thread::spawn(move || {
            let outcome = processing::run(service.as_ref(), &image, &params);
            let _ = sender.send(outcome);
        });
    }

    /// Picks up finished background work. Returns true if anything changed.
    pub fn poll_background(&mut self) -> bool {
        let mut changed = false;

        if let Some(receiver) = &self.state.image_receiver {
            match receiver.try_recv() {
                Ok(Ok(image)) => {
                    self.state.image_receiver = None;
                    self.previews.forget_source();
                    self.state.select_image(image);
                    changed = true;
                }
                Ok(Err(e)) => {
                    self.state.image_receiver = None;
                    error!("Failed to load image: {}", e);
                    self.state.error_message = Some(e.user_message());
                    changed = true;
                }
                Err(TryRecvError::Disconnected) => {
                    self.state.image_receiver = None;
                }
                Err(TryRecvError::Empty) => {}
            }
        }

        if let Some(receiver) = &self.state.outcome_receiver {
            let outcome = match receiver.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Disconnected) => {
                    error!("Processing thread exited without sending a result");
                    Some(Err(SplitterError::WorkerStopped))
                }
                Err(TryRecvError::Empty) => None,
            };

            if let Some(outcome) = outcome {
                self.state.outcome_receiver = None;
                self.state.finish(outcome);
                if let Some(result) = &self.state.result {
                    self.previews.sync(result.generation());
                }
                changed = true;
            }
        }

        changed
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        self.handle_dropped_files(ctx);

        if self.poll_background() {
            ctx.request_repaint();
        }

        if self.state.outcome_receiver.is_some() || self.state.image_receiver.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) =
            ctx.input(|i| (!i.raw.hovered_files.is_empty(), i.raw.dropped_files.clone()));
        self.state.dragging = hovering;

        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Some(path) = file.path {
            self.load_image_path(path);
        } else if let Some(bytes) = file.bytes {
            self.load_image_bytes(file.name, bytes);
        } else {
            warn!("Dropped file '{}' has neither a path nor contents", file.name);
        }
    }

    pub fn save_tile(&mut self, name: &str) {
        let Some(tile) = self.state.result.as_ref().and_then(|r| r.get(name)) else {
            return;
        };
        let bytes = tile.bytes.clone();
        self.save_download(name, &bytes);
    }

    pub fn save_archive(&mut self) {
        let Some(result) = &self.state.result else {
            return;
        };
        let bytes = result.archive.clone();
        self.save_download(ARCHIVE_FILE_NAME, &bytes);
    }

    fn save_download(&mut self, entry_name: &str, bytes: &[u8]) {
        let file_name = suggested_file_name(entry_name);
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&file_name)
            .save_file()
        else {
            return;
        };

        match write_download(&path, bytes) {
            Ok(()) => {
                self.state.notice = Some(format!("Saved {}", path.display()));
                self.last_saved = Some(path);
            }
            Err(e) => {
                error!("Failed to save {:?}: {}", path, e);
                self.state.error_message = Some(e.user_message());
            }
        }
    }

    pub fn reveal_last_saved(&self) {
        let Some(folder) = self.last_saved.as_ref().and_then(|p| p.parent()) else {
            return;
        };
        if let Err(e) = open::that(folder) {
            warn!("Could not open {:?}: {}", folder, e);
        }
    }
}

/// Archive entries may carry folders in their names; only the last part is
/// offered as the file name.
fn suggested_file_name(entry_name: &str) -> String {
    entry_name
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or("tile")
        .to_string()
}

fn write_download(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    info!("Saved {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

impl App for TileSplitter {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
