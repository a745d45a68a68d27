mod dispatcher;
mod types;
mod unpacker;

pub use dispatcher::Dispatcher;
pub use types::{ImageSource, PreviewPixels, ProcessingParameters, MAX_GRID, MIN_GRID};
pub use unpacker::{unpack, ProcessingResult, Tile};

#[cfg(test)]
pub(crate) use unpacker::tests as archive_fixtures;

use crate::error::Result;
use std::sync::Arc;

/// Anything that can turn an image plus parameters into a tile archive.
/// Called from a background thread, so it may block.
pub trait ProcessingService: Send + Sync + 'static {
    fn fetch(&self, image: &ImageSource, params: &ProcessingParameters) -> Result<Arc<[u8]>>;
}

/// One full round trip: fetch the archive, then unpack all of it.
pub fn run(
    service: &dyn ProcessingService,
    image: &ImageSource,
    params: &ProcessingParameters,
) -> Result<ProcessingResult> {
    let archive = service.fetch(image, params)?;
    unpack(archive, params.columns())
}
