use crate::error::{Result, SplitterError};
use crate::processing::types::PreviewPixels;
use derivative::Derivative;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// One file extracted from the response archive.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Tile {
    pub name: String,
    #[derivative(Debug = "ignore")]
    pub bytes: Arc<[u8]>,
    #[derivative(Debug = "ignore")]
    pub preview: Option<Arc<PreviewPixels>>,
}

/// Everything produced by one successful run: the raw archive for bulk
/// download and each entry keyed by its name, in archive order.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ProcessingResult {
    pub(crate) generation: u64,
    pub columns: u32,
    #[derivative(Debug = "ignore")]
    pub archive: Arc<[u8]>,
    pub tiles: Vec<Tile>,
}

impl ProcessingResult {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.name == name)
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(|tile| tile.name.as_str())
    }
}

/// Lazily walks the file entries of an archive, extracting one tile per
/// call. Directory entries are skipped.
pub struct TileEntries {
    archive: ZipArchive<Cursor<Arc<[u8]>>>,
    next: usize,
}

impl TileEntries {
    pub fn new(bytes: Arc<[u8]>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive, next: 0 })
    }

    fn extract(&mut self, index: usize) -> Result<Option<Tile>> {
        let mut file = self.archive.by_index(index)?;
        if file.is_dir() {
            return Ok(None);
        }

        let name = file.name().to_string();
        // The size in the header is whatever the server wrote; let the buffer
        // grow with the bytes that are actually there.
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| SplitterError::Decode(zip::result::ZipError::Io(e)))?;
        debug!("Extracted '{}' ({} bytes)", name, bytes.len());

        let preview = match PreviewPixels::decode(&bytes) {
            Ok(pixels) => Some(Arc::new(pixels)),
            Err(e) => {
                warn!("Entry '{}' has no preview: {}", name, e);
                None
            }
        };

        Ok(Some(Tile {
            name,
            bytes: bytes.into(),
            preview,
        }))
    }
}

impl Iterator for TileEntries {
    type Item = Result<Tile>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.archive.len() {
            let index = self.next;
            self.next += 1;
            match self.extract(index) {
                Ok(Some(tile)) => return Some(Ok(tile)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Extracts every entry before returning, so callers never see a partial
/// set of tiles.
pub fn unpack(archive: Arc<[u8]>, columns: u32) -> Result<ProcessingResult> {
    let mut tiles = Vec::new();
    for tile in TileEntries::new(archive.clone())? {
        insert_tile(&mut tiles, tile?);
    }

    if tiles.is_empty() {
        return Err(SplitterError::EmptyArchive);
    }

    info!("Unpacked {} tiles from {} byte archive", tiles.len(), archive.len());
    Ok(ProcessingResult {
        generation: 0,
        columns,
        archive,
        tiles,
    })
}

// Names are keys: a repeated name replaces the earlier entry in place.
fn insert_tile(tiles: &mut Vec<Tile>, tile: Tile) {
    match tiles.iter_mut().find(|existing| existing.name == tile.name) {
        Some(existing) => {
            warn!("Duplicate entry '{}' in archive", tile.name);
            *existing = tile;
        }
        None => tiles.push(tile),
    }
}
