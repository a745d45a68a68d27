use crate::processing::{ImageSource, PreviewPixels, ProcessingResult, Tile};
use eframe::egui::{self, TextureHandle, TextureOptions};
use std::collections::HashMap;
use tracing::debug;

/// GPU textures for what is on screen. Tile textures belong to exactly one
/// result generation and are dropped as soon as a newer one shows up.
#[derive(Default)]
pub struct PreviewCache {
    source: Option<TextureHandle>,
    generation: u64,
    tiles: HashMap<String, TextureHandle>,
}

impl PreviewCache {
    pub fn clear(&mut self) {
        self.source = None;
        self.release_tiles();
    }

    pub fn forget_source(&mut self) {
        self.source = None;
    }

    /// Drops every tile texture that belongs to an older run.
    pub fn sync(&mut self, generation: u64) {
        if generation != self.generation {
            self.release_tiles();
            self.generation = generation;
        }
    }

    #[cfg(test)]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn source_texture(
        &mut self,
        ctx: &egui::Context,
        image: &ImageSource,
    ) -> Option<TextureHandle> {
        if self.source.is_none() {
            let pixels = image.preview.as_ref()?;
            self.source = Some(load(ctx, &format!("source:{}", image.name), pixels));
        }
        self.source.clone()
    }

    pub fn tile_texture(
        &mut self,
        ctx: &egui::Context,
        result: &ProcessingResult,
        tile: &Tile,
    ) -> Option<TextureHandle> {
        self.sync(result.generation());
        if let Some(texture) = self.tiles.get(&tile.name) {
            return Some(texture.clone());
        }

        let pixels = tile.preview.as_ref()?;
        let texture = load(
            ctx,
            &format!("tile:{}:{}", result.generation(), tile.name),
            pixels,
        );
        self.tiles.insert(tile.name.clone(), texture.clone());
        Some(texture)
    }

    fn release_tiles(&mut self) {
        if !self.tiles.is_empty() {
            debug!(
                "Releasing {} previews from run {}",
                self.tiles.len(),
                self.generation
            );
        }
        self.tiles.clear();
    }
}

fn load(ctx: &egui::Context, name: &str, pixels: &PreviewPixels) -> TextureHandle {
    let image = egui::ColorImage::from_rgba_unmultiplied(pixels.size, &pixels.rgba);
    ctx.load_texture(name, image, TextureOptions::LINEAR)
}
