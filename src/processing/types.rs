use crate::error::Result;
use derivative::Derivative;
use image::ImageFormat;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub const FIELD_FILE: &str = "file";
pub const FIELD_ROWS: &str = "rows";
pub const FIELD_COLUMNS: &str = "columns";
pub const FIELD_STRIPES: &str = "stripes";
pub const FIELD_STRIPE_HEIGHT: &str = "stripe_height";

pub const MIN_GRID: u32 = 1;
pub const MAX_GRID: u32 = 20;

/// Longest edge of the thumbnails kept for on-screen previews.
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Decoded RGBA pixels ready to be turned into a texture.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct PreviewPixels {
    pub size: [usize; 2],
    #[derivative(Debug = "ignore")]
    pub rgba: Vec<u8>,
}

impl PreviewPixels {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        let thumb = if image.width() > PREVIEW_MAX_EDGE || image.height() > PREVIEW_MAX_EDGE {
            image.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
        } else {
            image
        };
        let size = [thumb.width() as usize, thumb.height() as usize];
        Ok(Self {
            size,
            rgba: thumb.to_rgba8().into_raw(),
        })
    }
}

/// The picked or dropped image. Replaced wholesale, never edited.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ImageSource {
    pub name: String,
    pub mime: String,
    #[derivative(Debug = "ignore")]
    pub bytes: Arc<[u8]>,
    #[derivative(Debug = "ignore")]
    pub preview: Option<Arc<PreviewPixels>>,
}

impl ImageSource {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let mime = ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type().to_string());
        Ok(Self::build(name, mime, bytes.into()))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self::build(name.into(), None, bytes)
    }

    fn build(name: String, mime: Option<String>, bytes: Arc<[u8]>) -> Self {
        let mime = mime
            .or_else(|| {
                image::guess_format(&bytes)
                    .ok()
                    .map(|format| format.to_mime_type().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        // Presence is the only validation; an undecodable file is still sent.
        let preview = match PreviewPixels::decode(&bytes) {
            Ok(pixels) => Some(Arc::new(pixels)),
            Err(e) => {
                warn!("No preview for '{}': {}", name, e);
                None
            }
        };

        Self {
            name,
            mime,
            bytes,
            preview,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingParameters {
    rows: u32,
    columns: u32,
    stripes: bool,
    stripe_height: f64,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 3,
            stripes: false,
            stripe_height: 1.0 / 6.0,
        }
    }
}

impl ProcessingParameters {
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn stripes(&self) -> bool {
        self.stripes
    }

    /// Fraction of the tile height used for the white band, in `[0, 1]`.
    pub fn stripe_height(&self) -> f64 {
        self.stripe_height
    }

    pub fn stripe_height_percent(&self) -> f64 {
        self.stripe_height * 100.0
    }

    pub fn set_rows(&mut self, rows: u32) {
        self.rows = rows.clamp(MIN_GRID, MAX_GRID);
    }

    pub fn set_columns(&mut self, columns: u32) {
        self.columns = columns.clamp(MIN_GRID, MAX_GRID);
    }

    pub fn set_stripes(&mut self, stripes: bool) {
        self.stripes = stripes;
    }

    pub fn set_stripe_height_percent(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        self.stripe_height = percent.clamp(0.0, 100.0) / 100.0;
    }

    /// Text fields of the multipart body, in send order. The image part is
    /// added separately by the dispatcher.
    pub fn form_fields(&self) -> [(&'static str, String); 4] {
        [
            (FIELD_ROWS, self.rows.to_string()),
            (FIELD_COLUMNS, self.columns.to_string()),
            (FIELD_STRIPES, self.stripes.to_string()),
            (FIELD_STRIPE_HEIGHT, self.stripe_height.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(fields: &'a [(&'static str, String); 4], name: &str) -> &'a str {
        fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
            .unwrap()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn defaults_match_the_form() {
        let params = ProcessingParameters::default();
        assert_eq!(params.rows(), 1);
        assert_eq!(params.columns(), 3);
        assert!(!params.stripes());
        assert_eq!(params.stripe_height(), 1.0 / 6.0);
    }

    #[test]
    fn default_fields_serialize_fraction() {
        let mut params = ProcessingParameters::default();
        params.set_rows(3);
        params.set_columns(3);
        let fields = params.form_fields();

        assert_eq!(field(&fields, FIELD_ROWS), "3");
        assert_eq!(field(&fields, FIELD_COLUMNS), "3");
        assert_eq!(field(&fields, FIELD_STRIPES), "false");
        assert_eq!(field(&fields, FIELD_STRIPE_HEIGHT), "0.16666666666666666");
    }

    #[test]
    fn stripe_height_is_sent_as_fraction_not_percent() {
        let mut params = ProcessingParameters::default();
        params.set_stripes(true);
        params.set_stripe_height_percent(20.0);
        let fields = params.form_fields();

        assert_eq!(field(&fields, FIELD_STRIPES), "true");
        assert_eq!(field(&fields, FIELD_STRIPE_HEIGHT), "0.2");
    }

    #[test]
    fn fields_parse_back_to_the_same_values() {
        for rows in MIN_GRID..=MAX_GRID {
            for columns in [MIN_GRID, 7, MAX_GRID] {
                for stripes in [false, true] {
                    for percent in [0.0, 12.5, 16.0, 33.3, 100.0] {
                        let mut params = ProcessingParameters::default();
                        params.set_rows(rows);
                        params.set_columns(columns);
                        params.set_stripes(stripes);
                        params.set_stripe_height_percent(percent);
                        let fields = params.form_fields();

                        let rows_back: u32 = field(&fields, FIELD_ROWS).parse().unwrap();
                        let columns_back: u32 = field(&fields, FIELD_COLUMNS).parse().unwrap();
                        let stripes_back: bool = field(&fields, FIELD_STRIPES).parse().unwrap();
                        let height_back: f64 =
                            field(&fields, FIELD_STRIPE_HEIGHT).parse().unwrap();

                        assert_eq!(rows_back, params.rows());
                        assert_eq!(columns_back, params.columns());
                        assert_eq!(stripes_back, params.stripes());
                        assert_eq!(height_back, params.stripe_height());
                        assert!((0.0..=1.0).contains(&height_back));
                    }
                }
            }
        }
    }

    #[test]
    fn setters_clamp_to_their_own_ranges() {
        let mut params = ProcessingParameters::default();
        params.set_rows(0);
        params.set_columns(99);
        params.set_stripe_height_percent(250.0);
        assert_eq!(params.rows(), MIN_GRID);
        assert_eq!(params.columns(), MAX_GRID);
        assert_eq!(params.stripe_height(), 1.0);

        params.set_stripe_height_percent(-5.0);
        assert_eq!(params.stripe_height(), 0.0);
    }

    #[test]
    fn grid_product_is_not_limited() {
        let mut params = ProcessingParameters::default();
        params.set_rows(MAX_GRID);
        params.set_columns(MAX_GRID);
        assert_eq!(params.rows() * params.columns(), 400);
    }

    #[test]
    fn non_finite_percent_is_ignored() {
        let mut params = ProcessingParameters::default();
        params.set_stripe_height_percent(25.0);
        params.set_stripe_height_percent(f64::NAN);
        assert_eq!(params.stripe_height(), 0.25);
    }

    #[test]
    fn image_source_detects_png_and_builds_preview() {
        let source = ImageSource::from_bytes("photo.png", png_bytes(900, 900).into());
        assert_eq!(source.mime, "image/png");

        let preview = source.preview.expect("preview");
        assert_eq!(preview.size, [PREVIEW_MAX_EDGE as usize, PREVIEW_MAX_EDGE as usize]);
        assert_eq!(preview.rgba.len(), preview.size[0] * preview.size[1] * 4);
    }

    #[test]
    fn undecodable_file_is_still_an_image_source() {
        let source = ImageSource::from_bytes("notes.png", Arc::from(&b"not an image"[..]));
        assert!(source.preview.is_none());
        assert_eq!(source.mime, "application/octet-stream");
        assert_eq!(source.bytes.len(), 12);
    }

    #[test]
    fn from_path_reads_name_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.jpg");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();

        let source = ImageSource::from_path(&path).unwrap();
        assert_eq!(source.name, "holiday.jpg");
        assert_eq!(source.mime, "image/jpeg");
    }
}
