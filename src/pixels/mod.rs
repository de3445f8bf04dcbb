//! Decoded source images.
//!
//! Everything downstream works on [`Image`]: a row-major grid of RGB
//! [`Pixel`]s. Static formats decode to a single image, animated GIFs to one
//! image per frame, each composited to the full canvas.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, RgbImage};

use crate::error::{Result, ViewError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Image {
    /// Build an image from row-major pixels. Both dimensions must be non-zero
    /// and `pixels` must hold exactly `width * height` entries.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ViewError::EmptyImage);
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ViewError::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A `width` x `height` image where every pixel is `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self> {
        Self::new(width, height, vec![pixel; width as usize * height as usize])
    }

    pub fn from_rgb(buffer: &RgbImage) -> Result<Self> {
        let pixels = buffer
            .pixels()
            .map(|p| Pixel::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self::new(buffer.width(), buffer.height(), pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height, doubled because a terminal cell is about twice as
    /// tall as it is wide.
    pub fn ratio(&self) -> f64 {
        2.0 * f64::from(self.width) / f64::from(self.height)
    }

    /// The pixel at column `x`, row `y`. Callers stay inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// Decode raw bytes into one image per frame.
///
/// The format is sniffed from the magic bytes; `hint` is only consulted when
/// sniffing fails.
pub fn decode(bytes: &[u8], hint: Option<ImageFormat>) -> Result<Vec<Image>> {
    let format = image::guess_format(bytes)
        .ok()
        .or(hint)
        .ok_or_else(|| ViewError::UnsupportedFormat("unrecognized image data".to_string()))?;

    let frames = match format {
        ImageFormat::Gif => decode_gif(bytes)?,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp => {
            let decoded = image::load_from_memory_with_format(bytes, format)?;
            vec![Image::from_rgb(&decoded.to_rgb8())?]
        }
        other => {
            return Err(ViewError::UnsupportedFormat(format!("{other:?}")));
        }
    };

    if frames.is_empty() {
        return Err(ViewError::EmptyImage);
    }

    tracing::debug!(
        ?format,
        frames = frames.len(),
        width = frames[0].width(),
        height = frames[0].height(),
        "decoded image"
    );
    Ok(frames)
}

fn decode_gif(bytes: &[u8]) -> Result<Vec<Image>> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    decoder
        .into_frames()
        .collect_frames()?
        .into_iter()
        .map(|frame| Image::from_rgb(&DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8()))
        .collect()
}

/// Read `path` and decode it. The file extension serves as the format hint.
pub fn load(path: &Path) -> Result<Vec<Image>> {
    let bytes = std::fs::read(path)?;
    let hint = ImageFormat::from_path(path).ok();
    decode(&bytes, hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Frame, Rgb, Rgba, RgbaImage};

    fn encode(buffer: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        buffer.write_to(&mut bytes, format).expect("encode fixture");
        bytes.into_inner()
    }

    fn gif_with_frames(colors: &[[u8; 3]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            let frames = colors.iter().map(|&[r, g, b]| {
                Frame::new(RgbaImage::from_pixel(4, 2, Rgba([r, g, b, 255])))
            });
            encoder.encode_frames(frames).expect("encode gif");
        }
        bytes
    }

    #[test]
    fn ratio_compensates_for_tall_cells() {
        let image = Image::filled(100, 50, Pixel::default()).unwrap();
        assert_eq!(image.ratio(), 4.0);
    }

    #[test]
    fn rejects_empty_and_mismatched_buffers() {
        assert!(matches!(
            Image::new(0, 3, Vec::new()),
            Err(ViewError::EmptyImage)
        ));
        assert!(matches!(
            Image::new(2, 2, vec![Pixel::default(); 3]),
            Err(ViewError::PixelCount {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn decodes_png_row_major() {
        let mut buffer = RgbImage::new(3, 2);
        buffer.put_pixel(2, 1, Rgb([10, 20, 30]));
        let frames = decode(&encode(&buffer, ImageFormat::Png), None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!((frames[0].width(), frames[0].height()), (3, 2));
        assert_eq!(frames[0].pixel(2, 1), Pixel::new(10, 20, 30));
        assert_eq!(frames[0].pixel(0, 0), Pixel::default());
    }

    #[test]
    fn decodes_bmp_as_single_frame() {
        let buffer = RgbImage::from_pixel(5, 5, Rgb([200, 100, 50]));
        let frames = decode(&encode(&buffer, ImageFormat::Bmp), None).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].pixel(4, 4), Pixel::new(200, 100, 50));
    }

    #[test]
    fn decodes_every_gif_frame() {
        let bytes = gif_with_frames(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]]);
        let frames = decode(&bytes, None).unwrap();
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_eq!((frame.width(), frame.height()), (4, 2));
        }
        assert_eq!(frames[0].pixel(0, 0), Pixel::new(255, 0, 0));
        assert_eq!(frames[1].pixel(3, 1), Pixel::new(0, 255, 0));
        assert_eq!(frames[2].pixel(1, 0), Pixel::new(0, 0, 255));
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        let result = decode(b"definitely not an image", None);
        assert!(matches!(result, Err(ViewError::UnsupportedFormat(_))));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let buffer = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let bytes = encode(&buffer, ImageFormat::Png);
        let result = decode(&bytes[..bytes.len() / 2], None);
        assert!(matches!(result, Err(ViewError::Decode(_))));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.png");
        let buffer = RgbImage::from_pixel(6, 3, Rgb([9, 8, 7]));
        std::fs::write(&path, encode(&buffer, ImageFormat::Png)).unwrap();

        let frames = load(&path).unwrap();
        assert_eq!(frames[0].pixel(5, 2), Pixel::new(9, 8, 7));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("missing.png"));
        assert!(matches!(result, Err(ViewError::Io(_))));
    }
}
