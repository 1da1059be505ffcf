use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Argb8,
    Bgra8,
    Yuyv,
    Jpeg,
}

impl PixelFormat {
    /// Map a V4L2 style fourcc onto a pixel format.
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(PixelFormat::Rgb8),
            b"AB24" => Some(PixelFormat::Rgba8),
            b"BA24" => Some(PixelFormat::Argb8),
            b"AR24" => Some(PixelFormat::Bgra8),
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"MJPG" => Some(PixelFormat::Jpeg),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            PixelFormat::Rgb8 => *b"RGB3",
            PixelFormat::Rgba8 => *b"AB24",
            PixelFormat::Argb8 => *b"BA24",
            PixelFormat::Bgra8 => *b"AR24",
            PixelFormat::Yuyv => *b"YUYV",
            PixelFormat::Jpeg => *b"MJPG",
        }
    }

    /// Bytes per pixel, `None` for compressed formats.
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::Rgb8 => Some(3),
            PixelFormat::Rgba8 | PixelFormat::Argb8 | PixelFormat::Bgra8 => Some(4),
            PixelFormat::Yuyv => Some(2),
            PixelFormat::Jpeg => None,
        }
    }

    pub fn ensure_format(&self, expected: PixelFormat) -> Result<(), ImageError> {
        if *self != expected {
            return Err(ImageError::Decode(format!(
                "expected {:?} format, got {:?}",
                expected, self
            )));
        }
        Ok(())
    }
}

// BT.601 YUV-to-RGB conversion for a single pixel (fixed-point, shift 8)
pub(crate) fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as i32;
    let u = u as i32 - 128;
    let v = v as i32 - 128;
    let r = (y + ((359 * v) >> 8)).clamp(0, 255) as u8;
    let g = (y - ((88 * u + 183 * v) >> 8)).clamp(0, 255) as u8;
    let b = (y + ((454 * u) >> 8)).clamp(0, 255) as u8;
    (r, g, b)
}
