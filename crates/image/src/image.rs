use {crate::*, base::Vec2};

/// A frame of pixel data in a known format.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

impl Image {
    pub fn new(size: Vec2<usize>, data: Vec<u8>, format: PixelFormat) -> Self {
        Self { size, data, format }
    }

    pub fn width(&self) -> usize {
        self.size.x
    }

    pub fn height(&self) -> usize {
        self.size.y
    }

    /// Expected data length for uncompressed formats.
    pub fn expected_len(&self) -> Option<usize> {
        self.format.bytes_per_pixel().map(|bpp| self.size.area() * bpp)
    }

    /// Check that the buffer holds at least one full frame.
    pub fn validate(&self) -> Result<(), ImageError> {
        if let Some(expected) = self.expected_len() {
            if self.data.len() < expected {
                return Err(ImageError::Decode(format!(
                    "{:?} frame of {} needs {} bytes, got {}",
                    self.format,
                    self.size,
                    expected,
                    self.data.len()
                )));
            }
        }
        Ok(())
    }
}
