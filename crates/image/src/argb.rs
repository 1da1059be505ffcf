use {
    crate::{pixelformat::yuv_to_rgb, *},
    base::Vec2,
    crates_image::{ImageBuffer, Rgba, imageops::FilterType},
};

pub fn rgb_to_argb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut argb = Vec::with_capacity(size.area() * 4);
    for chunk in data.chunks_exact(3).take(size.area()) {
        argb.extend_from_slice(&[0xFF, chunk[0], chunk[1], chunk[2]]);
    }
    argb
}

pub fn rgba_to_argb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut argb = Vec::with_capacity(size.area() * 4);
    for chunk in data.chunks_exact(4).take(size.area()) {
        argb.extend_from_slice(&[chunk[3], chunk[0], chunk[1], chunk[2]]);
    }
    argb
}

/// BGRA and ARGB are each other's byte reversal.
pub fn bgra_to_argb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut argb = Vec::with_capacity(size.area() * 4);
    for chunk in data.chunks_exact(4).take(size.area()) {
        argb.extend_from_slice(&[chunk[3], chunk[2], chunk[1], chunk[0]]);
    }
    argb
}

pub fn yuyv_to_argb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut argb = Vec::with_capacity(size.area() * 4);
    for chunk in data.chunks_exact(4).take(size.area() / 2) {
        let (r0, g0, b0) = yuv_to_rgb(chunk[0], chunk[1], chunk[3]);
        let (r1, g1, b1) = yuv_to_rgb(chunk[2], chunk[1], chunk[3]);
        argb.extend_from_slice(&[0xFF, r0, g0, b0, 0xFF, r1, g1, b1]);
    }
    argb
}

pub fn jpeg_to_argb(image: &Image) -> Result<Image, ImageError> {
    image.format.ensure_format(PixelFormat::Jpeg)?;
    let decoded = crates_image::load_from_memory(&image.data)
        .map_err(|e| ImageError::Decode(format!("Failed to decode JPEG: {}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = Vec2::new(width as usize, height as usize);
    Ok(Image::new(
        size,
        rgba_to_argb(size, rgba.as_raw()),
        PixelFormat::Argb8,
    ))
}

/// Convert any supported frame into 32-bit ARGB (bytes A, R, G, B per pixel).
pub fn to_argb(image: &Image) -> Result<Image, ImageError> {
    image.validate()?;
    let size = image.size;
    let data = match image.format {
        PixelFormat::Argb8 => image.data[..size.area() * 4].to_vec(),
        PixelFormat::Rgb8 => rgb_to_argb(size, &image.data),
        PixelFormat::Rgba8 => rgba_to_argb(size, &image.data),
        PixelFormat::Bgra8 => bgra_to_argb(size, &image.data),
        PixelFormat::Yuyv => {
            if size.x % 2 != 0 {
                return Err(ImageError::Decode(format!(
                    "YUYV frame width must be even, got {}",
                    size.x
                )));
            }
            yuyv_to_argb(size, &image.data)
        }
        PixelFormat::Jpeg => return jpeg_to_argb(image),
    };
    Ok(Image::new(size, data, PixelFormat::Argb8))
}

/// Reorder ARGB pixels into the RGBA byte order encoders expect.
pub fn argb_to_rgba(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|c| [c[1], c[2], c[3], c[0]])
        .collect()
}

/// Drop alpha from ARGB pixels, for encoders without an alpha channel.
pub fn argb_to_rgb(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|c| [c[1], c[2], c[3]])
        .collect()
}

/// Scale an ARGB frame to `size` (triangle filter). Returns a copy when the
/// size already matches.
pub fn resize_argb(image: &Image, size: Vec2<usize>) -> Result<Image, ImageError> {
    image.format.ensure_format(PixelFormat::Argb8)?;
    image.validate()?;
    if size == image.size {
        return Ok(image.clone());
    }
    if size.is_empty() || image.size.is_empty() {
        return Err(ImageError::Unsupported(format!(
            "cannot scale {} to {}",
            image.size, size
        )));
    }

    // resizing treats the four channels independently, so ARGB passes through
    // an Rgba buffer untouched
    let source: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(
        image.size.x as u32,
        image.size.y as u32,
        image.data[..image.size.area() * 4].to_vec(),
    )
    .ok_or_else(|| ImageError::Decode("ARGB buffer too small".to_string()))?;
    let scaled = crates_image::imageops::resize(
        &source,
        size.x as u32,
        size.y as u32,
        FilterType::Triangle,
    );
    Ok(Image::new(size, scaled.into_raw(), PixelFormat::Argb8))
}
