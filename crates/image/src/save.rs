use {
    crate::*,
    crates_image::{ExtendedColorType, ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder},
    std::{
        fs::File,
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    },
};

/// JPEG quality used for snapshots.
pub const JPEG_QUALITY: u8 = 95;

/// Pick the output encoding from the file extension.
pub fn output_format(path: &Path) -> Result<ImageFormat, ImageError> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| ImageError::Unsupported(format!("no image format for {:?}", path)))?;
    match format {
        ImageFormat::Jpeg
        | ImageFormat::Png
        | ImageFormat::Bmp
        | ImageFormat::Tiff
        | ImageFormat::WebP => Ok(format),
        other => Err(ImageError::Unsupported(format!(
            "cannot write {:?} images ({:?})",
            other, path
        ))),
    }
}

fn save_argb_inner(path: &Path, image: &Image) -> Result<(), ImageError> {
    image.format.ensure_format(PixelFormat::Argb8)?;
    image.validate()?;
    let format = output_format(path)?;
    let (width, height) = (image.width() as u32, image.height() as u32);
    let pixels = &image.data[..image.size.area() * 4];

    match format {
        ImageFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
                .write_image(&argb_to_rgb(pixels), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| ImageError::Encode(e.to_string()))?;
            writer.flush()?;
        }
        format => crates_image::save_buffer_with_format(
            path,
            &argb_to_rgba(pixels),
            width,
            height,
            ExtendedColorType::Rgba8,
            format,
        )?,
    }
    Ok(())
}

/// Encode an ARGB frame into `path`, the extension choosing the format.
///
/// JPEG output drops the alpha channel; other formats are written as RGBA.
///
/// The CPU-bound encoding and the file write run on tokio's blocking thread pool.
/// The image is handed back on success so callers can keep using it.
///
/// # Errors
///
/// Returns `ImageError::Unsupported` for unknown extensions, `ImageError::Io`
/// if the file cannot be written and `ImageError::Encode` if encoding fails.
pub async fn save_argb(path: PathBuf, image: Image) -> Result<Image, ImageError> {
    tokio::task::spawn_blocking(move || save_argb_inner(&path, &image).map(|_| image))
        .await
        .map_err(|e| ImageError::Encode(e.to_string()))?
}

/// Blocking variant of [`save_argb`].
pub fn save_argb_blocking(path: &Path, image: &Image) -> Result<(), ImageError> {
    save_argb_inner(path, image)
}
