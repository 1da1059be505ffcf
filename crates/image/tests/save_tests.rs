use base::Vec2;
use image::{Image, ImageError, PixelFormat};
use std::path::PathBuf;

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("timelapse-image-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn red_square() -> Image {
    let data = [0xFFu8, 0xFF, 0, 0].repeat(16);
    Image::new(Vec2::new(4, 4), data, PixelFormat::Argb8)
}

#[tokio::test]
async fn test_save_jpeg() {
    let dir = test_dir("jpeg");
    let path = dir.join("frame0000.jpeg");

    let image = image::save_argb(path.clone(), red_square()).await.unwrap();
    assert_eq!(image.size, Vec2::new(4, 4));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]); // JPEG SOI marker
    let decoded = crates_image::open(&path).unwrap().to_rgb8();
    let pixel = decoded.get_pixel(1, 1);
    assert!(pixel[0] > 200 && pixel[1] < 60 && pixel[2] < 60);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_save_png_keeps_channel_order() {
    let dir = test_dir("png");
    let path = dir.join("frame0001.png");

    image::save_argb(path.clone(), red_square()).await.unwrap();

    let decoded = crates_image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [0xFF, 0, 0, 0xFF]);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_save_unknown_extension() {
    let dir = test_dir("unknown");
    let result = image::save_argb(dir.join("frame0000.xyz"), red_square()).await;
    assert!(matches!(result, Err(ImageError::Unsupported(_))));
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_save_into_missing_directory() {
    let dir = test_dir("missing");
    let result = image::save_argb(dir.join("nope").join("frame0000.png"), red_square()).await;
    assert!(result.is_err());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_save_rejects_non_argb() {
    let dir = test_dir("format");
    let image = Image::new(Vec2::new(1, 1), vec![1, 2, 3], PixelFormat::Rgb8);
    assert!(image::save_argb_blocking(&dir.join("x.png"), &image).is_err());
    std::fs::remove_dir_all(&dir).ok();
}
