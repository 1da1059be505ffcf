use std::fmt;

#[derive(Debug)]
pub enum ImageError {
    Decode(String),
    Encode(String),
    Unsupported(String),
    Io(std::io::Error),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Decode(msg) => write!(f, "decode error: {msg}"),
            ImageError::Encode(msg) => write!(f, "encode error: {msg}"),
            ImageError::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            ImageError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Io(err)
    }
}

impl From<crates_image::ImageError> for ImageError {
    fn from(err: crates_image::ImageError) -> Self {
        match err {
            crates_image::ImageError::IoError(err) => ImageError::Io(err),
            crates_image::ImageError::Decoding(err) => ImageError::Decode(err.to_string()),
            crates_image::ImageError::Unsupported(err) => ImageError::Unsupported(err.to_string()),
            other => ImageError::Encode(other.to_string()),
        }
    }
}
