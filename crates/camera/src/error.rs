use {image::ImageError, std::fmt, std::time::Duration};

#[derive(Debug)]
pub enum CameraError {
    Device(String),
    Stream(String),
    Pipeline(String),
    NotPlaying,
    Destroyed,
    Timeout(Duration),
    Image(ImageError),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Device(msg) => write!(f, "device error: {msg}"),
            CameraError::Stream(msg) => write!(f, "stream error: {msg}"),
            CameraError::Pipeline(msg) => write!(f, "pipeline error: {msg}"),
            CameraError::NotPlaying => write!(f, "pipeline is not playing"),
            CameraError::Destroyed => write!(f, "camera has been destroyed"),
            CameraError::Timeout(after) => {
                write!(f, "no frame available after {} ms", after.as_millis())
            }
            CameraError::Image(err) => write!(f, "image error: {err}"),
        }
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Device(err.to_string())
    }
}

impl From<ImageError> for CameraError {
    fn from(err: ImageError) -> Self {
        CameraError::Image(err)
    }
}
