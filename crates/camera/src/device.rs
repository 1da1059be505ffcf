use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
};

/// What an opened device actually delivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceInfo {
    pub size: Vec2<usize>,
    pub format: PixelFormat,
    pub frame_rate: f32,
}

/// A frame source driven from the pipeline worker thread.
///
/// `open` and `blocking_capture` are always called from the same OS thread,
/// some backends have thread affinity requirements.
pub trait Device: Send {
    /// Open the device, returning the configuration that was actually set.
    fn open(&mut self) -> Result<DeviceInfo, CameraError>;
    /// Close the device, if open.
    fn close(&mut self);
    /// Block until the next frame is available.
    fn blocking_capture(&mut self) -> Result<Image, CameraError>;
}

#[derive(Debug, Clone)]
pub enum DeviceConfig {
    Pattern(pattern::PatternConfig),
    #[cfg(feature = "v4l2")]
    V4l2(v4l2::V4l2Config),
}

impl Default for DeviceConfig {
    #[cfg(feature = "v4l2")]
    fn default() -> Self {
        DeviceConfig::V4l2(v4l2::V4l2Config::default())
    }

    #[cfg(not(feature = "v4l2"))]
    fn default() -> Self {
        DeviceConfig::Pattern(pattern::PatternConfig::default())
    }
}

pub fn create_device(config: &DeviceConfig) -> Box<dyn Device> {
    match config {
        DeviceConfig::Pattern(config) => Box::new(pattern::PatternDevice::new(config.clone())),
        #[cfg(feature = "v4l2")]
        DeviceConfig::V4l2(config) => Box::new(v4l2::V4l2Device::new(config.clone())),
    }
}
