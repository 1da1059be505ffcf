use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
    std::time::{Duration, Instant},
};

#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub size: Vec2<usize>,
    pub frame_rate: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(640, 480),
            frame_rate: 30.0,
        }
    }
}

/// Synthetic camera producing a moving RGB gradient.
pub struct PatternDevice {
    config: PatternConfig,
    open: bool,
    frame_index: u64,
    next_frame: Option<Instant>,
}

impl PatternDevice {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            open: false,
            frame_index: 0,
            next_frame: None,
        }
    }

    fn frame_interval(&self) -> Duration {
        if self.config.frame_rate > 0.0 {
            Duration::from_secs_f32(1.0 / self.config.frame_rate)
        } else {
            Duration::ZERO
        }
    }

    fn render(&self) -> Vec<u8> {
        let size = self.config.size;
        let shift = (self.frame_index % 256) as usize;
        let mut data = Vec::with_capacity(size.area() * 3);
        for y in 0..size.y {
            for x in 0..size.x {
                let r = ((x * 255) / size.x.max(1) + shift) % 256;
                let g = ((y * 255) / size.y.max(1)) % 256;
                let b = (shift * 3) % 256;
                data.extend_from_slice(&[r as u8, g as u8, b as u8]);
            }
        }
        data
    }
}

impl Device for PatternDevice {
    fn open(&mut self) -> Result<DeviceInfo, CameraError> {
        if self.config.size.is_empty() {
            return Err(CameraError::Device(format!(
                "invalid pattern size {}",
                self.config.size
            )));
        }
        self.open = true;
        self.next_frame = None;
        Ok(DeviceInfo {
            size: self.config.size,
            format: PixelFormat::Rgb8,
            frame_rate: self.config.frame_rate,
        })
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn blocking_capture(&mut self) -> Result<Image, CameraError> {
        if !self.open {
            return Err(CameraError::Stream("No stream".to_string()));
        }

        // pace frames like a real sensor would
        let now = Instant::now();
        if let Some(next) = self.next_frame {
            if next > now {
                std::thread::sleep(next - now);
            }
        }
        self.next_frame = Some(Instant::now() + self.frame_interval());

        let frame = Image::new(self.config.size, self.render(), PixelFormat::Rgb8);
        self.frame_index += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_requires_open() {
        let mut device = PatternDevice::new(PatternConfig::default());
        assert!(device.blocking_capture().is_err());
    }

    #[test]
    fn test_pattern_frames_match_config() {
        let mut device = PatternDevice::new(PatternConfig {
            size: Vec2::new(8, 6),
            frame_rate: 0.0,
        });
        let info = device.open().unwrap();
        assert_eq!(info.size, Vec2::new(8, 6));
        assert_eq!(info.format, PixelFormat::Rgb8);

        let first = device.blocking_capture().unwrap();
        let second = device.blocking_capture().unwrap();
        assert_eq!(first.data.len(), 8 * 6 * 3);
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn test_pattern_rejects_empty_size() {
        let mut device = PatternDevice::new(PatternConfig {
            size: Vec2::new(0, 480),
            frame_rate: 30.0,
        });
        assert!(device.open().is_err());
    }
}
