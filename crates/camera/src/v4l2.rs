use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
    std::path::PathBuf,
    v4l::{
        Device as V4lDevice, Format, FourCC, buffer::Type, io::mmap::Stream as MmapStream,
        io::traits::CaptureStream, video::Capture,
    },
};

// number of mmap buffers queued with the driver
const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct V4l2Config {
    pub path: Option<PathBuf>,
    pub size: Option<Vec2<usize>>,
    pub format: Option<PixelFormat>,
    pub frame_rate: Option<f32>,
}

pub struct V4l2Device {
    config: V4l2Config,
    stream: Option<MmapStream<'static>>,
    size: Vec2<usize>,
    format: PixelFormat,
}

impl V4l2Device {
    pub fn new(config: V4l2Config) -> Self {
        Self {
            config,
            stream: None,
            size: Vec2::new(0, 0),
            format: PixelFormat::Yuyv,
        }
    }
}

impl Device for V4l2Device {
    fn open(&mut self) -> Result<DeviceInfo, CameraError> {
        self.stream.take();

        let device = match &self.config.path {
            Some(path) => V4lDevice::with_path(path)?,
            None => V4lDevice::new(0)?,
        };
        let device_format = Capture::format(&device)?;

        let desired_size = self.config.size.unwrap_or(Vec2::new(
            device_format.width as usize,
            device_format.height as usize,
        ));
        let desired_fourcc = match self.config.format {
            Some(format) => FourCC::new(&format.fourcc()),
            None => device_format.fourcc,
        };

        // the driver may pick something else, read back what it chose
        let actual_format = Capture::set_format(
            &device,
            &Format::new(desired_size.x as u32, desired_size.y as u32, desired_fourcc),
        )?;
        self.size = Vec2::new(actual_format.width as usize, actual_format.height as usize);
        self.format = PixelFormat::from_fourcc(&actual_format.fourcc.repr).ok_or_else(|| {
            CameraError::Device(format!("Unsupported pixel format: {}", actual_format.fourcc))
        })?;

        let desired_frame_rate = match self.config.frame_rate {
            Some(frame_rate) => frame_rate,
            None => {
                let params = Capture::params(&device)?;
                params.interval.denominator as f32 / params.interval.numerator as f32
            }
        };
        let actual_params = Capture::set_params(
            &device,
            &v4l::video::capture::Parameters::with_fps(desired_frame_rate as u32),
        )?;
        let frame_rate =
            actual_params.interval.denominator as f32 / actual_params.interval.numerator as f32;

        self.stream = Some(
            MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
                .map_err(|error| CameraError::Stream(error.to_string()))?,
        );

        log::info!(
            "v4l2: opened {:?} at {} {:?} {:.1} fps",
            self.config.path,
            self.size,
            self.format,
            frame_rate
        );
        Ok(DeviceInfo {
            size: self.size,
            format: self.format,
            frame_rate,
        })
    }

    fn close(&mut self) {
        self.stream.take();
    }

    fn blocking_capture(&mut self) -> Result<Image, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CameraError::Stream("No stream".to_string()))?;
        match CaptureStream::next(stream) {
            Ok((frame_data, _metadata)) => Ok(Image::new(self.size, frame_data.to_vec(), self.format)),
            Err(error) => Err(CameraError::Stream(error.to_string())),
        }
    }
}
