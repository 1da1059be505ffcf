use {
    crate::*,
    std::{path::PathBuf, time::Duration},
};

/// The session form as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionForm {
    pub directory: Option<PathBuf>,
    pub basename: String,
    pub width: String,
    pub height: String,
    pub count: String,
    pub interval: String,
}

/// A validated session. Changing it means stopping and starting a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub output_path_template: PathBuf,
    /// 0 keeps the native width.
    pub width: u32,
    /// 0 keeps the native height.
    pub height: u32,
    /// 0 captures until stopped.
    pub count: u32,
    pub interval_seconds: u32,
}

impl SessionConfig {
    pub fn period(&self) -> Duration {
        Duration::from_micros(1_000_000 * self.interval_seconds as u64)
    }

    /// The output template as text, for the sequencer. Lossless, `validate`
    /// only accepts UTF-8 directories.
    pub fn template(&self) -> String {
        self.output_path_template.to_string_lossy().into_owned()
    }
}

fn parse_number(text: &str, field: Field, label: &str, errors: &mut Vec<FieldError>) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(value) => value,
        Err(_) => {
            errors.push(FieldError {
                field,
                message: format!("{label} must be a number."),
            });
            0
        }
    }
}

impl SessionForm {
    /// Fill the form from persisted settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let path = PathBuf::from(&settings.filename);
        let (directory, basename) = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                (Some(parent.to_path_buf()), name.to_string_lossy().into_owned())
            }
            _ => (None, settings.filename.clone()),
        };
        Self {
            directory,
            basename,
            width: settings.width.to_string(),
            height: settings.height.to_string(),
            count: settings.count.to_string(),
            interval: settings.interval.to_string(),
        }
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<SessionConfig, ValidationError> {
        let mut errors = Vec::new();

        let basename = self.basename.trim();
        if basename.is_empty() {
            errors.push(FieldError {
                field: Field::Name,
                message: "Name must not be empty.".to_string(),
            });
        }

        if self.directory.as_ref().is_some_and(|directory| directory.to_str().is_none()) {
            errors.push(FieldError {
                field: Field::Name,
                message: "Folder name must be valid text.".to_string(),
            });
        }

        let width = parse_number(&self.width, Field::Width, "Width", &mut errors);
        let height = parse_number(&self.height, Field::Height, "Height", &mut errors);
        let count = parse_number(&self.count, Field::Count, "Count", &mut errors);
        let interval = parse_number(&self.interval, Field::Interval, "Interval", &mut errors);

        if !errors.iter().any(|e| e.field == Field::Interval) && interval == 0 {
            errors.push(FieldError {
                field: Field::Interval,
                message: "Interval must be at least one second.".to_string(),
            });
        }

        // without a frame number every snapshot would overwrite the last one
        if !basename.is_empty()
            && !errors.iter().any(|e| e.field == Field::Count)
            && count != 1
            && !sequencer::has_sequence(basename)
        {
            errors.push(FieldError {
                field: Field::Name,
                message: "Name needs a frame number (like frame0000.jpeg) to capture more than one image."
                    .to_string(),
            });
        }

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        let output_path_template = match &self.directory {
            Some(directory) => directory.join(basename),
            None => PathBuf::from(basename),
        };
        Ok(SessionConfig {
            output_path_template,
            width,
            height,
            count,
            interval_seconds: interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(basename: &str, width: &str, height: &str, count: &str, interval: &str) -> SessionForm {
        SessionForm {
            directory: None,
            basename: basename.to_string(),
            width: width.to_string(),
            height: height.to_string(),
            count: count.to_string(),
            interval: interval.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let config = form("frame0000.jpeg", "640", " 480 ", "100", "2").validate().unwrap();
        assert_eq!(config.output_path_template, PathBuf::from("frame0000.jpeg"));
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.count, 100);
        assert_eq!(config.period(), Duration::from_secs(2));
    }

    #[test]
    fn test_directory_joined() {
        let mut form = form("shot01.png", "0", "0", "0", "5");
        form.directory = Some(PathBuf::from("/tmp/captures"));
        let config = form.validate().unwrap();
        assert_eq!(config.output_path_template, PathBuf::from("/tmp/captures/shot01.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_directory_rejected() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let mut form = form("shot01.png", "0", "0", "0", "5");
        form.directory = Some(PathBuf::from(OsStr::from_bytes(b"/tmp/caps\xff")));
        let error = form.validate().unwrap_err();
        assert!(error.has(Field::Name));
        assert_eq!(error.errors.len(), 1);
        assert!(error.to_string().contains("Folder name"));
    }

    #[test]
    fn test_every_failing_field_reported() {
        let error = form("", "wide", "", "-1", "2s").validate().unwrap_err();
        for field in [Field::Name, Field::Width, Field::Height, Field::Count, Field::Interval] {
            assert!(error.has(field), "{field:?} missing");
        }
        assert_eq!(error.to_string().lines().count(), 5);
        assert!(error.to_string().contains("Width must be a number."));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let error = form("frame0.jpg", "1", "1", "1", "0").validate().unwrap_err();
        assert_eq!(error.errors.len(), 1);
        assert!(error.has(Field::Interval));
    }

    #[test]
    fn test_name_without_number() {
        assert!(form("snapshot.jpg", "0", "0", "1", "1").validate().is_ok());
        let error = form("snapshot.jpg", "0", "0", "3", "1").validate().unwrap_err();
        assert!(error.has(Field::Name));
        assert!(form("snapshot.jpg", "0", "0", "0", "1").validate().is_err());
    }

    #[test]
    fn test_from_settings_splits_directory() {
        let settings = Settings {
            filename: "/srv/lapse/frame0000.jpeg".to_string(),
            ..Settings::default()
        };
        let form = SessionForm::from_settings(&settings);
        assert_eq!(form.directory, Some(PathBuf::from("/srv/lapse")));
        assert_eq!(form.basename, "frame0000.jpeg");
        assert_eq!(form.count, "100");

        let config = form.validate().unwrap();
        assert_eq!(Settings::from(&config), settings);
    }
}
