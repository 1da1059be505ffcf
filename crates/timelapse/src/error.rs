use {camera::CameraError, std::fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    EmptyTemplate,
    /// The frame number does not fit, or would overflow once incremented.
    Overflow(String),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::EmptyTemplate => write!(f, "empty filename template"),
            SequenceError::Overflow(field) => write!(f, "frame number {field} overflows"),
        }
    }
}

impl std::error::Error for SequenceError {}

/// Which form field a validation message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Width,
    Height,
    Count,
    Interval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every problem found in a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn has(&self, field: Field) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    NoConfigDir,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "settings I/O error: {err}"),
            SettingsError::Parse(err) => write!(f, "settings parse error: {err}"),
            SettingsError::Serialize(err) => write!(f, "settings serialize error: {err}"),
            SettingsError::NoConfigDir => write!(f, "no configuration directory"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
            SettingsError::Serialize(err) => Some(err),
            SettingsError::NoConfigDir => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(err: toml::de::Error) -> Self {
        SettingsError::Parse(err)
    }
}

impl From<toml::ser::Error> for SettingsError {
    fn from(err: toml::ser::Error) -> Self {
        SettingsError::Serialize(err)
    }
}

#[derive(Debug)]
pub enum SessionError {
    Validation(ValidationError),
    Pipeline(CameraError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Validation(err) => write!(f, "{err}"),
            SessionError::Pipeline(err) => write!(f, "Could not start the camera: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Validation(err) => Some(err),
            SessionError::Pipeline(err) => Some(err),
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Validation(err)
    }
}

impl From<CameraError> for SessionError {
    fn from(err: CameraError) -> Self {
        SessionError::Pipeline(err)
    }
}
