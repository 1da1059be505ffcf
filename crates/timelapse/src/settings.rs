use {
    crate::*,
    serde::{Deserialize, Serialize},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

// directory under the user configuration directory
const APP_DIR: &str = "timelapse";

const SETTINGS_FILE: &str = "settings.toml";

/// Persisted session parameters, the `[timelapse]` section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub count: u32,
    pub interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filename: "frame0000.jpeg".to_string(),
            width: 640,
            height: 480,
            count: 100,
            interval: 2,
        }
    }
}

impl From<&SessionConfig> for Settings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            filename: config.output_path_template.to_string_lossy().into_owned(),
            width: config.width,
            height: config.height,
            count: config.count,
            interval: config.interval_seconds,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    timelapse: Settings,
}

/// The settings file on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/timelapse/settings.toml`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Settings, SettingsError> {
        let content = fs::read_to_string(&self.path)?;
        let file: SettingsFile = toml::from_str(&content)?;
        Ok(file.timelapse)
    }

    /// Load the settings, falling back to the defaults when the file is
    /// missing or unreadable.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => {
                log::debug!("settings: loaded {}", self.path.display());
                settings
            }
            Err(SettingsError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                log::info!("settings: {} not found, using defaults", self.path.display());
                Settings::default()
            }
            Err(error) => {
                log::warn!("settings: unable to load {}: {}, using defaults", self.path.display(), error);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&SettingsFile {
            timelapse: settings.clone(),
        })?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Save, logging instead of failing.
    pub fn save_or_log(&self, settings: &Settings) {
        match self.save(settings) {
            Ok(()) => log::debug!("settings: saved {}", self.path.display()),
            Err(error) => log::error!("settings: unable to save {}: {}", self.path.display(), error),
        }
    }
}
