use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use maddy_chat::{ControllerConfig, DEFAULT_BOT_NAME, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_USER_NAME};
use maddy_client::{DEFAULT_BASE_URL, TransportConfig};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const SETTINGS_DIRECTORY_NAME: &str = "maddy";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "MADDY_";
/// Extension of the file written before it replaces the settings file.
const PARTIAL_EXTENSION: &str = "json.partial";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    /// Rewritten as an HTML page after every transcript change when set.
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            user_name: default_user_name(),
            bot_name: default_bot_name(),
            transcript_path: None,
        }
    }
}

impl ChatSettings {
    pub fn normalized(mut self) -> Self {
        self.endpoint = non_blank_or(self.endpoint, default_endpoint);
        self.user_name = non_blank_or(self.user_name, default_user_name);
        self.bot_name = non_blank_or(self.bot_name, default_bot_name);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = default_max_upload_bytes();
        }
        self.transcript_path = self
            .transcript_path
            .filter(|path| !path.as_os_str().is_empty());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(&self.endpoint, self.request_timeout())
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            user_name: self.user_name.clone(),
            bot_name: self.bot_name.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<ChatSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".maddy"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<ChatSettings> {
        self.settings.load_full()
    }

    /// Swaps the live settings without touching the file.
    pub fn replace(&self, settings: ChatSettings) {
        self.settings.store(Arc::new(settings.normalized()));
    }

    pub fn update(&self, settings: ChatSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> ChatSettings {
        if !path.exists() {
            tracing::info!(path = %path.display(), "settings file not found, using defaults");
        }

        let figment = Figment::from(Serialized::defaults(ChatSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        match figment.extract::<ChatSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "failed to parse settings, using defaults"
                );
                ChatSettings::default()
            }
        }
    }

    /// Writes a partial file beside the settings file, then renames it over.
    fn persist(&self, settings: &ChatSettings) -> Result<(), SettingsError> {
        if let Some(config_dir) = self.config_path.parent() {
            std::fs::create_dir_all(config_dir).context(CreateConfigDirSnafu {
                stage: "create-maddy-config-dir",
                path: config_dir.to_path_buf(),
            })?;
        }

        let encoded = serde_json::to_vec_pretty(settings).context(EncodeSettingsSnafu {
            stage: "encode-chat-settings",
        })?;

        let partial_path = self.config_path.with_extension(PARTIAL_EXTENSION);
        std::fs::write(&partial_path, &encoded).context(WritePartialSnafu {
            stage: "write-partial-chat-settings",
            path: partial_path.clone(),
        })?;
        std::fs::rename(&partial_path, &self.config_path).context(PublishSettingsSnafu {
            stage: "publish-chat-settings",
            partial: partial_path,
            path: self.config_path.clone(),
        })?;

        tracing::info!(
            path = %self.config_path.display(),
            endpoint = %settings.endpoint,
            bytes = encoded.len(),
            "chat settings saved"
        );
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("cannot create config directory {path:?} on `{stage}`: {source}"))]
    CreateConfigDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot encode chat settings on `{stage}`: {source}"))]
    EncodeSettings {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("cannot write {path:?} on `{stage}`: {source}"))]
    WritePartial {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot move {partial:?} over {path:?} on `{stage}`: {source}"))]
    PublishSettings {
        stage: &'static str,
        partial: PathBuf,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SettingsError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::CreateConfigDir { stage, .. }
            | Self::EncodeSettings { stage, .. }
            | Self::WritePartial { stage, .. }
            | Self::PublishSettings { stage, .. } => stage,
        }
    }
}

fn non_blank_or(value: String, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

fn default_endpoint() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_user_name() -> String {
    DEFAULT_USER_NAME.to_string()
}

fn default_bot_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}
