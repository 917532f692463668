use crate::error::{PhotoSyncError, Result};
use crate::strategy::ResolverStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use travel_photos_common::Location;

/// カレントディレクトリで探す設定ファイル名
pub const LOCAL_CONFIG_FILE: &str = "travel-photos.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub locations: Vec<Location>,
    pub photos_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub strategy: ResolverStrategy,
    /// 高解像度リクエスト時の最大辺（px）
    pub max_dimension: u32,
    /// ダウンロード間の待機（レート制限対策）
    pub download_delay_ms: u64,
    pub download: DownloadSettings,
    pub browser: BrowserSettings,
    pub command: CommandSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadSettings {
    pub timeout_secs: u64,
    pub max_redirects: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserSettings {
    /// Chrome/Chromium の実行ファイル（未指定なら自動検出）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
    pub image_wait_secs: u64,
    pub scroll_step: u32,
    pub scroll_interval_ms: u64,
    pub max_scroll_distance: u32,
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandSettings {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locations: vec![Location::new("seattle", "Seattle")
                .with_album("https://photos.app.goo.gl/7P6z2JjEF24G5NN58")],
            photos_dir: PathBuf::from("public").join("photos"),
            manifest_path: PathBuf::from("src").join("data").join("photos-manifest.json"),
            strategy: ResolverStrategy::default(),
            max_dimension: 2048,
            download_delay_ms: 200,
            download: DownloadSettings::default(),
            browser: BrowserSettings::default(),
            command: CommandSettings::default(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 5,
            user_agent: concat!("travel-photos/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            navigation_timeout_secs: 60,
            image_wait_secs: 30,
            scroll_step: 100,
            scroll_interval_ms: 100,
            max_scroll_distance: 10_000,
            settle_ms: 2_000,
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            program: "google-photos-album-image-url-fetch".to_string(),
            args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

impl DownloadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// 設定を読み込む
    ///
    /// 明示パス → `./travel-photos.json` → `~/.config/travel-photos/config.json` の順。
    /// どれもなければ既定値。明示パスが存在しない場合はエラー。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(PhotoSyncError::Config(format!(
                    "設定ファイルが見つかりません: {}",
                    path.display()
                )));
            }
            return Self::load_from(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }

        if let Ok(user) = Self::user_config_path() {
            if user.exists() {
                return Self::load_from(&user);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), locations = config.locations.len(), "loaded config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn user_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PhotoSyncError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("travel-photos").join("config.json"))
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }

    /// `--only` で指定されたIDだけに絞る（順序は設定のまま）
    pub fn select_locations(&self, only: &[String]) -> Result<Vec<Location>> {
        if only.is_empty() {
            return Ok(self.locations.clone());
        }

        if let Some(unknown) = only
            .iter()
            .find(|id| !self.locations.iter().any(|l| &l.id == *id))
        {
            return Err(PhotoSyncError::Config(format!(
                "ロケーションが登録されていません: {}",
                unknown
            )));
        }

        Ok(self
            .locations
            .iter()
            .filter(|l| only.contains(&l.id))
            .cloned()
            .collect())
    }
}
