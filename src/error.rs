use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoSyncError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] travel_photos_common::Error),

    #[error("アルバム解決エラー: {0}")]
    Resolve(#[from] ResolveError),

    #[error("ダウンロードエラー: {0}")]
    Download(#[from] DownloadError),

    #[error("マニフェスト検証エラー: {0}件の問題")]
    Verification(usize),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

/// 画像1枚のダウンロード失敗
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("リダイレクトが多すぎます（上限{max}回）: {url}")]
    TooManyRedirects { url: String, max: u32 },

    #[error("想定外のHTTPステータス {status}: {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("タイムアウト（{secs}秒）: {url}")]
    Timeout { url: String, secs: u64 },

    #[error("未対応のスキーム: {0}")]
    UnsupportedScheme(String),

    #[error("URLが不正: {0}")]
    InvalidUrl(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

/// アルバムから画像URLを取得できなかった
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URLが不正: {0}")]
    InvalidUrl(String),

    #[error("ブラウザ操作エラー: {0}")]
    Browser(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("外部コマンドエラー: {0}")]
    Command(String),

    #[error("アルバムデータの解析に失敗: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PhotoSyncError>;
