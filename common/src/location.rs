//! ロケーション（旅行先）の型定義と検証
//!
//! ロケーションIDはそのまま `photos/<id>/` のディレクトリ名になるため、
//! ファイルシステムで安全な文字だけを許可する。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 旅行先1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,

    pub name: String,

    /// 共有アルバムのURL（未設定ならダウンロードしない）
    #[serde(default, alias = "googlePhotosLink", skip_serializing_if = "Option::is_none")]
    pub source_album_url: Option<String>,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_album_url: None,
        }
    }

    pub fn with_album(mut self, url: impl Into<String>) -> Self {
        self.source_album_url = Some(url.into());
        self
    }

    /// 空文字のURLは未設定として扱う
    pub fn album_url(&self) -> Option<&str> {
        self.source_album_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// パスに直接使えるID（空でなく、英小文字・数字・`-`・`_` のみ）
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// ロケーション一覧を検証する
///
/// - IDは空でなく、英小文字・数字・`-`・`_` のみ
/// - 名前は空白以外を含む
/// - ID・名前ともに重複なし
/// - アルバムURLは http/https の絶対URL
pub fn validate_locations(locations: &[Location]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();

    for location in locations {
        if !is_safe_id(&location.id) {
            return Err(Error::InvalidLocation(format!(
                "id {:?} must be non-empty and use only a-z, 0-9, '-' or '_'",
                location.id
            )));
        }

        let name = location.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidLocation(format!(
                "{}: name must not be empty",
                location.id
            )));
        }

        if !ids.insert(location.id.as_str()) {
            return Err(Error::InvalidLocation(format!("duplicate id: {}", location.id)));
        }
        if !names.insert(name) {
            return Err(Error::InvalidLocation(format!("duplicate name: {}", name)));
        }

        if let Some(album) = location.album_url() {
            match url::Url::parse(album) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => {
                    return Err(Error::InvalidLocation(format!(
                        "{}: album url {:?} is not an http(s) URL",
                        location.id, album
                    )))
                }
            }
        }
    }

    Ok(())
}
