//! 写真マニフェストのスキーマ
//!
//! サイト側はビルド時にこのJSONを読み、`photos/<id>/<file>` を表示する。
//!
//! ```json
//! { "seattle": { "name": "Seattle", "photos": ["photo_001.jpg"] } }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 既存写真として扱う拡張子（大文字小文字は区別しない）
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// マニフェストの1エントリ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,

    #[serde(default)]
    pub photos: Vec<String>,
}

/// ロケーションID → エントリ
///
/// キー順で出力するので、入力が同じなら毎回同じバイト列になる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// エントリを追加（同じIDは上書き）
    pub fn insert(&mut self, id: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(id.into(), entry);
    }

    /// サイト側の扱いと同じく、未登録も空リストも「写真なし」
    pub fn photos(&self, id: &str) -> &[String] {
        self.entries
            .get(id)
            .map(|e| e.photos.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_photos(&self) -> usize {
        self.entries.values().map(|e| e.photos.len()).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 1始まりの連番から保存ファイル名を作る（`photo_001.jpg`）
pub fn photo_file_name(index: usize) -> String {
    format!("photo_{:03}.jpg", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_file_name() {
        assert_eq!(photo_file_name(1), "photo_001.jpg");
        assert_eq!(photo_file_name(42), "photo_042.jpg");
        assert_eq!(photo_file_name(1234), "photo_1234.jpg");
    }

    #[test]
    fn test_manifest_json_shape() {
        let mut manifest = Manifest::new();
        manifest.insert(
            "paris",
            ManifestEntry {
                name: "Paris".to_string(),
                photos: vec!["photo_001.jpg".to_string()],
            },
        );

        let value: serde_json::Value =
            serde_json::from_str(&manifest.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["paris"]["name"], "Paris");
        assert_eq!(value["paris"]["photos"][0], "photo_001.jpg");
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut manifest = Manifest::new();
        manifest.insert("tokyo", ManifestEntry::default());
        manifest.insert("lisbon", ManifestEntry::default());

        let json = manifest.to_json_pretty().unwrap();
        assert!(json.find("lisbon").unwrap() < json.find("tokyo").unwrap());
    }

    #[test]
    fn test_missing_photos_field_defaults_to_empty() {
        let manifest = Manifest::from_json(r#"{"rome":{"name":"Rome"}}"#).unwrap();
        assert!(manifest.photos("rome").is_empty());
        assert!(manifest.photos("unknown").is_empty());
    }

    #[test]
    fn test_totals() {
        let mut manifest = Manifest::new();
        manifest.insert(
            "a",
            ManifestEntry {
                name: "A".into(),
                photos: vec!["photo_001.jpg".into(), "photo_002.jpg".into()],
            },
        );
        manifest.insert("b", ManifestEntry { name: "B".into(), photos: vec![] });
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.total_photos(), 2);
    }
}
