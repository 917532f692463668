//! マニフェストの書き出しと検証

use crate::error::{PhotoSyncError, Result};
use std::fmt;
use std::path::Path;
use travel_photos_common::{is_safe_id, Manifest};

/// マニフェストを書き出す（既存ファイルは丸ごと置き換え）
///
/// 同じディレクトリの一時ファイルに書いてから rename するので、
/// 途中で落ちても読み手が半端なJSONを見ることはない。
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut json = manifest.to_json_pretty()?;
    json.push('\n');

    let file_name = path
        .file_name()
        .ok_or_else(|| PhotoSyncError::Config(format!("マニフェストのパスが不正: {}", path.display())))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&tmp_path, json)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)?;
    Ok(Manifest::from_json(&content)?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestIssue {
    EmptyName { location: String },
    /// パスとして使えないID（`../` など）
    UnsafeId { location: String },
    /// ファイル名以外を含む写真名
    UnsafePhotoName { location: String, file: String },
    MissingPhoto { location: String, file: String },
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestIssue::EmptyName { location } => write!(f, "{}: 名前が空です", location),
            ManifestIssue::UnsafeId { location } => write!(f, "{:?}: IDとして使えない文字を含みます", location),
            ManifestIssue::UnsafePhotoName { location, file } => {
                write!(f, "{}: ファイル名として不正です: {:?}", location, file)
            }
            ManifestIssue::MissingPhoto { location, file } => {
                write!(f, "{}: ファイルがありません: {}", location, file)
            }
        }
    }
}

/// マニフェストとディスク上の写真を突き合わせる
///
/// ディレクトリ自体がないロケーションは「まだ写真なし」としてファイル確認を飛ばす。
/// `photos_dir` の外を指すIDや写真名は結合せずに問題として返す。
pub fn verify_manifest(manifest: &Manifest, photos_dir: &Path) -> Vec<ManifestIssue> {
    let mut issues = Vec::new();

    for (id, entry) in manifest.iter() {
        if entry.name.trim().is_empty() {
            issues.push(ManifestIssue::EmptyName {
                location: id.clone(),
            });
        }

        if !is_safe_id(id) {
            issues.push(ManifestIssue::UnsafeId {
                location: id.clone(),
            });
            continue;
        }

        let dir = photos_dir.join(id);
        if !dir.is_dir() {
            continue;
        }

        for photo in &entry.photos {
            if !is_plain_file_name(photo) {
                issues.push(ManifestIssue::UnsafePhotoName {
                    location: id.clone(),
                    file: photo.clone(),
                });
                continue;
            }
            if !dir.join(photo).is_file() {
                issues.push(ManifestIssue::MissingPhoto {
                    location: id.clone(),
                    file: photo.clone(),
                });
            }
        }
    }

    issues
}

/// 区切り文字や `..` を含まない単独のファイル名か
fn is_plain_file_name(name: &str) -> bool {
    Path::new(name)
        .file_name()
        .is_some_and(|f| f.to_str() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_photos_common::ManifestEntry;

    #[test]
    fn test_display_issue() {
        let issue = ManifestIssue::MissingPhoto {
            location: "paris".into(),
            file: "photo_002.jpg".into(),
        };
        let display = issue.to_string();
        assert!(display.contains("paris"));
        assert!(display.contains("photo_002.jpg"));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos-manifest.json");

        let mut manifest = Manifest::new();
        manifest.insert("rome", ManifestEntry { name: "Rome".into(), photos: vec![] });
        write_manifest(&path, &manifest).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["photos-manifest.json"]);
    }

    #[test]
    fn test_is_plain_file_name() {
        assert!(is_plain_file_name("photo_001.jpg"));
        assert!(!is_plain_file_name("../photo_001.jpg"));
        assert!(!is_plain_file_name("sub/photo_001.jpg"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }
}
