use crate::error::Result;
use std::path::Path;
use travel_photos_common::PHOTO_EXTENSIONS;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PhotoFile {
    pub file_name: String,
}

/// ロケーションの写真ディレクトリを用意して既存写真を列挙する
///
/// ディレクトリがなければ作成する（空の結果を返す）。
pub fn scan_location_dir(dir: &Path) -> Result<Vec<PhotoFile>> {
    std::fs::create_dir_all(dir)?;
    scan_folder(dir)
}

/// フォルダ直下の写真ファイルをファイル名順で返す
pub fn scan_folder(folder: &Path) -> Result<Vec<PhotoFile>> {
    let mut photos = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !is_photo_path(path) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        photos.push(PhotoFile { file_name });
    }

    // ファイル名でソート（photo_001, photo_002, ... の順）
    photos.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(photos)
}

fn is_photo_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_photo_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

fn is_photo_extension(ext: &str) -> bool {
    PHOTO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
