//! Travel Photos Common Library
//!
//! 写真取得ツールとサイト側で共有される型（ロケーション、マニフェストのスキーマ）

pub mod error;
pub mod location;
pub mod manifest;

pub use error::{Error, Result};
pub use location::{is_safe_id, validate_locations, Location};
pub use manifest::{photo_file_name, Manifest, ManifestEntry, PHOTO_EXTENSIONS};
