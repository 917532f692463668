//! 画像URLの正規化モジュール
//!
//! Google Photos の画像CDN（googleusercontent.com）はパス末尾の `=w..-h..` で
//! 返す解像度が決まる。サイズ指定を差し替えて大きい版を要求する。

use url::Url;

/// 画像CDNのドメイン
pub const IMAGE_CDN_DOMAIN: &str = "googleusercontent.com";

/// 既定の最大辺（px）
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// URLのホストが画像CDN（またはそのサブドメイン）か
pub fn is_cdn_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(is_cdn_host))
        .unwrap_or(false)
}

pub(crate) fn is_cdn_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == IMAGE_CDN_DOMAIN || host.ends_with(&format!(".{}", IMAGE_CDN_DOMAIN))
}

/// 高解像度版を要求するURLに書き換える
///
/// CDN以外のURLはそのまま返す。2回適用しても結果は変わらない。
pub fn normalize_image_url(url: &str, max_dimension: u32) -> String {
    if !is_cdn_url(url) {
        return url.to_string();
    }

    let base = url.split('=').next().unwrap_or(url);
    format!("{}=w{}-h{}", base, max_dimension, max_dimension)
}
