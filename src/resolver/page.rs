//! アルバムページから画像URLを抽出する方式
//!
//! 共有アルバムのページには `AF_initDataCallback(...)` でアルバムデータが埋め込まれており、
//! 写真1枚ごとに次の形の配列が並ぶ:
//!
//! ```text
//! ["AF1Qip...",["https://lh3.googleusercontent.com/pw/...",4032,3024,...
//! ```

use super::{dedup_images, AlbumResolver, ResolvedImage};
use crate::config::DownloadSettings;
use crate::error::ResolveError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

pub struct PageResolver {
    client: Client,
}

impl PageResolver {
    pub fn new(settings: &DownloadSettings) -> Result<Self, ResolveError> {
        // 短縮リンク（photos.app.goo.gl）はリダイレクトで本体に飛ぶ
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AlbumResolver for PageResolver {
    fn name(&self) -> &'static str {
        "page"
    }

    async fn resolve(&self, album_url: &str) -> Result<Vec<ResolvedImage>, ResolveError> {
        let url = url::Url::parse(album_url)
            .map_err(|e| ResolveError::InvalidUrl(format!("{}: {}", album_url, e)))?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let html = response.text().await?;
        tracing::debug!(album = %album_url, final_url = %final_url, bytes = html.len(), "fetched album page");

        Ok(extract_album_images(&html))
    }
}

/// ページHTMLからアルバム内の写真URLをページ順で抽出する
pub fn extract_album_images(html: &str) -> Vec<ResolvedImage> {
    lazy_static::lazy_static! {
        // 写真エントリ: ["<uid>",["<url>",<width>,<height>
        static ref ENTRY_RE: Regex = Regex::new(
            r#"\["[\w-]+",\["(https://[\w.-]*googleusercontent\.com/[^"\s]+)",\d+,\d+"#
        ).unwrap();
    }

    dedup_images(
        ENTRY_RE
            .captures_iter(html)
            .map(|caps| ResolvedImage::new(&caps[1])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"<html><head>
<meta property="og:image" content="https://lh3.googleusercontent.com/pw/COVER=w600-h315-p-k">
</head><body>
<script>AF_initDataCallback({key: 'ds:1', hash: '2', data:[null,[
["AF1QipA1",["https://lh3.googleusercontent.com/pw/AP1GczFirst",4032,3024,null,null,null,null,null,null,[1]],1700000000000,"x",0],
["AF1QipB2",["https://lh3.googleusercontent.com/pw/AP1GczSecond",3024,4032,null],1700000001000,"y",0],
["AF1QipA1",["https://lh3.googleusercontent.com/pw/AP1GczFirst",4032,3024,null],1700000000000,"x",0],
["AF1QipC3",["https://lh4.googleusercontent.com/pw/AP1GczThird",800,600,null],1700000002000,"z",0]
]], sideChannel: {}});</script>
<img src="https://lh3.googleusercontent.com/a/AVATAR=s64">
</body></html>"#;

    #[test]
    fn test_extract_album_images_in_page_order() {
        let urls: Vec<_> = extract_album_images(SAMPLE_PAGE)
            .into_iter()
            .map(|i| i.url)
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://lh3.googleusercontent.com/pw/AP1GczFirst",
                "https://lh3.googleusercontent.com/pw/AP1GczSecond",
                "https://lh4.googleusercontent.com/pw/AP1GczThird",
            ]
        );
    }

    #[test]
    fn test_extract_ignores_cover_and_avatars() {
        let urls: Vec<_> = extract_album_images(SAMPLE_PAGE)
            .into_iter()
            .map(|i| i.url)
            .collect();
        assert!(!urls.iter().any(|u| u.contains("COVER") || u.contains("AVATAR")));
    }

    #[test]
    fn test_extract_empty_page() {
        assert!(extract_album_images("<html><body>no album here</body></html>").is_empty());
    }
}
