//! 外部ヘルパーコマンドに画像URLの取得を任せる方式
//!
//! `<program> <args...> <album_url>` を実行し、標準出力の JSON 配列を読む。
//! 配列の要素は文字列でも `{ "url": ... }` でもよい。

use super::{dedup_images, AlbumResolver, RawAlbumItem, ResolvedImage};
use crate::config::CommandSettings;
use crate::error::ResolveError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub struct CommandResolver {
    settings: CommandSettings,
}

impl CommandResolver {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AlbumResolver for CommandResolver {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn resolve(&self, album_url: &str) -> Result<Vec<ResolvedImage>, ResolveError> {
        let program = self.settings.program.trim();
        if program.is_empty() {
            return Err(ResolveError::Command("ヘルパーコマンドが設定されていません".into()));
        }

        let mut command = Command::new(program);
        command
            .args(&self.settings.args)
            .arg(album_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // タイムアウトで future を破棄したとき子プロセスも終了させる
            .kill_on_drop(true);

        tracing::debug!(program, album = %album_url, "running album helper");

        let limit = Duration::from_secs(self.settings.timeout_secs);
        let output = tokio::time::timeout(limit, command.output())
            .await
            .map_err(|_| {
                ResolveError::Timeout(format!("{} が{}秒以内に終了しませんでした", program, limit.as_secs()))
            })?
            .map_err(|e| ResolveError::Command(format!("{} の実行に失敗: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Command(format!(
                "{} failed (code {:?}): {}",
                program,
                output.status.code(),
                stderr.trim()
            )));
        }

        parse_helper_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// ヘルパーの標準出力（JSON配列）を画像一覧に変換する
pub fn parse_helper_output(stdout: &str) -> Result<Vec<ResolvedImage>, ResolveError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let items: Vec<RawAlbumItem> =
        serde_json::from_str(trimmed).map_err(|e| ResolveError::Parse(e.to_string()))?;

    Ok(dedup_images(
        items.into_iter().filter_map(RawAlbumItem::into_resolved),
    ))
}
