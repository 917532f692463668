use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// アルバム解決の方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// アルバムページを取得して埋め込みデータから抽出
    #[default]
    Page,
    /// 外部ヘルパーコマンドにURL取得を任せる
    Command,
    /// ヘッドレスブラウザでスクロールしながら抽出
    Browser,
}

impl ResolverStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ResolverStrategy::Page => "page",
            ResolverStrategy::Command => "command",
            ResolverStrategy::Browser => "browser",
        }
    }
}

impl std::fmt::Display for ResolverStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
