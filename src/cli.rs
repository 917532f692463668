use crate::strategy::ResolverStrategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "travel-photos")]
#[command(about = "旅行アルバムの写真を取得してマニフェストを生成するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（省略時は ./travel-photos.json → ~/.config/travel-photos/config.json）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 全ロケーションの写真を取得してマニフェストを書き出す
    Sync {
        /// アルバム解決の方式
        #[arg(short, long)]
        strategy: Option<ResolverStrategy>,

        /// 写真の保存先（ロケーションごとにサブフォルダ）
        #[arg(long)]
        photos_dir: Option<PathBuf>,

        /// 出力マニフェストJSON
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// 指定したロケーションIDだけ処理（複数指定可）
        #[arg(long = "only", value_name = "ID")]
        only: Vec<String>,
    },

    /// アルバムURLから取得できる画像URLを表示（ダウンロードしない）
    Resolve {
        /// 共有アルバムのURL
        #[arg(required = true)]
        album_url: String,

        /// アルバム解決の方式
        #[arg(short, long)]
        strategy: Option<ResolverStrategy>,
    },

    /// マニフェストとディスク上の写真を突き合わせる
    Verify {
        /// 写真の保存先
        #[arg(long)]
        photos_dir: Option<PathBuf>,

        /// マニフェストJSON
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// 登録ロケーションを検証して一覧表示
    Locations,

    /// 設定を表示/作成
    Config {
        /// 現在の設定を表示
        #[arg(long)]
        show: bool,

        /// 既定の設定ファイルを ./travel-photos.json に作成
        #[arg(long)]
        init: bool,
    },
}
