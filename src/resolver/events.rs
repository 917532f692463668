//! ブラウザ方式の進捗イベント
//!
//! 解決器は `BrowserEventSink` にイベントを送るだけで、受け手（ログ出力、チャネル、テスト）は
//! 呼び出し側が渡す。

use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    Launched,
    Navigated { url: String },
    ImagesVisible,
    Scrolled { distance: u32, scroll_height: f64 },
    Settled,
    Extracted { found: usize, kept: usize },
    Closed,
}

pub trait BrowserEventSink: Send + Sync {
    fn emit(&self, event: BrowserEvent);
}

/// tracing に流す（既定）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl BrowserEventSink for TracingEvents {
    fn emit(&self, event: BrowserEvent) {
        match event {
            BrowserEvent::Scrolled { distance, scroll_height } => {
                tracing::trace!(distance, scroll_height, "scrolled");
            }
            BrowserEvent::Extracted { found, kept } => {
                tracing::debug!(found, kept, "extracted image sources");
            }
            other => tracing::debug!(event = ?other, "browser"),
        }
    }
}

/// チャネルで購読する場合（受信側が閉じていたら捨てる）
impl BrowserEventSink for UnboundedSender<BrowserEvent> {
    fn emit(&self, event: BrowserEvent) {
        let _ = self.send(event);
    }
}
