//! 実行ドライバ
//!
//! エンジン呼び出しを待つ間、擬似進捗を一定間隔で進める。
//! 進捗は表示用で、実際の完了数ではない。

use crate::engine::{dispatch, ConversionGateway};
use crate::error::Result;
use image_batch_common::{BatchRequest, ProcessingOptions, ReplyOutcome, SessionController, TaggedReply};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// 擬似進捗を進める間隔
pub const PROGRESS_TICK: Duration = Duration::from_millis(500);

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} 変換中 [{bar:30.cyan/dim}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// 1回実行して応答を適用するまで待つ
pub async fn run_once(
    session: &mut SessionController,
    gateway: &dyn ConversionGateway,
    options: &ProcessingOptions,
    tick: Duration,
    show_progress: bool,
) -> Result<ReplyOutcome> {
    let request = session.start_run(options)?;
    let bar = show_progress.then(|| progress_bar(request.len()));

    let call = dispatch(gateway, &request);
    tokio::pin!(call);
    let mut ticker = tokio::time::interval(tick);
    // 最初のtickは即時に完了するので読み捨てる
    ticker.tick().await;

    let reply = loop {
        tokio::select! {
            reply = &mut call => break reply,
            _ = ticker.tick() => {
                session.tick_progress();
                if let Some(bar) = &bar {
                    bar.set_position(session.progress().done() as u64);
                }
            }
        }
    };

    let outcome = session.apply_reply(reply);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(outcome)
}

/// エンジン呼び出しを別タスクで実行し、応答をチャネルに送る
///
/// 受信側が先に閉じていれば応答は捨てる。
pub fn spawn_run(
    gateway: Arc<dyn ConversionGateway>,
    request: BatchRequest,
    replies: UnboundedSender<TaggedReply>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reply = dispatch(gateway.as_ref(), &request).await;
        if replies.send(reply).is_err() {
            debug!(token = %request.token, "reply receiver closed");
        }
    })
}
