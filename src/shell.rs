//! 対話モード
//!
//! 標準入力の1行を1コマンドとして処理する。エンジン呼び出しは別タスクで動き、
//! 応答はチャネル経由でこのループに戻るので、実行中でも clear / load / cancel を受け付ける。

use crate::engine::ConversionGateway;
use crate::error::Result;
use crate::export::{export_all_to_dir, export_single_to_dir, BulkMode};
use crate::render;
use crate::runner::{spawn_run, PROGRESS_TICK};
use crate::scanner;
use image_batch_common::{
    NoticeBoard, PreviewPool, ProcessingOptions, ReplyOutcome, SessionController, TaggedReply, ViewKind,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub const HELP: &str = "\
コマンド:
  load <path>...   画像を読み込む（現在のセッションを置き換え）
  run              変換を開始
  cancel           キャンセルを要求（実行中の処理は止まらない）
  select <n>       画像を選択
  grid | list | thumbs   表示を切り替え
  show             選択中の画像の詳細
  export <n>       1枚を保存
  export-all       全件を保存
  clear            すべてクリア
  status           状態を表示
  help             このヘルプ
  quit             終了";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Load(Vec<PathBuf>),
    Run,
    Cancel,
    Select(usize),
    View(ViewKind),
    Show,
    Export(usize),
    ExportAll,
    Clear,
    Status,
    Help,
    Quit,
}

fn parse_index(arg: Option<&str>, usage: &str) -> std::result::Result<usize, String> {
    arg.ok_or_else(|| format!("使い方: {}", usage))?
        .parse()
        .map_err(|_| format!("番号が不正です: {}", usage))
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(String::new());
        };
        match head.to_lowercase().as_str() {
            "load" => {
                let paths: Vec<PathBuf> = parts.map(PathBuf::from).collect();
                if paths.is_empty() {
                    return Err("使い方: load <path>...".to_string());
                }
                Ok(ShellCommand::Load(paths))
            }
            "run" => Ok(ShellCommand::Run),
            "cancel" => Ok(ShellCommand::Cancel),
            "select" => Ok(ShellCommand::Select(parse_index(parts.next(), "select <n>")?)),
            "grid" => Ok(ShellCommand::View(ViewKind::Grid)),
            "list" => Ok(ShellCommand::View(ViewKind::List)),
            "thumbs" | "thumbnails" => Ok(ShellCommand::View(ViewKind::Thumbnails)),
            "show" => Ok(ShellCommand::Show),
            "export" => Ok(ShellCommand::Export(parse_index(parts.next(), "export <n>")?)),
            "export-all" => Ok(ShellCommand::ExportAll),
            "clear" => Ok(ShellCommand::Clear),
            "status" => Ok(ShellCommand::Status),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            other => Err(format!("不明なコマンド: {}（help で一覧）", other)),
        }
    }
}

/// 1コマンド分の出力
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub text: String,
    pub quit: bool,
}

impl ShellOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// 対話セッション
pub struct Shell {
    session: SessionController,
    gateway: Arc<dyn ConversionGateway>,
    options: ProcessingOptions,
    output_dir: PathBuf,
    bulk_mode: BulkMode,
    recursive: bool,
    view: ViewKind,
    notices: NoticeBoard,
    previews: PreviewPool,
    replies: UnboundedSender<TaggedReply>,
}

impl Shell {
    pub fn new(
        gateway: Arc<dyn ConversionGateway>,
        options: ProcessingOptions,
        output_dir: PathBuf,
        bulk_mode: BulkMode,
        notice_lifetime: Duration,
    ) -> (Self, UnboundedReceiver<TaggedReply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shell = Self {
            session: SessionController::new(),
            gateway,
            options,
            output_dir,
            bulk_mode,
            recursive: false,
            view: ViewKind::List,
            notices: NoticeBoard::new(notice_lifetime),
            previews: PreviewPool::new(),
            replies: tx,
        };
        (shell, rx)
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn notices(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// 現在のビューを描画
    pub fn render_view(&mut self) -> String {
        let projector = self.session.projector();
        match self.view {
            ViewKind::Grid => render::render_grid(&projector.grid(&mut self.previews)),
            ViewKind::List => render::render_list(&projector.list()),
            ViewKind::Thumbnails => render::render_thumbnails(&projector.thumbnails(&mut self.previews)),
        }
    }

    fn status_line(&self) -> String {
        render::render_status(self.session.state(), &self.session.projector().controls())
    }

    /// コマンドを処理する（エラーは通知にして返す）
    pub async fn handle(&mut self, command: ShellCommand) -> ShellOutput {
        match self.execute(command).await {
            Ok(output) => output,
            Err(e) => {
                let message = e.to_string();
                self.notices.error(message.clone(), Instant::now());
                ShellOutput::text(format!("⚠ {}", message))
            }
        }
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<ShellOutput> {
        let output = match command {
            ShellCommand::Load(paths) => {
                let files = scanner::load_sources(&paths, self.recursive)?;
                let count = self.session.ingest(files)?;
                self.previews.purge();
                ShellOutput::text(format!("✔ {}枚の画像を読み込みました\n{}", count, self.render_view()))
            }
            ShellCommand::Run => {
                let request = self.session.start_run(&self.options)?;
                let count = request.len();
                spawn_run(Arc::clone(&self.gateway), request, self.replies.clone());
                ShellOutput::text(format!(
                    "- {}枚を変換中... (形式: {}, 品質: {})",
                    count, self.options.target_format, self.options.quality
                ))
            }
            ShellCommand::Cancel => {
                self.session.request_cancel()?;
                ShellOutput::text("- キャンセルを要求しました（実行中の変換は完了まで続きます）")
            }
            ShellCommand::Select(index) => {
                self.session.select_in(self.view, index);
                ShellOutput::text(format!(
                    "{}\n{}",
                    self.render_view(),
                    render::render_detail(self.session.projector().detail().as_ref())
                ))
            }
            ShellCommand::View(kind) => {
                self.view = kind;
                ShellOutput::text(self.render_view())
            }
            ShellCommand::Show => {
                ShellOutput::text(render::render_detail(self.session.projector().detail().as_ref()))
            }
            ShellCommand::Export(index) => {
                let path = export_single_to_dir(&self.session, index, &self.output_dir)?;
                ShellOutput::text(format!("✔ 保存: {}", path.display()))
            }
            ShellCommand::ExportAll => {
                let summary = export_all_to_dir(&self.session, &self.output_dir, self.bulk_mode).await?;
                let mut text = String::new();
                for path in &summary.written {
                    text.push_str(&format!("✔ 保存: {}\n", path.display()));
                }
                ShellOutput::text(text.trim_end().to_string())
            }
            ShellCommand::Clear => {
                self.session.clear();
                self.previews.purge();
                ShellOutput::text(format!("✔ クリアしました\n{}", self.render_view()))
            }
            ShellCommand::Status => {
                let mut text = self.status_line();
                if let Some(notice) = self.notices.current(Instant::now()) {
                    text.push_str(&format!("\n通知: {}", notice.message));
                }
                ShellOutput::text(text)
            }
            ShellCommand::Help => ShellOutput::text(HELP),
            ShellCommand::Quit => ShellOutput {
                text: String::new(),
                quit: true,
            },
        };
        Ok(output)
    }

    /// エンジンの応答を反映する
    pub fn on_reply(&mut self, reply: TaggedReply) -> Option<String> {
        match self.session.apply_reply(reply) {
            ReplyOutcome::Applied { succeeded, failed, state } => {
                self.previews.purge();
                Some(format!(
                    "✔ 変換完了: 成功 {}枚 / 失敗 {}枚 ({})\n{}",
                    succeeded,
                    failed,
                    state,
                    self.render_view()
                ))
            }
            ReplyOutcome::Failed(error) => {
                let message = format!("処理に失敗しました: {}", error);
                self.notices.error(message.clone(), Instant::now());
                Some(format!("⚠ {}", message))
            }
            ReplyOutcome::Stale(token) => {
                debug!(%token, "stale reply ignored by shell");
                None
            }
        }
    }

    /// 擬似進捗を進める
    pub fn on_tick(&mut self) {
        self.session.tick_progress();
    }
}

/// 標準入力を読みながら応答とtickを待つイベントループ
pub async fn run_shell(mut shell: Shell, mut replies: UnboundedReceiver<TaggedReply>) -> Result<()> {
    println!("{}\n", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(PROGRESS_TICK);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(command) => {
                        let output = shell.handle(command).await;
                        if !output.text.is_empty() {
                            println!("{}", output.text);
                        }
                        if output.quit {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
            Some(reply) = replies.recv() => {
                if let Some(text) = shell.on_reply(reply) {
                    println!("{}", text);
                }
            }
            _ = ticker.tick() => shell.on_tick(),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("run".parse::<ShellCommand>(), Ok(ShellCommand::Run));
        assert_eq!("select 3".parse::<ShellCommand>(), Ok(ShellCommand::Select(3)));
        assert_eq!("export 0".parse::<ShellCommand>(), Ok(ShellCommand::Export(0)));
        assert_eq!(
            "thumbs".parse::<ShellCommand>(),
            Ok(ShellCommand::View(ViewKind::Thumbnails))
        );
        assert_eq!(
            "load a.png photos".parse::<ShellCommand>(),
            Ok(ShellCommand::Load(vec![PathBuf::from("a.png"), PathBuf::from("photos")]))
        );
        assert_eq!("EXIT".parse::<ShellCommand>(), Ok(ShellCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!("select".parse::<ShellCommand>().is_err());
        assert!("select x".parse::<ShellCommand>().is_err());
        assert!("load".parse::<ShellCommand>().is_err());
        assert!("frobnicate".parse::<ShellCommand>().is_err());
    }
}
