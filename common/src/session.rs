//! セッションコントローラ
//!
//! レジストリ・結果ストア・選択位置を一つの集約として排他的に保持する状態機械。
//!
//! 状態遷移:
//! - Idle / FilesLoaded / Completed / Cancelled --ingest--> FilesLoaded
//! - FilesLoaded / Completed / Cancelled --start_run--> Processing
//! - Processing --応答(成功)--> Completed（キャンセル要求済みなら Cancelled）
//! - Processing --応答(失敗)--> FilesLoaded（結果は残さない）
//! - Processing --request_cancel--> Processing（フラグのみ。呼び出しは中断しない）
//! - 任意 --clear--> Idle
//!
//! 応答は実行トークンで照合し、世代が変わった後に届いた古い応答は破棄する。

use crate::error::{GatewayError, Result, SessionError};
use crate::export::ExportCoordinator;
use crate::gateway::{BatchRequest, RunToken, TaggedReply};
use crate::progress::SyntheticProgress;
use crate::registry::SourceRegistry;
use crate::results::ResultStore;
use crate::types::{ProcessingOptions, SessionState, SourceFile};
use crate::view::{ViewKind, ViewProjector};
use tracing::{debug, info, warn};

/// 応答適用の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// 結果を反映した
    Applied {
        succeeded: usize,
        failed: usize,
        state: SessionState,
    },
    /// エンジン呼び出し自体が失敗した（状態は FilesLoaded に戻る）
    Failed(GatewayError),
    /// 古い応答なので破棄した
    Stale(RunToken),
}

#[derive(Debug, Clone)]
struct InFlightRun {
    token: RunToken,
    item_count: usize,
}

#[derive(Debug, Default)]
pub struct SessionController {
    registry: SourceRegistry,
    results: ResultStore,
    selection: usize,
    state: SessionState,
    generation: u64,
    run_counter: u64,
    in_flight: Option<InFlightRun>,
    last_options: Option<ProcessingOptions>,
    cancel_requested: bool,
    progress: SyntheticProgress,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルを取り込んでレジストリを置き換える
    ///
    /// 画像が1枚もない場合は `ValidationError` を返し、状態は変えない。
    /// 実行中は取り込みできない。
    pub fn ingest(&mut self, files: Vec<SourceFile>) -> Result<usize> {
        if self.state == SessionState::Processing {
            return Err(SessionError::RunInFlight.into());
        }

        let count = self.registry.ingest(files)?;
        self.results.clear();
        self.selection = 0;
        self.generation += 1;
        self.cancel_requested = false;
        self.last_options = None;
        self.progress.reset();
        self.state = SessionState::FilesLoaded;

        info!(count, generation = self.generation, "files ingested");
        Ok(count)
    }

    /// セッションを空にする（どの状態からでも可能）
    ///
    /// 実行中に呼ばれた場合、その実行の応答は届いても破棄される。
    pub fn clear(&mut self) {
        if let Some(run) = self.in_flight.take() {
            debug!(token = %run.token, "clearing session with a run in flight");
        }
        self.registry.clear();
        self.results.clear();
        self.selection = 0;
        self.generation += 1;
        self.cancel_requested = false;
        self.last_options = None;
        self.progress.reset();
        self.state = SessionState::Idle;

        info!(generation = self.generation, "session cleared");
    }

    /// 実行を開始して、エンジンへ送るリクエストを返す
    ///
    /// 設定はここでスナップショットされ、以後の変更は影響しない。
    pub fn start_run(&mut self, options: &ProcessingOptions) -> Result<BatchRequest> {
        if self.state == SessionState::Processing {
            return Err(SessionError::RunInFlight.into());
        }
        if self.registry.is_empty() {
            return Err(SessionError::NoItems.into());
        }
        options.validate()?;

        self.run_counter += 1;
        let token = RunToken {
            generation: self.generation,
            run_id: self.run_counter,
        };
        let snapshot = options.clone();
        let request = BatchRequest {
            token,
            contents: self
                .registry
                .items()
                .iter()
                .map(|item| item.shared_content())
                .collect(),
            options: snapshot.clone(),
        };

        self.results.clear();
        self.cancel_requested = false;
        self.last_options = Some(snapshot);
        self.in_flight = Some(InFlightRun {
            token,
            item_count: request.len(),
        });
        self.progress.start(request.len());
        self.state = SessionState::Processing;

        info!(token = %token, items = request.len(), format = %options.target_format, "run dispatched");
        Ok(request)
    }

    /// キャンセルを要求する
    ///
    /// フラグを立てて以後のキャンセルを無効にするだけで、エンジン呼び出しは止めない。
    pub fn request_cancel(&mut self) -> Result<()> {
        if self.state != SessionState::Processing {
            return Err(SessionError::NotProcessing.into());
        }
        if self.cancel_requested {
            return Err(SessionError::CancelAlreadyRequested.into());
        }
        self.cancel_requested = true;
        info!("cancellation requested; the engine call keeps running");
        Ok(())
    }

    /// エンジンの応答を適用する
    pub fn apply_reply(&mut self, reply: TaggedReply) -> ReplyOutcome {
        let matches = self
            .in_flight
            .as_ref()
            .is_some_and(|run| run.token == reply.token);
        if !matches {
            debug!(token = %reply.token, generation = self.generation, "stale reply discarded");
            return ReplyOutcome::Stale(reply.token);
        }
        let Some(run) = self.in_flight.take() else {
            return ReplyOutcome::Stale(reply.token);
        };

        match reply.outcome {
            Ok(outcomes) => {
                self.results.clear();
                let registry_len = self.registry.len();
                for (index, outcome) in outcomes.into_iter().enumerate().take(registry_len) {
                    if let Some(result) = outcome {
                        self.results.set(index, result);
                    }
                }

                let succeeded = self.results.success_count();
                let failed = run.item_count.saturating_sub(succeeded);
                self.progress.finish();
                self.state = if self.cancel_requested {
                    SessionState::Cancelled
                } else {
                    SessionState::Completed
                };

                info!(token = %run.token, succeeded, failed, state = %self.state, "reply applied");
                ReplyOutcome::Applied {
                    succeeded,
                    failed,
                    state: self.state,
                }
            }
            Err(error) => {
                self.results.clear();
                self.progress.reset();
                self.state = SessionState::FilesLoaded;

                warn!(token = %run.token, %error, "run failed");
                ReplyOutcome::Failed(error)
            }
        }
    }

    /// 擬似進捗を1つ進める（実行中のみ）
    pub fn tick_progress(&mut self) -> Option<usize> {
        self.progress.advance()
    }

    /// 選択位置を変更する（範囲外は末尾に丸める）
    pub fn select(&mut self, index: usize) -> usize {
        self.selection = match self.registry.len() {
            0 => 0,
            len => index.min(len - 1),
        };
        self.selection
    }

    /// いずれかのビューでの選択（全ビューが同じ選択位置を参照する）
    pub fn select_in(&mut self, view: ViewKind, index: usize) -> usize {
        let selection = self.select(index);
        debug!(view = view.as_str(), selection, "selection changed");
        selection
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// これまでに開始した実行の数
    pub fn run_count(&self) -> u64 {
        self.run_counter
    }

    pub fn progress(&self) -> &SyntheticProgress {
        &self.progress
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// キャンセル操作が可能か（実行中かつ未要求）
    pub fn cancel_available(&self) -> bool {
        self.state == SessionState::Processing && !self.cancel_requested
    }

    pub fn in_flight_token(&self) -> Option<RunToken> {
        self.in_flight.as_ref().map(|run| run.token)
    }

    /// 直近の実行で使った設定
    pub fn last_options(&self) -> Option<&ProcessingOptions> {
        self.last_options.as_ref()
    }

    pub fn projector(&self) -> ViewProjector<'_> {
        ViewProjector::new(self)
    }

    pub fn exporter(&self) -> ExportCoordinator<'_> {
        ExportCoordinator::new(&self.registry, &self.results)
    }
}
