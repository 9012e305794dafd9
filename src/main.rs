use clap::Parser;
use image_batch_common::ReplyOutcome;
use image_batch_rust::{cli, config, engine, error, export, logging, render, runner, scanner, shell};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);
    let mut config = Config::load()?;
    let engine_kind = cli.engine.unwrap_or(config.engine);

    match cli.command {
        Commands::Convert { paths, output, options, no_archive, single, recursive } => {
            println!("🖼  image-batch - 一括変換\n");

            // 1. 取り込み
            println!("[1/3] 画像を読み込み中...");
            let files = scanner::load_sources(&paths, recursive)?;
            let mut session = image_batch_common::SessionController::new();
            let count = match session.ingest(files) {
                Ok(count) => count,
                Err(image_batch_common::Error::Validation(_)) => {
                    let joined = paths
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    return Err(error::ImageBatchError::NoImagesFound(joined));
                }
                Err(e) => return Err(e.into()),
            };
            println!("✔ {}枚の画像を検出\n", count);

            // 2. 変換
            let options = options.resolve(&config);
            let gateway = engine::build_gateway(&config, engine_kind)?;
            println!(
                "[2/3] 変換中... (エンジン: {}, 形式: {}, 品質: {})",
                gateway.name(),
                options.target_format,
                options.quality
            );
            match runner::run_once(&mut session, gateway.as_ref(), &options, runner::PROGRESS_TICK, true).await? {
                ReplyOutcome::Applied { succeeded, failed, .. } => {
                    println!("✔ 変換完了: 成功 {}枚 / 失敗 {}枚\n", succeeded, failed);
                }
                ReplyOutcome::Failed(e) => return Err(e.into()),
                ReplyOutcome::Stale(_) => {}
            }
            print!("{}", render::render_list(&session.projector().list()));
            println!();

            // 3. 保存
            println!("[3/3] 保存中...");
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            match single {
                Some(index) => {
                    let path = export::export_single_to_dir(&session, index, &output_dir)?;
                    println!("✔ 保存: {}", path.display());
                }
                None => {
                    let mode = if no_archive || !config.archive {
                        export::BulkMode::Sequential {
                            stagger: Duration::from_millis(config.stagger_ms),
                        }
                    } else {
                        export::BulkMode::Archive
                    };
                    let summary = export::export_all_to_dir(&session, &output_dir, mode).await?;
                    for path in &summary.written {
                        println!("✔ 保存: {}", path.display());
                    }
                }
            }

            println!("\n✅ 完了");
        }

        Commands::Shell { paths, output, options, recursive } => {
            let options = options.resolve(&config);
            let gateway = engine::build_gateway(&config, engine_kind)?;
            let mode = if config.archive {
                export::BulkMode::Archive
            } else {
                export::BulkMode::Sequential {
                    stagger: Duration::from_millis(config.stagger_ms),
                }
            };
            let (mut session_shell, replies) = shell::Shell::new(
                gateway,
                options,
                output.unwrap_or_else(|| PathBuf::from(".")),
                mode,
                Duration::from_millis(config.notice_ms),
            );
            session_shell = session_shell.with_recursive(recursive);

            if !paths.is_empty() {
                let output = session_shell.handle(shell::ShellCommand::Load(paths)).await;
                println!("{}", output.text);
            }
            shell::run_shell(session_shell, replies).await?;
        }

        Commands::Config {
            show,
            set_theme,
            toggle_theme,
            set_quality,
            set_format,
            set_engine,
            set_engine_command,
        } => {
            let mut changed = false;

            if let Some(theme) = set_theme {
                config.theme = theme;
                changed = true;
                println!("✔ テーマを設定しました: {}", theme);
            }
            if toggle_theme {
                let theme = config.toggle_theme();
                changed = true;
                println!("✔ テーマを切り替えました: {}", theme);
            }
            if let Some(quality) = set_quality {
                config.set_quality(quality)?;
                changed = true;
                println!("✔ 品質を設定しました: {}", quality);
            }
            if let Some(format) = set_format {
                config.format = format;
                changed = true;
                println!("✔ 出力形式を設定しました: {}", format);
            }
            if let Some(kind) = set_engine {
                config.engine = kind;
                changed = true;
                println!("✔ エンジンを設定しました: {}", kind);
            }
            if let Some(command) = set_engine_command {
                config.engine_command = Some(command);
                changed = true;
                println!("✔ 外部エンジンを設定しました");
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  品質: {}", config.quality);
                println!("  出力形式: {}", config.format);
                println!(
                    "  最大サイズ: {} x {}",
                    config.max_width.map(|w| w.to_string()).unwrap_or_else(|| "-".into()),
                    config.max_height.map(|h| h.to_string()).unwrap_or_else(|| "-".into())
                );
                println!("  テーマ: {}", config.theme);
                println!("  エンジン: {}", config.engine);
                println!(
                    "  外部エンジン: {}",
                    config.engine_command.as_deref().unwrap_or("未設定")
                );
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  ZIPにまとめる: {}", if config.archive { "はい" } else { "いいえ" });
            }
        }
    }

    Ok(())
}
