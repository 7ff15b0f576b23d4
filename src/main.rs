//! mdpro 命令行入口

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use md_editor_pro::editor::{ActionOutcome, EditorContext, TextArea, Toolbar, ToolbarAction, WebviewMessage};
use md_editor_pro::env::{self, core::LogLevel, EnvConfig, EnvVar};
use md_editor_pro::translation::{ConfigManager, TranslationConfig, TranslationService};
use md_editor_pro::{print_error_message, print_info_message, MdProError};

#[derive(Parser, Debug)]
#[command(name = "mdpro", version, about = "Markdown editing and code-aware translation")]
struct Cli {
    /// 配置文件路径，默认按搜索路径查找
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a Markdown file, keeping code and diagrams intact
    Translate {
        file: PathBuf,
        /// Target language code
        #[arg(short, long)]
        to: Option<String>,
        /// Source language code, `auto` to detect
        #[arg(short, long)]
        from: Option<String>,
        /// Write the result to this file instead of stdout
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,
        /// Overwrite the input file
        #[arg(short, long)]
        in_place: bool,
    },
    /// Apply a toolbar action to a byte range and print the result
    Format {
        /// Toolbar action name, e.g. `bold`, `heading2`, `ordered-list`
        action: String,
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long)]
        end: Option<usize>,
        /// Emoji for the `insert-emoji` action
        #[arg(long)]
        emoji: Option<String>,
    },
    /// Write an example configuration file
    InitConfig {
        #[arg(default_value = "mdpro.toml")]
        path: String,
        #[arg(long)]
        force: bool,
    },
    /// Print environment variable documentation
    EnvDocs {
        /// Print the effective values instead
        #[arg(long)]
        summary: bool,
    },
}

fn init_tracing() {
    let level = LogLevel::get_or_default("info".to_string());
    let filter = EnvFilter::try_new(format!("md_editor_pro={level},mdpro={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<TranslationConfig, MdProError> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    if let Some(source) = manager.source() {
        tracing::debug!("使用配置文件: {}", source);
    }
    Ok(manager.get_config().clone())
}

async fn translate(
    config_path: Option<&str>,
    file: &Path,
    to: Option<String>,
    from: Option<String>,
    output: Option<PathBuf>,
    in_place: bool,
) -> Result<(), MdProError> {
    let mut config = load_config(config_path)?;
    if let Some(to) = to {
        config.target_lang = to;
    }
    if let Some(from) = from {
        config.source_lang = from;
    }

    let content = fs::read_to_string(file)?;
    let service = TranslationService::new(config)?;
    let translated = service.translate_document(&content).await?;

    let snapshot = service.get_stats().snapshot();
    tracing::info!(
        "请求 {} 次，失败 {} 次，保留原文 {} 行",
        snapshot.requests_sent,
        snapshot.requests_failed,
        snapshot.lines_kept
    );
    let errors = service.get_stats().error_stats();
    if errors.total_errors > 0 {
        tracing::warn!(
            "错误率 {:.1}%，其中可重试 {} 次，严重 {} 次",
            100.0 * errors.error_rate(snapshot.requests_sent),
            errors.retryable_errors,
            errors.critical_errors
        );
    }

    let destination = if in_place { Some(file.to_path_buf()) } else { output };
    match destination {
        Some(path) => {
            fs::write(&path, translated)?;
            print_info_message(&format!("Translated to {}", path.display()));
        }
        None => print!("{translated}"),
    }
    Ok(())
}

fn format(
    action: &str,
    file: &Path,
    start: usize,
    end: Option<usize>,
    emoji: Option<&str>,
) -> Result<(), MdProError> {
    let action = ToolbarAction::from_data_action(action, emoji)?;
    let content = fs::read_to_string(file)?;
    let end = end.unwrap_or(start);

    let surface = TextArea::with_selection(content, start, end)?;
    let mut context = EditorContext::new(surface, Vec::<WebviewMessage>::new());
    let outcome = Toolbar::new().execute(&mut context, &action)?;

    match outcome {
        ActionOutcome::Edited(_) => {
            print!("{}", context.engine().get_value()?);
            Ok(())
        }
        _ => Err(MdProError::new(&format!(
            "操作 {} 不修改文本",
            action.name()
        ))),
    }
}

fn init_config(path: &str, force: bool) -> Result<(), MdProError> {
    let expanded = shellexpand::tilde(path).into_owned();
    if Path::new(&expanded).exists() && !force {
        return Err(MdProError::new(&format!(
            "{} 已存在，使用 --force 覆盖",
            expanded
        )));
    }
    ConfigManager::generate_example_config(&expanded)?;
    print_info_message(&format!("Wrote {}", expanded));
    Ok(())
}

fn env_docs(summary: bool) -> Result<(), MdProError> {
    if summary {
        let config = EnvConfig::from_env().map_err(|e| MdProError::new(&e.to_string()))?;
        config.print_summary();
    } else {
        print!("{}", env::generate_env_docs());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Command::Translate {
            file,
            to,
            from,
            output,
            in_place,
        } => translate(cli.config.as_deref(), &file, to, from, output, in_place).await,
        Command::Format {
            action,
            file,
            start,
            end,
            emoji,
        } => format(&action, &file, start, end, emoji.as_deref()),
        Command::InitConfig { path, force } => init_config(&path, force),
        Command::EnvDocs { summary } => env_docs(summary),
    };

    if let Err(e) = result {
        print_error_message(&format!("Error: {}", e));
        process::exit(1);
    }
}
