mod app;
mod render;
mod repl;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use aura_chat::{ChatOrchestrator, TurnOutcome};
use aura_config::{Config, ConfigManager};
use aura_core::Theme;

use crate::render::Palette;

#[derive(Parser)]
#[command(name = "aura")]
#[command(about = "Terminal chat client for Gemini with web search and image generation")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = "AURA_CONFIG", default_value = "~/.aura/config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动交互式聊天（默认）
    Chat,
    /// 在当前会话中发送单条消息
    Send {
        /// 消息内容
        message: String,
    },
    /// 列出所有会话
    List,
    /// 查看或设置主题
    Theme {
        /// light, dark 或 system
        value: Option<String>,
    },
    /// 配置管理命令
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: llm.chat_model, storage.debounce_ms)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: llm.chat_model, storage.debounce_ms)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 展开配置文件路径
    let config_path =
        aura_config::expand_tilde(&cli.config).unwrap_or_else(|| PathBuf::from(&cli.config));

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Config(args) => handle_config(args, config_path).await,
        command => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;
            let _logs = app::init_logging(&config, cli.debug);
            run_chat_command(command, &config).await
        }
    }
}

/// 无论命令成败都先写出待保存的会话
async fn run_chat_command(command: Commands, config: &Config) -> anyhow::Result<()> {
    let orchestrator = app::open(config).await?;
    let result = dispatch(command, &orchestrator).await;
    orchestrator.shutdown().await;
    result
}

async fn dispatch(command: Commands, orchestrator: &ChatOrchestrator) -> anyhow::Result<()> {
    match command {
        Commands::Chat => repl::run(orchestrator).await?,
        Commands::Send { message } => {
            let palette = Palette::new(orchestrator.theme());
            let report = orchestrator.send_message(&message).await;
            if report.outcome == TurnOutcome::Busy {
                println!("{}", "⏳ Session is busy".yellow());
            }
            if let Some(session) = orchestrator.session(&report.session_id) {
                if let Some(last) = session.last_message() {
                    render::message(&palette, last);
                }
            }
            if let Some(naming) = report.naming {
                if let Err(e) = naming.await {
                    tracing::warn!("Naming task failed: {}", e);
                }
            }
        }
        Commands::List => {
            let palette = Palette::new(orchestrator.theme());
            render::session_list(&palette, &orchestrator.list_sessions());
        }
        Commands::Theme { value: None } => println!("{}", orchestrator.theme()),
        Commands::Theme { value: Some(value) } => {
            let theme = Theme::from_str(&value)?;
            orchestrator.set_theme(theme).await;
            println!("{}", format!("✅ Theme set to {}", theme).green());
        }
        Commands::Config(_) => {}
    }

    Ok(())
}

async fn handle_config(args: ConfigArgs, config_path: PathBuf) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(&config_path).await?;
            if let Err(e) = manager
                .update(|config| config.set_value(&key, &value))
                .await
            {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }
            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!(
                    "{}",
                    format!("⚠️  Config already exists at {:?}", config_path).yellow()
                );
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            aura_config::init_aura_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.clone());
            manager.save().await?;

            println!(
                "{}",
                format!("✅ Config initialized at {:?}", config_path).green()
            );
            println!(
                "{}",
                "Set the API key environment variable named in llm.api_key_env before chatting"
                    .dimmed()
            );
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_command_still_flushes_sessions() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.path = temp_dir.path().to_string_lossy().to_string();
        config.storage.sessions_key = "sessions".to_string();

        let result = run_chat_command(
            Commands::Theme {
                value: Some("sepia".to_string()),
            },
            &config,
        )
        .await;

        assert!(result.is_err());
        assert!(temp_dir.path().join("sessions.json").exists());
    }
}
