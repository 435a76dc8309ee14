//! 交互式聊天循环

use std::io::{self, Write};
use std::str::FromStr;

use colored::Colorize;

use aura_chat::{ChatOrchestrator, SessionSummary, TurnOutcome};
use aura_core::{SessionId, Theme};
use aura_session::DeleteOutcome;

use crate::render::{self, Palette};

/// 以 `/` 开头的本地命令，其余输入都交给编排器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New,
    List,
    Switch(String),
    Delete(String),
    Rename(String),
    Theme(Option<String>),
    History,
    Help,
    Quit,
    Turn(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head {
        "/new" => ReplCommand::New,
        "/list" => ReplCommand::List,
        "/switch" => ReplCommand::Switch(rest.to_string()),
        "/delete" => ReplCommand::Delete(rest.to_string()),
        "/rename" => ReplCommand::Rename(rest.to_string()),
        "/theme" if rest.is_empty() => ReplCommand::Theme(None),
        "/theme" => ReplCommand::Theme(Some(rest.to_string())),
        "/history" => ReplCommand::History,
        "/help" => ReplCommand::Help,
        "/quit" | "/exit" => ReplCommand::Quit,
        _ => ReplCommand::Turn(line.to_string()),
    }
}

/// `n` is a 1-based index into the listing, anything else is a session id
pub fn resolve_target(sessions: &[SessionSummary], target: &str) -> Option<SessionId> {
    if let Ok(index) = target.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| sessions.get(i))
            .map(|s| s.id.clone());
    }
    sessions
        .iter()
        .find(|s| s.id == target)
        .map(|s| s.id.clone())
}

/// 删除确认，从 stdin 读 y/N
pub fn confirm_on_stdin(prompt: &str) -> bool {
    print!("{} {} ", prompt.yellow(), "[y/N]".dimmed());
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_history(palette: &Palette, orchestrator: &ChatOrchestrator) {
    if let Some(session) = orchestrator.active_session() {
        println!("{}", format!("── {} ──", session.name).cyan().bold());
        for message in &session.messages {
            render::message(palette, message);
        }
    }
}

pub async fn run(orchestrator: &ChatOrchestrator) -> anyhow::Result<()> {
    let mut palette = Palette::new(orchestrator.theme());

    println!("{}", "✨ Aura".cyan().bold());
    println!("{}", "Type /help for commands, /quit to leave".dimmed());
    println!();
    print_history(&palette, orchestrator);

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match parse_command(&input) {
            ReplCommand::Quit => break,
            ReplCommand::Help => render::help(&orchestrator.settings().image_command),
            ReplCommand::New => {
                orchestrator.create_session();
                print_history(&palette, orchestrator);
            }
            ReplCommand::List => render::session_list(&palette, &orchestrator.list_sessions()),
            ReplCommand::History => print_history(&palette, orchestrator),
            ReplCommand::Switch(target) => {
                match resolve_target(&orchestrator.list_sessions(), &target) {
                    Some(id) if orchestrator.select_session(&id) => {
                        print_history(&palette, orchestrator)
                    }
                    _ => println!("{}", format!("❌ No chat matches '{}'", target).red()),
                }
            }
            ReplCommand::Delete(target) => {
                let Some(id) = resolve_target(&orchestrator.list_sessions(), &target) else {
                    println!("{}", format!("❌ No chat matches '{}'", target).red());
                    continue;
                };
                match orchestrator.delete_session(&id, &confirm_on_stdin) {
                    DeleteOutcome::Deleted => {
                        println!("{}", "🗑  Chat deleted".green());
                        print_history(&palette, orchestrator);
                    }
                    DeleteOutcome::Cancelled => println!("{}", "Cancelled".dimmed()),
                    DeleteOutcome::NotFound => {
                        println!("{}", format!("❌ No chat matches '{}'", target).red())
                    }
                }
            }
            ReplCommand::Rename(name) => {
                let id = orchestrator.active_session_id();
                if orchestrator.rename_session(&id, &name) {
                    println!("{}", format!("✅ Renamed to {}", name.trim()).green());
                } else {
                    println!("{}", "Usage: /rename <name>".yellow());
                }
            }
            ReplCommand::Theme(None) => println!("Theme: {}", orchestrator.theme()),
            ReplCommand::Theme(Some(value)) => match Theme::from_str(&value) {
                Ok(theme) => {
                    orchestrator.set_theme(theme).await;
                    palette = Palette::new(theme);
                    println!("{}", format!("✅ Theme set to {}", theme).green());
                }
                Err(e) => println!("{}", format!("❌ {}", e).red()),
            },
            ReplCommand::Turn(text) => send_turn(&palette, orchestrator, &text).await,
        }
    }

    println!("{}", "👋 Goodbye!".cyan());
    Ok(())
}

/// 发送一轮并打印这一轮新增的消息（用户消息除外）
async fn send_turn(palette: &Palette, orchestrator: &ChatOrchestrator, text: &str) {
    let session_id = orchestrator.active_session_id();
    let before = orchestrator
        .session(&session_id)
        .map(|s| s.messages.len())
        .unwrap_or(0);

    println!("{}", "…".dimmed());
    let report = orchestrator.send_message_to(&session_id, text).await;

    match report.outcome {
        TurnOutcome::Ignored => return,
        TurnOutcome::Busy => {
            println!("{}", "⏳ Still waiting for the previous reply".yellow());
            return;
        }
        TurnOutcome::SessionNotFound => {
            println!("{}", "❌ This chat no longer exists".red());
            return;
        }
        _ => {}
    }

    if let Some(session) = orchestrator.session(&session_id) {
        for message in session.messages.iter().skip(before + 1) {
            render::message(palette, message);
        }
    }
}
