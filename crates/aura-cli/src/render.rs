//! 终端输出

use chrono::Local;
use colored::{ColoredString, Colorize};

use aura_chat::SessionSummary;
use aura_core::defaults::ASSISTANT_LABEL;
use aura_core::{Message, Sender, Theme};

/// 终端配色，由主题决定
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    dark: bool,
}

impl Palette {
    pub fn new(theme: Theme) -> Self {
        Self {
            dark: theme.resolve_dark(system_prefers_dark()),
        }
    }

    fn assistant(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_green().bold()
        } else {
            text.green().bold()
        }
    }

    fn user(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_cyan().bold()
        } else {
            text.blue().bold()
        }
    }

    fn accent(&self, text: &str) -> ColoredString {
        if self.dark {
            text.bright_yellow()
        } else {
            text.magenta()
        }
    }
}

/// `COLORFGBG` 形如 `15;0`，背景色号小于 7 或等于 8 视为深色背景
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| parse_colorfgbg(&value))
        .unwrap_or(true)
}

fn parse_colorfgbg(value: &str) -> Option<bool> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(background < 7 || background == 8)
}

pub fn message(palette: &Palette, message: &Message) {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    let label = match message.sender {
        Sender::User => palette.user("You"),
        Sender::Ai => palette.assistant(ASSISTANT_LABEL),
    };
    println!("{} {}", label, time.to_string().dimmed());

    if message.is_error {
        println!("{}", message.text.red());
    } else {
        println!("{}", message.text);
    }

    if let Some(url) = &message.image_url {
        let alt = message.image_alt_text.as_deref().unwrap_or("image");
        println!("{}", palette.accent(&format!("[image: {}] {}", alt, describe_image_url(url))));
    }

    if let Some(citations) = &message.citations {
        if !citations.is_empty() {
            println!("{}", "Sources:".dimmed());
            for (i, citation) in citations.iter().enumerate() {
                println!(
                    "{}",
                    format!("  [{}] {} <{}>", i + 1, citation.title, citation.uri).dimmed()
                );
            }
        }
    }
    println!();
}

/// Data URI 太长，终端里只显示类型和大小
fn describe_image_url(url: &str) -> String {
    match url.strip_prefix("data:") {
        Some(rest) => {
            let mime = rest.split(';').next().unwrap_or("image");
            let payload = rest.split_once(',').map(|(_, data)| data.len()).unwrap_or(0);
            format!("({} data URI, {} bytes base64)", mime, payload)
        }
        None => url.to_string(),
    }
}

pub fn session_list(palette: &Palette, sessions: &[SessionSummary]) {
    for (i, session) in sessions.iter().enumerate() {
        let marker = if session.is_active { "*" } else { " " };
        let updated = session
            .last_updated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");
        let status = if session.status.is_busy() {
            format!(" ({})", session.status)
        } else {
            String::new()
        };
        let line = format!(
            "{} {:>2}. {}  {}  {} messages{}",
            marker,
            i + 1,
            session.name,
            updated,
            session.message_count,
            status
        );
        if session.is_active {
            println!("{}", palette.accent(&line));
        } else {
            println!("{}", line);
        }
    }
}

pub fn help(image_command: &str) {
    println!("{}", "Commands:".cyan().bold());
    let rows = [
        ("/new", "start a new chat"),
        ("/list", "list chats"),
        ("/switch <n|id>", "switch to a chat"),
        ("/delete <n|id>", "delete a chat"),
        ("/rename <name>", "rename the current chat"),
        ("/theme [light|dark|system]", "show or change the theme"),
        ("/history", "show the current chat"),
        ("/help", "show this help"),
        ("/quit", "save and exit"),
    ];
    for (command, description) in rows {
        println!("  {:<28} {}", command, description.dimmed());
    }
    println!(
        "  {:<28} {}",
        format!("{} <prompt>", image_command),
        "generate an image".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colorfgbg() {
        assert_eq!(parse_colorfgbg("15;0"), Some(true));
        assert_eq!(parse_colorfgbg("0;15"), Some(false));
        assert_eq!(parse_colorfgbg("15;default;8"), Some(true));
        assert_eq!(parse_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_describe_image_url() {
        assert_eq!(
            describe_image_url("data:image/jpeg;base64,Zm94"),
            "(image/jpeg data URI, 4 bytes base64)"
        );
        assert_eq!(describe_image_url("https://x/y.png"), "https://x/y.png");
    }
}
