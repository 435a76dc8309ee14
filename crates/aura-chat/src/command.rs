//! Classification of raw user input.

/// What a submitted line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Nothing but whitespace
    Blank,
    /// Ordinary chat text
    Text(String),
    /// Image command with a prompt
    Image(String),
    /// Image command with no prompt
    ImageUsage,
}

/// Parse a line. `image_command` is matched case-insensitively and must be
/// followed by whitespace or the end of input; `/imagefoo` is plain text.
pub fn parse(raw: &str, image_command: &str) -> Input {
    let text = raw.trim();
    if text.is_empty() {
        return Input::Blank;
    }

    let matches_command = text
        .get(..image_command.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(image_command));
    if matches_command {
        let rest = &text[image_command.len()..];
        if rest.is_empty() {
            return Input::ImageUsage;
        }
        if rest.starts_with(char::is_whitespace) {
            let prompt = rest.trim();
            return if prompt.is_empty() {
                Input::ImageUsage
            } else {
                Input::Image(prompt.to_string())
            };
        }
    }

    Input::Text(text.to_string())
}
