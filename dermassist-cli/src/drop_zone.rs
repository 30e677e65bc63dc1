//! Parsing paths dropped onto the terminal
//!
//! Dragging a file onto a terminal pastes its path, quoted or escaped the
//! way the terminal emulator likes it. Dropping several files pastes several
//! paths; only the first is used.

use dermassist::Url;
use std::path::PathBuf;

/// Extracts the first path from pasted text
///
/// Accepts single or double quotes, backslash-escaped spaces and
/// `file://` URLs with percent-encoding. Returns `None` for blank input and
/// for `file://` URLs naming a remote host.
///
/// # Examples
///
/// ```rust
/// use dermassist_cli_lib::drop_zone::parse_dropped_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     parse_dropped_path("'/home/me/My Photos/arm.png' /tmp/b.jpg"),
///     Some(PathBuf::from("/home/me/My Photos/arm.png"))
/// );
/// assert_eq!(
///     parse_dropped_path("/home/me/My\\ Photos/arm.png"),
///     Some(PathBuf::from("/home/me/My Photos/arm.png"))
/// );
/// ```
#[must_use]
pub fn parse_dropped_path(input: &str) -> Option<PathBuf> {
    let token = first_token(input.trim())?;
    let path = if token.starts_with("file://") {
        Url::parse(&token).ok()?.to_file_path().ok()?
    } else {
        PathBuf::from(token)
    };

    (!path.as_os_str().is_empty()).then_some(path)
}

/// First shell-style word: quotes group, backslash escapes, whitespace splits
fn first_token(input: &str) -> Option<String> {
    let mut chars = input.chars();
    let mut token = String::new();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => token.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') => {
                if let Some(escaped) = chars.next() {
                    token.push(escaped);
                }
            }
            (None, c) if c.is_whitespace() => {
                if !token.is_empty() {
                    break;
                }
            }
            (None, c) => token.push(c),
        }
    }

    (!token.is_empty()).then_some(token)
}
