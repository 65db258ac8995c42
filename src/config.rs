//! Settings read from an xpdfrc-style configuration file.
//!
//! Each line holds a directive followed by its arguments. Only
//! `textEncoding` is understood; other directives are ignored.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::encoding::TextEncoding;

const DEFAULT_FILE_NAME: &str = ".xpdfrc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub text_encoding: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            text_encoding: TextEncoding::DEFAULT_NAME.to_string(),
        }
    }
}

impl Config {
    /// The per-user configuration file, `~/.xpdfrc`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_FILE_NAME))
    }

    /// Load `path`, or the default file when `path` is `None`.
    ///
    /// A missing default file is not an error. An explicitly named file
    /// that cannot be read is reported and the defaults are used.
    pub fn load(path: Option<&Path>) -> Config {
        match path {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => Config::parse(&text),
                Err(e) => {
                    warn!("Couldn't open config file '{}': {}", path.display(), e);
                    Config::default()
                }
            },
            None => Config::default_path()
                .and_then(|path| std::fs::read_to_string(path).ok())
                .map(|text| Config::parse(&text))
                .unwrap_or_default(),
        }
    }

    pub fn parse(text: &str) -> Config {
        let mut config = Config::default();
        for (line_no, line) in text.lines().enumerate() {
            let mut tokens = tokenize(line).into_iter();
            let Some(directive) = tokens.next() else {
                continue;
            };
            match directive.as_str() {
                "textEncoding" => match (tokens.next(), tokens.next()) {
                    (Some(name), None) => config.text_encoding = name,
                    _ => warn!("Bad 'textEncoding' config file command (line {})", line_no + 1),
                },
                _ => debug!("ignoring config directive '{}' (line {})", directive, line_no + 1),
            }
        }
        config
    }

    /// Resolve the configured text encoding.
    pub fn text_encoding(&self) -> Option<TextEncoding> {
        TextEncoding::for_name(&self.text_encoding)
    }
}

/// Split a line into whitespace-separated tokens. Double-quoted tokens may
/// contain spaces; everything after an unquoted `#` is a comment.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '#' {
            break;
        } else if c == '"' {
            chars.next();
            let token: String = chars.by_ref().take_while(|&c| c != '"').collect();
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }
    tokens
}
