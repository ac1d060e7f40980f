use crossterm::style::{StyledContent, Stylize};
use crossterm::tty::IsTty;
use std::fmt::Display;

use crate::config::ColorChoice;

/// Colors for transcript output; plain text when disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Resolve `auto` against the terminal and `NO_COLOR`
    pub fn detect(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
                    && std::io::stdout().is_tty()
            }
        };
        Self { enabled }
    }

    pub fn banner(&self, text: impl Display) -> String {
        self.paint(text, |s| s.bold().cyan())
    }

    pub fn heading(&self, text: impl Display) -> String {
        self.paint(text, |s| s.bold().magenta())
    }

    pub fn section(&self, text: impl Display) -> String {
        self.paint(text, |s| s.bold().yellow())
    }

    pub fn command(&self, text: impl Display) -> String {
        self.paint(text, |s| s.dark_grey())
    }

    pub fn timing(&self, text: impl Display) -> String {
        self.paint(text, |s| s.bold().green())
    }

    pub fn warning(&self, text: impl Display) -> String {
        self.paint(text, |s| s.bold().red())
    }

    fn paint<F>(&self, text: impl Display, style: F) -> String
    where
        F: FnOnce(String) -> StyledContent<String>,
    {
        let text = text.to_string();
        if self.enabled {
            style(text).to_string()
        } else {
            text
        }
    }
}
