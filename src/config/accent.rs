use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The one colour used to mark the selected note, focused field and search
/// matches.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum AccentColor {
    #[default]
    Blue,
    Cyan,
    Green,
    Yellow,
    Magenta,
    Red,
    Gray,
}

impl AccentColor {
    pub fn color(self) -> Color {
        match self {
            AccentColor::Blue => Color::Blue,
            AccentColor::Cyan => Color::Cyan,
            AccentColor::Green => Color::Green,
            AccentColor::Yellow => Color::Yellow,
            AccentColor::Magenta => Color::Magenta,
            AccentColor::Red => Color::Red,
            AccentColor::Gray => Color::Gray,
        }
    }

    /// Text colour that stays readable on top of the accent.
    pub fn contrast(self) -> Color {
        match self {
            AccentColor::Yellow | AccentColor::Cyan | AccentColor::Gray => Color::Black,
            _ => Color::White,
        }
    }
}
