use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::{Regex, RegexBuilder};

use crate::config::AccentColor;
use crate::search::SearchFilter;

/// Styles derived from the single configured accent colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    accent: AccentColor,
}

impl Highlight {
    pub fn new(accent: AccentColor) -> Self {
        Self { accent }
    }

    /// Row of the selected note in the list pane.
    pub fn selection(&self) -> Style {
        Style::default()
            .bg(self.accent.color())
            .fg(self.accent.contrast())
            .add_modifier(Modifier::BOLD)
    }

    pub fn focus_border(&self) -> Style {
        Style::default().fg(self.accent.color())
    }

    pub fn search_match(&self) -> Style {
        Style::default()
            .fg(self.accent.color())
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }
}

pub fn build_highlight_regex(filter: &SearchFilter) -> Option<Regex> {
    let needle = filter.needle()?;
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}

pub fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    let Some(re) = regex else {
        return vec![Span::styled(text.to_string(), base_style)];
    };
    let mut spans = Vec::new();
    let mut last = 0;
    for mat in re.find_iter(text) {
        if mat.start() > last {
            spans.push(Span::styled(text[last..mat.start()].to_string(), base_style));
        }
        spans.push(Span::styled(mat.as_str().to_string(), highlight_style));
        last = mat.end();
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), base_style));
    }
    if spans.is_empty() {
        spans.push(Span::styled(text.to_string(), base_style));
    }
    spans
}

pub fn highlight_body(
    body: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
) -> Vec<Line<'static>> {
    if body.is_empty() {
        return vec![Line::from("")];
    }
    body.split('\n')
        .map(|line| Line::from(highlight_line(line, regex, highlight_style, Style::default())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn span_texts(spans: &[Span<'static>]) -> Vec<String> {
        spans
            .iter()
            .map(|span| span.content.clone().into_owned())
            .collect()
    }

    #[test]
    fn matches_are_case_insensitive_and_literal() {
        let regex = build_highlight_regex(&SearchFilter::new("Cat.")).expect("regex");
        let spans = highlight_line("cat. or CAT. not cats", Some(&regex), Style::default(), Style::default());
        assert_eq!(span_texts(&spans), vec!["cat.", " or ", "CAT.", " not cats"]);
    }

    #[test]
    fn empty_filter_highlights_nothing() {
        assert!(build_highlight_regex(&SearchFilter::new("")).is_none());
        let spans = highlight_line("plain", None, Style::default(), Style::default());
        assert_eq!(span_texts(&spans), vec!["plain"]);
    }

    #[test]
    fn body_keeps_blank_lines() {
        let lines = highlight_body("one\n\nthree", None, Style::default());
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn styles_share_one_accent() {
        let highlight = Highlight::new(AccentColor::Green);
        assert_eq!(highlight.selection().bg, Some(Color::Green));
        assert_eq!(highlight.focus_border().fg, Some(Color::Green));
        assert_eq!(highlight.search_match().fg, Some(Color::Green));
    }
}
