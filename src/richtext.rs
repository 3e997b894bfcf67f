//! Inline markup for paragraph text.
//!
//! Paragraph and cell text is written with a small markdown-inspired syntax and parsed into
//! [`Span`]s when the document is assembled:
//!
//! - `**bold**` and `*italic*`, which may nest;
//! - `[color=#RRGGBB]{text}` for coloured text;
//! - a literal `\n` forces a line break (handled by the wrapper, not the parser).

use genpdf::style::{Color, Style};
use thiserror::Error;

use crate::palette::parse_hex_color;

/// A run of text sharing the same inline attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

impl Span {
    /// Creates a plain span.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Overrides the colour of the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Layers the span's attributes on top of the paragraph's base style.
    pub fn apply_to(&self, base: Style) -> Style {
        let mut style = base;
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        if let Some(color) = self.color {
            style.set_color(color);
        }
        style
    }
}

/// Markup error with the byte position at which it was detected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} (at byte {index})")]
pub struct ParseError {
    index: usize,
    message: String,
}

impl ParseError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Attributes {
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

impl Attributes {
    fn span(&self, text: String) -> Span {
        Span {
            text,
            bold: self.bold,
            italic: self.italic,
            color: self.color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Bold,
    Italic,
    Color,
}

impl Marker {
    fn closing_token(self) -> &'static str {
        match self {
            Marker::Bold => "**",
            Marker::Italic => "*",
            Marker::Color => "}",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Marker::Bold => "bold span",
            Marker::Italic => "italic span",
            Marker::Color => "color span",
        }
    }
}

const COLOR_PREFIX: &str = "[color=";

/// Parses inline markup into spans.
pub fn parse_markup(input: &str) -> Result<Vec<Span>, ParseError> {
    let mut parser = Parser { input, index: 0 };
    parser.parse(Attributes::default(), None)
}

struct Parser<'a> {
    input: &'a str,
    index: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.input[self.index..]
    }

    fn parse(
        &mut self,
        attributes: Attributes,
        closing: Option<Marker>,
    ) -> Result<Vec<Span>, ParseError> {
        let mut spans = Vec::new();
        let mut buffer = String::new();

        while let Some(ch) = self.rest().chars().next() {
            if let Some(marker) = closing {
                if self.rest().starts_with(marker.closing_token()) {
                    flush(&mut buffer, &mut spans, attributes);
                    self.index += marker.closing_token().len();
                    return Ok(spans);
                }
            }

            let nested = if self.rest().starts_with("**") {
                self.index += 2;
                Some((
                    Attributes {
                        bold: true,
                        ..attributes
                    },
                    Marker::Bold,
                ))
            } else if ch == '*' {
                self.index += 1;
                Some((
                    Attributes {
                        italic: true,
                        ..attributes
                    },
                    Marker::Italic,
                ))
            } else if self.rest().starts_with(COLOR_PREFIX) {
                let color = self.color_directive()?;
                Some((
                    Attributes {
                        color: Some(color),
                        ..attributes
                    },
                    Marker::Color,
                ))
            } else {
                None
            };

            if let Some((inner, marker)) = nested {
                flush(&mut buffer, &mut spans, attributes);
                spans.extend(self.parse(inner, Some(marker))?);
                continue;
            }

            match ch {
                '}' => {
                    return Err(ParseError::new(
                        self.index,
                        "unexpected `}` without a matching `[color=...]{`",
                    ))
                }
                '[' => {
                    return Err(ParseError::new(
                        self.index,
                        "unsupported directive; expected `[color=#RRGGBB]{...}`",
                    ))
                }
                _ => {
                    buffer.push(ch);
                    self.index += ch.len_utf8();
                }
            }
        }

        if let Some(marker) = closing {
            return Err(ParseError::new(
                self.index,
                format!("unterminated {}", marker.description()),
            ));
        }
        flush(&mut buffer, &mut spans, attributes);
        Ok(spans)
    }

    /// Consumes `[color=#RRGGBB]{` and returns the colour.
    fn color_directive(&mut self) -> Result<Color, ParseError> {
        let hex_start = self.index + COLOR_PREFIX.len();
        let directive = &self.input[hex_start..];
        let Some(close) = directive.find(']') else {
            return Err(ParseError::new(hex_start, "expected `]` to close color directive"));
        };
        let color = parse_hex_color(&directive[..close])
            .filter(|_| directive.starts_with('#'))
            .ok_or_else(|| {
                ParseError::new(hex_start, "invalid color; expected `#` and 6 hexadecimal digits")
            })?;

        let brace = hex_start + close + 1;
        if !self.input[brace..].starts_with('{') {
            return Err(ParseError::new(brace, "expected `{` to start the colored text"));
        }
        self.index = brace + 1;
        Ok(color)
    }
}

fn flush(buffer: &mut String, spans: &mut Vec<Span>, attributes: Attributes) {
    if !buffer.is_empty() {
        spans.push(attributes.span(std::mem::take(buffer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_single_span() {
        let spans = parse_markup("Curses are born from fear.").expect("parse succeeds");
        assert_eq!(spans, vec![Span::new("Curses are born from fear.")]);
    }

    #[test]
    fn nested_bold_and_italic() {
        let spans = parse_markup("Jujutsu Kaisen:\n**The *Cursed* Handbook**").expect("parse");
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].text(), "Jujutsu Kaisen:\n");
        assert!(!spans[0].is_bold());
        assert_eq!(spans[1].text(), "The ");
        assert!(spans[1].is_bold());
        assert!(spans[2].is_bold() && spans[2].is_italic());
        assert_eq!(spans[3].text(), " Handbook");
        assert!(!spans[3].is_italic());
    }

    #[test]
    fn italic_markup_selects_the_italic_face() {
        let spans = parse_markup("Signature: *Ratio*").expect("parse");
        assert_eq!(
            spans,
            vec![Span::new("Signature: "), Span::new("Ratio").italic()]
        );
        assert!(spans[1].apply_to(Style::new()).is_italic());
    }

    #[test]
    fn color_directive_sets_span_color() {
        let spans = parse_markup("[color=#8A2BE2]{violet} ink").expect("parse succeeds");
        assert_eq!(spans[0].text(), "violet");
        assert_eq!(spans[0].color(), Some(Color::Rgb(0x8A, 0x2B, 0xE2)));
        assert_eq!(spans[1].text(), " ink");
        assert_eq!(spans[1].color(), None);
    }

    #[test]
    fn unterminated_bold_is_reported() {
        let err = parse_markup("**Domain Expansion").unwrap_err();
        assert!(err.message().contains("unterminated bold"));
        assert_eq!(err.index(), 18);
    }

    #[test]
    fn invalid_color_is_reported() {
        let err = parse_markup("[color=#12FG34]{x}").unwrap_err();
        assert!(err.message().contains("invalid color"));
        assert_eq!(err.index(), 7);
    }

    #[test]
    fn stray_closing_brace_is_reported() {
        let err = parse_markup("oops}").unwrap_err();
        assert_eq!(err.index(), 4);
    }

    #[test]
    fn apply_to_layers_attributes() {
        let base = Style::new().with_font_size(11);
        let style = Span::new("x").bold().colored(Color::Rgb(1, 2, 3)).apply_to(base);
        assert!(style.is_bold());
        assert!(!style.is_italic());
        assert_eq!(style.color(), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(style.font_size(), 11);
    }
}
