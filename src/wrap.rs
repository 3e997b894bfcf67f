//! Greedy line breaking over styled runs.
//!
//! The wrapper is independent of the font machinery: callers pass a measuring closure that returns
//! the width of a string set in a given style, which keeps the algorithm testable without fonts.

/// A piece of text set in a single style.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Run<S> {
    pub text: String,
    pub style: S,
}

impl<S> Run<S> {
    pub fn new(text: impl Into<String>, style: S) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Part of a word, positioned relative to the start of the word.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Fragment<S> {
    pub text: String,
    pub style: S,
    pub offset: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Word<S> {
    pub fragments: Vec<Fragment<S>>,
    pub width: f64,
}

/// A wrapped line: words with their horizontal offsets, and the total width they occupy.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Line<S> {
    pub words: Vec<(f64, Word<S>)>,
    pub width: f64,
}

impl<S> Line<S> {
    fn empty() -> Self {
        Self {
            words: Vec::new(),
            width: 0.0,
        }
    }
}

enum Token<S> {
    Word(Word<S>),
    Break,
}

struct WordBuilder<S> {
    fragments: Vec<Fragment<S>>,
    width: f64,
}

impl<S: Copy> WordBuilder<S> {
    fn new() -> Self {
        Self {
            fragments: Vec::new(),
            width: 0.0,
        }
    }

    fn push(&mut self, text: &str, style: S, measure: &impl Fn(&str, S) -> f64) {
        if text.is_empty() {
            return;
        }
        let width = measure(text, style);
        self.fragments.push(Fragment {
            text: text.to_owned(),
            style,
            offset: self.width,
        });
        self.width += width;
    }

    fn finish(&mut self, tokens: &mut Vec<Token<S>>) {
        if !self.fragments.is_empty() {
            tokens.push(Token::Word(Word {
                fragments: std::mem::take(&mut self.fragments),
                width: self.width,
            }));
        }
        self.width = 0.0;
    }
}

fn tokenize<S: Copy>(runs: &[Run<S>], measure: &impl Fn(&str, S) -> f64) -> Vec<Token<S>> {
    let mut tokens = Vec::new();
    let mut word = WordBuilder::new();

    for run in runs {
        let mut pending = String::new();
        for ch in run.text.chars() {
            if ch == '\n' {
                word.push(&pending, run.style, measure);
                pending.clear();
                word.finish(&mut tokens);
                tokens.push(Token::Break);
            } else if ch.is_whitespace() {
                word.push(&pending, run.style, measure);
                pending.clear();
                word.finish(&mut tokens);
            } else {
                pending.push(ch);
            }
        }
        // A run boundary without whitespace continues the current word in a new style.
        word.push(&pending, run.style, measure);
    }
    word.finish(&mut tokens);
    tokens
}

/// Breaks `runs` into lines no wider than `max_width` where possible.
///
/// Whitespace collapses to a single space measured in the style of the following word; a word
/// wider than `max_width` is placed on a line of its own.  `\n` ends the current line, and
/// consecutive breaks produce empty lines.
pub(crate) fn wrap<S: Copy>(
    runs: &[Run<S>],
    max_width: f64,
    measure: impl Fn(&str, S) -> f64,
) -> Vec<Line<S>> {
    let mut lines = Vec::new();
    let mut line = Line::empty();
    let mut open = false;

    for token in tokenize(runs, &measure) {
        match token {
            Token::Break => {
                lines.push(std::mem::replace(&mut line, Line::empty()));
                open = false;
            }
            Token::Word(word) => {
                if line.words.is_empty() {
                    line.width = word.width;
                    line.words.push((0.0, word));
                } else {
                    let space = measure(" ", word.fragments[0].style);
                    let offset = line.width + space;
                    if offset + word.width <= max_width {
                        line.width = offset + word.width;
                        line.words.push((offset, word));
                    } else {
                        let mut next = Line::empty();
                        next.width = word.width;
                        next.words.push((0.0, word));
                        lines.push(std::mem::replace(&mut line, next));
                    }
                }
                open = true;
            }
        }
    }

    if open {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monospace(text: &str, _style: u8) -> f64 {
        text.chars().count() as f64
    }

    fn texts(lines: &[Line<u8>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                line.words
                    .iter()
                    .map(|(_, word)| {
                        word.fragments
                            .iter()
                            .map(|fragment| fragment.text.as_str())
                            .collect::<String>()
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    #[test]
    fn wraps_greedily_at_word_boundaries() {
        let runs = [Run::new("Curses are born from negative emotions", 0)];
        let lines = wrap(&runs, 16.0, monospace);
        assert_eq!(
            texts(&lines),
            vec!["Curses are born", "from negative", "emotions"]
        );
        assert_eq!(lines[0].width, 15.0);
        assert_eq!(lines[1].words[1].0, 5.0);
    }

    #[test]
    fn collapses_repeated_whitespace() {
        let runs = [Run::new("  Grade   4  ", 0)];
        let lines = wrap(&runs, 80.0, monospace);
        assert_eq!(texts(&lines), vec!["Grade 4"]);
    }

    #[test]
    fn explicit_breaks_end_lines() {
        let runs = [Run::new("Level: 3\nCEP: 10\n\nNotes", 0)];
        let lines = wrap(&runs, 80.0, monospace);
        assert_eq!(texts(&lines), vec!["Level: 3", "CEP: 10", "", "Notes"]);
    }

    #[test]
    fn style_change_inside_word_keeps_word_together() {
        let runs = [Run::new("Boogie", 1), Run::new("Woogie swap", 2)];
        let lines = wrap(&runs, 80.0, monospace);
        assert_eq!(lines.len(), 1);
        let (_, first) = &lines[0].words[0];
        assert_eq!(first.fragments.len(), 2);
        assert_eq!(first.fragments[1].offset, 6.0);
        assert_eq!(first.fragments[1].style, 2);
        assert_eq!(first.width, 12.0);
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let runs = [Run::new("a Reverse-Cursed-Technique b", 0)];
        let lines = wrap(&runs, 10.0, monospace);
        assert_eq!(texts(&lines), vec!["a", "Reverse-Cursed-Technique", "b"]);
    }

    #[test]
    fn empty_input_has_no_lines() {
        let runs: [Run<u8>; 1] = [Run::new("   ", 0)];
        assert!(wrap(&runs, 10.0, monospace).is_empty());
    }
}
