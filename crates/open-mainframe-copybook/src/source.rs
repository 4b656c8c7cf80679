//! Fixed-format copybook source handling.
//!
//! Turns raw copybook text into period-terminated [`Statement`]s:
//! - Columns 1-6 (sequence area) are ignored
//! - Column 7 marks comments (`*`, `/`) and continuations (`-`)
//! - Columns 8-72 carry the code
//! - Quoted literals are lifted out of each statement so that whitespace
//!   tokenization can never split them

use crate::config::SourceConfig;

/// Column indicator values in fixed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Normal code line (space or no indicator).
    Normal,
    /// Comment line ('*' or '/').
    Comment,
    /// Continuation line ('-').
    Continuation,
    /// Debug line ('D' or 'd').
    Debug,
}

impl Indicator {
    /// Parse an indicator character.
    pub fn from_char(ch: char) -> Self {
        match ch {
            '*' | '/' => Indicator::Comment,
            '-' => Indicator::Continuation,
            'D' | 'd' => Indicator::Debug,
            _ => Indicator::Normal,
        }
    }
}

/// A physical line of copybook source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// The original line number (1-indexed).
    pub line_number: u32,
    /// The indicator character.
    pub indicator: Indicator,
    /// The code area (columns 8-72, or to end of line without strict margins).
    pub content: String,
}

impl SourceLine {
    /// Check if this line is a comment.
    pub fn is_comment(&self) -> bool {
        self.indicator == Indicator::Comment
    }

    /// Check if this line is a continuation.
    pub fn is_continuation(&self) -> bool {
        self.indicator == Indicator::Continuation
    }

    /// Check if the code area holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A quoted literal lifted out of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// Byte position in the literal-free statement text.
    pub offset: usize,
    /// The literal, quotes included.
    pub text: String,
}

/// One period-terminated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Source line of the statement's first token.
    pub line: u32,
    /// Statement text with every literal removed.
    pub text: String,
    /// Literals in order of appearance.
    pub literals: Vec<Literal>,
}

impl Statement {
    /// Check if the statement carries no content at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.literals.is_empty()
    }
}

/// Normalize line endings to `\n`.
///
/// Converts `\r\n` and bare `\r`.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split copybook text into statements.
pub fn normalize(source: &str, config: &SourceConfig) -> Vec<Statement> {
    let text = normalize_line_endings(source);
    let lines = parse_lines(&text, config);
    let joined = join_lines(&lines);

    split_statements(&joined.text)
        .into_iter()
        .map(|(offset, raw)| {
            let leading = raw.len() - raw.trim_start().len();
            let (text, literals) = lift_literals(raw);
            Statement {
                line: joined.line_at(offset + leading),
                text,
                literals,
            }
        })
        .collect()
}

/// Parse source text into fixed-format lines.
///
/// The input **must** already be normalized (no `\r` bytes).
pub fn parse_lines(text: &str, config: &SourceConfig) -> Vec<SourceLine> {
    text.lines()
        .zip(1u32..)
        .map(|(line, number)| parse_fixed_line(line, number, config.strict_margins))
        .collect()
}

/// Parse a fixed-format line.
///
/// Fixed format layout:
/// - Columns 1-6: Sequence number area (ignored)
/// - Column 7: Indicator area
/// - Columns 8-72: Areas A and B (actual code)
/// - Columns 73-80: Identification area (ignored with strict margins)
fn parse_fixed_line(line: &str, line_number: u32, strict_margins: bool) -> SourceLine {
    let chars: Vec<char> = line.chars().collect();

    let indicator = chars
        .get(6)
        .copied()
        .map_or(Indicator::Normal, Indicator::from_char);

    let code_end = if strict_margins {
        chars.len().min(72)
    } else {
        chars.len()
    };
    let content: String = if chars.len() > 7 {
        chars[7..code_end].iter().collect()
    } else {
        String::new()
    };

    SourceLine {
        line_number,
        indicator,
        content,
    }
}

/// Code lines joined into one text, with a map back to source lines.
#[derive(Debug, Default)]
struct JoinedSource {
    text: String,
    /// `(byte offset in text, source line)` for each appended piece, ascending.
    lines: Vec<(usize, u32)>,
}

impl JoinedSource {
    fn line_at(&self, offset: usize) -> u32 {
        let idx = self.lines.partition_point(|&(start, _)| start <= offset);
        idx.checked_sub(1).map_or(0, |i| self.lines[i].1)
    }
}

/// Tracks whether a quoted literal is open while scanning text.
#[derive(Debug, Default)]
struct QuoteState {
    open: Option<char>,
}

impl QuoteState {
    fn feed(&mut self, text: &str) {
        for ch in text.chars() {
            self.open = match self.open {
                Some(quote) if ch == quote => None,
                Some(quote) => Some(quote),
                None if ch == '\'' || ch == '"' => Some(ch),
                None => None,
            };
        }
    }
}

/// Join code lines, dropping comments and blanks and resolving continuations.
fn join_lines(lines: &[SourceLine]) -> JoinedSource {
    let mut joined = JoinedSource::default();
    let mut quotes = QuoteState::default();

    for line in lines {
        if line.is_comment() || line.is_blank() {
            continue;
        }

        if line.is_continuation() {
            let resumed = line.content.trim_start();
            let piece = match quotes.open {
                // Continued literal: the leading quote reopens it
                Some(quote) if resumed.starts_with(quote) => &resumed[quote.len_utf8()..],
                _ => {
                    let kept = joined.text.trim_end().len();
                    joined.text.truncate(kept);
                    resumed
                }
            };
            joined.lines.push((joined.text.len(), line.line_number));
            quotes.feed(piece);
            joined.text.push_str(piece);
            continue;
        }

        // A literal may not run past the end of a line without a continuation
        if let Some(quote) = quotes.open.take() {
            joined.text.push(quote);
        }
        if !joined.text.is_empty() {
            joined.text.push('\n');
        }
        joined.lines.push((joined.text.len(), line.line_number));
        quotes.feed(&line.content);
        joined.text.push_str(&line.content);
    }

    if let Some(quote) = quotes.open.take() {
        joined.text.push(quote);
    }

    joined
}

/// Split text on separator periods.
///
/// A separator period lies outside any literal and is followed by
/// whitespace or the end of the text, so `9(3).99` and `VALUE 1.5` stay intact.
/// Returns each statement's byte offset and raw text.
fn split_statements(text: &str) -> Vec<(usize, &str)> {
    let mut statements = Vec::new();
    let mut quote: Option<char> = None;
    let mut begin = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '.' => {
                let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
                if at_boundary {
                    statements.push((begin, &text[begin..idx]));
                    begin = idx + 1;
                }
            }
            None => {}
        }
    }

    if begin < text.len() {
        statements.push((begin, &text[begin..]));
    }

    statements
}

/// Remove quoted literals from a statement, remembering where they were.
fn lift_literals(raw: &str) -> (String, Vec<Literal>) {
    let mut text = String::with_capacity(raw.len());
    let mut literals = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\'' && ch != '"' {
            text.push(ch);
            continue;
        }

        let mut literal = String::from(ch);
        while let Some(next) = chars.next() {
            literal.push(next);
            if next == ch {
                // A doubled quote stands for one quote character
                if chars.peek() == Some(&ch) {
                    literal.push(ch);
                    chars.next();
                    continue;
                }
                break;
            }
        }
        literals.push(Literal {
            offset: text.len(),
            text: literal,
        });
    }

    (text, literals)
}

/// Build fixed-format source from lines whose first character is column 7.
#[cfg(test)]
pub(crate) fn fixed_format(lines: &[&str]) -> String {
    lines
        .iter()
        .zip(1usize..)
        .map(|(line, n)| format!("{:06}{}", n * 100, line))
        .collect::<Vec<_>>()
        .join("\n")
}
