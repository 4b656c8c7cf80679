//! Statement tokenization into level/name/clause rows.

use crate::error::{CopybookError, Result};
use crate::source::Statement;

/// Name given to entries that omit one.
pub const FILLER: &str = "FILLER";

/// Keywords that may directly follow a level number when the name is omitted.
const CLAUSE_KEYWORDS: &[&str] = &[
    "PIC",
    "PICTURE",
    "REDEFINES",
    "OCCURS",
    "VALUE",
    "VALUES",
    "USAGE",
    "COMP",
    "COMP-3",
    "COMP-4",
    "COMPUTATIONAL",
    "COMPUTATIONAL-3",
    "COMPUTATIONAL-4",
    "BINARY",
    "PACKED-DECIMAL",
    "DISPLAY",
];

/// One data description entry, split into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    /// Level number (01-49, 66, 77, 88).
    pub level: u8,
    /// Original COBOL identifier.
    pub name: String,
    /// Everything after the name, in source order.
    pub clauses: Vec<String>,
    /// Source line of the entry.
    pub line: u32,
}

impl TokenRow {
    /// Check if the row is a level-88 condition name.
    pub fn is_condition(&self) -> bool {
        self.level == 88
    }

    /// Check if the row describes storage at an ordinary level (01-49).
    pub fn is_data_level(&self) -> bool {
        (1..=49).contains(&self.level)
    }

    /// Position of a clause keyword (case-insensitive).
    pub fn keyword_index(&self, keyword: &str) -> Option<usize> {
        self.clauses
            .iter()
            .position(|token| token.eq_ignore_ascii_case(keyword))
    }

    /// Check if any clause token is the given keyword.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keyword_index(keyword).is_some()
    }

    /// Check if the row carries a PICTURE clause.
    pub fn has_picture(&self) -> bool {
        self.has_keyword("PIC") || self.has_keyword("PICTURE")
    }

    /// The operand following the first of `keywords` found, skipping `IS`.
    pub fn operand(&self, keywords: &[&str]) -> Option<&str> {
        let idx = keywords.iter().find_map(|kw| self.keyword_index(kw))?;
        let mut rest = self.clauses[idx + 1..].iter();
        let mut operand = rest.next()?;
        if operand.eq_ignore_ascii_case("IS") {
            operand = rest.next()?;
        }
        Some(operand.as_str())
    }

    /// The tokens following a keyword.
    pub fn tokens_after(&self, keyword: &str) -> &[String] {
        match self.keyword_index(keyword) {
            Some(idx) => &self.clauses[idx + 1..],
            None => &[],
        }
    }
}

/// Split a statement on whitespace and put its literals back in place.
///
/// A literal touching a word (`X'F1'`) is spliced into that word; a literal
/// standing alone becomes a token of its own.
pub fn split_tokens(statement: &Statement) -> Vec<String> {
    let text = &statement.text;
    let mut words: Vec<(usize, usize)> = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), word_start) {
            (true, Some(start)) => {
                words.push((start, idx));
                word_start = None;
            }
            (false, None) => word_start = Some(idx),
            _ => {}
        }
    }
    if let Some(start) = word_start {
        words.push((start, text.len()));
    }

    let mut tokens: Vec<(usize, String)> = words
        .iter()
        .map(|&(start, end)| (start, text[start..end].to_string()))
        .collect();

    // Later literals first, so earlier offsets within a word stay valid
    for literal in statement.literals.iter().rev() {
        let touching = words
            .iter()
            .position(|&(start, end)| start <= literal.offset && literal.offset <= end);
        match touching {
            Some(idx) => {
                let at = literal.offset - words[idx].0;
                tokens[idx].1.insert_str(at, &literal.text);
            }
            None => tokens.push((literal.offset, literal.text.clone())),
        }
    }

    tokens.sort_by_key(|&(offset, _)| offset);
    tokens.into_iter().map(|(_, token)| token).collect()
}

/// Turn statements into token rows, dropping empty statements.
pub fn tokenize(statements: &[Statement]) -> Result<Vec<TokenRow>> {
    let mut rows = Vec::with_capacity(statements.len());

    for statement in statements {
        let mut tokens = split_tokens(statement).into_iter();
        let Some(level_token) = tokens.next() else {
            continue;
        };
        let level = parse_level(&level_token, statement.line)?;

        let mut clauses: Vec<String> = tokens.collect();
        let name = match clauses.first() {
            Some(first) if !is_clause_keyword(first) => clauses.remove(0),
            _ => FILLER.to_string(),
        };

        rows.push(TokenRow {
            level,
            name,
            clauses,
            line: statement.line,
        });
    }

    Ok(rows)
}

fn parse_level(token: &str, line: u32) -> Result<u8> {
    let level = if token.len() <= 2 && token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse::<u8>().ok()
    } else {
        None
    };

    match level {
        Some(level) if (1..=49).contains(&level) || matches!(level, 66 | 77 | 88) => Ok(level),
        _ => Err(CopybookError::structure(
            line,
            format!("expected a level number (01-49, 66, 77, 88), found '{}'", token),
        )),
    }
}

fn is_clause_keyword(token: &str) -> bool {
    CLAUSE_KEYWORDS
        .iter()
        .any(|keyword| token.eq_ignore_ascii_case(keyword))
}
