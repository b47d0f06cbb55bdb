//! Simple query string parser
//!
//! Grammar, whitespace separated:
//!
//! ```text
//! query   := clause*
//! clause  := occur? (word | phrase)
//! occur   := '+' | '-'
//! word    := chars ( '*' | '~' digits? )?
//! phrase  := '"' chars '"' ( '~' digits )?
//! ```
//!
//! Unprefixed clauses are optional (OR); `+` makes a clause required and
//! `-` prohibits it. A trailing `*` turns a word into a prefix, `~N` into a
//! fuzzy term with N edits (2 when N is omitted), and after a phrase `~N`
//! sets the phrase slop. Malformed input is rejected, never reinterpreted.

use crate::settings::MAX_FUZZY_EDITS;
use libris_core::{LibrisError, LibrisResult};

/// Whether a clause must, should, or must not match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// Optional; contributes to the score
    Should,
    /// Required
    Must,
    /// Excluding
    MustNot,
}

/// One parsed clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Text analyzed with the field's analyzer; any resulting term matches
    Term(String),
    /// Raw-word or term prefix
    Prefix(String),
    /// Analyzed phrase with slop
    Phrase {
        /// Phrase text
        text: String,
        /// Allowed displacement
        slop: u32,
    },
    /// Analyzed term matched within an edit distance
    Fuzzy {
        /// Term text
        text: String,
        /// Allowed edits
        edits: u8,
    },
}

/// A parsed query string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedQuery {
    /// Clauses in input order
    pub clauses: Vec<(Occur, Clause)>,
}

impl ParsedQuery {
    /// True when no clause can contribute a positive match
    pub fn is_negative_only(&self) -> bool {
        !self.clauses.is_empty() && self.clauses.iter().all(|(o, _)| *o == Occur::MustNot)
    }

    /// Clauses with the given occurrence
    pub fn with_occur(&self, occur: Occur) -> impl Iterator<Item = &Clause> {
        self.clauses
            .iter()
            .filter(move |(o, _)| *o == occur)
            .map(|(_, c)| c)
    }
}

/// Parse a query string
///
/// # Example
///
/// ```
/// use libris_search::query_string::{parse, Clause, Occur};
///
/// let q = parse("+pride -zombies prej*").unwrap();
/// assert_eq!(q.clauses[0], (Occur::Must, Clause::Term("pride".into())));
/// assert_eq!(q.clauses[1], (Occur::MustNot, Clause::Term("zombies".into())));
/// assert_eq!(q.clauses[2], (Occur::Should, Clause::Prefix("prej".into())));
/// ```
pub fn parse(input: &str) -> LibrisResult<ParsedQuery> {
    if input.trim().is_empty() {
        return Err(LibrisError::invalid_query("query string is blank"));
    }

    let chars: Vec<char> = input.chars().collect();
    let mut clauses = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let occur = match chars[i] {
            '+' => {
                i += 1;
                Occur::Must
            }
            '-' => {
                i += 1;
                Occur::MustNot
            }
            _ => Occur::Should,
        };

        if i < chars.len() && chars[i] == '"' {
            let start = i + 1;
            let end = chars[start..]
                .iter()
                .position(|c| *c == '"')
                .map(|p| start + p)
                .ok_or_else(|| LibrisError::invalid_query("unterminated quote in query string"))?;
            let text: String = chars[start..end].iter().collect();
            i = end + 1;

            let mut slop = 0;
            if i < chars.len() && chars[i] == '~' {
                let (digits, next) = read_word(&chars, i + 1);
                i = next;
                slop = parse_number(&digits, "phrase slop")?;
            }
            if !text.trim().is_empty() {
                clauses.push((occur, Clause::Phrase { text, slop }));
            }
            continue;
        }

        let (word, next) = read_word(&chars, i);
        i = next;
        if let Some(clause) = word_clause(&word)? {
            clauses.push((occur, clause));
        }
    }

    Ok(ParsedQuery { clauses })
}

/// Read until whitespace or a quote
fn read_word(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && !chars[end].is_whitespace() && chars[end] != '"' {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn parse_number(digits: &str, what: &str) -> LibrisResult<u32> {
    digits
        .parse::<u32>()
        .map_err(|_| LibrisError::invalid_query(format!("invalid {} '{}'", what, digits)))
}

fn word_clause(word: &str) -> LibrisResult<Option<Clause>> {
    if let Some((text, edits)) = word.rsplit_once('~') {
        let edits = if edits.is_empty() {
            MAX_FUZZY_EDITS as u32
        } else {
            parse_number(edits, "fuzzy edit distance")?
        };
        if edits > MAX_FUZZY_EDITS as u32 {
            return Err(LibrisError::invalid_query(format!(
                "fuzzy edit distance {} exceeds {}",
                edits, MAX_FUZZY_EDITS
            )));
        }
        if text.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Clause::Fuzzy {
            text: text.to_string(),
            edits: edits as u8,
        }));
    }

    if let Some(text) = word.strip_suffix('*') {
        let text = text.trim_end_matches('*');
        if text.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Clause::Prefix(text.to_string())));
    }

    if word.is_empty() {
        return Ok(None);
    }
    Ok(Some(Clause::Term(word.to_string())))
}
