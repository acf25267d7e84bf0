//! Rule pack parser.
//!
//! A pack is a `PREFIX` block followed by `CONSTRUCT { ... } WHERE { ... }`
//! rules separated by top-level `;`. Parsing is token-based: string
//! literals, IRI refs, prefixed names, variables, and comments are lexed
//! before any rule splitting happens, so a `;` or `.` inside a quoted
//! literal can never break a rule apart.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::graph::Term;
use crate::vocab;

#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// One position of a triple pattern: a variable or a ground term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTerm {
    Var(String),
    Const(Term),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

/// One `CONSTRUCT { ... } WHERE { ... }` rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub construct: Vec<TriplePattern>,
    pub where_: Vec<TriplePattern>,
}

/// A parsed pack: prefix declarations plus rules in file order.
#[derive(Debug, Clone)]
pub struct RulePack {
    pub name: String,
    pub prefixes: BTreeMap<String, String>,
    pub rules: Vec<Rule>,
}

impl RulePack {
    pub fn parse(name: &str, text: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            tokens,
            position: 0,
            prefixes: BTreeMap::new(),
        };
        let rules = parser.parse_pack()?;
        Ok(RulePack {
            name: name.to_string(),
            prefixes: parser.prefixes,
            rules,
        })
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    /// Keyword, boolean, or prefixed name.
    Word(String),
    Var(String),
    IriRef(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    Dot,
    Semicolon,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '{' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::LBrace,
                    line,
                });
            }
            '}' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::RBrace,
                    line,
                });
            }
            '.' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::Dot,
                    line,
                });
            }
            ';' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::Semicolon,
                    line,
                });
            }
            '?' => {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(ParseError::new(line, "expected variable name after '?'"));
                }
                tokens.push(Token {
                    kind: TokenKind::Var(name),
                    line,
                });
            }
            '<' => {
                chars.next();
                let mut iri = String::new();
                loop {
                    match chars.next() {
                        Some('>') => break,
                        Some('\n') | None => {
                            return Err(ParseError::new(line, "unterminated IRI reference"));
                        }
                        Some(c) => iri.push(c),
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::IriRef(iri),
                    line,
                });
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('\\') => value.push('\\'),
                            Some('"') => value.push('"'),
                            Some('n') => value.push('\n'),
                            Some('r') => value.push('\r'),
                            Some('t') => value.push('\t'),
                            other => {
                                return Err(ParseError::new(
                                    line,
                                    format!("invalid string escape: {:?}", other),
                                ));
                            }
                        },
                        Some('\n') | None => {
                            return Err(ParseError::new(line, "unterminated string literal"));
                        }
                        Some(c) => value.push(c),
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    line,
                });
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut digits = String::new();
                digits.push(c);
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| ParseError::new(line, format!("invalid integer: {}", digits)))?;
                tokens.push(Token {
                    kind: TokenKind::Int(value),
                    line,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '-' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Word(word),
                    line,
                });
            }
            other => {
                return Err(ParseError::new(line, format!("unexpected character: {:?}", other)));
            }
        }
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    prefixes: BTreeMap<String, String>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn is_word(&self, keyword: &str) -> bool {
        matches!(
            self.peek(),
            Some(Token { kind: TokenKind::Word(w), .. }) if w.eq_ignore_ascii_case(keyword)
        )
    }

    fn expect_word(&mut self, keyword: &str) -> Result<(), ParseError> {
        let line = self.current_line();
        if self.is_word(keyword) {
            self.next();
            Ok(())
        } else {
            Err(ParseError::new(line, format!("expected {}", keyword)))
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        let line = self.current_line();
        match self.next() {
            Some(token) if token.kind == kind => Ok(()),
            _ => Err(ParseError::new(line, format!("expected {}", what))),
        }
    }

    fn parse_pack(&mut self) -> Result<Vec<Rule>, ParseError> {
        while self.is_word("PREFIX") {
            self.parse_prefix()?;
        }
        let mut rules = Vec::new();
        while self.peek().is_some() {
            rules.push(self.parse_rule()?);
            // Top-level ';' separates rules; the final one may omit it.
            if matches!(self.peek(), Some(Token { kind: TokenKind::Semicolon, .. })) {
                self.next();
            }
        }
        if rules.is_empty() {
            return Err(ParseError::new(self.current_line(), "pack contains no rules"));
        }
        Ok(rules)
    }

    fn parse_prefix(&mut self) -> Result<(), ParseError> {
        self.expect_word("PREFIX")?;
        let line = self.current_line();
        let label = match self.next() {
            Some(Token { kind: TokenKind::Word(w), .. }) if w.ends_with(':') => {
                w[..w.len() - 1].to_string()
            }
            _ => return Err(ParseError::new(line, "expected prefix label ending in ':'")),
        };
        let line = self.current_line();
        let namespace = match self.next() {
            Some(Token { kind: TokenKind::IriRef(iri), .. }) => iri,
            _ => return Err(ParseError::new(line, "expected namespace IRI reference")),
        };
        self.prefixes.insert(label, namespace);
        Ok(())
    }

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        self.expect_word("CONSTRUCT")?;
        let construct = self.parse_pattern_block()?;
        self.expect_word("WHERE")?;
        let where_ = self.parse_pattern_block()?;
        if where_.is_empty() {
            return Err(ParseError::new(self.current_line(), "empty WHERE block"));
        }
        Ok(Rule { construct, where_ })
    }

    fn parse_pattern_block(&mut self) -> Result<Vec<TriplePattern>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut patterns = Vec::new();
        loop {
            if matches!(self.peek(), Some(Token { kind: TokenKind::RBrace, .. })) {
                self.next();
                return Ok(patterns);
            }
            let subject = self.parse_term()?;
            let predicate = self.parse_term()?;
            let object = self.parse_term()?;
            patterns.push(TriplePattern {
                subject,
                predicate,
                object,
            });
            // '.' terminates a pattern; the last one may rely on '}'.
            if matches!(self.peek(), Some(Token { kind: TokenKind::Dot, .. })) {
                self.next();
            }
        }
    }

    fn parse_term(&mut self) -> Result<PatternTerm, ParseError> {
        let line = self.current_line();
        match self.next() {
            Some(Token { kind: TokenKind::Var(name), .. }) => Ok(PatternTerm::Var(name)),
            Some(Token { kind: TokenKind::IriRef(iri), .. }) => {
                Ok(PatternTerm::Const(Term::iri(iri)))
            }
            Some(Token { kind: TokenKind::Str(value), .. }) => {
                Ok(PatternTerm::Const(Term::lit(value)))
            }
            Some(Token { kind: TokenKind::Int(value), .. }) => {
                Ok(PatternTerm::Const(Term::int(value)))
            }
            Some(Token { kind: TokenKind::Word(word), .. }) => match word.as_str() {
                "a" => Ok(PatternTerm::Const(Term::iri(vocab::RDF_TYPE))),
                "true" => Ok(PatternTerm::Const(Term::boolean(true))),
                "false" => Ok(PatternTerm::Const(Term::boolean(false))),
                _ => self.resolve_prefixed(&word, line),
            },
            _ => Err(ParseError::new(line, "expected a pattern term")),
        }
    }

    fn resolve_prefixed(&self, word: &str, line: usize) -> Result<PatternTerm, ParseError> {
        let Some((prefix, local)) = word.split_once(':') else {
            return Err(ParseError::new(
                line,
                format!("expected a prefixed name, found '{}'", word),
            ));
        };
        let Some(namespace) = self.prefixes.get(prefix) else {
            return Err(ParseError::new(line, format!("undeclared prefix '{}'", prefix)));
        };
        Ok(PatternTerm::Const(Term::iri(format!("{}{}", namespace, local))))
    }
}

// ============================================================================
// Tests
// ============================================================================
