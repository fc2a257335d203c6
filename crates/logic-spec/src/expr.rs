//! Custom rule logic such as `C1 AND (C2 OR NOT C3)`.
//!
//! Expressions are tokenized and parsed into a [`LogicExpr`] tree; slots `Ck`
//! are bound to condition results at evaluation time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::LogicError;

/// Deepest `NOT`/parenthesis nesting accepted in custom logic.
pub const MAX_NESTING: usize = 128;

/// Parsed custom logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LogicExpr {
    Literal { value: bool },
    /// 1-based condition slot.
    Slot { index: usize },
    And { expressions: Vec<LogicExpr> },
    Or { expressions: Vec<LogicExpr> },
    Not { expression: Box<LogicExpr> },
}

impl LogicExpr {
    pub fn parse(source: &str) -> Result<Self, LogicError> {
        let tokens = lex(source)?;
        if tokens.is_empty() {
            return Err(LogicError::EmptyExpression);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(LogicError::UnexpectedToken {
                found: token.kind.to_string(),
                offset: token.offset,
            }),
        }
    }

    /// Highest slot referenced, `0` when the expression references none.
    pub fn max_slot(&self) -> usize {
        match self {
            LogicExpr::Literal { .. } => 0,
            LogicExpr::Slot { index } => *index,
            LogicExpr::And { expressions } | LogicExpr::Or { expressions } => expressions
                .iter()
                .map(LogicExpr::max_slot)
                .max()
                .unwrap_or(0),
            LogicExpr::Not { expression } => expression.max_slot(),
        }
    }

    /// Checks every slot is within `1..=count`.
    pub fn check_slots(&self, count: usize) -> Result<(), LogicError> {
        match self {
            LogicExpr::Literal { .. } => Ok(()),
            LogicExpr::Slot { index } => {
                if *index == 0 || *index > count {
                    Err(LogicError::SlotOutOfRange {
                        slot: *index,
                        count,
                    })
                } else {
                    Ok(())
                }
            }
            LogicExpr::And { expressions } | LogicExpr::Or { expressions } => expressions
                .iter()
                .try_for_each(|expression| expression.check_slots(count)),
            LogicExpr::Not { expression } => expression.check_slots(count),
        }
    }

    /// Evaluates against condition results; `slots[0]` is `C1`.
    pub fn evaluate(&self, slots: &[bool]) -> Result<bool, LogicError> {
        self.check_slots(slots.len())?;
        Ok(self.eval_checked(slots))
    }

    fn eval_checked(&self, slots: &[bool]) -> bool {
        match self {
            LogicExpr::Literal { value } => *value,
            LogicExpr::Slot { index } => slots[index - 1],
            LogicExpr::And { expressions } => expressions.iter().all(|e| e.eval_checked(slots)),
            LogicExpr::Or { expressions } => expressions.iter().any(|e| e.eval_checked(slots)),
            LogicExpr::Not { expression } => !expression.eval_checked(slots),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Bool(bool),
    Slot(usize),
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::And => write!(f, "AND"),
            TokenKind::Or => write!(f, "OR"),
            TokenKind::Not => write!(f, "NOT"),
            TokenKind::Bool(value) => write!(f, "{}", value),
            TokenKind::Slot(index) => write!(f, "C{}", index),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn lex(source: &str) -> Result<Vec<Token>, LogicError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let (offset, c) = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let next = chars.get(pos + 1).map(|(_, c)| *c);
        let kind = match c {
            '(' => {
                pos += 1;
                TokenKind::LParen
            }
            ')' => {
                pos += 1;
                TokenKind::RParen
            }
            '!' => {
                pos += 1;
                TokenKind::Not
            }
            '&' if next == Some('&') => {
                pos += 2;
                TokenKind::And
            }
            '|' if next == Some('|') => {
                pos += 2;
                TokenKind::Or
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = pos;
                while pos < chars.len()
                    && (chars[pos].1.is_ascii_alphanumeric() || chars[pos].1 == '_')
                {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().map(|(_, c)| *c).collect();
                word_token(&word, offset)?
            }
            other => {
                return Err(LogicError::UnexpectedChar {
                    found: other,
                    offset,
                });
            }
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn word_token(word: &str, offset: usize) -> Result<TokenKind, LogicError> {
    match word {
        "AND" => return Ok(TokenKind::And),
        "OR" => return Ok(TokenKind::Or),
        "NOT" => return Ok(TokenKind::Not),
        "true" => return Ok(TokenKind::Bool(true)),
        "false" => return Ok(TokenKind::Bool(false)),
        _ => {}
    }

    if let Some(digits) = word.strip_prefix('C')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && let Ok(index) = digits.parse::<usize>()
    {
        return Ok(TokenKind::Slot(index));
    }

    Err(LogicError::UnexpectedToken {
        found: word.to_string(),
        offset,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|token| &token.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Runs `parse` one nesting level deeper, refusing past [`MAX_NESTING`].
    fn nested(
        &mut self,
        offset: usize,
        parse: fn(&mut Self) -> Result<LogicExpr, LogicError>,
    ) -> Result<LogicExpr, LogicError> {
        if self.depth >= MAX_NESTING {
            return Err(LogicError::TooDeep {
                limit: MAX_NESTING,
                offset,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> Result<LogicExpr, LogicError> {
        let mut expressions = vec![self.parse_and()?];
        while self.eat(&TokenKind::Or) {
            expressions.push(self.parse_and()?);
        }
        Ok(collapse(expressions, |expressions| LogicExpr::Or { expressions }))
    }

    fn parse_and(&mut self) -> Result<LogicExpr, LogicError> {
        let mut expressions = vec![self.parse_unary()?];
        while self.eat(&TokenKind::And) {
            expressions.push(self.parse_unary()?);
        }
        Ok(collapse(expressions, |expressions| LogicExpr::And { expressions }))
    }

    fn parse_unary(&mut self) -> Result<LogicExpr, LogicError> {
        if let Some(offset) = self.peek().map(|token| token.offset)
            && self.eat(&TokenKind::Not)
        {
            let expression = self.nested(offset, Self::parse_unary)?;
            return Ok(LogicExpr::Not {
                expression: Box::new(expression),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<LogicExpr, LogicError> {
        let token = self.advance().ok_or(LogicError::UnexpectedEnd {
            expected: "a condition slot, literal or '('",
        })?;
        match token.kind {
            TokenKind::Slot(index) => Ok(LogicExpr::Slot { index }),
            TokenKind::Bool(value) => Ok(LogicExpr::Literal { value }),
            TokenKind::LParen => {
                let inner = self.nested(token.offset, Self::parse_or)?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(LogicError::UnexpectedToken {
                        found: other.kind.to_string(),
                        offset: other.offset,
                    }),
                    None => Err(LogicError::UnexpectedEnd { expected: "')'" }),
                }
            }
            other => Err(LogicError::UnexpectedToken {
                found: other.to_string(),
                offset: token.offset,
            }),
        }
    }
}

fn collapse(mut expressions: Vec<LogicExpr>, wrap: fn(Vec<LogicExpr>) -> LogicExpr) -> LogicExpr {
    if expressions.len() == 1 {
        expressions.remove(0)
    } else {
        wrap(expressions)
    }
}
