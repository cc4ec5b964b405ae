//! The subset of the MSBuild condition language needed to select property
//! groups, items, imports, and targets.
//!
//! Supported: quoted and bare operands with `$(Name)` expansion, `==`, `!=`,
//! the relational operators on dotted version numbers, `and`, `or`, `!`,
//! parentheses, and the `Exists(...)` / `HasTrailingSlash(...)` functions.
//! String comparison ignores ASCII case, as MSBuild does.

use std::cmp::Ordering;

use camino::Utf8Path;
use miette::Diagnostic;
use thiserror::Error;

use super::PropertyBag;
use crate::paths::absolutize;

/// Errors raised while parsing or evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConditionError {
    /// A quoted operand was not closed.
    #[error("unterminated string starting at offset {offset}")]
    #[diagnostic(code(vcxgraph::condition::unterminated_string))]
    UnterminatedString {
        /// Character offset of the opening quote.
        offset: usize,
    },
    /// The parser met a token it did not expect.
    #[error("unexpected '{token}' in condition")]
    #[diagnostic(code(vcxgraph::condition::unexpected_token))]
    UnexpectedToken {
        /// Text of the offending token.
        token: String,
    },
    /// The condition ended early.
    #[error("condition ended unexpectedly")]
    #[diagnostic(code(vcxgraph::condition::unexpected_end))]
    UnexpectedEnd,
    /// A function other than `Exists` or `HasTrailingSlash` was called.
    #[error("unsupported condition function '{name}'")]
    #[diagnostic(code(vcxgraph::condition::unknown_function))]
    UnknownFunction {
        /// Name of the function.
        name: String,
    },
    /// A lone operand did not evaluate to `true` or `false`.
    #[error("'{value}' is not a boolean")]
    #[diagnostic(code(vcxgraph::condition::not_boolean))]
    NotBoolean {
        /// Expanded operand text.
        value: String,
    },
    /// A relational operator was applied to non-numeric operands.
    #[error("cannot order '{left}' and '{right}'")]
    #[diagnostic(code(vcxgraph::condition::not_comparable))]
    NotComparable {
        /// Expanded left operand.
        left: String,
        /// Expanded right operand.
        right: String,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A parsed condition expression. Operands hold unexpanded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// A lone operand that must expand to `true` or `false`.
    Value(String),
    /// A binary comparison.
    Compare {
        /// Left operand.
        left: String,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: String,
    },
    /// `Exists('path')`.
    Exists(String),
    /// `HasTrailingSlash('path')`.
    HasTrailingSlash(String),
    /// `!expr`
    Not(Box<Self>),
    /// `a and b`
    And(Box<Self>, Box<Self>),
    /// `a or b`
    Or(Box<Self>, Box<Self>),
}

impl Condition {
    /// Parse condition text.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] when the text is not a well-formed
    /// condition.
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.advance() {
            None => Ok(expr),
            Some(token) => Err(ConditionError::UnexpectedToken {
                token: token.to_string(),
            }),
        }
    }

    /// Evaluate against `properties`; `Exists` paths resolve from `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] when an operand has the wrong shape for the
    /// operation applied to it.
    pub fn evaluate(&self, properties: &PropertyBag, base_dir: &Utf8Path) -> Result<bool, ConditionError> {
        match self {
            Self::Value(raw) => {
                let value = properties.expand(raw);
                super::parse_bool(&value).ok_or(ConditionError::NotBoolean { value })
            }
            Self::Compare { left, op, right } => {
                compare(&properties.expand(left), *op, &properties.expand(right))
            }
            Self::Exists(raw) => {
                let value = properties.expand(raw);
                let trimmed = value.trim();
                Ok(!trimmed.is_empty() && absolutize(base_dir, trimmed).exists())
            }
            Self::HasTrailingSlash(raw) => {
                let value = properties.expand(raw);
                Ok(value.ends_with('/') || value.ends_with('\\'))
            }
            Self::Not(inner) => Ok(!inner.evaluate(properties, base_dir)?),
            Self::And(a, b) => {
                Ok(a.evaluate(properties, base_dir)? && b.evaluate(properties, base_dir)?)
            }
            Self::Or(a, b) => {
                Ok(a.evaluate(properties, base_dir)? || b.evaluate(properties, base_dir)?)
            }
        }
    }
}

/// Parse and evaluate `text`; a blank condition is true.
///
/// # Errors
///
/// Returns [`ConditionError`] when parsing or evaluation fails.
pub fn evaluate(text: &str, properties: &PropertyBag, base_dir: &Utf8Path) -> Result<bool, ConditionError> {
    if text.trim().is_empty() {
        return Ok(true);
    }
    Condition::parse(text)?.evaluate(properties, base_dir)
}

fn compare(left: &str, op: CompareOp, right: &str) -> Result<bool, ConditionError> {
    let equal = left.eq_ignore_ascii_case(right);
    let ordering = || {
        version_key(left)
            .zip(version_key(right))
            .map(|(l, r)| l.cmp(&r))
            .ok_or_else(|| ConditionError::NotComparable {
                left: left.to_owned(),
                right: right.to_owned(),
            })
    };
    Ok(match op {
        CompareOp::Eq => equal,
        CompareOp::Ne => !equal,
        CompareOp::Lt => ordering()? == Ordering::Less,
        CompareOp::Le => ordering()? != Ordering::Greater,
        CompareOp::Gt => ordering()? == Ordering::Greater,
        CompareOp::Ge => ordering()? != Ordering::Less,
    })
}

fn version_key(raw: &str) -> Option<Vec<u64>> {
    let mut parts = raw
        .trim()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    while parts.len() > 1 && parts.last() == Some(&0) {
        parts.pop();
    }
    Some(parts)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Quoted(String),
    Word(String),
    Op(CompareOp),
    Bang,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quoted(text) => write!(f, "'{text}'"),
            Self::Word(text) => f.write_str(text),
            Self::Op(op) => f.write_str(match op {
                CompareOp::Eq => "==",
                CompareOp::Ne => "!=",
                CompareOp::Lt => "<",
                CompareOp::Le => "<=",
                CompareOp::Gt => ">",
                CompareOp::Ge => ">=",
            }),
            Self::Bang => f.write_str("!"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Comma => f.write_str(","),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConditionError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(&ch) = chars.get(pos) {
        let next = chars.get(pos + 1).copied();
        match (ch, next) {
            (c, _) if c.is_whitespace() => pos += 1,
            ('\'', _) => {
                let start = pos;
                let len = chars
                    .iter()
                    .skip(pos + 1)
                    .position(|&c| c == '\'')
                    .ok_or(ConditionError::UnterminatedString { offset: start })?;
                tokens.push(Token::Quoted(chars.iter().skip(pos + 1).take(len).collect()));
                pos += len + 2;
            }
            ('=', Some('=')) => push_op(&mut tokens, &mut pos, CompareOp::Eq, 2),
            ('!', Some('=')) => push_op(&mut tokens, &mut pos, CompareOp::Ne, 2),
            ('<', Some('=')) => push_op(&mut tokens, &mut pos, CompareOp::Le, 2),
            ('>', Some('=')) => push_op(&mut tokens, &mut pos, CompareOp::Ge, 2),
            ('<', _) => push_op(&mut tokens, &mut pos, CompareOp::Lt, 1),
            ('>', _) => push_op(&mut tokens, &mut pos, CompareOp::Gt, 1),
            ('!', _) => {
                tokens.push(Token::Bang);
                pos += 1;
            }
            ('(', _) => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            (')', _) => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            (',', _) => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            _ => {
                let (word, consumed) = read_word(&chars, pos);
                if consumed == 0 {
                    return Err(ConditionError::UnexpectedToken { token: ch.to_string() });
                }
                tokens.push(Token::Word(word));
                pos += consumed;
            }
        }
    }
    Ok(tokens)
}

fn push_op(tokens: &mut Vec<Token>, pos: &mut usize, op: CompareOp, width: usize) {
    tokens.push(Token::Op(op));
    *pos += width;
}

/// Read a bare operand, keeping `$(...)` references intact.
fn read_word(chars: &[char], start: usize) -> (String, usize) {
    let mut word = String::new();
    let mut pos = start;
    while let Some(&ch) = chars.get(pos) {
        if matches!(ch, '$' | '%' | '@') && chars.get(pos + 1) == Some(&'(') {
            let mut depth = 0usize;
            while let Some(&inner) = chars.get(pos) {
                word.push(inner);
                pos += 1;
                match inner {
                    '(' => depth += 1,
                    ')' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            continue;
        }
        if ch.is_whitespace() || matches!(ch, '\'' | '(' | ')' | '!' | '=' | '<' | '>' | ',') {
            break;
        }
        word.push(ch);
        pos += 1;
    }
    (word, pos - start)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
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

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ConditionError> {
        match self.advance() {
            Some(token) if &token == expected => Ok(()),
            Some(token) => Err(ConditionError::UnexpectedToken {
                token: token.to_string(),
            }),
            None => Err(ConditionError::UnexpectedEnd),
        }
    }

    fn parse_or(&mut self) -> Result<Condition, ConditionError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, ConditionError> {
        let mut left = self.parse_unary()?;
        while self.peek_keyword("and") {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Condition, ConditionError> {
        if self.peek() == Some(&Token::Bang) {
            self.pos += 1;
            return Ok(Condition::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Condition, ConditionError> {
        match self.advance().ok_or(ConditionError::UnexpectedEnd)? {
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Word(name) if self.peek() == Some(&Token::LParen) => self.parse_call(name),
            Token::Quoted(text) | Token::Word(text) => self.parse_comparison(text),
            other => Err(ConditionError::UnexpectedToken {
                token: other.to_string(),
            }),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Condition, ConditionError> {
        self.expect(&Token::LParen)?;
        let argument = match self.advance().ok_or(ConditionError::UnexpectedEnd)? {
            Token::Quoted(text) | Token::Word(text) => text,
            other => {
                return Err(ConditionError::UnexpectedToken {
                    token: other.to_string(),
                });
            }
        };
        self.expect(&Token::RParen)?;
        if name.eq_ignore_ascii_case("Exists") {
            Ok(Condition::Exists(argument))
        } else if name.eq_ignore_ascii_case("HasTrailingSlash") {
            Ok(Condition::HasTrailingSlash(argument))
        } else {
            Err(ConditionError::UnknownFunction { name })
        }
    }

    fn parse_comparison(&mut self, left: String) -> Result<Condition, ConditionError> {
        let Some(Token::Op(op)) = self.peek().cloned() else {
            return Ok(Condition::Value(left));
        };
        self.pos += 1;
        match self.advance().ok_or(ConditionError::UnexpectedEnd)? {
            Token::Quoted(right) | Token::Word(right) => Ok(Condition::Compare { left, op, right }),
            other => Err(ConditionError::UnexpectedToken {
                token: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn props() -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.set("Configuration", "Debug");
        bag.set("Platform", "x64");
        bag.set("VisualStudioVersion", "14.0");
        bag.set("UseFast", "true");
        bag
    }

    #[rstest]
    #[case("'$(Configuration)|$(Platform)'=='Debug|x64'", true)]
    #[case("'$(Configuration)|$(Platform)'=='release|x64'", false)]
    #[case("'$(Configuration)' == 'DEBUG'", true)]
    #[case("'$(Platform)' != 'Win32' and '$(Configuration)' == 'Debug'", true)]
    #[case("'$(Platform)' == 'Win32' or !('$(Configuration)' == 'Release')", true)]
    #[case("$(UseFast)", true)]
    #[case("'$(Missing)' == ''", true)]
    #[case("'$(VisualStudioVersion)' >= '12.0'", true)]
    #[case("'$(VisualStudioVersion)' < '14'", false)]
    #[case("HasTrailingSlash('$(Configuration)\\')", true)]
    #[case("Exists('definitely/not/here.props')", false)]
    fn evaluates_conditions(props: PropertyBag, #[case] text: &str, #[case] expected: bool) {
        let result = evaluate(text, &props, Utf8Path::new("/")).expect("evaluate");
        assert_eq!(result, expected, "{text}");
    }

    #[rstest]
    fn blank_condition_is_true(props: PropertyBag) {
        assert!(evaluate("  ", &props, Utf8Path::new("/")).expect("evaluate"));
    }

    #[rstest]
    #[case("'unterminated == 'x'", "unterminated")]
    #[case("'a' ==", "ended unexpectedly")]
    #[case("Glob('x')", "unsupported condition function")]
    #[case("'a' == 'b')", "unexpected ')'")]
    fn rejects_malformed_conditions(props: PropertyBag, #[case] text: &str, #[case] message: &str) {
        let err = evaluate(text, &props, Utf8Path::new("/")).expect_err("should fail");
        assert!(err.to_string().contains(message), "{err}");
    }

    #[rstest]
    fn lone_operand_must_be_boolean(props: PropertyBag) {
        let err = evaluate("'$(Platform)'", &props, Utf8Path::new("/")).expect_err("not bool");
        assert_eq!(err, ConditionError::NotBoolean { value: "x64".into() });
    }
}
