//! Parser for the `{{ ... }}` action syntax.

use crate::error::{ForgeError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
}

/// Commands joined by `|`; each result becomes the last argument of the next.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub operands: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Dot,
    Field(Vec<String>),
    Int(i64),
    Str(String),
    Ident(String),
    Sub(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Dot,
    Field(Vec<String>),
    Ident(String),
    Int(i64),
    Str(String),
    LParen,
    RParen,
    Pipe,
}

/// Split template source into literal text and parsed actions.
pub(crate) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut rest = source;
    let mut trim_next = false;

    while let Some(start) = rest.find("{{") {
        let mut text = &rest[..start];
        if trim_next {
            text = text.trim_start();
        }

        let after_open = &rest[start + 2..];
        let end = find_action_end(after_open)
            .ok_or_else(|| ForgeError::parse(format!("unclosed action in template '{}'", source)))?;
        let mut body = &after_open[..end];

        if body.starts_with('-') && body[1..].starts_with(char::is_whitespace) {
            body = &body[1..];
            text = text.trim_end();
        }
        trim_next = body.ends_with('-') && body[..body.len() - 1].ends_with(char::is_whitespace);
        if trim_next {
            body = &body[..body.len() - 1];
        }

        if !text.is_empty() {
            nodes.push(Node::Text(text.to_string()));
        }
        nodes.push(Node::Action(parse_action(body)?));
        rest = &after_open[end + 2..];
    }

    let tail = if trim_next { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        nodes.push(Node::Text(tail.to_string()));
    }
    Ok(nodes)
}

/// Byte offset of the closing `}}`, skipping over string literals.
fn find_action_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut in_str = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_str => i += 1,
            b'"' => in_str = !in_str,
            b'}' if !in_str && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_action(body: &str) -> Result<Pipeline> {
    let tokens = lex(body)?;
    let mut parser = Parser { tokens, pos: 0 };
    let pipeline = parser.pipeline()?;
    if parser.pos != parser.tokens.len() {
        return Err(ForgeError::parse(format!(
            "unexpected {:?} in action '{}'",
            parser.tokens[parser.pos],
            body.trim()
        )));
    }
    Ok(pipeline)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn lex(body: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '.' => {
                let mut path = Vec::new();
                while i < chars.len()
                    && chars[i] == '.'
                    && chars.get(i + 1).is_some_and(|c| is_ident_start(*c))
                {
                    let (name, end) = read_ident(&chars, i + 1);
                    path.push(name);
                    i = end;
                }
                if path.is_empty() {
                    tokens.push(Token::Dot);
                    i += 1;
                } else {
                    tokens.push(Token::Field(path));
                }
            }
            '"' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(ForgeError::parse(format!(
                                "unterminated string in action '{}'",
                                body.trim()
                            )))
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = match chars.get(i + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some('"') => '"',
                                Some('\\') => '\\',
                                other => {
                                    return Err(ForgeError::parse(format!(
                                        "invalid escape {:?} in string literal",
                                        other
                                    )))
                                }
                            };
                            value.push(escaped);
                            i += 2;
                        }
                        Some(other) => {
                            value.push(*other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            '-' | '0'..='9' => {
                let start = i;
                if c == '-' {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let n = literal.parse::<i64>().map_err(|e| {
                    ForgeError::parse(format!("invalid number '{}': {}", literal, e))
                })?;
                tokens.push(Token::Int(n));
            }
            c if is_ident_start(c) => {
                let (name, end) = read_ident(&chars, i);
                tokens.push(Token::Ident(name));
                i = end;
            }
            other => {
                return Err(ForgeError::parse(format!(
                    "unexpected character '{}' in action '{}'",
                    other,
                    body.trim()
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn pipeline(&mut self) -> Result<Pipeline> {
        let mut commands = vec![self.command()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            commands.push(self.command()?);
        }
        Ok(Pipeline { commands })
    }

    fn command(&mut self) -> Result<Command> {
        let mut operands = Vec::new();
        while !matches!(self.peek(), None | Some(Token::Pipe) | Some(Token::RParen)) {
            operands.push(self.operand()?);
        }
        if operands.is_empty() {
            return Err(ForgeError::parse("missing value for command"));
        }
        Ok(Command { operands })
    }

    fn operand(&mut self) -> Result<Operand> {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let operand = match token {
            Token::Dot => Operand::Dot,
            Token::Field(path) => Operand::Field(path),
            Token::Ident(name) => Operand::Ident(name),
            Token::Int(n) => Operand::Int(n),
            Token::Str(s) => Operand::Str(s),
            Token::LParen => {
                let inner = self.pipeline()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(ForgeError::parse("unclosed left paren"));
                }
                self.pos += 1;
                Operand::Sub(inner)
            }
            Token::RParen | Token::Pipe => {
                return Err(ForgeError::parse(format!("unexpected {:?}", token)))
            }
        };
        Ok(operand)
    }
}
