//! Template rendering for version codes, tag-file lines and branch names.
//!
//! Templates use a small Go-template-like dialect: literal text with
//! `{{ ... }}` actions. An action is a pipeline of commands, a command is a
//! function call (`add . 1`) or a single operand (`.Major`).
//!
//! ```rust
//! # use release_forge::template::{GoTemplate, Render, Value};
//! let tpl = GoTemplate::compile("{{add . 1}}").unwrap();
//! assert_eq!(tpl.render(&Value::Int(41)).unwrap(), "42");
//! ```
//!
//! File mutators only depend on the [Render] trait, so another dialect can be
//! plugged in without touching their I/O.

mod parser;
mod value;

pub use value::Value;

use crate::error::{ForgeError, Result};
use parser::{Command, Node, Operand, Pipeline};

/// Turns a data value into text.
pub trait Render {
    fn render(&self, data: &Value) -> Result<String>;
}

/// A compiled `{{ }}` template.
#[derive(Debug, Clone, PartialEq)]
pub struct GoTemplate {
    source: String,
    nodes: Vec<Node>,
}

impl GoTemplate {
    /// Parse a template, failing with a parse error on malformed actions.
    pub fn compile(source: &str) -> Result<Self> {
        let nodes = parser::parse(source)?;
        Ok(GoTemplate {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Render for GoTemplate {
    fn render(&self, data: &Value) -> Result<String> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = eval_pipeline(pipeline, data).map_err(|e| match e {
                        ForgeError::Parse(msg) => {
                            ForgeError::parse(format!("template '{}': {}", self.source, msg))
                        }
                        other => other,
                    })?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}

fn eval_pipeline(pipeline: &Pipeline, dot: &Value) -> Result<Value> {
    let mut piped = None;
    for command in &pipeline.commands {
        piped = Some(eval_command(command, dot, piped.take())?);
    }
    piped.ok_or_else(|| ForgeError::parse("empty pipeline"))
}

fn eval_command(command: &Command, dot: &Value, piped: Option<Value>) -> Result<Value> {
    match command.operands.as_slice() {
        [Operand::Ident(name), rest @ ..] => {
            let mut args = rest
                .iter()
                .map(|op| eval_operand(op, dot))
                .collect::<Result<Vec<_>>>()?;
            args.extend(piped);
            call(name, &args)
        }
        [single] => {
            if piped.is_some() {
                return Err(ForgeError::parse("can't pipe into a non-function"));
            }
            eval_operand(single, dot)
        }
        _ => Err(ForgeError::parse("can't give argument to non-function")),
    }
}

fn eval_operand(operand: &Operand, dot: &Value) -> Result<Value> {
    match operand {
        Operand::Dot => Ok(dot.clone()),
        Operand::Field(path) => path
            .iter()
            .try_fold(dot.clone(), |value, name| value.field(name)),
        Operand::Int(n) => Ok(Value::Int(*n)),
        Operand::Str(s) => Ok(Value::Str(s.clone())),
        Operand::Ident(name) => call(name, &[]),
        Operand::Sub(pipeline) => eval_pipeline(pipeline, dot),
    }
}

fn arity<'a>(name: &str, args: &'a [Value], expected: usize) -> Result<&'a [Value]> {
    if args.len() != expected {
        return Err(ForgeError::parse(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(args)
}

fn overflow(name: &str) -> ForgeError {
    ForgeError::parse(format!("integer overflow in {}", name))
}

fn call(name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "add" => {
            let args = arity(name, args, 2)?;
            let (a, b) = (args[0].as_int()?, args[1].as_int()?);
            a.checked_add(b).map(Value::Int).ok_or_else(|| overflow(name))
        }
        "sub" => {
            let args = arity(name, args, 2)?;
            let (a, b) = (args[0].as_int()?, args[1].as_int()?);
            a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow(name))
        }
        "inc" => {
            let args = arity(name, args, 1)?;
            args[0]
                .as_int()?
                .checked_add(1)
                .map(Value::Int)
                .ok_or_else(|| overflow(name))
        }
        "Week" => {
            let args = arity(name, args, 1)?;
            args[0].as_time()?;
            args[0].field("Week")
        }
        "pad" => {
            let args = arity(name, args, 2)?;
            let width = usize::try_from(args[0].as_int()?)
                .map_err(|_| ForgeError::parse("pad width must not be negative"))?;
            let n = args[1].as_int()?;
            Ok(Value::Str(format!("{:0width$}", n, width = width)))
        }
        "lower" => {
            let args = arity(name, args, 1)?;
            Ok(Value::Str(args[0].to_string().to_lowercase()))
        }
        "upper" => {
            let args = arity(name, args, 1)?;
            Ok(Value::Str(args[0].to_string().to_uppercase()))
        }
        _ => Err(ForgeError::parse(format!(
            "function \"{}\" not defined",
            name
        ))),
    }
}
