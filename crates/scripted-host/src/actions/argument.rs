//! Declared arguments and their coercion
//!
//! Actions and argument-taking variables describe what they expect with a
//! slice of [`Argument`]s. Raw text is coerced against that list right before
//! use; a coercion failure becomes a response and the action never runs.

use std::fmt::Write as _;

use crate::error::{ArgumentError, ExprError};
use crate::expr;
use crate::variables::{PlayerSet, Resolver};

/// One value of a closed option set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionValue {
    pub value: &'static str,
    pub description: &'static str,
}

impl OptionValue {
    pub const fn new(value: &'static str, description: &'static str) -> Self {
        Self { value, description }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    Float,
    Bool,
    /// A single word, variables substituted
    Text,
    /// A single word taken verbatim, such as a variable name to assign
    Name,
    Players,
    /// Everything left on the line, variables substituted
    Message,
    /// Everything left on the line, evaluated as arithmetic
    Math,
    /// Everything left on the line, evaluated as a condition
    Condition,
    /// One of a closed set of literals
    Options(&'static [OptionValue]),
}

impl ArgumentType {
    pub fn consumes_rest(&self) -> bool {
        matches!(
            self,
            ArgumentType::Message | ArgumentType::Math | ArgumentType::Condition
        )
    }

    fn label(&self) -> String {
        match self {
            ArgumentType::Float => "number".to_string(),
            ArgumentType::Bool => "condition".to_string(),
            ArgumentType::Text => "text".to_string(),
            ArgumentType::Name => "name".to_string(),
            ArgumentType::Players => "players".to_string(),
            ArgumentType::Message => "message".to_string(),
            ArgumentType::Math => "math expression".to_string(),
            ArgumentType::Condition => "condition".to_string(),
            ArgumentType::Options(_) => "option".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument {
    pub name: &'static str,
    pub kind: ArgumentType,
    pub description: &'static str,
    pub required: bool,
}

impl Argument {
    pub const fn required(name: &'static str, kind: ArgumentType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ArgumentType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
        }
    }

    pub fn usage(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }

    pub fn help(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ({}{}): {}",
            self.name,
            self.kind.label(),
            if self.required { "" } else { ", optional" },
            self.description
        );
        if let ArgumentType::Options(options) = self.kind {
            for option in options {
                let _ = writeln!(out, "  {} - {}", option.value, option.description);
            }
        }
        out
    }
}

/// `NAME <a> <b> [c]`
pub fn usage(name: &str, expected: &[Argument]) -> String {
    std::iter::once(name.to_string())
        .chain(expected.iter().map(Argument::usage))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A coerced argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Float(f64),
    Bool(bool),
    Text(String),
    Players(PlayerSet),
    Option(&'static str),
}

/// Coerced arguments for one invocation, in declaration order. Optional
/// arguments that were not supplied are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<ArgValue>,
}

impl Arguments {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Coerce `raw` against `expected`. `owner` names the action or variable
    /// in usage messages.
    pub fn coerce(
        owner: &str,
        expected: &[Argument],
        raw: &[String],
        resolver: &Resolver<'_>,
    ) -> Result<Self, ArgumentError> {
        let required = expected.iter().filter(|a| a.required).count();
        if raw.len() < required {
            return Err(ArgumentError::Missing {
                usage: usage(owner, expected),
                got: raw.len(),
            });
        }

        let mut values = Vec::with_capacity(expected.len());
        let mut index = 0;
        for argument in expected {
            if index >= raw.len() {
                break;
            }
            if argument.kind.consumes_rest() {
                let joined = raw[index..].join(" ");
                values.push(coerce_one(argument, &joined, resolver)?);
                index = raw.len();
                break;
            }
            values.push(coerce_one(argument, &raw[index], resolver)?);
            index += 1;
        }

        if index < raw.len() {
            return Err(ArgumentError::TooMany {
                usage: usage(owner, expected),
                got: raw.len(),
            });
        }

        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }

    pub fn players(&self, index: usize) -> Result<&PlayerSet, ArgumentError> {
        match self.get(index) {
            Some(ArgValue::Players(players)) => Ok(players),
            _ => Err(ArgumentError::NotSupplied { index }),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64, ArgumentError> {
        match self.get(index) {
            Some(ArgValue::Float(value)) => Ok(*value),
            _ => Err(ArgumentError::NotSupplied { index }),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool, ArgumentError> {
        match self.get(index) {
            Some(ArgValue::Bool(value)) => Ok(*value),
            _ => Err(ArgumentError::NotSupplied { index }),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, ArgumentError> {
        match self.get(index) {
            Some(ArgValue::Text(text)) => Ok(text),
            _ => Err(ArgumentError::NotSupplied { index }),
        }
    }

    /// Selected option, upper-cased as declared
    pub fn option(&self, index: usize) -> Result<&'static str, ArgumentError> {
        match self.get(index) {
            Some(ArgValue::Option(value)) => Ok(value),
            _ => Err(ArgumentError::NotSupplied { index }),
        }
    }
}

fn coerce_one(
    argument: &Argument,
    raw: &str,
    resolver: &Resolver<'_>,
) -> Result<ArgValue, ArgumentError> {
    let not_a_number = |source: ExprError| ArgumentError::NotANumberOrCondition {
        argument: argument.name,
        source,
    };

    match argument.kind {
        ArgumentType::Players => resolver.players(raw).map(ArgValue::Players),
        ArgumentType::Text | ArgumentType::Message => Ok(ArgValue::Text(resolver.replace(raw)?)),
        ArgumentType::Name => Ok(ArgValue::Text(raw.to_string())),
        ArgumentType::Float | ArgumentType::Math => {
            let text = resolver.replace(raw)?;
            expr::try_math(&text).map(ArgValue::Float).map_err(not_a_number)
        }
        ArgumentType::Bool | ArgumentType::Condition => {
            let text = resolver.replace(raw)?;
            expr::try_condition(&text).map(ArgValue::Bool).map_err(not_a_number)
        }
        ArgumentType::Options(options) => {
            let text = resolver.replace(raw)?;
            options
                .iter()
                .find(|option| option.value.eq_ignore_ascii_case(&text))
                .map(|option| ArgValue::Option(option.value))
                .ok_or_else(|| ArgumentError::InvalidOption {
                    argument: argument.name,
                    value: text,
                    expected: options
                        .iter()
                        .map(|o| o.value)
                        .collect::<Vec<_>>()
                        .join(", "),
                })
        }
    }
}
