// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Call expressions typed at the prompt or passed with `--eval`.
//!
//! Two shapes are accepted, with an optional `<global>.` prefix:
//!
//! - `div(10, 2)`: comma-separated arguments in parentheses
//! - `join a "b c" 3`: whitespace-separated arguments
//!
//! Arguments are numbers, quoted strings, `true`, `false`, `null`,
//! `undefined`, `NaN`, `Infinity`, or bare words (taken as strings).

use anyhow::{Result, bail};
use rpglib_bundle::{BundleError, Value};

/// A parsed prompt expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The package value itself
    Package,
    /// Read an exported property
    Property(String),
    /// Call an exported function
    Call {
        /// Exported name
        name: String,
        /// Arguments in order
        args: Vec<Value>,
    },
}

/// Parse one expression
pub fn parse(input: &str, global_name: &str) -> Result<Expr> {
    let input = input.trim().trim_end_matches(';').trim_end();
    if input == global_name {
        return Ok(Expr::Package);
    }

    let input = input
        .strip_prefix(global_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(input);

    let name_len = input
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(input.len());
    if name_len == 0 {
        bail!("expected an exported name, found '{}'", input);
    }
    let (name, rest) = input.split_at(name_len);
    let rest = rest.trim_start();

    if rest.is_empty() {
        return Ok(Expr::Property(name.to_string()));
    }

    let tokens = if let Some(inner) = rest.strip_prefix('(') {
        let Some(inner) = inner.strip_suffix(')') else {
            bail!("missing ')' after arguments to {}", name);
        };
        split_args(inner, |c| c == ',', true)?
    } else {
        split_args(rest, char::is_whitespace, false)?
    };

    let args = tokens
        .iter()
        .map(|token| literal(token))
        .collect::<Result<Vec<_>>>()?;

    Ok(Expr::Call {
        name: name.to_string(),
        args,
    })
}

/// Parse and evaluate against the package value
pub fn evaluate(exports: &Value, global_name: &str, input: &str) -> Result<Value> {
    match parse(input, global_name)? {
        Expr::Package => Ok(exports.clone()),
        Expr::Property(name) => Ok(exports.get(&name)),
        Expr::Call { name, args } => {
            let target = exports.get(&name);
            if !target.is_function() {
                let message = format!("{}.{} is not a function", global_name, name);
                return Err(BundleError::type_error(message).into());
            }
            Ok(target.call(&args)?)
        }
    }
}

/// Split on `is_separator` outside quotes. With `strict`, empty items are
/// errors (`f(1,,2)`); otherwise runs of separators collapse.
fn split_args(input: &str, is_separator: impl Fn(char) -> bool, strict: bool) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match quote {
            Some(_) if c == '\\' => {
                current.push(c);
                escaped = true;
            }
            Some(q) if c == q => {
                current.push(c);
                quote = None;
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                current.push(c);
                quote = Some(c);
            }
            None if is_separator(c) => {
                let token = current.trim();
                if !token.is_empty() {
                    tokens.push(token.to_string());
                } else if strict {
                    bail!("empty argument");
                }
                current.clear();
            }
            None => current.push(c),
        }
    }

    if quote.is_some() {
        bail!("unterminated string");
    }

    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    } else if strict && !tokens.is_empty() {
        bail!("empty argument");
    }
    Ok(tokens)
}

fn literal(token: &str) -> Result<Value> {
    for quote in ['"', '\''] {
        if let Some(body) = token.strip_prefix(quote) {
            let Some(body) = body.strip_suffix(quote) else {
                bail!("malformed string literal {}", token);
            };
            return Ok(Value::String(unescape(body)));
        }
    }

    Ok(match token {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        "null" => Value::Null,
        "undefined" => Value::Undefined,
        "NaN" => Value::Number(f64::NAN),
        "Infinity" | "+Infinity" => Value::Number(f64::INFINITY),
        "-Infinity" => Value::Number(f64::NEG_INFINITY),
        // Rust also parses "inf" and "nan"; only plain numerals count
        t if t.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
            && t.chars().all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) =>
        {
            match t.parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => bail!("invalid number {}", t),
            }
        }
        word => Value::String(word.to_string()),
    })
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
