// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Values exchanged between packaged modules and their host.
//!
//! Objects are shared handles: cloning an [`Object`] clones the handle, not
//! the properties, so two clones observe each other's writes and compare
//! equal by identity. This is what lets a module hand its exports to a
//! dependent before its factory has finished.

use crate::error::{BundleError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A native (Rust) function body.
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// A function exported by a module.
#[derive(Clone)]
pub struct NativeFunction {
    /// The function name
    pub name: String,
    /// The arity (-1 for variadic)
    pub arity: i32,
    func: NativeFn,
}

impl NativeFunction {
    /// Creates a new native function.
    pub fn new(name: impl Into<String>, arity: i32, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            arity,
            func,
        }
    }

    /// Invokes the function with `args`.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }

    /// Returns true for functions accepting any number of arguments.
    pub fn is_variadic(&self) -> bool {
        self.arity < 0
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// A shared, mutable property bag with reference identity.
#[derive(Clone, Default)]
pub struct Object {
    props: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Object {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.props.read().get(key).cloned()
    }

    /// Writes a property, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.props.write().insert(key.into(), value.into())
    }

    /// Checks for an own property.
    pub fn has(&self, key: &str) -> bool {
        self.props.read().contains_key(key)
    }

    /// Removes a property.
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.props.write().remove(key)
    }

    /// Property names in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.props.read().keys().cloned().collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.props.read().len()
    }

    /// Whether the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.props.read().is_empty()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.props, &other.props)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Object {
    // Keys only: objects may reference themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("keys", &self.keys()).finish()
    }
}

/// A dynamic value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Shared object handle
    Object(Object),
    /// Native function (Arc for cheap sharing)
    Function(Arc<NativeFunction>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of f64 equality
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Wraps a native function.
    pub fn function(name: impl Into<String>, arity: i32, func: NativeFn) -> Self {
        Value::Function(Arc::new(NativeFunction::new(name, arity, func)))
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns the object handle, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the number, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Property read. Non-objects have no properties.
    pub fn get(&self, key: &str) -> Value {
        self.as_object()
            .and_then(|obj| obj.get(key))
            .unwrap_or(Value::Undefined)
    }

    /// Calls the value as a function.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(func) => func.call(args),
            other => Err(BundleError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    /// Numeric conversion (ToNumber).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// String conversion (ToString), as used by concatenation.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(func) => format!("function {}() {{ [native code] }}", func.name),
        }
    }

    /// The `+` operator: concatenates when either side is not primitive-numeric.
    pub fn add(&self, other: &Value) -> Value {
        let concatenates = |v: &Value| {
            matches!(v, Value::String(_) | Value::Object(_) | Value::Function(_))
        };
        if concatenates(self) || concatenates(other) {
            Value::String(format!("{}{}", self.to_js_string(), other.to_js_string()))
        } else {
            Value::Number(self.to_number() + other.to_number())
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if let Some(n) = prefixed_integer(t) {
        return n;
    }
    match t {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf" and "nan" spellings that are not numbers here
        t if t
            .chars()
            .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') =>
        {
            f64::NAN
        }
        t => t.parse().unwrap_or(f64::NAN),
    }
}

/// `0x`, `0o` and `0b` literals; unsigned only, like the `Number()` conversion
fn prefixed_integer(t: &str) -> Option<f64> {
    let radix = match t.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &t[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits
        .chars()
        .try_fold(0.0, |acc: f64, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN);
    Some(value)
}

/// Formats a number the way a JavaScript host prints it.
///
/// Shortest round-trip digits; exponent notation from `1e21` upward and
/// below `1e-6`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    if n.is_infinite() {
        return format!("{}Infinity", sign);
    }

    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let len = digits.len() as i32;
    // Position of the decimal point relative to the first digit
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if len <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(-point as usize), digits)
    } else {
        let exp = point - 1;
        let exp_sign = if exp < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, exp_sign, exp.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, exp_sign, exp.abs())
        }
    };
    format!("{}{}", sign, body)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s),
            Value::Function(func) => write!(f, "[Function: {}]", func.name),
            Value::Object(obj) => {
                let keys = obj.keys();
                if keys.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match obj.get(key) {
                        // One level deep only
                        Some(Value::Object(_)) => write!(f, "{}: [Object]", key)?,
                        Some(value) => write!(f, "{}: {}", key, value)?,
                        None => write!(f, "{}: undefined", key)?,
                    }
                }
                write!(f, " }}")
            }
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_identity() {
        let a = Object::new();
        let b = a.clone();
        b.set("x", 1.0);

        assert_eq!(a.get("x"), Some(Value::Number(1.0)));
        assert!(a.ptr_eq(&b));
        assert_ne!(Value::Object(a), Value::Object(Object::new()));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::from("  12 ").to_number(), 12.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::from("-Infinity").to_number(), f64::NEG_INFINITY);
        assert!(Value::from("inf").to_number().is_nan());
        assert!(Value::from("abc").to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::from("1e3").to_number(), 1000.0);
        assert_eq!(Value::from("0x10").to_number(), 16.0);
        assert_eq!(Value::from(" 0o17 ").to_number(), 15.0);
        assert_eq!(Value::from("0b101").to_number(), 5.0);
        assert!(Value::from("0x").to_number().is_nan());
        assert!(Value::from("0xZZ").to_number().is_nan());
        assert!(Value::from("-0x10").to_number().is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(123.456), "123.456");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e300), "1.5e+300");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-2.5e-8), "-2.5e-8");
    }

    #[test]
    fn test_accessors() {
        assert!(Value::Null.is_nullish());
        assert!(Value::Undefined.is_nullish());
        assert!(!Value::from(0.0).is_nullish());
        assert_eq!(Value::from(4.0).as_number(), Some(4.0));
        assert_eq!(Value::from("4").as_number(), None);

        let obj = Object::new();
        obj.set("a", 1.0);
        assert_eq!(obj.delete("a"), Some(Value::Number(1.0)));
        assert_eq!(obj.delete("a"), None);
        assert!(obj.is_empty());
    }

    #[test]
    fn test_native_function_arity() {
        let join = NativeFunction::new("join", -1, |_| Ok(Value::Undefined));
        let div = NativeFunction::new("div", 2, |_| Ok(Value::Undefined));
        assert!(join.is_variadic());
        assert!(!div.is_variadic());
    }

    #[test]
    fn test_add() {
        assert_eq!(Value::from(2.0).add(&Value::from(3.0)), Value::Number(5.0));
        assert_eq!(
            Value::from("a").add(&Value::from(1.0)),
            Value::String("a1".to_string())
        );
        assert_eq!(Value::Boolean(true).add(&Value::Null), Value::Number(1.0));
    }

    #[test]
    fn test_call_non_function() {
        let err = Value::from(1.0).call(&[]).unwrap_err();
        assert!(matches!(err, BundleError::TypeError(_)));
    }

    #[test]
    fn test_display() {
        let obj = Object::new();
        obj.set("n", 5.0);
        obj.set("f", Value::function("f", 0, |_| Ok(Value::Undefined)));
        assert_eq!(Value::Object(obj).to_string(), "{ f: [Function: f], n: 5 }");
        assert_eq!(Value::from("abc").to_string(), "'abc'");
    }
}
