// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `string/join`: variadic concatenation

use super::extend_core;
use crate::error::Result;
use crate::module_system::{ModuleHandle, Require};
use crate::value::{Object, Value};

/// Attach `join` to the library object
pub fn factory(req: &mut Require<'_>, module: &ModuleHandle, _exports: &Object) -> Result<()> {
    extend_core(req, module, "join", -1, join)
}

/// `join(...args)`: string forms of every argument, in order, no separator
pub fn join(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args.iter().map(Value::to_js_string).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        let args = [Value::from("a"), Value::from("b"), Value::from("c")];
        assert_eq!(join(&args).unwrap(), Value::String("abc".to_string()));
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join(&[]).unwrap(), Value::String(String::new()));
    }

    #[test]
    fn test_join_number_forms() {
        let args = [
            Value::from(1e21),
            Value::from(","),
            Value::from(1e-7),
            Value::from(","),
            Value::from(0.5),
        ];
        assert_eq!(join(&args).unwrap(), Value::String("1e+21,1e-7,0.5".to_string()));
    }

    #[test]
    fn test_join_mixed() {
        let args = [Value::from(1.0), Value::Null, Value::from(true), Value::Undefined];
        assert_eq!(join(&args).unwrap(), Value::String("1nulltrueundefined".to_string()));
    }
}
