// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `math/sum`: the `+` operator

use super::{arg, extend_core};
use crate::error::Result;
use crate::module_system::{ModuleHandle, Require};
use crate::value::{Object, Value};

/// Attach `sum` to the library object
pub fn factory(req: &mut Require<'_>, module: &ModuleHandle, _exports: &Object) -> Result<()> {
    extend_core(req, module, "sum", 2, sum)
}

/// `sum(a, b)`: numeric addition, concatenation when an operand is a string
pub fn sum(args: &[Value]) -> Result<Value> {
    Ok(arg(args, 0).add(&arg(args, 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers() {
        let result = sum(&[Value::from(2.0), Value::from(3.0)]).unwrap();
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn test_string_operand_concatenates() {
        let result = sum(&[Value::from("2"), Value::from(3.0)]).unwrap();
        assert_eq!(result, Value::String("23".to_string()));

        let result = sum(&[Value::from(true), Value::from(1.0)]).unwrap();
        assert_eq!(result, Value::Number(2.0));
    }
}
