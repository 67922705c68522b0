// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `math/div`: floating division

use super::{arg, extend_core};
use crate::error::Result;
use crate::module_system::{ModuleHandle, Require};
use crate::value::{Object, Value};

/// Attach `div` to the library object
pub fn factory(req: &mut Require<'_>, module: &ModuleHandle, _exports: &Object) -> Result<()> {
    extend_core(req, module, "div", 2, div)
}

/// `div(a, b)`: IEEE division, so `div(1, 0)` is `Infinity`
pub fn div(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(arg(args, 0).to_number() / arg(args, 1).to_number()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(a: impl Into<Value>, b: impl Into<Value>) -> f64 {
        div(&[a.into(), b.into()]).unwrap().to_number()
    }

    #[test]
    fn test_div() {
        assert_eq!(call(10.0, 2.0), 5.0);
        assert_eq!(call(1.0, 4.0), 0.25);
        assert_eq!(call("9", 3.0), 3.0);
        assert_eq!(call("0x10", 2.0), 8.0);
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(call(1.0, 0.0), f64::INFINITY);
        assert_eq!(call(-1.0, 0.0), f64::NEG_INFINITY);
        assert!(call(0.0, 0.0).is_nan());
    }

    #[test]
    fn test_missing_operand_is_nan() {
        assert!(div(&[Value::from(1.0)]).unwrap().to_number().is_nan());
    }
}
