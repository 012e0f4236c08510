use std::time::Instant;

use once_cell::sync::Lazy;

use crate::callable::NativeFunction;
use crate::environment::Value;
use crate::expr::LiteralValue;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Natives bound in the global scope of every new session.
pub fn standard_library() -> Vec<NativeFunction> {
    vec![NativeFunction {
        name: "clock",
        arity: 0,
        func: native_clock,
    }]
}

fn native_clock(_args: &[Value]) -> Value {
    // make sure epoch is initialized first (lazy init)
    let epoch = *EPOCH;
    let duration = Instant::now() - epoch;
    // lossy conversion to f64 here, shouldn't be an issue for a while though
    Value::from(LiteralValue::Number(duration.as_millis() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let first = native_clock(&[]);
        let second = native_clock(&[]);
        match (first, second) {
            (Value::Literal(LiteralValue::Number(first)), Value::Literal(LiteralValue::Number(second))) => {
                assert!(second >= first);
            }
            other => panic!("clock should return numbers, got {other:?}"),
        }
    }
}
