//! Named query parameters.
//!
//! Query fragments refer to parameters symbolically (`WHERE ticker = @ticker`). Before execution
//! the fragment is rewritten into the dialect's positional form and the values are laid out in the
//! order the markers were emitted:
//!
//! ```ignore
//! use rowmap::{Dialect, named};
//!
//! let mut ph = Dialect::Postgres.placeholders();
//! let q = named::compile("WHERE a = @x OR b = @x", '@', &mut ph);
//! assert_eq!(q.sql, "WHERE a = $1 OR b = $2");
//! assert_eq!(q.params, ["x", "x"]);
//! ```

use crate::dialect::Placeholders;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Default character introducing a symbolic parameter.
pub const DEFAULT_PREFIX: char = '@';

/// A query rewritten to positional placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// SQL with one positional marker per parameter occurrence.
    pub sql: String,
    /// Parameter names in marker order. A name used twice appears twice.
    pub params: Vec<String>,
}

/// A value bound to a parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArg {
    pub name: String,
    pub value: Value,
}

/// Bind `value` to the symbolic parameter `name` (without its prefix).
pub fn named(name: impl Into<String>, value: impl Into<Value>) -> NamedArg {
    NamedArg {
        name: name.into(),
        value: value.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Argument,
}

/// Characters that may appear in a parameter name.
///
/// Besides `_` and `-`, any character Unicode marks as alphabetic or numeric is accepted. That
/// is wider than letters and decimal digits: combining marks, letter numbers (`Ⅻ`) and other
/// numerics such as `²` or `½` continue a name too.
pub fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || c == '_' || c == '-'
}

/// Rewrite every `<prefix><name>` in `input` into the next positional marker.
///
/// A name ends at the first character that is not a letter, digit, `_` or `-`; that character is
/// copied through unchanged. A prefix with no name after it yields an empty parameter name.
pub fn compile(input: &str, prefix: char, placeholders: &mut Placeholders) -> CompiledQuery {
    let mut sql = String::with_capacity(input.len() + 8);
    let mut params = Vec::new();
    let mut name = String::new();
    let mut state = State::Normal;

    for c in input.chars() {
        match state {
            State::Normal => {
                if c == prefix {
                    state = State::Argument;
                } else {
                    sql.push(c);
                }
            }
            State::Argument => {
                if is_name_char(c) {
                    name.push(c);
                } else {
                    placeholders.push_next(&mut sql);
                    params.push(std::mem::take(&mut name));
                    sql.push(c);
                    state = State::Normal;
                }
            }
        }
    }

    if state == State::Argument {
        placeholders.push_next(&mut sql);
        params.push(name);
    }

    CompiledQuery { sql, params }
}

/// Lay out argument values in parameter order.
///
/// When a name is supplied more than once, the last value wins.
pub fn bind(params: &[String], args: &[NamedArg]) -> OrmResult<Vec<Value>> {
    params
        .iter()
        .map(|p| {
            args.iter()
                .rev()
                .find(|a| &a.name == p)
                .map(|a| a.value.clone())
                .ok_or_else(|| OrmError::UnknownParameter(p.clone()))
        })
        .collect()
}
