use crate::{expr::ExprType, value::Value};
use thiserror::Error as ThisError;

///
/// ValueMismatch
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("expected {expected}, found {found}")]
pub struct ValueMismatch {
    pub expected: &'static str,
    pub found: String,
}

impl ValueMismatch {
    fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: format!("{found:?}"),
        }
    }
}

///
/// FromValue
///
/// Conversion from a result value into a Rust field type. `EXPR_TYPE` is
/// checked against the projection when a binding is resolved; the value
/// itself (nulls included) is checked per row.
///

pub trait FromValue: Sized {
    const EXPR_TYPE: ExprType;

    fn from_value(value: Value) -> Result<Self, ValueMismatch>;
}

impl FromValue for Value {
    const EXPR_TYPE: ExprType = ExprType::Opaque;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        Ok(value)
    }
}

impl FromValue for String {
    const EXPR_TYPE: ExprType = ExprType::Text;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Text(s) | Value::Enum(s) => Ok(s),
            other => Err(ValueMismatch::new("text", &other)),
        }
    }
}

impl FromValue for i64 {
    const EXPR_TYPE: ExprType = ExprType::Numeric;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value
            .as_i64()
            .ok_or_else(|| ValueMismatch::new("integer", &value))
    }
}

impl FromValue for i32 {
    const EXPR_TYPE: ExprType = ExprType::Numeric;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value
            .as_i64()
            .and_then(|v| Self::try_from(v).ok())
            .ok_or_else(|| ValueMismatch::new("32-bit integer", &value))
    }
}

impl FromValue for f64 {
    const EXPR_TYPE: ExprType = ExprType::Numeric;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value
            .as_f64()
            .ok_or_else(|| ValueMismatch::new("number", &value))
    }
}

impl FromValue for bool {
    const EXPR_TYPE: ExprType = ExprType::Boolean;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value
            .as_bool()
            .ok_or_else(|| ValueMismatch::new("boolean", &value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPR_TYPE: ExprType = T::EXPR_TYPE;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

///
/// ConstructorArgs
///
/// Positional argument list for constructor binding, implemented for tuples
/// of `FromValue` types. Errors carry the failing position.
///

pub trait ConstructorArgs: Sized {
    fn param_types() -> Vec<ExprType>;

    fn from_values(values: Vec<Value>) -> Result<Self, (usize, ValueMismatch)>;
}

fn take<V: FromValue>(
    values: &mut impl Iterator<Item = (usize, Value)>,
) -> Result<V, (usize, ValueMismatch)> {
    let (index, value) = values.next().ok_or_else(|| {
        (
            usize::MAX,
            ValueMismatch {
                expected: "a value",
                found: "end of row".to_string(),
            },
        )
    })?;

    V::from_value(value).map_err(|err| (index, err))
}

macro_rules! impl_constructor_args {
    ( $( $name:ident ),+ ) => {
        impl<$( $name: FromValue ),+> ConstructorArgs for ( $( $name, )+ ) {
            fn param_types() -> Vec<ExprType> {
                vec![ $( <$name as FromValue>::EXPR_TYPE ),+ ]
            }

            fn from_values(values: Vec<Value>) -> Result<Self, (usize, ValueMismatch)> {
                let mut values = values.into_iter().enumerate();

                Ok(( $( take::<$name>(&mut values)?, )+ ))
            }
        }
    };
}

impl_constructor_args!(A);
impl_constructor_args!(A, B);
impl_constructor_args!(A, B, C);
impl_constructor_args!(A, B, C, D);
impl_constructor_args!(A, B, C, D, E);
impl_constructor_args!(A, B, C, D, E, F);
impl_constructor_args!(A, B, C, D, E, F, G);
impl_constructor_args!(A, B, C, D, E, F, G, H);
