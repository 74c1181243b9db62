use super::{Type, Value};
use rust_decimal::Decimal;

macro_rules! impl_num {
    (
        $(
            $variant:ident($ty:ty) {
                $is:ident
                $lit:literal
            } )*
    ) => {
        impl Type {
            $(
                pub fn $is(&self) -> bool {
                    matches!(self, Self::$variant)
                }
            )*
        }

        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl From<&$ty> for Value {
                fn from(value: &$ty) -> Self {
                    Self::$variant(*value)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = crate::Error;

                fn try_from(value: Value) -> crate::Result<Self> {
                    match value {
                        Value::$variant(value) => Ok(value),
                        _ => Err(crate::err!(
                            "value of type {} is not of type {}",
                            value.type_name(),
                            $lit
                        )),
                    }
                }
            }
        )*
    };
}

impl_num! {
    I32(i32) {
        is_i32
        "i32"
    }
    I64(i64) {
        is_i64
        "i64"
    }
    F64(f64) {
        is_f64
        "f64"
    }
    Decimal(Decimal) {
        is_decimal
        "Decimal"
    }
}
