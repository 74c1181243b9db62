use super::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

impl Value {
    /// Returns a stable 32-bit hash of the value.
    ///
    /// Integers hash to themselves so that a single integer primary key hashes to its
    /// own value. Keys sum these hashes, so the result must not depend on the process.
    pub fn hash_code(&self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Bool(true) => 1231,
            Self::Bool(false) => 1237,
            Self::Char(v) => *v as i32,
            Self::I32(v) => *v,
            Self::I64(v) => fold(*v as u64),
            Self::F64(v) => {
                let bits = if v.is_nan() {
                    0x7ff8_0000_0000_0000
                } else {
                    v.to_bits()
                };
                fold(bits)
            }
            Self::String(v) => v
                .encode_utf16()
                .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c))),
            Self::Decimal(v) => digest(v),
            Self::Date(v) => digest(v),
            Self::Time(v) => digest(v),
            Self::Timestamp(v) => digest(v),
            Self::Blob(v) => digest(v),
            Self::Entity(entity) => entity.hash_code(),
        }
    }
}

fn fold(bits: u64) -> i32 {
    (bits ^ (bits >> 32)) as i32
}

fn digest(value: &impl Hash) -> i32 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    fold(hasher.finish())
}
