use crate::value::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

// Each parameter is tagged so that `Int(1)` and `Text("1")` differ.
pub(super) fn digest(text: &str, params: &[Value]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());

    for param in params {
        hasher.update([0u8]);
        match param {
            Value::Bool(b) => {
                hasher.update(b"b");
                hasher.update([u8::from(*b)]);
            }
            Value::Enum(s) => {
                hasher.update(b"e");
                hasher.update(s.as_bytes());
            }
            Value::Float(f) => {
                hasher.update(b"f");
                hasher.update(f.to_bits().to_be_bytes());
            }
            Value::Int(i) => {
                hasher.update(b"i");
                hasher.update(i.to_be_bytes());
            }
            Value::Null => hasher.update(b"n"),
            Value::Text(s) => {
                hasher.update(b"t");
                hasher.update(s.as_bytes());
            }
        }
    }

    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}
