//! # Param/Query Decode Module
//!
//! Routes may declare per-field decoders that turn raw URL strings into
//! structured values. Decoding is strictly best-effort: a failing decoder
//! never fails the render. The field degrades to its raw string value and
//! the failure is logged at debug level.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Decode-and-validate contract for a single named field.
pub trait Decoder: Send + Sync {
    /// Decode the raw string extracted from the URL.
    fn decode(&self, name: &str, raw: &str) -> anyhow::Result<Value>;
}

/// Per-field decoder table declared on a route.
pub type DecoderMap = HashMap<String, Arc<dyn Decoder>>;

/// Adapter turning a closure into a [`Decoder`].
pub struct FnDecoder<F>(F);

impl<F> FnDecoder<F>
where
    F: Fn(&str) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Decoder for FnDecoder<F>
where
    F: Fn(&str) -> anyhow::Result<Value> + Send + Sync,
{
    fn decode(&self, _name: &str, raw: &str) -> anyhow::Result<Value> {
        (self.0)(raw)
    }
}

/// Decode every raw field through its declared decoder.
///
/// Fields without a decoder, and fields whose decoder fails, come through
/// as `Value::String(raw)`.
#[must_use]
pub fn decode_fields(
    decoders: &DecoderMap,
    raw: &HashMap<String, String>,
) -> HashMap<String, Value> {
    let mut decoded = HashMap::with_capacity(raw.len());
    for (name, value) in raw {
        let entry = match decoders.get(name) {
            Some(decoder) => match decoder.decode(name, value) {
                Ok(v) => v,
                Err(e) => {
                    debug!(
                        field = %name,
                        raw = %value,
                        error = %e,
                        "Decode failed, falling back to raw string"
                    );
                    Value::String(value.clone())
                }
            },
            None => Value::String(value.clone()),
        };
        decoded.insert(name.clone(), entry);
    }
    decoded
}
