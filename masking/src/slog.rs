//! Adapters for emitting masked payloads through `slog`.
//!
//! This module connects [`MaskingEngine`] with `slog` by providing a
//! `slog::Value` that serializes the *masked* form of a payload as structured
//! JSON via `slog`'s nested-value support.
//!
//! It is responsible for:
//! - Ensuring the logged representation is produced after masking, never from
//!   the original value.
//! - Avoiding fallible logging APIs: masking and serialization failures are
//!   represented as placeholder strings rather than propagated as errors.
//!
//! It does not configure `slog` and does not check whether the activation
//! context is active: converting a value always masks it.

use serde::Serialize;
use serde_json::Value as JsonValue;
use slog::{Key, Record, Result as SlogResult, Serializer, Value as SlogValue};

use crate::{Maskable, MaskingEngine};

/// Placeholder logged when the payload could not be masked.
pub const MASK_FAILED: &str = "Failed to mask value";
/// Placeholder logged when the masked payload could not be serialized.
pub const SERIALIZE_FAILED: &str = "Failed to serialize masked value";

/// A `slog::Value` that emits a masked payload as structured JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedJson {
    value: JsonValue,
}

impl MaskedJson {
    fn new(value: JsonValue) -> Self {
        Self { value }
    }

    /// The JSON that will be logged.
    pub fn as_json(&self) -> &JsonValue {
        &self.value
    }
}

impl SlogValue for MaskedJson {
    fn serialize(
        &self,
        record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        let nested = slog::Serde(self.value.clone());
        SlogValue::serialize(&nested, record, key, serializer)
    }
}

/// Converts values into a `slog::Value` that logs their masked form as JSON.
///
/// ## Example
/// ```ignore
/// use masking::slog::IntoMaskedJson;
///
/// info!(logger, "user loaded"; "user" => user.into_masked_json());
/// ```
pub trait IntoMaskedJson: Maskable + Serialize + Sized {
    /// Masks `self` with the global engine.
    fn into_masked_json(self) -> MaskedJson {
        self.into_masked_json_with(MaskingEngine::global())
    }

    /// Masks `self` with `engine`.
    fn into_masked_json_with(mut self, engine: &MaskingEngine) -> MaskedJson {
        if let Err(err) = engine.redact(&mut self) {
            tracing::warn!(error = %err, "masking failed, logging placeholder");
            return MaskedJson::new(JsonValue::String(MASK_FAILED.to_string()));
        }
        let json_value = serde_json::to_value(&self)
            .unwrap_or_else(|_| JsonValue::String(SERIALIZE_FAILED.to_string()));
        MaskedJson::new(json_value)
    }
}

impl<T> IntoMaskedJson for T where T: Maskable + Serialize {}
