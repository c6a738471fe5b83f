//! Codec lookup keyed by value kind.

use std::collections::HashMap;
use std::sync::Arc;

use super::builtin::{builtin_codecs, ArrayCodec, PropertyCodec};
use super::value::ValueKind;
use crate::error::ConfigError;

/// Maps a value kind to its codec.
///
/// Each kind has exactly one shared codec instance. Array kinds are
/// composed on demand from their element codec and cached.
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<ValueKind, Arc<dyn PropertyCodec>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in codec.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for codec in builtin_codecs() {
            registry.register(codec);
        }
        registry
    }

    /// Registers (or replaces) the codec for its kind.
    pub fn register(&mut self, codec: Arc<dyn PropertyCodec>) {
        self.codecs.insert(codec.kind(), codec);
    }

    /// Returns true if `kind` resolves.
    #[must_use]
    pub fn contains(&self, kind: &ValueKind) -> bool {
        match kind {
            ValueKind::Array(element) => self.codecs.contains_key(kind) || self.contains(element),
            _ => self.codecs.contains_key(kind),
        }
    }

    /// Resolves the codec for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCodec`] if neither the kind nor (for
    /// arrays) its element kind is registered.
    pub fn resolve(&mut self, kind: &ValueKind) -> Result<Arc<dyn PropertyCodec>, ConfigError> {
        if let Some(codec) = self.codecs.get(kind) {
            return Ok(Arc::clone(codec));
        }
        match kind {
            ValueKind::Array(element) => {
                let element = self
                    .resolve(element)
                    .map_err(|_| ConfigError::MissingCodec(kind.clone()))?;
                let codec: Arc<dyn PropertyCodec> = Arc::new(ArrayCodec::new(element));
                self.codecs.insert(kind.clone(), Arc::clone(&codec));
                Ok(codec)
            }
            _ => Err(ConfigError::MissingCodec(kind.clone())),
        }
    }

    /// Number of cached codecs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
