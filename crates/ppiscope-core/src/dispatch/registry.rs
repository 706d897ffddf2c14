use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{debug, error};

use super::LayerDecoder;
use crate::decoders;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("encapsulation code {code} already registered to '{existing}'")]
    DuplicateCode { code: u32, existing: &'static str },
}

/// Map from encapsulation code to the decoder for that payload format.
///
/// Populate with [`register`](Self::register) during setup, then share it
/// behind an `Arc` or a `static`: lookups take `&self` and need no locking.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use ppiscope_core::{DecodedPayload, LayerDecoder, LayerTypeRegistry, PayloadError};
///
/// struct Opaque;
///
/// impl LayerDecoder for Opaque {
///     fn name(&self) -> &'static str {
///         "opaque"
///     }
///
///     fn decode(&self, data: &[u8]) -> Result<DecodedPayload, PayloadError> {
///         Ok(DecodedPayload::new("opaque", data.len()))
///     }
/// }
///
/// let mut registry = LayerTypeRegistry::new();
/// registry.register(147, Arc::new(Opaque))?;
/// assert!(registry.register(147, Arc::new(Opaque)).is_err());
/// assert_eq!(registry.lookup(147).map(|d| d.name()), Some("opaque"));
/// # Ok::<(), ppiscope_core::RegistryError>(())
/// ```
#[derive(Default, Clone)]
pub struct LayerTypeRegistry {
    decoders: HashMap<u32, Arc<dyn LayerDecoder>>,
}

impl LayerTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the decoders shipped with this crate.
    pub fn with_builtin_decoders() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (code, decoder) in decoders::builtin() {
            registry.register(code, decoder)?;
        }
        Ok(registry)
    }

    /// Associate `code` with `decoder`. A code can only be registered once.
    pub fn register(
        &mut self,
        code: u32,
        decoder: Arc<dyn LayerDecoder>,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.decoders.get(&code) {
            return Err(RegistryError::DuplicateCode {
                code,
                existing: existing.name(),
            });
        }
        debug!(code, decoder = decoder.name(), "registered layer decoder");
        self.decoders.insert(code, decoder);
        Ok(())
    }

    pub fn lookup(&self, code: u32) -> Option<&Arc<dyn LayerDecoder>> {
        self.decoders.get(&code)
    }

    /// Registered codes in ascending order.
    pub fn codes(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.decoders.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for LayerTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self
            .decoders
            .iter()
            .map(|(code, decoder)| (*code, decoder.name()))
            .collect();
        entries.sort_unstable();
        f.debug_map().entries(entries).finish()
    }
}

/// Process-wide registry with the built-in decoders, built on first use and
/// read-only afterwards.
pub fn default_registry() -> &'static LayerTypeRegistry {
    static REGISTRY: OnceLock<LayerTypeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| registry_or_empty(LayerTypeRegistry::with_builtin_decoders()))
}

/// Falls back to an empty registry, so every code dispatches as unknown,
/// and logs the registration failure.
fn registry_or_empty(built: Result<LayerTypeRegistry, RegistryError>) -> LayerTypeRegistry {
    built.unwrap_or_else(|err| {
        error!(error = %err, "built-in decoder registration failed");
        LayerTypeRegistry::new()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{LayerTypeRegistry, RegistryError, default_registry, registry_or_empty};
    use crate::decoders::{self, DLT_ETHERNET, DLT_IEEE802_11, DLT_RAW};
    use crate::dispatch::{DecodedPayload, LayerDecoder, PayloadError};

    struct Fixed(&'static str);

    impl LayerDecoder for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn decode(&self, data: &[u8]) -> Result<DecodedPayload, PayloadError> {
            Ok(DecodedPayload::new(self.0, data.len()))
        }
    }

    #[test]
    fn register_then_lookup() {
        let mut registry = LayerTypeRegistry::new();
        assert!(registry.is_empty());
        registry.register(7, Arc::new(Fixed("seven"))).unwrap();
        assert_eq!(registry.lookup(7).unwrap().name(), "seven");
        assert!(registry.lookup(8).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_code_is_rejected_at_registration() {
        let mut registry = LayerTypeRegistry::new();
        registry.register(7, Arc::new(Fixed("first"))).unwrap();
        let err = registry.register(7, Arc::new(Fixed("second"))).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateCode {
                code: 7,
                existing: "first",
            }
        );
        assert_eq!(registry.lookup(7).unwrap().name(), "first");
    }

    #[test]
    fn builtin_codes_are_distinct() {
        let registry = LayerTypeRegistry::with_builtin_decoders().unwrap();
        assert_eq!(registry.len(), decoders::builtin().len());
        assert_eq!(registry.codes(), vec![DLT_ETHERNET, DLT_RAW, DLT_IEEE802_11]);
    }

    #[test]
    fn default_registry_is_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    default_registry()
                        .lookup(DLT_IEEE802_11)
                        .map(|decoder| decoder.name())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("802.11"));
        }
    }

    #[test]
    fn failed_builtin_registration_yields_empty_registry() {
        let failed = Err(RegistryError::DuplicateCode {
            code: DLT_RAW,
            existing: "raw-ip",
        });
        assert!(registry_or_empty(failed).is_empty());

        let built = LayerTypeRegistry::with_builtin_decoders();
        assert_eq!(registry_or_empty(built).codes(), default_registry().codes());
    }

    #[test]
    fn debug_lists_codes_and_names() {
        let mut registry = LayerTypeRegistry::new();
        registry.register(2, Arc::new(Fixed("b"))).unwrap();
        registry.register(1, Arc::new(Fixed("a"))).unwrap();
        assert_eq!(format!("{registry:?}"), r#"{1: "a", 2: "b"}"#);
    }
}
