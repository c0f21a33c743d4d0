//! Compiled program cache

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use super::TensorDescriptor;
use crate::error::Result;
use crate::program::ProgramDescriptor;

/// Canonical cache key for compiling `program` against the given layouts.
///
/// With shape uniforms enabled, concrete shapes are bound at run time, so
/// only ranks and layout flags take part in the key. Otherwise the full
/// logical and texture shapes do.
pub fn shader_key(
    program: &ProgramDescriptor,
    inputs: &[TensorDescriptor],
    output: &TensorDescriptor,
) -> String {
    let mut key = String::from(program.name);
    for tensor in inputs.iter().chain(std::iter::once(output)) {
        let layout = &tensor.texture_layout;
        if program.enable_shape_uniforms {
            let _ = write!(key, "_r{}", tensor.rank());
        } else {
            let _ = write!(key, "_{:?}_{:?}", tensor.shape.as_slice(), layout.tex_shape);
        }
        let _ = write!(key, "_{}{}", u8::from(layout.is_packed), u8::from(layout.is_uniform));
    }
    let _ = write!(
        key,
        "_{}_{}",
        u8::from(program.enable_shape_uniforms),
        program.source
    );
    key
}

/// Thread-safe get-or-compile map from [`shader_key`] to compiled kernels
pub struct ProgramCache<K> {
    kernels: Mutex<HashMap<String, Arc<K>>>,
}

impl<K> Default for ProgramCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ProgramCache<K> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            kernels: Mutex::new(HashMap::new()),
        }
    }

    /// Return the kernel cached under `key`, compiling it on a miss.
    ///
    /// The lock is held across `compile`, so concurrent callers with the
    /// same key compile once. A failed compile caches nothing.
    pub fn get_or_compile<F>(&self, key: &str, compile: F) -> Result<Arc<K>>
    where
        F: FnOnce() -> Result<K>,
    {
        let mut kernels = self.kernels.lock();
        if let Some(kernel) = kernels.get(key) {
            log::debug!("program cache hit: {}", short_key(key));
            return Ok(kernel.clone());
        }

        log::debug!("program cache miss: {}", short_key(key));
        let kernel = Arc::new(compile()?);
        kernels.insert(key.to_owned(), kernel.clone());
        Ok(kernel)
    }

    /// Number of cached kernels
    pub fn len(&self) -> usize {
        self.kernels.lock().len()
    }

    /// True when nothing has been compiled yet
    pub fn is_empty(&self) -> bool {
        self.kernels.lock().is_empty()
    }

    /// Drop every cached kernel
    pub fn clear(&self) {
        self.kernels.lock().clear();
    }
}

/// Keys embed the whole source; logs only need the prefix.
fn short_key(key: &str) -> &str {
    match key.char_indices().nth(96) {
        Some((end, _)) => &key[..end],
        None => key,
    }
}
