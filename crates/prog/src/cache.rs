//! Compiled program cache
//!
//! Programs are cached by a SHA-256 digest of their source and signature, so
//! identical progs attached to many objects compile once. Named bindings
//! track the current program for a persisted prog identity and survive a
//! failed recompile of that prog.

use crate::engine::ProgEngine;
use crate::error::Result;
use crate::program::{CompiledProgram, ProgParameter};
use crate::types::ProgType;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default number of compiled programs kept by content hash
pub const DEFAULT_CACHE_SIZE: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry {
    program: Arc<CompiledProgram>,
    /// Insertion order, oldest first out
    stamp: u64,
}

#[derive(Debug, Clone)]
struct NamedEntry {
    key: String,
    program: Arc<CompiledProgram>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub programs: usize,
    pub named: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe cache of compiled programs
pub struct ProgCache {
    engine: ProgEngine,
    programs: DashMap<String, CacheEntry>,
    named: DashMap<String, NamedEntry>,
    capacity: usize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProgCache {
    pub fn new(engine: ProgEngine, capacity: usize) -> Self {
        Self {
            engine,
            programs: DashMap::new(),
            named: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(engine: ProgEngine) -> Self {
        Self::new(engine, DEFAULT_CACHE_SIZE)
    }

    pub fn engine(&self) -> &ProgEngine {
        &self.engine
    }

    /// Cache key for a prog's source and signature
    pub fn key(source: &str, return_type: ProgType, parameters: &[ProgParameter]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update([0u8]);
        hasher.update(return_type.to_string().as_bytes());
        for parameter in parameters {
            hasher.update([0u8]);
            hasher.update(parameter.to_string().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Fetch the program compiled from this source, compiling it on a miss
    pub fn get_or_compile(
        &self,
        source: &str,
        return_type: ProgType,
        parameters: &[ProgParameter],
    ) -> Result<Arc<CompiledProgram>> {
        let key = Self::key(source, return_type, parameters);
        self.get_or_compile_keyed(key, source, return_type, parameters)
    }

    fn get_or_compile_keyed(
        &self,
        key: String,
        source: &str,
        return_type: ProgType,
        parameters: &[ProgParameter],
    ) -> Result<Arc<CompiledProgram>> {
        if let Some(entry) = self.programs.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(&entry.program));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let program = Arc::new(self.engine.compile(source, return_type, parameters)?);

        self.evict_if_full();
        let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
        self.programs.insert(
            key,
            CacheEntry {
                program: Arc::clone(&program),
                stamp,
            },
        );
        Ok(program)
    }

    /// Compile a prog and bind it to a persisted identity
    ///
    /// When compilation fails the previous binding, if any, stays in place.
    pub fn insert_named(
        &self,
        name: &str,
        source: &str,
        return_type: ProgType,
        parameters: &[ProgParameter],
    ) -> Result<Arc<CompiledProgram>> {
        let key = Self::key(source, return_type, parameters);
        if let Some(existing) = self.named.get(name) {
            if existing.key == key {
                return Ok(Arc::clone(&existing.program));
            }
        }

        let program = self.get_or_compile_keyed(key.clone(), source, return_type, parameters)?;
        self.named.insert(
            name.to_string(),
            NamedEntry {
                key,
                program: Arc::clone(&program),
            },
        );
        tracing::debug!("Bound prog '{}'", name);
        Ok(program)
    }

    pub fn get_named(&self, name: &str) -> Option<Arc<CompiledProgram>> {
        self.named.get(name).map(|entry| Arc::clone(&entry.program))
    }

    /// Drop a named binding; returns whether one existed
    pub fn invalidate_named(&self, name: &str) -> bool {
        self.named.remove(name).is_some()
    }

    /// Names with a bound program, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.named.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Forget every hashed program; named bindings keep theirs
    pub fn clear(&self) {
        self.programs.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            programs: self.programs.len(),
            named: self.named.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn evict_if_full(&self) {
        while self.programs.len() >= self.capacity {
            let oldest = self
                .programs
                .iter()
                .min_by_key(|entry| entry.stamp)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(key) => {
                    self.programs.remove(&key);
                    tracing::trace!("Evicted compiled prog {}", key);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProgError;

    fn cache(capacity: usize) -> ProgCache {
        ProgCache::new(ProgEngine::standard(), capacity)
    }

    #[test]
    fn test_identical_source_compiles_once() {
        let cache = cache(8);
        let first = cache.get_or_compile("return 1", ProgType::Number, &[]).unwrap();
        let second = cache.get_or_compile("return 1", ProgType::Number, &[]).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_signature_is_part_of_key() {
        let with_param = [ProgParameter::new("n", ProgType::Number)];
        assert_ne!(
            ProgCache::key("return 1", ProgType::Number, &[]),
            ProgCache::key("return 1", ProgType::Number, &with_param)
        );
        assert_ne!(
            ProgCache::key("return", ProgType::Void, &[]),
            ProgCache::key("return", ProgType::Number, &[])
        );
    }

    #[test]
    fn test_oldest_program_evicted() {
        let cache = cache(2);
        let one = cache.get_or_compile("return 1", ProgType::Number, &[]).unwrap();
        cache.get_or_compile("return 2", ProgType::Number, &[]).unwrap();
        cache.get_or_compile("return 3", ProgType::Number, &[]).unwrap();
        assert_eq!(cache.len(), 2);

        let again = cache.get_or_compile("return 1", ProgType::Number, &[]).unwrap();
        assert!(!Arc::ptr_eq(&one, &again));
    }

    #[test]
    fn test_failed_recompile_keeps_binding() {
        let cache = cache(8);
        cache.insert_named("greet", "return \"hello\"", ProgType::Text, &[]).unwrap();

        let err = cache
            .insert_named("greet", "return hello", ProgType::Text, &[])
            .unwrap_err();
        assert!(matches!(err, ProgError::Compile(ref e) if e.line == 1));

        let program = cache.get_named("greet").unwrap();
        assert_eq!(program.return_type(), ProgType::Text);
        assert_eq!(cache.names(), vec!["greet".to_string()]);
    }

    #[test]
    fn test_invalidate_named() {
        let cache = cache(8);
        cache.insert_named("idle", "return", ProgType::Void, &[]).unwrap();
        assert!(cache.invalidate_named("idle"));
        assert!(!cache.invalidate_named("idle"));
        assert!(cache.get_named("idle").is_none());
    }

    #[test]
    fn test_named_binding_survives_clear() {
        let cache = cache(8);
        cache.insert_named("idle", "return", ProgType::Void, &[]).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get_named("idle").is_some());
    }
}
