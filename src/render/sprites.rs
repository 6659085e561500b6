//! Sprite handles guarded by an availability predicate
//!
//! Asset loading lives outside the core. The host registers the sprites
//! it will provide and flips them to ready as they finish loading; draw
//! code checks `is_available` and falls back to placeholder rectangles.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Opaque handle the surface resolves to real pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteHandle(pub u32);

/// A region within a sprite sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SpriteRegion {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone)]
struct SpriteEntry {
    handle: SpriteHandle,
    ready: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SpriteBank {
    entries: AHashMap<String, SpriteEntry>,
    next: u32,
}

impl SpriteBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `name`, registering it as pending on first request
    pub fn request(&mut self, name: &str) -> SpriteHandle {
        if let Some(entry) = self.entries.get(name) {
            return entry.handle;
        }
        let handle = SpriteHandle(self.next);
        self.next += 1;
        self.entries.insert(
            name.to_string(),
            SpriteEntry {
                handle,
                ready: false,
            },
        );
        handle
    }

    /// The host finished loading `name`
    pub fn mark_ready(&mut self, name: &str) -> SpriteHandle {
        let handle = self.request(name);
        if let Some(entry) = self.entries.get_mut(name) {
            entry.ready = true;
        }
        handle
    }

    /// Loading failed; draw code keeps using placeholders
    pub fn mark_failed(&mut self, name: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.ready = false;
        }
        tracing::warn!("Sprite '{}' failed to load; using placeholder", name);
    }

    /// Ready handle for `name`, if loaded
    pub fn get(&self, name: &str) -> Option<SpriteHandle> {
        self.entries.get(name).filter(|e| e.ready).map(|e| e.handle)
    }

    pub fn is_available(&self, handle: SpriteHandle) -> bool {
        self.entries.values().any(|e| e.handle == handle && e.ready)
    }

    pub fn pending(&self) -> usize {
        self.entries.values().filter(|e| !e.ready).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_ready() {
        let mut bank = SpriteBank::new();
        let handle = bank.request("map_sprites/eirika");
        assert!(!bank.is_available(handle));
        assert_eq!(bank.get("map_sprites/eirika"), None);
        assert_eq!(bank.pending(), 1);

        assert_eq!(bank.mark_ready("map_sprites/eirika"), handle);
        assert!(bank.is_available(handle));
        assert_eq!(bank.get("map_sprites/eirika"), Some(handle));
    }

    #[test]
    fn test_handles_are_stable() {
        let mut bank = SpriteBank::new();
        let a = bank.request("a");
        let b = bank.request("b");
        assert_ne!(a, b);
        assert_eq!(bank.request("a"), a);
    }
}
