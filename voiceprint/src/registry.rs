//! Read-only view of registered speakers.
//!
//! Storage, registration and deletion belong to the caller. The verifier
//! only iterates entries, in the order the registry reports them.

use parking_lot::RwLock;

use crate::VoiceprintError;

/// What a registry stores for one speaker sample.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredVoice {
    /// A serialized embedding (little-endian `f32`), decoded tolerantly.
    Embedding(Vec<u8>),
    /// Mono PCM16 samples, embedded on the fly.
    Pcm { samples: Vec<i16>, sample_rate: u32 },
}

/// One registered speaker sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    /// Opaque identifier (e.g. a filename).
    pub id: String,
    pub speaker_name: String,
    pub voice: StoredVoice,
}

/// A source of registered speakers.
///
/// All implementations must be safe for concurrent use (Send + Sync).
pub trait Registry: Send + Sync {
    /// Returns every entry in a stable order.
    fn entries(&self) -> Result<Vec<RegistryEntry>, VoiceprintError>;

    /// Returns the number of entries.
    fn len(&self) -> Result<usize, VoiceprintError> {
        Ok(self.entries()?.len())
    }
}

/// In-memory registry preserving insertion order.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, replacing an existing one with the same id in place.
    pub fn insert(&self, entry: RegistryEntry) {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => *slot = entry,
            None => entries.push(entry),
        }
    }

    /// Removes an entry. Returns false if the id was unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }
}

impl Registry for MemoryRegistry {
    fn entries(&self) -> Result<Vec<RegistryEntry>, VoiceprintError> {
        Ok(self.entries.read().clone())
    }

    fn len(&self) -> Result<usize, VoiceprintError> {
        Ok(self.entries.read().len())
    }
}
