//! Directory-backed speaker registry.
//!
//! Layout:
//!
//! ```text
//! <dir>/
//!   alice_20240101_120000.wav
//!   bob_20240102_093000.wav
//!   metadata.json          {"alice_20240101_120000.wav": {...}, ...}
//! ```
//!
//! Every `.wav` file in the directory is a registered speaker, listed in
//! filename order. `metadata.json` is optional per file; missing entries
//! fall back to "Unknown". Registration stores the embedding computed at
//! that time; files without one are embedded from their audio on demand.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use voicegate_audio::{AudioError, wav};
use voicegate_voiceprint::{
    Embedding, Registry, RegistryEntry, StoredVoice, VoiceprintError, codec,
};

use crate::upload::secure_filename;

const METADATA_FILE: &str = "metadata.json";
const UNKNOWN_SPEAKER: &str = "Unknown";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no registered audio found with filename: {0}")]
    NotFound(String),

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: AudioError,
    },

    #[error("metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Bookkeeping stored per registered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerRecord {
    pub speaker_name: String,
    pub original_filename: String,
    pub original_format: String,
    pub registered_at: String,
    pub file_size: u64,
    /// Base64 embedding computed at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
}

/// A registered speaker as reported by [`DirRegistry::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub filename: String,
    pub speaker_name: String,
    pub registered_at: String,
    pub file_size: u64,
}

/// Input of [`DirRegistry::register`].
pub struct NewSpeaker<'a> {
    pub speaker_name: Option<&'a str>,
    /// Sanitized client filename.
    pub original_filename: &'a str,
    pub original_format: &'a str,
    pub wav: &'a [u8],
    pub embedding: Option<&'a Embedding>,
}

type Metadata = BTreeMap<String, SpeakerRecord>;

pub struct DirRegistry {
    dir: PathBuf,
    // Serializes read-modify-write cycles on metadata.json.
    write_lock: Mutex<()>,
}

impl DirRegistry {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            op: "create",
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores a WAV file and its metadata. Returns the new filename and
    /// record.
    ///
    /// Files are named `<speaker>_<YYYYmmdd_HHMMSS>.wav`; a numeric suffix
    /// is appended if that name is already taken.
    pub fn register(&self, new: NewSpeaker<'_>) -> Result<(String, SpeakerRecord), StoreError> {
        let now = Local::now();
        let speaker_name = new
            .speaker_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SPEAKER)
            .to_string();
        let stem = match new.speaker_name.map(secure_filename) {
            Some(safe) if !safe.is_empty() => safe,
            _ => "speaker".to_string(),
        };
        let base = format!("{stem}_{}", now.format("%Y%m%d_%H%M%S"));

        let _guard = self.write_lock.lock();
        let filename = self.free_name(&base);
        let path = self.dir.join(&filename);
        fs::write(&path, new.wav).map_err(|source| StoreError::Io {
            op: "write",
            path: path.clone(),
            source,
        })?;

        let record = SpeakerRecord {
            speaker_name,
            original_filename: new.original_filename.to_string(),
            original_format: new.original_format.to_string(),
            registered_at: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            file_size: new.wav.len() as u64,
            embedding: new.embedding.map(codec::to_base64),
        };
        let mut metadata = self.load_metadata()?;
        metadata.insert(filename.clone(), record.clone());
        self.save_metadata(&metadata)?;

        info!(filename = %filename, speaker = %record.speaker_name, "speaker registered");
        Ok((filename, record))
    }

    /// Lists registered files in filename order.
    pub fn list(&self) -> Result<Vec<Listing>, StoreError> {
        let metadata = self.load_metadata()?;
        Ok(self
            .audio_files()?
            .into_iter()
            .map(|filename| match metadata.get(&filename) {
                Some(r) => Listing {
                    speaker_name: r.speaker_name.clone(),
                    registered_at: r.registered_at.clone(),
                    file_size: r.file_size,
                    filename,
                },
                None => Listing {
                    speaker_name: UNKNOWN_SPEAKER.to_string(),
                    registered_at: UNKNOWN_SPEAKER.to_string(),
                    file_size: 0,
                    filename,
                },
            })
            .collect())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.audio_files()?.len())
    }

    /// Deletes a registered file and its metadata. Returns the sanitized
    /// filename that was removed.
    pub fn delete(&self, filename: &str) -> Result<String, StoreError> {
        let safe = secure_filename(filename);
        if !is_audio_file(&safe) {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        let path = self.dir.join(&safe);

        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(filename.to_string()));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    op: "remove",
                    path,
                    source,
                });
            }
        }

        let mut metadata = self.load_metadata()?;
        if metadata.remove(&safe).is_some() {
            self.save_metadata(&metadata)?;
        }
        info!(filename = %safe, "speaker deleted");
        Ok(safe)
    }

    fn audio_files(&self) -> Result<Vec<String>, StoreError> {
        let read_err = |source| StoreError::Io {
            op: "read",
            path: self.dir.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_audio_file(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn free_name(&self, base: &str) -> String {
        let mut name = format!("{base}.wav");
        let mut n = 1;
        while self.dir.join(&name).exists() {
            name = format!("{base}_{n}.wav");
            n += 1;
        }
        name
    }

    fn load_metadata(&self) -> Result<Metadata, StoreError> {
        let path = self.dir.join(METADATA_FILE);
        match fs::read(&path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Metadata::new()),
            Err(source) => Err(StoreError::Io {
                op: "read",
                path,
                source,
            }),
        }
    }

    fn save_metadata(&self, metadata: &Metadata) -> Result<(), StoreError> {
        let path = self.dir.join(METADATA_FILE);
        let tmp = self.dir.join(format!("{METADATA_FILE}.tmp"));
        let data = serde_json::to_vec_pretty(metadata)?;
        fs::write(&tmp, data).map_err(|source| StoreError::Io {
            op: "write",
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            op: "rename",
            path,
            source,
        })
    }

    fn load_voice(&self, filename: &str, record: Option<&SpeakerRecord>) -> Result<StoredVoice, StoreError> {
        if let Some(text) = record.and_then(|r| r.embedding.as_deref()) {
            match codec::decode_base64(text) {
                Ok(bytes) => return Ok(StoredVoice::Embedding(bytes)),
                Err(e) => warn!(filename, error = %e, "stored embedding unreadable, using audio"),
            }
        }
        let path = self.dir.join(filename);
        let data = fs::read(&path).map_err(|source| StoreError::Io {
            op: "read",
            path,
            source,
        })?;
        let audio = wav::decode_wav(&data).map_err(|source| StoreError::Decode {
            path: self.dir.join(filename),
            source,
        })?;
        Ok(StoredVoice::Pcm {
            samples: audio.samples,
            sample_rate: audio.format.sample_rate,
        })
    }
}

fn is_audio_file(name: &str) -> bool {
    name.len() > 4 && name.to_ascii_lowercase().ends_with(".wav")
}

impl Registry for DirRegistry {
    fn entries(&self) -> Result<Vec<RegistryEntry>, VoiceprintError> {
        let to_err = |e: StoreError| VoiceprintError::Registry(e.to_string());
        let metadata = self.load_metadata().map_err(to_err)?;
        self.audio_files()
            .map_err(to_err)?
            .into_iter()
            .map(|filename| -> Result<RegistryEntry, VoiceprintError> {
                let record = metadata.get(&filename);
                let voice = self.load_voice(&filename, record).map_err(to_err)?;
                Ok(RegistryEntry {
                    speaker_name: record
                        .map(|r| r.speaker_name.clone())
                        .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()),
                    id: filename,
                    voice,
                })
            })
            .collect()
    }

    fn len(&self) -> Result<usize, VoiceprintError> {
        self.count().map_err(|e| VoiceprintError::Registry(e.to_string()))
    }
}
