//! Observability hooks for sorted record files.
//!
//! Storage components report lifecycle events to an [`EventSink`] handed to
//! them at construction time. [`LogSink`] forwards events to the `log`
//! facade and is used when no other sink is injected.

use std::fmt::Debug;
use std::path::Path;

/// A lifecycle event emitted by a sorted record file.
#[derive(Debug)]
pub enum StorageEvent<'a> {
    /// The backing file was opened.
    Opened {
        path: &'a Path,
        record_count: usize,
        record_size: usize,
    },
    /// A read-only mapping over the whole file was established.
    Mapped { path: &'a Path, len: usize },
    /// The mapping could not be established. Sequential reads stay unavailable.
    MappingFailed {
        path: &'a Path,
        error: &'a std::io::Error,
    },
    /// The mapping was dropped.
    MappingReleased { path: &'a Path },
}

/// Receiver of [`StorageEvent`]s.
pub trait EventSink: Send + Sync + Debug {
    fn on_event(&self, event: &StorageEvent<'_>);
}

/// Sink that forwards events to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_event(&self, event: &StorageEvent<'_>) {
        match event {
            StorageEvent::Opened {
                path,
                record_count,
                record_size,
            } => log::debug!(
                "opened {} ({record_count} records of {record_size} bytes)",
                path.display()
            ),
            StorageEvent::Mapped { path, len } => {
                log::debug!("mapped {} ({len} bytes)", path.display())
            }
            StorageEvent::MappingFailed { path, error } => {
                log::error!("failed to map {}: {error}", path.display())
            }
            StorageEvent::MappingReleased { path } => {
                log::debug!("released mapping of {}", path.display())
            }
        }
    }
}
