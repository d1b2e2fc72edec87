//! Run report and append-only run log.
//!
//! Every processed slot produces one [`SlotRecord`]. Records are collected in
//! a [`RunReport`] and written, one line each, to the [`RunLog`] text file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use artwork_healer_common::{ArtworkSlot, ArtworkState, ItemKind, LibraryItem};

/// Terminal outcome of processing one artwork slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairOutcome {
    /// Existing artwork is valid; nothing was touched.
    AlreadyOk,
    /// Artwork was restored from the local backup store.
    RestoredFromBackup,
    /// Artwork was fetched from the metadata provider.
    RestoredFromProvider,
    /// Neither the backup store nor the provider had an image.
    NotFound,
    /// The media server rejected the upload.
    UploadFailed,
    /// The provider image could not be written to the backup store.
    BackupFailed,
    /// A repair was possible but skipped because of dry-run mode.
    DryRunSkipped,
}

impl RepairOutcome {
    pub const ALL: [RepairOutcome; 7] = [
        RepairOutcome::AlreadyOk,
        RepairOutcome::RestoredFromBackup,
        RepairOutcome::RestoredFromProvider,
        RepairOutcome::NotFound,
        RepairOutcome::UploadFailed,
        RepairOutcome::BackupFailed,
        RepairOutcome::DryRunSkipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyOk => "already-ok",
            Self::RestoredFromBackup => "restored-from-backup",
            Self::RestoredFromProvider => "restored-from-provider",
            Self::NotFound => "not-found",
            Self::UploadFailed => "upload-failed",
            Self::BackupFailed => "backup-failed",
            Self::DryRunSkipped => "dry-run-skipped",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NotFound | Self::UploadFailed | Self::BackupFailed)
    }
}

impl fmt::Display for RepairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repair source chosen for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairAction {
    None,
    RestoreFromBackup,
    RestoreFromProvider,
}

impl RepairAction {
    /// Outcome reported when the repair completes.
    pub fn restored_outcome(&self) -> RepairOutcome {
        match self {
            Self::RestoreFromBackup => RepairOutcome::RestoredFromBackup,
            Self::RestoreFromProvider => RepairOutcome::RestoredFromProvider,
            Self::None => RepairOutcome::AlreadyOk,
        }
    }
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::RestoreFromBackup => write!(f, "restore-from-backup"),
            Self::RestoreFromProvider => write!(f, "restore-from-provider"),
        }
    }
}

/// Everything decided about one slot of one item.
#[derive(Debug, Clone)]
pub struct SlotRecord {
    pub item_key: String,
    pub title: String,
    pub kind: ItemKind,
    pub slot: ArtworkSlot,
    pub detected: ArtworkState,
    pub action: RepairAction,
    pub outcome: RepairOutcome,
    /// Free-form context: error messages, paths written, skipped steps.
    pub detail: Vec<String>,
}

impl SlotRecord {
    pub fn new(item: &LibraryItem, slot: ArtworkSlot) -> Self {
        Self {
            item_key: item.key.clone(),
            title: item.title.clone(),
            kind: item.kind,
            slot,
            detected: ArtworkState::Present,
            action: RepairAction::None,
            outcome: RepairOutcome::AlreadyOk,
            detail: Vec::new(),
        }
    }

    pub fn note(&mut self, detail: impl Into<String>) {
        self.detail.push(detail.into());
    }
}

impl fmt::Display for SlotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) {}: state={} action={} outcome={}",
            self.outcome.as_str().to_ascii_uppercase(),
            self.title,
            self.kind,
            self.slot,
            self.detected,
            self.action,
            self.outcome
        )?;
        if !self.detail.is_empty() {
            write!(f, " - {}", self.detail.join("; "))?;
        }
        Ok(())
    }
}

/// Collected records of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<SlotRecord>,
    pub items: usize,
}

impl RunReport {
    pub fn push(&mut self, record: SlotRecord) {
        self.records.push(record);
    }

    pub fn count(&self, outcome: RepairOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// Records for one item title, in processing order.
    pub fn for_title<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a SlotRecord> + 'a {
        self.records.iter().filter(move |r| r.title == title)
    }

    pub fn summary(&self) -> String {
        let counts: Vec<String> = RepairOutcome::ALL
            .iter()
            .map(|o| format!("{}={}", o, self.count(*o)))
            .collect();
        format!(
            "{} items, {} slots: {}",
            self.items,
            self.records.len(),
            counts.join(" ")
        )
    }
}

/// Append-only text log of a run.
///
/// Write failures are reported through `tracing` and never abort the run.
pub struct RunLog {
    file: Option<File>,
}

impl RunLog {
    /// Open `path` for appending, creating it and its parent folder if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;
        Ok(Self { file: Some(file) })
    }

    /// A log that only forwards to `tracing`.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn header(&mut self, dry_run: bool, enable_upload: bool) {
        self.line(&format!(
            "=== Artwork healer run (dry_run={}, enable_upload={}) ===",
            dry_run, enable_upload
        ));
    }

    pub fn record(&mut self, record: &SlotRecord) {
        if record.outcome.is_failure() {
            tracing::warn!("{}", record);
        } else {
            tracing::info!("{}", record);
        }
        self.write(&record.to_string());
    }

    pub fn line(&mut self, msg: &str) {
        tracing::info!("{}", msg);
        self.write(msg);
    }

    pub fn summary(&mut self, report: &RunReport) {
        self.line(&format!("=== Finished: {} ===", report.summary()));
    }

    fn write(&mut self, msg: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(e) = writeln!(file, "{} - {}", stamp, msg) {
            tracing::warn!("Failed to write run log: {}", e);
        }
    }
}
