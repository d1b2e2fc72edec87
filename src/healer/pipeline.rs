//! Per-slot repair state machine and the run loop around it.

use std::sync::Arc;
use std::time::Duration;

use artwork_healer_common::{ArtworkSlot, Error, ItemKind, LibraryItem, Result};
use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::backup::BackupStore;
use crate::config::HealerConfig;
use crate::metadata::{MetadataProvider, ProviderMatch};
use crate::plex::MediaServer;
use crate::report::{RepairAction, RepairOutcome, RunLog, RunReport, SlotRecord};

/// Behaviour switches of a run.
#[derive(Debug, Clone, Default)]
pub struct HealSettings {
    pub enable_upload: bool,
    pub dry_run: bool,
    pub item_delay: Duration,
    pub backup_healthy: bool,
}

impl From<&HealerConfig> for HealSettings {
    fn from(config: &HealerConfig) -> Self {
        Self {
            enable_upload: config.enable_upload,
            dry_run: config.dry_run,
            item_delay: Duration::from_millis(config.item_delay_ms),
            backup_healthy: config.backup_healthy,
        }
    }
}

/// States of one artwork slot.
///
/// `Check -> NeedsRepair -> TryBackup -> TryProvider -> SaveBackup -> Upload`,
/// with every path ending in `Done`.
enum SlotStep {
    Check,
    NeedsRepair,
    TryBackup,
    TryProvider,
    SaveBackup { data: Bytes },
    Upload { data: Bytes },
    Done(RepairOutcome),
}

impl SlotStep {
    fn name(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::NeedsRepair => "needs-repair",
            Self::TryBackup => "try-backup",
            Self::TryProvider => "try-provider",
            Self::SaveBackup { .. } => "save-backup",
            Self::Upload { .. } => "upload",
            Self::Done(_) => "done",
        }
    }
}

/// Provider match for the item being processed, shared by both slots.
///
/// The provider is asked at most once per item; a failed lookup is reported
/// again for the second slot without another request.
#[derive(Debug, Default)]
enum ProviderLookup {
    #[default]
    Pending,
    Resolved(Option<ProviderMatch>),
    Failed(String),
}

pub struct Healer {
    server: Arc<dyn MediaServer>,
    provider: Arc<dyn MetadataProvider>,
    backups: BackupStore,
    settings: HealSettings,
}

impl Healer {
    pub fn new(
        server: Arc<dyn MediaServer>,
        provider: Arc<dyn MetadataProvider>,
        backups: BackupStore,
        settings: HealSettings,
    ) -> Self {
        Self {
            server,
            provider,
            backups,
            settings,
        }
    }

    /// Process every item the server lists, one at a time.
    ///
    /// Never fails: problems are recorded per slot and the run continues.
    pub async fn run(&self, log: &mut RunLog) -> RunReport {
        let mut report = RunReport::default();
        log.header(self.settings.dry_run, self.settings.enable_upload);

        let items = match self.server.list_items().await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to list library items: {}", e);
                log.line(&format!("[ERROR] Failed to list library items: {}", e));
                log.summary(&report);
                return report;
            }
        };

        let count = |kind: ItemKind| items.iter().filter(|i| i.kind == kind).count();
        log.line(&format!(
            "Found {} items (movies={}, shows={}, collections={})",
            items.len(),
            count(ItemKind::Movie),
            count(ItemKind::Show),
            count(ItemKind::Collection)
        ));

        for (index, item) in items.iter().enumerate() {
            if index > 0 && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }

            for record in self.heal_item(item).await {
                log.record(&record);
                report.push(record);
            }
            report.items += 1;
        }

        log.summary(&report);
        report
    }

    /// Process both slots of one item independently.
    pub async fn heal_item(&self, item: &LibraryItem) -> Vec<SlotRecord> {
        let mut lookup = ProviderLookup::default();
        let mut records = Vec::with_capacity(ArtworkSlot::ALL.len());
        for slot in ArtworkSlot::ALL {
            records.push(self.heal_slot(item, slot, &mut lookup).await);
        }
        records
    }

    async fn heal_slot(
        &self,
        item: &LibraryItem,
        slot: ArtworkSlot,
        lookup: &mut ProviderLookup,
    ) -> SlotRecord {
        let mut record = SlotRecord::new(item, slot);
        let mut step = SlotStep::Check;

        loop {
            debug!(item = %item, %slot, step = step.name(), "Slot step");
            step = match step {
                SlotStep::Check => {
                    record.detected = self.server.artwork_state(item, slot).await;
                    if record.detected.needs_repair() {
                        SlotStep::NeedsRepair
                    } else {
                        if self.settings.backup_healthy {
                            self.mirror_healthy(item, slot, &mut record).await;
                        }
                        SlotStep::Done(RepairOutcome::AlreadyOk)
                    }
                }

                SlotStep::NeedsRepair => SlotStep::TryBackup,

                SlotStep::TryBackup => match self.backups.find(item.kind, &item.title, slot) {
                    Some(path) => match self.backups.read(&path) {
                        Ok(data) => {
                            record.action = RepairAction::RestoreFromBackup;
                            record.note(format!("backup {}", path.display()));
                            SlotStep::Upload {
                                data: Bytes::from(data),
                            }
                        }
                        Err(e) => {
                            warn!("Unreadable backup {}: {}", path.display(), e);
                            record.note(format!("unreadable backup {}: {}", path.display(), e));
                            SlotStep::TryProvider
                        }
                    },
                    None => SlotStep::TryProvider,
                },

                SlotStep::TryProvider => match self.provider_image(item, slot, lookup).await {
                    Ok(data) => {
                        record.action = RepairAction::RestoreFromProvider;
                        SlotStep::SaveBackup { data }
                    }
                    Err(e) => {
                        record.note(e.to_string());
                        SlotStep::Done(RepairOutcome::NotFound)
                    }
                },

                SlotStep::SaveBackup { data } => {
                    if self.settings.dry_run {
                        let path = self.backups.path_for(
                            item.kind,
                            &item.title,
                            slot,
                            crate::backup::image_extension(&data),
                        );
                        record.note(format!("would write backup {}", path.display()));
                        SlotStep::Upload { data }
                    } else {
                        match self.backups.write(item.kind, &item.title, slot, &data) {
                            Ok(path) => {
                                record.note(format!("saved backup {}", path.display()));
                                SlotStep::Upload { data }
                            }
                            Err(e) => {
                                record.note(e.to_string());
                                SlotStep::Done(RepairOutcome::BackupFailed)
                            }
                        }
                    }
                }

                SlotStep::Upload { data } => {
                    if self.settings.dry_run {
                        if self.settings.enable_upload {
                            record.note("would upload");
                        }
                        SlotStep::Done(RepairOutcome::DryRunSkipped)
                    } else if !self.settings.enable_upload {
                        record.note("upload disabled");
                        SlotStep::Done(record.action.restored_outcome())
                    } else {
                        match self.server.upload_artwork(item, slot, data).await {
                            Ok(()) => {
                                record.note("uploaded");
                                SlotStep::Done(record.action.restored_outcome())
                            }
                            Err(e) => {
                                record.note(e.to_string());
                                SlotStep::Done(RepairOutcome::UploadFailed)
                            }
                        }
                    }
                }

                SlotStep::Done(outcome) => {
                    record.outcome = outcome;
                    return record;
                }
            };
        }
    }

    /// Fetch the provider image for `slot`, resolving the item's match once.
    ///
    /// Every way of coming back empty-handed is an error for the record,
    /// [`Error::NotFound`] when the provider simply has nothing.
    async fn provider_image(
        &self,
        item: &LibraryItem,
        slot: ArtworkSlot,
        lookup: &mut ProviderLookup,
    ) -> Result<Bytes> {
        let name = self.provider.name();

        if matches!(lookup, ProviderLookup::Pending) {
            *lookup = match self.resolve_match(item).await {
                Ok(found) => ProviderLookup::Resolved(found),
                Err(e) => {
                    warn!(item = %item, "{} lookup failed: {}", name, e);
                    ProviderLookup::Failed(e.to_string())
                }
            };
        }

        let found = match &*lookup {
            ProviderLookup::Resolved(Some(found)) => found,
            ProviderLookup::Failed(reason) => {
                return Err(Error::not_found(format!("{} lookup failed: {}", name, reason)))
            }
            ProviderLookup::Resolved(None) | ProviderLookup::Pending => {
                return Err(Error::not_found(format!("no {} match for '{}'", name, item.title)))
            }
        };

        debug!(
            item = %item,
            provider_id = %found.id,
            confidence = found.confidence,
            "Using provider match"
        );
        self.provider
            .fetch_image(found, slot)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("{} match {} has no {} image", name, found.id, slot))
            })
    }

    async fn resolve_match(&self, item: &LibraryItem) -> Result<Option<ProviderMatch>> {
        if let Some(id) = item.provider_id {
            if let Some(found) = self.provider.lookup(id, item.kind).await? {
                return Ok(Some(found));
            }
            debug!(item = %item, id, "Provider id unknown upstream, searching by title");
        }
        self.provider.search(&item.title, item.kind, item.year).await
    }

    /// Copy healthy server artwork into the backup store when no backup exists.
    async fn mirror_healthy(&self, item: &LibraryItem, slot: ArtworkSlot, record: &mut SlotRecord) {
        if self.backups.find(item.kind, &item.title, slot).is_some() {
            return;
        }

        match self.server.download_artwork(item, slot).await {
            Ok(Some(data)) if self.settings.dry_run => {
                let path = self.backups.path_for(
                    item.kind,
                    &item.title,
                    slot,
                    crate::backup::image_extension(&data),
                );
                record.note(format!("would mirror to {}", path.display()));
            }
            Ok(Some(data)) => match self.backups.write(item.kind, &item.title, slot, &data) {
                Ok(path) => record.note(format!("mirrored to {}", path.display())),
                Err(e) => record.note(e.to_string()),
            },
            Ok(None) => {}
            Err(e) => record.note(format!("mirror download failed: {}", e)),
        }
    }
}
