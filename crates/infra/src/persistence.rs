//! Flat-file persistence: one text file per entity kind, one record per line.
//!
//! Loading is forgiving: a line that fails to decode, or that clashes with a
//! record already loaded, is skipped with a warning and loading continues.
//! Saving rewrites whole files through sibling temporary files; the renames
//! happen only once every temporary file has been written.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use eventdesk_auth::User;
use eventdesk_core::{DomainResult, EntityKind};
use eventdesk_events::{Attendee, Event};
use eventdesk_inventory::{InventoryItem, ReconcileReport};

use crate::codec::LineCodec;
use crate::store::EntityStore;

/// A persisted line that was not loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub kind: EntityKind,
    /// 1-based.
    pub line_no: usize,
    pub reason: String,
}

/// Outcome of [`DataFiles::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub users: usize,
    pub events: usize,
    pub attendees: usize,
    pub items: usize,
    pub skipped: Vec<SkippedLine>,
    pub reconcile: ReconcileReport,
}

/// The four data files inside one directory.
#[derive(Debug, Clone)]
pub struct DataFiles {
    dir: PathBuf,
}

impl DataFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(file_name(kind))
    }

    /// Load every collection, then reconcile allocations and re-seed ids.
    ///
    /// Missing files count as empty. Only I/O failures are errors.
    pub fn load(&self) -> anyhow::Result<(EntityStore, LoadReport)> {
        let mut store = EntityStore::new();
        let mut report = LoadReport::default();

        report.users = self.load_kind::<User>(&mut report.skipped, |u| store.insert_user(u))?;
        report.events = self.load_kind::<Event>(&mut report.skipped, |e| store.insert_event(e))?;
        report.items =
            self.load_kind::<InventoryItem>(&mut report.skipped, |i| store.insert_item(i))?;
        report.attendees =
            self.load_kind::<Attendee>(&mut report.skipped, |a| store.insert_attendee(a))?;

        report.reconcile = store.reconcile_allocations();
        log_reconcile(&report.reconcile);
        store.reseed_identities();

        info!(
            dir = %self.dir.display(),
            users = report.users,
            events = report.events,
            attendees = report.attendees,
            items = report.items,
            skipped = report.skipped.len(),
            "store loaded"
        );
        Ok((store, report))
    }

    /// Rewrite the file holding `kind`.
    pub fn save(&self, store: &EntityStore, kind: EntityKind) -> anyhow::Result<()> {
        self.save_kinds(store, &[kind])
    }

    pub fn save_all(&self, store: &EntityStore) -> anyhow::Result<()> {
        self.save_kinds(store, &EntityKind::ALL)
    }

    /// Rewrite the files holding `kinds` together.
    ///
    /// Every temporary file is written before any of them is renamed into
    /// place; if one write fails, the others are removed and no data file
    /// changes.
    pub fn save_kinds(&self, store: &EntityStore, kinds: &[EntityKind]) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create data directory at {:?}", self.dir))?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            match self.stage(store, kind) {
                Ok(paths) => staged.push(paths),
                Err(err) => {
                    for (tmp, _) in &staged {
                        let _ = std::fs::remove_file(tmp);
                    }
                    return Err(err);
                }
            }
        }

        for (tmp, path) in staged {
            std::fs::rename(&tmp, &path)
                .with_context(|| format!("failed to move {:?} into place", path))?;
            debug!(file = %path.display(), "saved");
        }
        Ok(())
    }

    /// Write `kind` to its temporary sibling; returns `(tmp, final)` paths.
    fn stage(&self, store: &EntityStore, kind: EntityKind) -> anyhow::Result<(PathBuf, PathBuf)> {
        let contents = match kind {
            EntityKind::User => encode_all(store.users()),
            EntityKind::Event => encode_all(store.events()),
            EntityKind::Attendee => encode_all(store.attendees()),
            EntityKind::Item => encode_all(store.inventory()),
        };

        let path = self.path(kind);
        let tmp = path.with_extension("txt.tmp");
        std::fs::write(&tmp, contents).with_context(|| format!("failed to write {:?}", tmp))?;
        Ok((tmp, path))
    }

    fn load_kind<T: LineCodec>(
        &self,
        skipped: &mut Vec<SkippedLine>,
        mut insert: impl FnMut(T) -> DomainResult<()>,
    ) -> anyhow::Result<usize> {
        let path = self.path(T::KIND);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(file = %path.display(), "data file missing; starting empty");
                return Ok(0);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {:?}", path));
            }
        };

        let mut loaded = 0;
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let outcome = T::decode(line)
                .map_err(|e| e.to_string())
                .and_then(|record| insert(record).map_err(|e| e.to_string()));
            match outcome {
                Ok(()) => loaded += 1,
                Err(reason) => {
                    warn!(
                        file = %path.display(),
                        line = line_no,
                        error = %reason,
                        "skipping unreadable record"
                    );
                    skipped.push(SkippedLine {
                        kind: T::KIND,
                        line_no,
                        reason,
                    });
                }
            }
        }
        Ok(loaded)
    }
}

fn encode_all<T: LineCodec>(records: &[T]) -> String {
    let mut contents = String::new();
    for record in records {
        contents.push_str(&record.encode());
        contents.push('\n');
    }
    contents
}

fn file_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users.txt",
        EntityKind::Event => "events.txt",
        EntityKind::Attendee => "attendees.txt",
        EntityKind::Item => "inventory.txt",
    }
}

fn log_reconcile(report: &ReconcileReport) {
    for (event, item, qty) in &report.dangling {
        warn!(%event, %item, qty, "dropped allocation for unknown inventory item");
    }
    for (item, stored, recomputed) in &report.corrected {
        warn!(%item, stored, recomputed, "allocated quantity did not match events; corrected");
    }
    for item in &report.raised_totals {
        warn!(%item, "events hold more than the item total; total raised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventdesk_auth::Role;
    use eventdesk_core::{AttendeeId, Entity, EventId, ItemId, UserId};
    use eventdesk_events::EventDraft;
    use eventdesk_inventory::AllocationEngine;

    use crate::coordinator::IntegrityCoordinator;
    use tempfile::tempdir;

    fn draft(name: &str) -> EventDraft {
        EventDraft {
            name: name.to_string(),
            date: "2025-05-20".to_string(),
            time: "14:00".to_string(),
            location: "Room | 2".to_string(),
            description: "two\nlines".to_string(),
            category: "Workshop".to_string(),
            capacity: 30,
        }
    }

    #[test]
    fn missing_files_load_as_empty_store() {
        let dir = tempdir().unwrap();
        let (store, report) = DataFiles::new(dir.path().join("nowhere")).load().unwrap();

        assert!(store.users().is_empty());
        assert!(store.events().is_empty());
        assert_eq!(report, LoadReport::default());
        assert_eq!(store.ids().peek(EntityKind::User), 1);
    }

    #[test]
    fn save_then_load_reproduces_store_and_continues_ids() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());

        let mut store = EntityStore::new();
        store.create_user("admin", "admin123", Role::Admin).unwrap();
        let carol = store.create_user("carol", "secret1", Role::RegularUser).unwrap();
        let event = store.create_event(draft("Rust meetup")).unwrap();
        let item = store.create_inventory_item("Chairs", 40, "folding").unwrap();
        let guest = store.create_guest_attendee("Guest", "g@example.com", Some(event)).unwrap();
        {
            let (chairs, meetup) = store.item_and_event_mut(item, event).unwrap();
            AllocationEngine::allocate(chairs, meetup, 12).unwrap();
            meetup.add_attendee(guest);
            meetup.add_attendee(AttendeeId::from(carol));
        }
        files.save_all(&store).unwrap();

        let (mut loaded, report) = files.load().unwrap();
        assert!(report.skipped.is_empty());
        assert!(report.reconcile.is_clean());
        assert_eq!(loaded.users(), store.users());
        assert_eq!(loaded.events(), store.events());
        assert_eq!(loaded.attendees(), store.attendees());
        assert_eq!(loaded.inventory(), store.inventory());

        // User 3 would bridge into the guest's attendee record, so it is skipped.
        let next_user = loaded.create_user("dave", "secret2", Role::RegularUser).unwrap();
        assert_eq!(next_user, UserId::new(4));
        let next_event = loaded.create_event(draft("Another")).unwrap();
        assert_eq!(next_event, EventId::new(2));
        let next_item = loaded.create_inventory_item("Tables", 5, "").unwrap();
        assert_eq!(next_item, ItemId::new(2));
    }

    #[test]
    fn bad_inventory_line_is_skipped_and_rest_loads() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());
        std::fs::write(
            files.path(EntityKind::Item),
            "1|5|0|Projector|HD\n2|lots|0|Chairs|\n3|10|0|Tables|\n",
        )
        .unwrap();

        let (store, report) = files.load().unwrap();

        assert_eq!(report.items, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].kind, EntityKind::Item);
        assert_eq!(report.skipped[0].line_no, 2);
        assert!(store.find_item_by_name("Projector").is_some());
        assert!(store.find_item_by_name("Tables").is_some());
        assert!(store.find_item_by_name("Chairs").is_none());
        assert_eq!(store.ids().peek(EntityKind::Item), 4);
    }

    #[test]
    fn duplicate_records_are_skipped() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());
        std::fs::write(
            files.path(EntityKind::User),
            "1|1|admin|admin123\n2|0|admin|other12\n1|0|bob|secret1\n",
        )
        .unwrap();

        let (store, report) = files.load().unwrap();
        assert_eq!(store.users().len(), 1);
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn load_reconciles_counters_against_events() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());
        std::fs::write(
            files.path(EntityKind::Event),
            "1|0|2025-05-20|14:00|40||7:3;9:2|Gala|||\n",
        )
        .unwrap();
        std::fs::write(files.path(EntityKind::Item), "7|2|0|Projector|\n").unwrap();

        let (store, report) = files.load().unwrap();

        let projector = store.find_item(ItemId::new(7)).unwrap();
        assert_eq!(projector.allocated_quantity(), 3);
        assert_eq!(projector.total_quantity(), 3);
        assert_eq!(report.reconcile.dangling, vec![(EventId::new(1), ItemId::new(9), 2)]);
        assert_eq!(report.reconcile.raised_totals, vec![ItemId::new(7)]);

        let gala = store.find_event(EventId::new(1)).unwrap();
        assert_eq!(gala.allocations().get(ItemId::new(9)), 0);
        assert!(store.conservation_violations().is_empty());
        assert_eq!(gala.id(), EventId::new(1));
    }

    #[test]
    fn over_allocated_item_loads_and_is_repaired() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());
        std::fs::write(
            files.path(EntityKind::Event),
            "1|0|2025-05-20|14:00|40||7:4|Gala|||\n",
        )
        .unwrap();
        std::fs::write(files.path(EntityKind::Item), "7|2|9|Projector|\n").unwrap();

        let (store, report) = files.load().unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.items, 1);
        let projector = store.find_item(ItemId::new(7)).unwrap();
        assert_eq!(projector.allocated_quantity(), 4);
        assert_eq!(projector.total_quantity(), 4);
        assert_eq!(report.reconcile.corrected, vec![(ItemId::new(7), 9, 4)]);
        assert!(store.conservation_violations().is_empty());
    }

    #[test]
    fn save_leaves_no_temporary_file() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());
        let mut store = EntityStore::new();
        store.create_user("admin", "admin123", Role::Admin).unwrap();

        files.save(&store, EntityKind::User).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["users.txt".to_string()]);
        assert_eq!(
            std::fs::read_to_string(files.path(EntityKind::User)).unwrap(),
            "1|1|admin|admin123\n"
        );
    }

    #[test]
    fn failed_write_leaves_every_file_as_it_was() {
        let dir = tempdir().unwrap();
        let files = DataFiles::new(dir.path());
        let mut store = EntityStore::new();
        let gala = store.create_event(draft("Gala")).unwrap();
        let chairs = store.create_inventory_item("Chairs", 10, "").unwrap();
        IntegrityCoordinator::allocate(&mut store, chairs, gala, 4).unwrap();
        files.save_all(&store).unwrap();
        let events_before = std::fs::read_to_string(files.path(EntityKind::Event)).unwrap();

        // A directory squatting on the temporary path makes the write fail.
        std::fs::create_dir(files.path(EntityKind::Item).with_extension("txt.tmp")).unwrap();
        IntegrityCoordinator::delete_event(&mut store, gala).unwrap();
        let err = files
            .save_kinds(&store, &[EntityKind::Event, EntityKind::Item])
            .unwrap_err();
        assert!(format!("{err:#}").contains("inventory.txt.tmp"));

        assert_eq!(
            std::fs::read_to_string(files.path(EntityKind::Event)).unwrap(),
            events_before
        );
        assert!(!files.path(EntityKind::Event).with_extension("txt.tmp").exists());

        let (reloaded, _) = files.load().unwrap();
        assert!(reloaded.find_event(gala).is_some());
        assert_eq!(reloaded.find_item(chairs).unwrap().allocated_quantity(), 4);
    }
}
