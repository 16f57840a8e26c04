//! The `EventDesk` facade: authorization, locking and persistence around the core.
//!
//! Every operation takes the caller's [`Principal`] explicitly and checks it
//! against the role policy before touching the store. Mutations run under one
//! store-wide lock together with the save that follows them; if the save
//! fails the in-memory change is rolled back.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use eventdesk_auth::{Permission, Principal, Role, User, authenticate, authorize};
use eventdesk_core::{AttendeeId, DomainResult, EntityKind, EventId, ItemId, UserId};
use eventdesk_events::{Attendee, Event, EventDraft, EventPatch};
use eventdesk_infra::{
    ConservationViolation, DataFiles, EntityStore, IntegrityCoordinator, LoadReport, Registrant,
    Registration, StoreConfig,
};
use eventdesk_inventory::InventoryItem;

use crate::errors::ServiceResult;
use crate::reports::{self, AttendanceRow, InventoryRow};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

struct Inner {
    store: EntityStore,
    files: Option<DataFiles>,
}

/// One event-management store, shared by however many sessions hold it.
pub struct EventDesk {
    inner: Mutex<Inner>,
}

impl EventDesk {
    /// Load the store from `config.data_dir`, seeding the default admin when
    /// no users exist and seeding is enabled.
    pub fn open(config: &StoreConfig) -> anyhow::Result<(Self, LoadReport)> {
        let files = DataFiles::new(config.data_dir.clone());
        let (mut store, report) = files.load()?;

        if store.users().is_empty() && config.seed_default_admin {
            store.create_user(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, Role::Admin)?;
            files.save(&store, EntityKind::User)?;
            warn!(
                username = DEFAULT_ADMIN_USERNAME,
                "no users found; seeded default admin account"
            );
        }

        let desk = Self {
            inner: Mutex::new(Inner {
                store,
                files: Some(files),
            }),
        };
        Ok((desk, report))
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::from_store(EntityStore::new())
    }

    pub fn from_store(store: EntityStore) -> Self {
        Self {
            inner: Mutex::new(Inner { store, files: None }),
        }
    }

    // ── sessions and users ───────────────────────────────────────────────────

    pub fn authenticate(&self, username: &str, password: &str) -> ServiceResult<Principal> {
        let outcome = self.read(|store| authenticate(store.users(), username, password));
        match &outcome {
            Ok(principal) => info!(username, role = %principal.role, "signed in"),
            Err(_) => warn!(username, "failed sign-in attempt"),
        }
        Ok(outcome?)
    }

    pub fn create_user(
        &self,
        caller: &Principal,
        username: &str,
        password: &str,
        role: Role,
    ) -> ServiceResult<UserId> {
        authorize(caller, Permission::ManageUsers)?;
        self.mutate(&[EntityKind::User], |store| {
            store.create_user(username, password, role)
        })
    }

    pub fn delete_user(&self, caller: &Principal, username: &str) -> ServiceResult<()> {
        authorize(caller, Permission::ManageUsers)?;
        self.mutate(&[EntityKind::User], |store| {
            store.delete_user(username, caller).map(|_| ())
        })
    }

    /// Change the caller's own password.
    pub fn change_password(&self, caller: &Principal, new_password: &str) -> ServiceResult<()> {
        authorize(caller, Permission::ManageOwnProfile)?;
        self.mutate(&[EntityKind::User], |store| {
            store.change_password(caller.user_id, new_password)
        })
    }

    pub fn list_users(&self, caller: &Principal) -> ServiceResult<Vec<User>> {
        authorize(caller, Permission::ManageUsers)?;
        Ok(self.read(|store| store.users().to_vec()))
    }

    // ── events ───────────────────────────────────────────────────────────────

    pub fn create_event(&self, caller: &Principal, draft: EventDraft) -> ServiceResult<EventId> {
        authorize(caller, Permission::ManageEvents)?;
        self.mutate(&[EntityKind::Event], |store| store.create_event(draft))
    }

    pub fn update_event(
        &self,
        caller: &Principal,
        event_id: EventId,
        patch: EventPatch,
    ) -> ServiceResult<()> {
        authorize(caller, Permission::ManageEvents)?;
        self.mutate(&[EntityKind::Event], |store| {
            store.update_event(event_id, patch)
        })
    }

    /// Delete an event, returning its allocated stock to inventory first.
    pub fn delete_event(&self, caller: &Principal, event_id: EventId) -> ServiceResult<Event> {
        authorize(caller, Permission::ManageEvents)?;
        self.mutate(&[EntityKind::Event, EntityKind::Item], |store| {
            IntegrityCoordinator::delete_event(store, event_id)
        })
    }

    pub fn list_events(&self, caller: &Principal) -> ServiceResult<Vec<Event>> {
        authorize(caller, Permission::ViewEvents)?;
        Ok(self.read(|store| store.events().to_vec()))
    }

    pub fn find_event(&self, caller: &Principal, event_id: EventId) -> ServiceResult<Option<Event>> {
        authorize(caller, Permission::ViewEvents)?;
        Ok(self.read(|store| store.find_event(event_id).cloned()))
    }

    pub fn find_events_by_name(&self, caller: &Principal, name: &str) -> ServiceResult<Vec<Event>> {
        authorize(caller, Permission::ViewEvents)?;
        Ok(self.read(|store| {
            store.find_events_by_name(name).into_iter().cloned().collect()
        }))
    }

    pub fn search_events(&self, caller: &Principal, keyword: &str) -> ServiceResult<Vec<Event>> {
        authorize(caller, Permission::ViewEvents)?;
        Ok(self.read(|store| store.search_events(keyword).into_iter().cloned().collect()))
    }

    // ── inventory ────────────────────────────────────────────────────────────

    pub fn create_inventory_item(
        &self,
        caller: &Principal,
        name: &str,
        total_quantity: i64,
        description: &str,
    ) -> ServiceResult<ItemId> {
        authorize(caller, Permission::ManageInventory)?;
        self.mutate(&[EntityKind::Item], |store| {
            store.create_inventory_item(name, total_quantity, description)
        })
    }

    pub fn update_inventory_total(
        &self,
        caller: &Principal,
        item_id: ItemId,
        new_total: i64,
    ) -> ServiceResult<()> {
        authorize(caller, Permission::ManageInventory)?;
        self.mutate(&[EntityKind::Item], |store| {
            store.update_inventory_total_quantity(item_id, new_total)
        })
    }

    pub fn update_inventory_description(
        &self,
        caller: &Principal,
        item_id: ItemId,
        description: &str,
    ) -> ServiceResult<()> {
        authorize(caller, Permission::ManageInventory)?;
        self.mutate(&[EntityKind::Item], |store| {
            store.update_inventory_description(item_id, description)
        })
    }

    pub fn list_inventory(&self, caller: &Principal) -> ServiceResult<Vec<InventoryItem>> {
        authorize(caller, Permission::ManageInventory)?;
        Ok(self.read(|store| store.inventory().to_vec()))
    }

    pub fn find_item_by_name(
        &self,
        caller: &Principal,
        name: &str,
    ) -> ServiceResult<Option<InventoryItem>> {
        authorize(caller, Permission::ManageInventory)?;
        Ok(self.read(|store| store.find_item_by_name(name).cloned()))
    }

    pub fn allocate(
        &self,
        caller: &Principal,
        item_id: ItemId,
        event_id: EventId,
        qty: i64,
    ) -> ServiceResult<()> {
        authorize(caller, Permission::ManageInventory)?;
        self.mutate(&[EntityKind::Item, EntityKind::Event], |store| {
            IntegrityCoordinator::allocate(store, item_id, event_id, qty)
        })
    }

    /// Returns the quantity actually released, which may be less than `qty`.
    pub fn deallocate(
        &self,
        caller: &Principal,
        item_id: ItemId,
        event_id: EventId,
        qty: i64,
    ) -> ServiceResult<u32> {
        authorize(caller, Permission::ManageInventory)?;
        self.mutate(&[EntityKind::Item, EntityKind::Event], |store| {
            IntegrityCoordinator::deallocate(store, item_id, event_id, qty)
        })
    }

    // ── attendees ────────────────────────────────────────────────────────────

    /// Register the caller for an event under their own user id.
    pub fn register_self(
        &self,
        caller: &Principal,
        event_id: EventId,
        contact: &str,
    ) -> ServiceResult<Registration> {
        authorize(caller, Permission::SelfRegister)?;
        self.mutate(&[EntityKind::Attendee, EntityKind::Event], |store| {
            IntegrityCoordinator::register_attendee_for_event(
                store,
                caller,
                event_id,
                Registrant::Caller {
                    contact: contact.to_string(),
                },
            )
        })
    }

    /// Register a third party under a newly minted attendee id.
    pub fn register_guest(
        &self,
        caller: &Principal,
        event_id: EventId,
        name: &str,
        contact: &str,
    ) -> ServiceResult<Registration> {
        authorize(caller, Permission::ManageAttendees)?;
        self.mutate(&[EntityKind::Attendee, EntityKind::Event], |store| {
            IntegrityCoordinator::register_attendee_for_event(
                store,
                caller,
                event_id,
                Registrant::Guest {
                    name: name.to_string(),
                    contact: contact.to_string(),
                },
            )
        })
    }

    /// Cancel a registration. Anyone may cancel their own; cancelling someone
    /// else's needs attendee management rights.
    pub fn cancel_registration(
        &self,
        caller: &Principal,
        attendee_id: AttendeeId,
        event_id: EventId,
    ) -> ServiceResult<()> {
        authorize(caller, own_or(caller, attendee_id, Permission::SelfRegister))?;
        self.mutate(&[EntityKind::Attendee, EntityKind::Event], |store| {
            IntegrityCoordinator::cancel_registration(store, attendee_id, event_id)
        })
    }

    /// Returns `false` if the attendee was already checked in.
    pub fn check_in(
        &self,
        caller: &Principal,
        attendee_id: AttendeeId,
        event_id: EventId,
    ) -> ServiceResult<bool> {
        authorize(caller, Permission::ManageAttendees)?;
        self.mutate(&[EntityKind::Attendee], |store| {
            IntegrityCoordinator::check_in(store, attendee_id, event_id)
        })
    }

    pub fn update_contact_info(
        &self,
        caller: &Principal,
        attendee_id: AttendeeId,
        contact: &str,
    ) -> ServiceResult<()> {
        authorize(caller, own_or(caller, attendee_id, Permission::ManageOwnProfile))?;
        self.mutate(&[EntityKind::Attendee], |store| {
            store.update_contact_info(attendee_id, contact)
        })
    }

    pub fn list_attendees(&self, caller: &Principal) -> ServiceResult<Vec<Attendee>> {
        authorize(caller, Permission::ManageAttendees)?;
        Ok(self.read(|store| store.attendees().to_vec()))
    }

    /// Events the caller is registered for under their own id.
    pub fn my_registrations(&self, caller: &Principal) -> ServiceResult<Vec<Event>> {
        authorize(caller, Permission::ViewEvents)?;
        Ok(self.read(|store| reports::registrations_of(store, caller.attendee_id())))
    }

    // ── reports ──────────────────────────────────────────────────────────────

    pub fn attendance_report(&self, caller: &Principal) -> ServiceResult<Vec<AttendanceRow>> {
        authorize(caller, Permission::ViewReports)?;
        Ok(self.read(reports::attendance_report))
    }

    pub fn inventory_report(&self, caller: &Principal) -> ServiceResult<Vec<InventoryRow>> {
        authorize(caller, Permission::ViewReports)?;
        Ok(self.read(reports::inventory_report))
    }

    pub fn export_attendee_list(&self, caller: &Principal, event_id: EventId) -> ServiceResult<String> {
        authorize(caller, Permission::ViewReports)?;
        Ok(self.read(|store| reports::export_attendee_list(store, event_id))?)
    }

    /// Dated plain-text dump of every event; writing it anywhere is up to the caller.
    pub fn export_events(&self, caller: &Principal) -> ServiceResult<String> {
        authorize(caller, Permission::ViewReports)?;
        Ok(self.read(|store| reports::export_events(store, today())))
    }

    pub fn export_attendees(&self, caller: &Principal) -> ServiceResult<String> {
        authorize(caller, Permission::ViewReports)?;
        Ok(self.read(|store| reports::export_attendees(store, today())))
    }

    pub fn export_inventory(&self, caller: &Principal) -> ServiceResult<String> {
        authorize(caller, Permission::ViewReports)?;
        Ok(self.read(|store| reports::export_inventory(store, today())))
    }

    /// Items whose counters disagree with the events; empty on a healthy store.
    pub fn conservation_violations(&self) -> Vec<ConservationViolation> {
        self.read(EntityStore::conservation_violations)
    }

    /// Owned copy of the whole store.
    pub fn snapshot(&self) -> EntityStore {
        self.read(EntityStore::clone)
    }

    // ── plumbing ─────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&EntityStore) -> T) -> T {
        f(&self.lock().store)
    }

    /// Apply `f` and persist `kinds`. On a domain error nothing changed; on a
    /// save error the store is restored to its state before `f`.
    fn mutate<T>(
        &self,
        kinds: &[EntityKind],
        f: impl FnOnce(&mut EntityStore) -> DomainResult<T>,
    ) -> ServiceResult<T> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let Some(files) = inner.files.as_ref() else {
            return Ok(f(&mut inner.store)?);
        };

        let before = inner.store.clone();
        let value = f(&mut inner.store)?;
        if let Err(err) = files.save_kinds(&inner.store, kinds) {
            error!(?kinds, error = %format!("{err:#}"), "save failed; rolling back");
            inner.store = before;
            // Only a failed rename can leave some files ahead of the rest.
            if let Err(restore) = files.save_kinds(&inner.store, kinds) {
                error!(?kinds, error = %format!("{restore:#}"), "could not rewrite previous state");
            }
            return Err(err.into());
        }
        Ok(value)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Acting on one's own attendee record needs `own`; anyone else's needs
/// attendee management.
fn own_or(caller: &Principal, attendee_id: AttendeeId, own: Permission) -> Permission {
    if caller.attendee_id() == attendee_id {
        own
    } else {
        Permission::ManageAttendees
    }
}
