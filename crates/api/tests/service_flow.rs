use eventdesk_api::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, EventDesk, ServiceError};
use eventdesk_auth::Role;
use eventdesk_core::{AttendeeId, DomainError, Entity};
use eventdesk_events::{EventDraft, EventPatch, EventStatus};
use eventdesk_infra::{EntityStore, StoreConfig};

fn draft(name: &str, date: &str) -> EventDraft {
    EventDraft {
        name: name.to_string(),
        date: date.to_string(),
        time: "09:00".to_string(),
        location: "Hall A".to_string(),
        description: "Talks | demos".to_string(),
        category: "Conference".to_string(),
        capacity: 50,
    }
}

fn open(dir: &std::path::Path) -> EventDesk {
    let (desk, report) = EventDesk::open(&StoreConfig::new(dir)).unwrap();
    assert!(report.skipped.is_empty(), "unexpected skipped lines: {:?}", report.skipped);
    desk
}

fn in_memory_with_admin() -> EventDesk {
    let mut store = EntityStore::new();
    store.create_user("admin", "admin123", Role::Admin).unwrap();
    EventDesk::from_store(store)
}

#[test]
fn empty_directory_seeds_default_admin() {
    let dir = tempfile::tempdir().unwrap();
    let desk = open(dir.path());

    let admin = desk
        .authenticate(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(dir.path().join("users.txt").exists());
}

#[test]
fn seeding_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        data_dir: dir.path().to_path_buf(),
        seed_default_admin: false,
    };
    let (desk, _) = EventDesk::open(&config).unwrap();

    let err = desk
        .authenticate(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Auth(_)));
}

#[test]
fn projector_allocation_scenario() {
    let desk = in_memory_with_admin();
    let admin = desk.authenticate("admin", "admin123").unwrap();

    let event = desk.create_event(&admin, draft("Launch", "2025-04-01")).unwrap();
    let projector = desk.create_inventory_item(&admin, "Projector", 5, "").unwrap();

    desk.allocate(&admin, projector, event, 5).unwrap();
    let item = desk.find_item_by_name(&admin, "projector").unwrap().unwrap();
    assert_eq!(item.available_quantity(), 0);

    let err = desk.allocate(&admin, projector, event, 1).unwrap_err();
    match err {
        ServiceError::Domain(DomainError::InsufficientInventory { requested, available }) => {
            assert_eq!((requested, available), (1, 0));
        }
        other => panic!("expected InsufficientInventory, got {other:?}"),
    }

    let released = desk.deallocate(&admin, projector, event, 2).unwrap();
    assert_eq!(released, 2);
    let item = desk.find_item_by_name(&admin, "Projector").unwrap().unwrap();
    assert_eq!(item.allocated_quantity(), 3);
    assert_eq!(item.available_quantity(), 2);
    assert!(desk.conservation_violations().is_empty());
}

#[test]
fn state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (event, chairs, carol_attendee) = {
        let desk = open(dir.path());
        let admin = desk.authenticate("admin", "admin123").unwrap();
        desk.create_user(&admin, "carol", "secret1", Role::RegularUser).unwrap();
        let carol = desk.authenticate("carol", "secret1").unwrap();

        let event = desk.create_event(&admin, draft("Summit", "2025-06-10")).unwrap();
        let chairs = desk.create_inventory_item(&admin, "Chairs", 100, "stackable").unwrap();
        desk.allocate(&admin, chairs, event, 60).unwrap();
        let reg = desk.register_self(&carol, event, "carol@example.com").unwrap();
        desk.register_guest(&admin, event, "Visitor", "").unwrap();
        assert!(desk.check_in(&admin, reg.attendee_id, event).unwrap());
        (event, chairs, reg.attendee_id)
    };

    let desk = open(dir.path());
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let carol = desk.authenticate("carol", "secret1").unwrap();
    assert_eq!(carol_attendee, AttendeeId::from(carol.user_id));

    let summit = desk.find_event(&admin, event).unwrap().unwrap();
    assert_eq!(summit.attendees().len(), 2);
    assert_eq!(summit.allocations().get(chairs), 60);
    assert_eq!(summit.details().description, "Talks | demos");

    let mine = desk.my_registrations(&carol).unwrap();
    assert_eq!(mine.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![event]);

    let attendance = desk.attendance_report(&admin).unwrap();
    assert_eq!(attendance[0].total_attendees, 2);
    assert_eq!(attendance[0].checked_in, 1);

    // Ids keep counting past what was loaded.
    let next = desk.create_event(&admin, draft("Follow-up", "2025-06-11")).unwrap();
    assert!(next.get() > event.get());
}

#[test]
fn deleting_an_event_frees_its_stock_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let chairs = {
        let desk = open(dir.path());
        let admin = desk.authenticate("admin", "admin123").unwrap();
        let event = desk.create_event(&admin, draft("Gala", "2025-12-01")).unwrap();
        let chairs = desk.create_inventory_item(&admin, "Chairs", 10, "").unwrap();
        desk.allocate(&admin, chairs, event, 7).unwrap();
        desk.register_guest(&admin, event, "Pat", "").unwrap();

        let removed = desk.delete_event(&admin, event).unwrap();
        assert_eq!(removed.id(), event);
        chairs
    };

    let desk = open(dir.path());
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let inventory = desk.list_inventory(&admin).unwrap();
    let item = inventory.iter().find(|i| i.id() == chairs).unwrap();
    assert_eq!(item.allocated_quantity(), 0);
    assert!(desk.list_events(&admin).unwrap().is_empty());
    assert!(desk.conservation_violations().is_empty());
}

#[test]
fn closed_events_refuse_registration() {
    let desk = {
        let dir = tempfile::tempdir().unwrap();
        let desk = open(dir.path());
        // Detach from the directory so the test only exercises policy.
        EventDesk::from_store(desk.snapshot())
    };
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let event = desk.create_event(&admin, draft("Done", "2024-01-01")).unwrap();
    desk.update_event(
        &admin,
        event,
        EventPatch {
            status: Some(EventStatus::Completed),
            ..EventPatch::default()
        },
    )
    .unwrap();

    let err = desk.register_guest(&admin, event, "Late", "").unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::PolicyViolation(_))));
    assert!(desk.find_event(&admin, event).unwrap().unwrap().attendees().is_empty());
}

#[test]
fn failed_save_rolls_back_the_change() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let desk = open(&data);
    let admin = desk.authenticate("admin", "admin123").unwrap();

    // Replace the data directory with a plain file so the next save fails.
    std::fs::remove_dir_all(&data).unwrap();
    std::fs::write(&data, "not a directory").unwrap();

    let err = desk.create_inventory_item(&admin, "Tents", 4, "").unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert!(desk.list_inventory(&admin).unwrap().is_empty());
}

#[test]
fn export_renders_attendee_list() {
    let desk = in_memory_with_admin();
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let event = desk.create_event(&admin, draft("Workshop", "2025-02-02")).unwrap();
    let guest = desk.register_guest(&admin, event, "Robin", "robin@example.com").unwrap();
    desk.check_in(&admin, guest.attendee_id, event).unwrap();

    let doc = desk.export_attendee_list(&admin, event).unwrap();
    assert!(doc.contains("Robin\trobin@example.com\tYes"));
    assert!(doc.ends_with("Total attendees: 1\n"));

    let found = desk.search_events(&admin, "2025-02").unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn users_created_after_guests_do_not_inherit_their_registrations() {
    let desk = in_memory_with_admin();
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let event = desk.create_event(&admin, draft("Meetup", "2025-03-03")).unwrap();
    let guest = desk.register_guest(&admin, event, "Sam", "sam@example.com").unwrap();

    let carol_id = desk.create_user(&admin, "carol", "secret1", Role::RegularUser).unwrap();
    let carol = desk.authenticate("carol", "secret1").unwrap();
    assert_ne!(AttendeeId::from(carol_id), guest.attendee_id);

    assert!(desk.my_registrations(&carol).unwrap().is_empty());
    let err = desk
        .update_contact_info(&carol, guest.attendee_id, "carol@example.com")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[test]
fn users_created_after_a_restart_skip_a_deleted_users_attendee() {
    let dir = tempfile::tempdir().unwrap();
    let event = {
        let desk = open(dir.path());
        let admin = desk.authenticate("admin", "admin123").unwrap();
        desk.create_user(&admin, "carol", "secret1", Role::RegularUser).unwrap();
        let carol = desk.authenticate("carol", "secret1").unwrap();
        let event = desk.create_event(&admin, draft("Summit", "2025-06-10")).unwrap();
        desk.register_self(&carol, event, "carol@example.com").unwrap();
        desk.delete_user(&admin, "carol").unwrap();
        event
    };

    let desk = open(dir.path());
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let dave_id = desk.create_user(&admin, "dave", "secret2", Role::RegularUser).unwrap();
    let dave = desk.authenticate("dave", "secret2").unwrap();

    let summit = desk.find_event(&admin, event).unwrap().unwrap();
    assert_eq!(summit.attendees().len(), 1);
    assert!(!summit.has_attendee(AttendeeId::from(dave_id)));
    assert!(desk.my_registrations(&dave).unwrap().is_empty());
}

#[test]
fn failed_multi_file_save_keeps_disk_and_memory_in_step() {
    let dir = tempfile::tempdir().unwrap();
    let (event, chairs) = {
        let desk = open(dir.path());
        let admin = desk.authenticate("admin", "admin123").unwrap();
        let event = desk.create_event(&admin, draft("Gala", "2025-12-01")).unwrap();
        let chairs = desk.create_inventory_item(&admin, "Chairs", 10, "").unwrap();
        desk.allocate(&admin, chairs, event, 4).unwrap();

        // The event file could be written, the inventory file cannot.
        std::fs::create_dir(dir.path().join("inventory.txt.tmp")).unwrap();
        let err = desk.delete_event(&admin, event).unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(desk.find_event(&admin, event).unwrap().is_some());
        (event, chairs)
    };

    let desk = open(dir.path());
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let gala = desk.find_event(&admin, event).unwrap().unwrap();
    assert_eq!(gala.allocations().get(chairs), 4);
    let item = desk.find_item_by_name(&admin, "Chairs").unwrap().unwrap();
    assert_eq!(item.allocated_quantity(), 4);
    assert!(desk.conservation_violations().is_empty());
}

#[test]
fn capacity_limits_registration_and_can_be_raised() {
    let desk = in_memory_with_admin();
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let event = desk
        .create_event(
            &admin,
            EventDraft {
                capacity: 1,
                ..draft("Masterclass", "2025-08-08")
            },
        )
        .unwrap();
    desk.create_user(&admin, "carol", "secret1", Role::RegularUser).unwrap();
    let carol = desk.authenticate("carol", "secret1").unwrap();

    desk.register_self(&carol, event, "carol@example.com").unwrap();
    let err = desk.register_guest(&admin, event, "Extra", "").unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::PolicyViolation(_))));
    let again = desk.register_self(&carol, event, "").unwrap();
    assert!(!again.newly_added);

    let err = desk
        .update_event(
            &admin,
            event,
            EventPatch {
                capacity: Some(0),
                ..EventPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

    desk.update_event(
        &admin,
        event,
        EventPatch {
            capacity: Some(2),
            ..EventPatch::default()
        },
    )
    .unwrap();
    desk.register_guest(&admin, event, "Extra", "").unwrap();
    let masterclass = desk.find_event(&admin, event).unwrap().unwrap();
    assert_eq!(masterclass.attendees().len(), 2);
    assert!(masterclass.is_full());
}

#[test]
fn exports_render_every_record() {
    let desk = in_memory_with_admin();
    let admin = desk.authenticate("admin", "admin123").unwrap();
    let event = desk.create_event(&admin, draft("Expo", "2025-05-05")).unwrap();
    let chairs = desk.create_inventory_item(&admin, "Chairs", 8, "folding").unwrap();
    desk.allocate(&admin, chairs, event, 3).unwrap();
    desk.register_guest(&admin, event, "Robin", "robin@example.com").unwrap();

    let events = desk.export_events(&admin).unwrap();
    assert!(events.starts_with("Events Export - "));
    assert!(events.contains("Name: Expo\nDate: 2025-05-05\nTime: 09:00\nLocation: Hall A\n"));
    assert!(events.contains("Status: Upcoming\n"));

    let attendees = desk.export_attendees(&admin).unwrap();
    assert!(attendees.contains("Name: Robin\nContact Info: robin@example.com\nEvent: Expo\n"));

    let inventory = desk.export_inventory(&admin).unwrap();
    assert!(inventory.contains("Quantity: 8\nAllocated: 3\nAvailable: 5\n"));
    assert!(inventory.contains("Allocated Events: Expo (3)\n"));
}
