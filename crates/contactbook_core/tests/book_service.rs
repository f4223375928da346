use contactbook_core::{
    BookService, EntityStore, HistoryDirection, HistoryError, ServiceError, StoreListener,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct CountingListener {
    seen: Rc<RefCell<Vec<usize>>>,
}

impl StoreListener for CountingListener {
    fn on_store_changed(&mut self, store: &EntityStore) {
        self.seen.borrow_mut().push(store.person_count());
    }
}

const ADD_AMY: &str = "add n/Amy Bee p/11111111 e/amy@example.com a/Block 312";
const ADD_BOB: &str = "add n/Bob Choo p/22222222 e/bob@example.com a/Block 123 t/friend";

#[test]
fn executes_lines_and_notifies_listeners_on_every_change() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut service = BookService::new(EntityStore::new());
    service.subscribe(Box::new(CountingListener { seen: seen.clone() }));

    let outcome = service.execute_line(ADD_AMY).unwrap();
    assert!(outcome.mutated);
    assert!(outcome.feedback.starts_with("New person added: Amy Bee"));
    service.execute_line(ADD_BOB).unwrap();

    let outcome = service.execute_line("undo").unwrap();
    assert_eq!(outcome.feedback, "Undo success: add person Bob Choo");
    let outcome = service.execute_line("redo").unwrap();
    assert!(outcome.feedback.starts_with("Redo success: New person added: Bob Choo"));

    assert_eq!(*seen.borrow(), vec![1, 2, 1, 2]);
}

#[test]
fn failures_do_not_notify_or_record() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut service = BookService::new(EntityStore::new());
    service.subscribe(Box::new(CountingListener { seen: seen.clone() }));

    service.execute_line(ADD_AMY).unwrap();
    let err = service.execute_line(ADD_AMY).unwrap_err();
    assert!(matches!(err, ServiceError::Command(_)));
    assert!(!err.is_fatal());

    let err = service.execute_line("delete 9").unwrap_err();
    assert!(matches!(err, ServiceError::Parse(_)));

    assert_eq!(service.history().undo_depth(), 1);
    assert_eq!(*seen.borrow(), vec![1]);
}

#[test]
fn empty_history_is_a_user_error() {
    let mut service = BookService::new(EntityStore::new());
    let err = service.execute_line("undo").unwrap_err();
    assert_eq!(
        err,
        ServiceError::History(HistoryError::Empty(HistoryDirection::Undo))
    );
    assert!(!err.is_fatal());
    assert_eq!(err.to_string(), "No more commands to undo!");
}

#[test]
fn read_only_instructions_leave_store_alone() {
    let mut service = BookService::new(EntityStore::new());
    service.execute_line(ADD_AMY).unwrap();
    service
        .execute_line("eventadd n/Demo s/100 d/show and tell")
        .unwrap();
    service.execute_line("join 1 1").unwrap();

    let listing = service.execute_line("list").unwrap();
    assert!(!listing.mutated);
    assert!(listing.feedback.contains("1. Amy Bee"));
    assert!(listing.feedback.contains("Participants: [Amy Bee]"));

    let history = service.execute_line("history").unwrap();
    assert!(history.feedback.contains("Undoable (3)"));

    let exit = service.execute_line("exit").unwrap();
    assert!(exit.exit);
    assert!(!exit.mutated);
}

#[test]
fn delete_cascade_round_trips_through_service() {
    let mut service = BookService::new(EntityStore::new());
    service.execute_line(ADD_AMY).unwrap();
    service.execute_line(ADD_BOB).unwrap();
    service.execute_line("eventadd n/Demo s/100").unwrap();
    service.execute_line("eventadd n/Retro s/200").unwrap();
    service.execute_line("join 2 1").unwrap();
    service.execute_line("join 1 1").unwrap();
    service.execute_line("join 1 2").unwrap();
    let before = service.snapshot();

    service.execute_line("delete 1").unwrap();
    assert_eq!(service.store().person_count(), 1);
    service.execute_line("undo").unwrap();
    assert_eq!(service.snapshot(), before);

    service.execute_line("clear").unwrap();
    assert!(service.store().is_empty());
    service.execute_line("undo").unwrap();
    assert_eq!(service.snapshot(), before);
}

#[test]
fn separate_services_do_not_share_history() {
    let mut first = BookService::new(EntityStore::new());
    let mut second = BookService::new(EntityStore::new());
    first.execute_line(ADD_AMY).unwrap();

    assert!(first.history().can_undo());
    assert!(!second.history().can_undo());
    assert!(second.undo().is_err());
}
