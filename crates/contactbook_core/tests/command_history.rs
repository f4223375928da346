use contactbook_core::{
    Command, CommandError, EntityStore, Event, EventKey, History, HistoryDirection, HistoryError,
    Person, StoreError, Tag,
};
use std::collections::BTreeSet;

fn person(name: &str) -> Person {
    Person::new(name, "87652533", "person@example.com", "10th street").unwrap()
}

fn tagged(name: &str, tags: &[&str]) -> Person {
    let tags: BTreeSet<Tag> = tags.iter().map(|t| Tag::new(t).unwrap()).collect();
    person(name).with_tags(tags)
}

fn event(title: &str, start_ms: i64) -> Event {
    Event::new(title, "", start_ms, None).unwrap()
}

fn names(store: &EntityStore) -> Vec<String> {
    store.persons().map(|p| p.name.clone()).collect()
}

fn run(history: &mut History, store: &mut EntityStore, command: Command) -> String {
    let executed = command.execute(store).unwrap();
    let feedback = executed.feedback().to_string();
    history.record(executed);
    feedback
}

/// Store with two persons, two events and three participation links.
fn populated() -> EntityStore {
    let mut store = EntityStore::new();
    store.add_person(tagged("Carl Kurz", &["friends"])).unwrap();
    store.add_person(tagged("Daniel Meier", &["friends", "owes"])).unwrap();
    store.add_event(event("Picnic", 1_000)).unwrap();
    store.add_event(event("Concert", 500)).unwrap();
    let picnic = EventKey::new("Picnic", 1_000);
    let concert = EventKey::new("Concert", 500);
    store.add_participant("Daniel Meier", &picnic).unwrap();
    store.add_participant("Carl Kurz", &picnic).unwrap();
    store.add_participant("Carl Kurz", &concert).unwrap();
    store
}

fn every_command() -> Vec<Command> {
    let picnic = EventKey::new("Picnic", 1_000);
    vec![
        Command::AddPerson(person("Elle Meyer")),
        Command::DeletePerson {
            name: "Carl Kurz".to_string(),
        },
        Command::EditPerson {
            target: "Carl Kurz".to_string(),
            edited: person("Ida Mueller"),
        },
        Command::ClearAll,
        Command::AddEvent(event("Dinner", 2_000)),
        Command::DeleteEvent {
            key: picnic.clone(),
        },
        Command::EditEvent {
            target: picnic.clone(),
            edited: Event::new("Picnic", "bring food", 1_500, Some(2_500)).unwrap(),
        },
        Command::AddParticipant {
            person: "Daniel Meier".to_string(),
            event: EventKey::new("Concert", 500),
        },
        Command::RemoveParticipant {
            person: "Carl Kurz".to_string(),
            event: picnic,
        },
        Command::SortEvents,
        Command::RemoveTag {
            tag: Tag::new("friends").unwrap(),
        },
    ]
}

#[test]
fn undo_restores_and_redo_replays_every_command() {
    for command in every_command() {
        let word = command.word();
        let mut store = populated();
        let mut history = History::new();
        let before = store.clone();

        run(&mut history, &mut store, command);
        let after = store.clone();
        assert_ne!(store, before, "{word} should change the store");
        store.check_integrity().unwrap();

        history.undo(&mut store).unwrap();
        assert_eq!(store, before, "{word} undo");
        store.check_integrity().unwrap();

        history.redo(&mut store).unwrap();
        assert_eq!(store, after, "{word} redo");

        history.undo(&mut store).unwrap();
        assert_eq!(store, before, "{word} second undo");
    }
}

#[test]
fn failed_execute_leaves_store_unchanged_and_is_not_recorded() {
    let mut store = populated();
    let before = store.clone();

    let err = Command::AddPerson(person("carl kurz"))
        .execute(&mut store)
        .unwrap_err();
    assert!(matches!(
        err,
        CommandError::Store(StoreError::DuplicatePerson(_))
    ));
    assert_eq!(store, before);

    let err = Command::RemoveTag {
        tag: Tag::new("colleagues").unwrap(),
    }
    .execute(&mut store)
    .unwrap_err();
    assert_eq!(err, CommandError::TagNotInUse("colleagues".to_string()));
    assert_eq!(store, before);
}

#[test]
fn edit_scenario_unwinds_to_original_then_reports_empty_history() {
    let mut store = EntityStore::new();
    store.add_person(person("Carl")).unwrap();
    store.add_person(person("Daniel")).unwrap();
    let original = store.clone();
    let mut history = History::new();

    run(
        &mut history,
        &mut store,
        Command::EditPerson {
            target: "Carl".to_string(),
            edited: person("Ida"),
        },
    );
    run(
        &mut history,
        &mut store,
        Command::EditPerson {
            target: "Daniel".to_string(),
            edited: person("Hoon"),
        },
    );
    assert_eq!(names(&store), vec!["Ida", "Hoon"]);

    history.undo(&mut store).unwrap();
    assert_eq!(names(&store), vec!["Ida", "Daniel"]);
    history.undo(&mut store).unwrap();
    assert_eq!(store, original);

    let err = history.undo(&mut store).unwrap_err();
    assert_eq!(err, HistoryError::Empty(HistoryDirection::Undo));
    assert_eq!(err.to_string(), "No more commands to undo!");
    assert!(!err.is_fatal());
    assert_eq!(store, original);
}

#[test]
fn new_command_after_undo_discards_redo_branch() {
    let mut store = EntityStore::new();
    let mut history = History::new();
    run(&mut history, &mut store, Command::AddPerson(person("Amy Bee")));
    run(&mut history, &mut store, Command::AddPerson(person("Bob Choo")));

    history.undo(&mut store).unwrap();
    history.undo(&mut store).unwrap();
    assert_eq!(history.redo_depth(), 2);

    run(&mut history, &mut store, Command::AddPerson(person("Cat Dee")));
    assert!(!history.can_redo());
    assert_eq!(
        history.redo(&mut store).unwrap_err(),
        HistoryError::Empty(HistoryDirection::Redo)
    );
    assert_eq!(names(&store), vec!["Cat Dee"]);
}

#[test]
fn deleting_person_in_two_events_and_undoing_restores_links_in_order() {
    let mut store = populated();
    let before = store.clone();
    let mut history = History::new();

    run(
        &mut history,
        &mut store,
        Command::DeletePerson {
            name: "Carl Kurz".to_string(),
        },
    );
    assert!(store.events_of("Daniel Meier").unwrap().len() == 1);
    assert!(store
        .participants_of(&EventKey::new("Concert", 500))
        .unwrap()
        .is_empty());

    history.undo(&mut store).unwrap();
    assert_eq!(store, before);
    assert_eq!(names(&store), vec!["Carl Kurz", "Daniel Meier"]);
    let picnic: Vec<_> = store
        .participants_of(&EventKey::new("Picnic", 1_000))
        .unwrap()
        .iter()
        .map(|p| p.name.clone())
        .collect();
    assert_eq!(picnic, vec!["Daniel Meier", "Carl Kurz"]);
}

#[test]
fn redo_regenerates_consistent_state_after_intervening_history() {
    let mut store = EntityStore::new();
    let mut history = History::new();
    run(&mut history, &mut store, Command::AddPerson(person("Amy Bee")));
    run(&mut history, &mut store, Command::AddEvent(event("Gig", 7)));
    run(
        &mut history,
        &mut store,
        Command::AddParticipant {
            person: "Amy Bee".to_string(),
            event: EventKey::new("Gig", 7),
        },
    );
    let end_state = store.clone();

    for _ in 0..3 {
        history.undo(&mut store).unwrap();
    }
    assert!(store.is_empty());
    for _ in 0..3 {
        history.redo(&mut store).unwrap();
    }
    assert_eq!(store, end_state);
    assert!(store.is_participating("Amy Bee", &EventKey::new("Gig", 7)));
}

#[test]
fn undo_against_diverged_store_is_an_integrity_violation() {
    let mut store = EntityStore::new();
    let mut history = History::new();
    run(&mut history, &mut store, Command::AddPerson(person("Amy Bee")));

    let mut other = EntityStore::new();
    let err = history.undo(&mut other).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        HistoryError::IntegrityViolation {
            direction: HistoryDirection::Undo,
            ..
        }
    ));
    assert!(other.is_empty());
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}

#[test]
fn redo_against_diverged_store_is_an_integrity_violation() {
    let mut store = EntityStore::new();
    let mut history = History::new();
    run(&mut history, &mut store, Command::AddPerson(person("Amy Bee")));
    history.undo(&mut store).unwrap();
    assert!(history.can_redo());

    let mut other = EntityStore::new();
    other.add_person(person("Amy Bee")).unwrap();
    let before = other.clone();

    let err = history.redo(&mut other).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        HistoryError::IntegrityViolation {
            direction: HistoryDirection::Redo,
            ..
        }
    ));
    assert_eq!(other, before);
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}

#[test]
fn history_descriptions_are_most_recent_first() {
    let mut store = EntityStore::new();
    let mut history = History::new();
    run(&mut history, &mut store, Command::AddPerson(person("Amy Bee")));
    run(&mut history, &mut store, Command::AddPerson(person("Bob Choo")));
    run(&mut history, &mut store, Command::SortEvents);

    assert_eq!(
        history.undo_descriptions(2),
        vec!["sort events", "add person Bob Choo"]
    );
    history.undo(&mut store).unwrap();
    assert_eq!(history.redo_descriptions(5), vec!["sort events"]);
    assert_eq!(history.undo_depth(), 2);
}

#[test]
fn execute_feedback_mentions_the_record() {
    let mut store = EntityStore::new();
    let executed = Command::AddPerson(person("Amy Bee"))
        .execute(&mut store)
        .unwrap();
    assert!(executed.feedback().starts_with("New person added: Amy Bee"));

    let executed = Command::ClearAll.execute(&mut store).unwrap();
    assert_eq!(executed.feedback(), "Address book has been cleared!");
}
