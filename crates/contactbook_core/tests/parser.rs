use contactbook_core::parser::{USAGE_ADD, USAGE_DELETE, USAGE_EDIT, USAGE_GENERAL, USAGE_JOIN};
use contactbook_core::{
    parse_instruction, Command, EntityStore, Event, EventKey, Instruction, Person, Tag,
};

fn store() -> EntityStore {
    let mut store = EntityStore::new();
    let amy = Person::new("Amy Bee", "11111111", "amy@example.com", "Block 312, Amy Street 1")
        .unwrap()
        .with_tags([Tag::new("friend").unwrap()].into_iter().collect());
    store.add_person(amy).unwrap();
    store
        .add_person(Person::new("Bob Choo", "22222222", "bob@example.com", "Block 123").unwrap())
        .unwrap();
    store
        .add_event(Event::new("Demo Day", "", 1_700_000_000_000, None).unwrap())
        .unwrap();
    store
}

fn command(input: &str, store: &EntityStore) -> Command {
    match parse_instruction(input, store).unwrap() {
        Instruction::Execute(command) => command,
        other => panic!("expected a command, got {other:?}"),
    }
}

#[test]
fn add_parses_all_fields_and_tags() {
    let parsed = command(
        "add n/Cat Dee p/33333333 e/cat@example.com a/Cat Lane 3 t/friend t/Colleague pt/cat.png",
        &EntityStore::new(),
    );
    let Command::AddPerson(person) = parsed else {
        panic!("expected add");
    };
    assert_eq!(person.name, "Cat Dee");
    assert_eq!(person.phone, "33333333");
    assert_eq!(person.address, "Cat Lane 3");
    assert_eq!(person.portrait.as_deref(), Some("cat.png"));
    let tags: Vec<_> = person.tags.iter().map(Tag::as_str).collect();
    assert_eq!(tags, vec!["colleague", "friend"]);
}

#[test]
fn add_with_missing_or_invalid_fields_reports_usage() {
    let store = EntityStore::new();
    let err = parse_instruction("add n/Cat Dee p/333 e/cat@example.com", &store).unwrap_err();
    assert_eq!(err.usage, USAGE_ADD);
    assert!(err.detail.contains("a/"));

    let err = parse_instruction("add n/Cat Dee p/3a e/cat@example.com a/x", &store).unwrap_err();
    assert_eq!(err.usage, USAGE_ADD);
    assert!(err.to_string().starts_with("Invalid command format!"));
}

#[test]
fn indexes_are_one_based_and_resolve_to_identity_keys() {
    let store = store();
    assert_eq!(
        command("delete 2", &store),
        Command::DeletePerson {
            name: "Bob Choo".to_string()
        }
    );
    for bad in ["delete 0", "delete 3", "delete -1", "delete x"] {
        let err = parse_instruction(bad, &store).unwrap_err();
        assert_eq!(err.usage, USAGE_DELETE, "{bad}");
    }
}

#[test]
fn edit_keeps_untouched_fields_and_clears_tags_with_empty_prefix() {
    let store = store();
    let Command::EditPerson { target, edited } = command("edit 1 p/99999999", &store) else {
        panic!("expected edit");
    };
    assert_eq!(target, "Amy Bee");
    assert_eq!(edited.phone, "99999999");
    assert_eq!(edited.email, "amy@example.com");
    assert_eq!(edited.tags.len(), 1);

    let Command::EditPerson { edited, .. } = command("edit 1 t/", &store) else {
        panic!("expected edit");
    };
    assert!(edited.tags.is_empty());

    let err = parse_instruction("edit 1", &store).unwrap_err();
    assert_eq!(err.usage, USAGE_EDIT);
}

#[test]
fn portrait_sets_only_the_portrait() {
    let store = store();
    let Command::EditPerson { target, edited } = command("portrait 2 pt/photos/bob.jpg", &store)
    else {
        panic!("expected edit");
    };
    assert_eq!(target, "Bob Choo");
    assert_eq!(edited.portrait.as_deref(), Some("photos/bob.jpg"));
    assert_eq!(edited.phone, "22222222");

    assert!(parse_instruction("portrait 2 pt/bob.gif", &store).is_err());
}

#[test]
fn event_commands_parse_times_and_links() {
    let store = store();
    let Command::AddEvent(event) = command("eventadd n/Launch s/100 f/200 d/Big day", &store)
    else {
        panic!("expected eventadd");
    };
    assert_eq!(event.title, "Launch");
    assert_eq!(event.end_ms, Some(200));
    assert_eq!(event.description, "Big day");

    assert!(parse_instruction("eventadd n/Launch s/300 f/200", &store).is_err());

    let demo = EventKey::new("Demo Day", 1_700_000_000_000);
    assert_eq!(
        command("join 2 1", &store),
        Command::AddParticipant {
            person: "Bob Choo".to_string(),
            event: demo.clone(),
        }
    );
    assert_eq!(
        command("leave 1 1", &store),
        Command::RemoveParticipant {
            person: "Amy Bee".to_string(),
            event: demo.clone(),
        }
    );
    assert_eq!(
        command("eventdelete 1", &store),
        Command::DeleteEvent { key: demo }
    );
    assert_eq!(parse_instruction("join 1", &store).unwrap_err().usage, USAGE_JOIN);
}

#[test]
fn event_edit_can_clear_end_time() {
    let mut store = EntityStore::new();
    store
        .add_event(Event::new("Trip", "", 10, Some(20)).unwrap())
        .unwrap();
    let Command::EditEvent { target, edited } = command("eventedit 1 f/", &store) else {
        panic!("expected eventedit");
    };
    assert_eq!(target, EventKey::new("Trip", 10));
    assert_eq!(edited.end_ms, None);
    assert_eq!(edited.start_ms, 10);
}

#[test]
fn keywords_and_unknown_words() {
    let store = EntityStore::new();
    assert_eq!(parse_instruction("undo", &store).unwrap(), Instruction::Undo);
    assert_eq!(parse_instruction(" redo ", &store).unwrap(), Instruction::Redo);
    assert_eq!(parse_instruction("list", &store).unwrap(), Instruction::List);
    assert_eq!(parse_instruction("exit", &store).unwrap(), Instruction::Exit);
    assert_eq!(command("clear", &store), Command::ClearAll);
    assert_eq!(command("sortevents", &store), Command::SortEvents);
    assert_eq!(
        command("untag Friend", &store),
        Command::RemoveTag {
            tag: Tag::new("friend").unwrap()
        }
    );
    assert!(parse_instruction("clear everything", &store).is_err());
    assert_eq!(
        parse_instruction("frobnicate", &store).unwrap_err().usage,
        USAGE_GENERAL
    );
    assert_eq!(parse_instruction("   ", &store).unwrap_err().usage, USAGE_GENERAL);
}
