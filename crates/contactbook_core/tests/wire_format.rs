use contactbook_core::{BookSnapshot, EntityStore, Event, EventKey, Person, Tag};
use serde_json::json;

fn snapshot() -> BookSnapshot {
    let mut store = EntityStore::new();
    store
        .add_person(
            Person::new("Amy Bee", "11111111", "amy@example.com", "Block 312")
                .unwrap()
                .with_tags([Tag::new("friend").unwrap()].into_iter().collect()),
        )
        .unwrap();
    store
        .add_event(Event::new("Demo", "", 100, Some(200)).unwrap())
        .unwrap();
    store
        .add_participant("Amy Bee", &EventKey::new("Demo", 100))
        .unwrap();
    store.snapshot()
}

#[test]
fn snapshot_serializes_with_participants_by_name() {
    let value = serde_json::to_value(snapshot()).unwrap();
    assert_eq!(
        value,
        json!({
            "persons": [{
                "name": "Amy Bee",
                "phone": "11111111",
                "email": "amy@example.com",
                "address": "Block 312",
                "portrait": null,
                "tags": ["friend"]
            }],
            "events": [{
                "event": {
                    "title": "Demo",
                    "description": "",
                    "start_ms": 100,
                    "end_ms": 200
                },
                "participants": ["Amy Bee"]
            }]
        })
    );
}

#[test]
fn snapshot_json_round_trips() {
    let original = snapshot();
    let text = serde_json::to_string(&original).unwrap();
    let parsed: BookSnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, original);
}

#[test]
fn deserialization_validates_records() {
    let bad_person = json!({
        "name": "Amy Bee",
        "phone": "12",
        "email": "amy@example.com",
        "address": "Block 312"
    });
    assert!(serde_json::from_value::<Person>(bad_person).is_err());

    let bad_event = json!({ "title": "Demo", "start_ms": 10, "end_ms": 5 });
    assert!(serde_json::from_value::<Event>(bad_event).is_err());

    assert!(serde_json::from_value::<Tag>(json!("two words")).is_err());
}
