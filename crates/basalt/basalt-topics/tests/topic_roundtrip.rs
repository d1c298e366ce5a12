//! Integration tests for the topic layer over a real region: staging,
//! dispatch, handler registry semantics, and decode failure handling.

use basalt_bus::{BusReader, BusWriter};
use basalt_topics::{ReadResult, TopicReader, TopicWriter};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

const CAP: usize = 4096;

fn region_path(label: &str) -> String {
    let pid = std::process::id();
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("/tmp/basalt_topics_{label}_{pid}_{ts}")
}

fn pair(path: &str) -> (TopicWriter, TopicReader) {
    let writer = TopicWriter::new(BusWriter::create(path, CAP).unwrap());
    let reader = TopicReader::new(BusReader::attach(path, CAP).unwrap());
    (writer, reader)
}

/// Collects `(topic, value)` pairs as handlers fire.
fn recorder(
    reader: &mut TopicReader,
    topic: &str,
    seen: &Arc<Mutex<Vec<(String, Value)>>>,
) {
    let seen = Arc::clone(seen);
    let name = topic.to_string();
    reader.on(topic, move |v| {
        seen.lock().unwrap().push((name.clone(), v.clone()));
        Ok(())
    });
}

#[test]
fn two_topics_dispatch_once_each() {
    let path = region_path("two");
    let (mut writer, mut reader) = pair(&path);

    let seen = Arc::new(Mutex::new(Vec::new()));
    recorder(&mut reader, "speed", &seen);
    recorder(&mut reader, "gear", &seen);
    recorder(&mut reader, "brake", &seen);

    writer.add("speed", 42).unwrap();
    writer.add("gear", 3).unwrap();
    writer.write().unwrap();

    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 2, seq: 1 });

    let mut got = seen.lock().unwrap().clone();
    got.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        got,
        vec![
            ("gear".to_string(), json!(3)),
            ("speed".to_string(), json!(42)),
        ]
    );

    // Nothing else pending, no handler fires again.
    assert_eq!(reader.read(), ReadResult::NothingNew);
    assert_eq!(seen.lock().unwrap().len(), 2);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn empty_publication_dispatches_nothing() {
    let path = region_path("emptysnap");
    let (mut writer, mut reader) = pair(&path);

    let seen = Arc::new(Mutex::new(Vec::new()));
    recorder(&mut reader, "speed", &seen);

    // write() with nothing staged: a valid "no topics this tick" frame.
    writer.write().unwrap();

    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 0, seq: 1 });
    assert!(seen.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn zero_length_frame_is_the_empty_snapshot() {
    let path = region_path("zerolen");

    let mut bus = BusWriter::create(&path, CAP).unwrap();
    bus.publish(b"").unwrap();

    let mut reader = TopicReader::new(BusReader::attach(&path, CAP).unwrap());
    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 0, seq: 1 });

    let _ = std::fs::remove_file(&path);
}

#[test]
fn mapping_roundtrips_with_original_values() {
    let path = region_path("roundtrip");
    let (mut writer, mut reader) = pair(&path);

    let seen = Arc::new(Mutex::new(Vec::new()));
    for topic in ["int", "float", "text", "nested"] {
        recorder(&mut reader, topic, &seen);
    }

    writer.add("int", 7).unwrap();
    writer.add("float", 2.5).unwrap();
    writer.add("text", "tyre change").unwrap();
    writer
        .add("nested", json!({ "sector": 2, "delta_ms": -142 }))
        .unwrap();
    writer.write().unwrap();

    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 4, seq: 1 });

    let mut got = seen.lock().unwrap().clone();
    got.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        got,
        vec![
            ("float".to_string(), json!(2.5)),
            ("int".to_string(), json!(7)),
            ("nested".to_string(), json!({ "sector": 2, "delta_ms": -142 })),
            ("text".to_string(), json!("tyre change")),
        ]
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn staged_topic_keeps_newest_value() {
    let path = region_path("newest");
    let (mut writer, mut reader) = pair(&path);

    let seen = Arc::new(Mutex::new(Vec::new()));
    recorder(&mut reader, "speed", &seen);

    writer.add("speed", 10).unwrap();
    writer.add("speed", 99).unwrap();
    writer.write().unwrap();

    reader.read();
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("speed".to_string(), json!(99))]
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn reregistering_replaces_the_handler() {
    let path = region_path("replace");
    let (mut writer, mut reader) = pair(&path);

    let first = Arc::new(Mutex::new(0u32));
    let second = Arc::new(Mutex::new(0u32));

    {
        let first = Arc::clone(&first);
        reader.on("tick", move |_| {
            *first.lock().unwrap() += 1;
            Ok(())
        });
    }
    {
        let second = Arc::clone(&second);
        reader.on("tick", move |_| {
            *second.lock().unwrap() += 1;
            Ok(())
        });
    }

    writer.add("tick", 1).unwrap();
    writer.write().unwrap();
    reader.read();

    assert_eq!(*first.lock().unwrap(), 0, "replaced handler must not fire");
    assert_eq!(*second.lock().unwrap(), 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn off_unregisters_the_topic() {
    let path = region_path("off");
    let (mut writer, mut reader) = pair(&path);

    let seen = Arc::new(Mutex::new(Vec::new()));
    recorder(&mut reader, "speed", &seen);
    reader.off("speed");

    writer.add("speed", 42).unwrap();
    writer.write().unwrap();

    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 0, seq: 1 });
    assert!(seen.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn undecodable_frame_stays_pending_until_superseded() {
    let path = region_path("decode");

    let mut bus = BusWriter::create(&path, CAP).unwrap();
    bus.publish(b"this is not json").unwrap();

    let mut reader = TopicReader::new(BusReader::attach(&path, CAP).unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    recorder(&mut reader, "speed", &seen);

    // The bad frame is reported on every read, not silently consumed.
    assert_eq!(reader.read(), ReadResult::DecodeError { seq: 1 });
    assert_eq!(reader.read(), ReadResult::DecodeError { seq: 1 });

    // A well-formed snapshot supersedes it.
    let mut writer = TopicWriter::new(bus);
    writer.add("speed", 42).unwrap();
    writer.write().unwrap();

    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 1, seq: 2 });
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("speed".to_string(), json!(42))]
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn non_object_json_is_a_decode_error() {
    let path = region_path("nonobject");

    let mut bus = BusWriter::create(&path, CAP).unwrap();
    bus.publish(b"[1,2,3]").unwrap();

    let mut reader = TopicReader::new(BusReader::attach(&path, CAP).unwrap());
    assert_eq!(reader.read(), ReadResult::DecodeError { seq: 1 });

    let _ = std::fs::remove_file(&path);
}

#[test]
fn failing_handler_does_not_stop_dispatch() {
    let path = region_path("failing");
    let (mut writer, mut reader) = pair(&path);

    let seen = Arc::new(Mutex::new(Vec::new()));
    reader.on("broken", |_| Err("handler exploded".into()));
    recorder(&mut reader, "speed", &seen);

    writer.add("broken", 1).unwrap();
    writer.add("speed", 42).unwrap();
    writer.write().unwrap();

    // Both handlers were invoked; the failure is logged, not propagated.
    assert_eq!(reader.read(), ReadResult::Dispatched { topics: 2, seq: 1 });
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[("speed".to_string(), json!(42))]
    );

    let _ = std::fs::remove_file(&path);
}
