//! The operation algebra run against the in-memory store.

use binstore::{ops, BinOp, ConnectionManager, Error, Key, Operation, Runner, Set, Value};
use binstore_memory::MemoryStore;
use collection_literals::btree;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    age: i64,
    nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LongValue {
    value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StringValue {
    value: String,
}

fn manager() -> (MemoryStore, ConnectionManager) {
    let store = MemoryStore::new();
    let manager = ConnectionManager::from_client(store.client());
    (store, manager)
}

fn key(set: &str, id: &str) -> Key {
    Set::new("test", set).unwrap().key(id).unwrap()
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let (_store, manager) = manager();
    let key = key("people", "ann");
    let ann = Person {
        name: "Ann".into(),
        age: 41,
        nickname: None,
    };

    let read = ops::put(&key, &ann)
        .then(ops::get::<Person>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, Some(ann));
}

#[tokio::test]
async fn put_of_all_none_fields_round_trips() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Optional {
        nickname: Option<String>,
    }

    let (_store, manager) = manager();
    let key = key("people", "blank");

    let read = ops::put(&key, &LongValue { value: 1 })
        .then(ops::put(&key, &Optional { nickname: None }))
        .then(ops::get::<Optional>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, Some(Optional { nickname: None }));

    assert!(ops::exists(&key).run(&manager).await.unwrap());
}

#[tokio::test]
async fn get_of_absent_record_is_none() {
    let (_store, manager) = manager();
    let read = ops::get::<Person>(&key("people", "nobody"))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, None);
}

#[tokio::test]
async fn get_with_wrong_shape_is_decode_error() {
    let (_store, manager) = manager();
    let key = key("values", "s");

    let err = ops::put(&key, &StringValue { value: "x".into() })
        .then(ops::get::<LongValue>(&key))
        .run(&manager)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn append_and_prepend_apply_in_program_order() {
    let (_store, manager) = manager();
    let key = key("values", "text");

    let read = ops::put(&key, &StringValue { value: "value".into() })
        .then(ops::append(&key, [("value", "_with_suffix")]))
        .then(ops::prepend(&key, [("value", "with_prefix_")]))
        .then(ops::get::<StringValue>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read.unwrap().value, "with_prefix_value_with_suffix");
}

#[tokio::test]
async fn append_to_absent_record_is_not_found() {
    let (_store, manager) = manager();
    let err = ops::append(&key("values", "none"), [("value", "x")])
        .run(&manager)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn add_increments_numeric_bin() {
    let (_store, manager) = manager();
    let key = key("values", "long");

    let read = ops::put(&key, &LongValue { value: 1 })
        .then(ops::add(&key, [("value", 2)]))
        .then(ops::get::<LongValue>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, Some(LongValue { value: 3 }));
}

#[tokio::test]
async fn add_on_string_bin_is_a_server_error() {
    let (_store, manager) = manager();
    let key = key("values", "mixed");

    let err = ops::put(&key, &StringValue { value: "x".into() })
        .then(ops::add(&key, [("value", 1)]))
        .run(&manager)
        .await
        .unwrap_err();
    assert_eq!(err.result_code(), Some(binstore::result_code::BIN_TYPE_ERROR));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_store, manager) = manager();
    let key = key("values", "gone");

    let read = ops::put(&key, &LongValue { value: 1 })
        .then(ops::delete(&key))
        .then(ops::delete(&key))
        .then(ops::get::<LongValue>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, None);
}

#[tokio::test]
async fn exists_follows_the_record_lifecycle() {
    let (_store, manager) = manager();
    let key = key("values", "life");

    let seen = ops::exists(&key)
        .and_then({
            let key = key.clone();
            move |before| {
                ops::put(&key, &LongValue { value: 0 })
                    .then(ops::exists(&key))
                    .map(move |during| (before, during))
            }
        })
        .and_then({
            let key = key.clone();
            move |(before, during)| {
                ops::delete(&key)
                    .then(ops::exists(&key))
                    .map(move |after| [before, during, after])
            }
        })
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(seen, [false, true, false]);
}

#[tokio::test]
async fn touch_bumps_generation_and_header_reads_it() {
    let (_store, manager) = manager();
    let key = key("values", "touched");

    let metadata = ops::put(&key, &LongValue { value: 1 })
        .then(ops::touch(&key))
        .then(ops::header(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(metadata.generation, 2);
}

#[tokio::test]
async fn touch_and_header_on_absent_record_are_not_found() {
    let (_store, manager) = manager();
    let key = key("values", "absent");

    let err = ops::touch(&key).run(&manager).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = ops::header(&key).run(&manager).await.unwrap_err();
    match err {
        Error::NotFound { key: missing } => assert_eq!(missing, key),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn get_all_returns_only_present_keys() {
    let (_store, manager) = manager();
    let keys: Vec<Key> = (0..4).map(|i| key("batch", &format!("k{}", i))).collect();

    let writes = keys[..2]
        .iter()
        .enumerate()
        .map(|(i, key)| ops::put(key, &LongValue { value: i as i64 }));

    let mut read = Operation::sequence(writes)
        .then(ops::get_all::<LongValue>(keys.clone()))
        .run(&manager)
        .await
        .unwrap();
    read.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        read,
        vec![
            (keys[0].clone(), LongValue { value: 0 }),
            (keys[1].clone(), LongValue { value: 1 }),
        ]
    );
}

#[tokio::test]
async fn get_bins_projects() {
    let (_store, manager) = manager();
    let key = key("people", "proj");

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct NameOnly {
        name: String,
    }

    let read = ops::put(
        &key,
        &Person {
            name: "Bo".into(),
            age: 9,
            nickname: Some("b".into()),
        },
    )
    .then(ops::get_bins::<NameOnly, _>(&key, ["name"]))
    .run(&manager)
    .await
    .unwrap();
    assert_eq!(read, Some(NameOnly { name: "Bo".into() }));
}

#[tokio::test]
async fn put_bins_merges_raw_bins() {
    let (_store, manager) = manager();
    let key = key("values", "raw");

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Extended {
        value: i64,
        extra: String,
    }

    let read = ops::put(&key, &LongValue { value: 5 })
        .then(ops::put_bins(&key, btree! { "extra".to_string() => Value::from("x") }))
        .then(ops::get::<Extended>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(
        read,
        Some(Extended {
            value: 5,
            extra: "x".into()
        })
    );
}

#[tokio::test]
async fn operate_matches_the_sequential_chain() {
    let (_store, manager) = manager();
    let atomic = key("values", "atomic");
    let chained = key("values", "chained");

    let via_operate = ops::put(&atomic, &StringValue { value: "a".into() })
        .then(ops::operate::<StringValue>(
            &atomic,
            vec![
                BinOp::append("value", "b"),
                BinOp::prepend("value", "z"),
                BinOp::get("value"),
            ],
        ))
        .run(&manager)
        .await
        .unwrap();

    let via_chain = ops::put(&chained, &StringValue { value: "a".into() })
        .then(ops::append(&chained, [("value", "b")]))
        .then(ops::prepend(&chained, [("value", "z")]))
        .then(ops::get::<StringValue>(&chained))
        .run(&manager)
        .await
        .unwrap();

    assert_eq!(via_operate, via_chain);
    assert_eq!(via_operate.unwrap().value, "zab");
}

#[tokio::test]
async fn operate_without_reads_is_none() {
    let (_store, manager) = manager();
    let key = key("values", "blind");

    let read = ops::operate::<LongValue>(&key, vec![BinOp::add("value", 4)])
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, None);

    let stored = ops::get::<LongValue>(&key).run(&manager).await.unwrap();
    assert_eq!(stored, Some(LongValue { value: 4 }));
}

#[tokio::test]
async fn first_failure_stops_the_chain() {
    let (store, manager) = manager();
    let key = key("values", "stop");

    let err = ops::touch(&key)
        .then(ops::put(&key, &LongValue { value: 1 }))
        .run(&manager)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn encode_failure_surfaces_at_run() {
    let (store, manager) = manager();
    let key = key("values", "scalar");

    let program = ops::put(&key, &42i64);
    assert!(store.is_empty());
    let err = program.run(&manager).await.unwrap_err();
    assert!(matches!(err, Error::Encode { .. }));
}

#[tokio::test]
async fn long_chains_run_in_constant_stack() {
    let (_store, manager) = manager();

    let mut program = Operation::pure(0u64);
    for _ in 0..10_000 {
        program = program.and_then(|n| Operation::pure(n + 1));
    }
    assert_eq!(program.run(&manager).await.unwrap(), 10_000);
}

#[tokio::test]
async fn long_request_chains_run_in_constant_stack() {
    let (_store, manager) = manager();
    let key = key("values", "counter");

    let steps = (0..10_000).map(|_| ops::add(&key, [("value", 1)]));
    let read = Operation::sequence(steps)
        .then(ops::get::<LongValue>(&key))
        .run(&manager)
        .await
        .unwrap();
    assert_eq!(read, Some(LongValue { value: 10_000 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_share_one_manager() {
    let (store, manager) = manager();
    let runner = Runner::current().unwrap();
    let counter = key("values", "shared");

    let pending: Vec<_> = (0..16)
        .map(|i| {
            let own = key("values", &format!("own{}", i));
            let program = ops::put(&own, &LongValue { value: i })
                .then(ops::add(&counter, [("value", 1)]))
                .then(ops::get::<LongValue>(&own));
            runner.run(program, &manager)
        })
        .collect();

    for (i, deferred) in pending.into_iter().enumerate() {
        assert_eq!(deferred.await.unwrap(), Some(LongValue { value: i as i64 }));
    }

    let total = ops::get::<LongValue>(&counter).run(&manager).await.unwrap();
    assert_eq!(total, Some(LongValue { value: 16 }));
    assert_eq!(store.len(), 17);
}

#[tokio::test]
async fn closed_manager_fails_with_connection_error() {
    let (_store, manager) = manager();
    let key = key("values", "closed");
    let program = ops::put(&key, &LongValue { value: 1 });

    manager.close().await.unwrap();
    let err = program.run(&manager).await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }));
}
