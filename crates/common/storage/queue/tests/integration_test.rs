// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{collections::HashSet, sync::Arc, thread};

use crossbeam::channel::unbounded;
use pqueue_common_storage_queue::{
    GapPolicy, JsonCodec, PersistentQueue, QueueBuilder, QueueConfig, QueueError,
};
use pqueue_common_telemetry::init_default_ut_logging;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

fn create_queue(temp_dir: &TempDir) -> PersistentQueue<String> {
    init_default_ut_logging();
    QueueBuilder::new(temp_dir.path()).build().unwrap()
}

fn element_files(temp_dir: &TempDir) -> usize {
    std::fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".obj"))
        .count()
}

#[test]
fn test_size_tracks_produce() {
    let temp_dir = TempDir::new().unwrap();
    let queue = create_queue(&temp_dir);

    assert!(queue.is_empty());
    for n in 1..=20u64 {
        queue.offer(format!("message-{n:04}"));
        assert_eq!(queue.len(), n);
        assert!(!queue.is_empty());
    }
    assert_eq!(element_files(&temp_dir), 20);
}

#[test]
fn test_fifo_order() {
    let temp_dir = TempDir::new().unwrap();
    let queue = create_queue(&temp_dir);

    for i in 0..100 {
        queue.offer(format!("message-{i:04}"));
    }

    for i in 0..100 {
        assert_eq!(queue.poll().unwrap(), format!("message-{i:04}"));
    }

    assert_eq!(queue.poll(), None);
    assert!(matches!(queue.remove(), Err(QueueError::Empty)));
    assert_eq!(element_files(&temp_dir), 0);
}

#[test]
fn test_queue_recovery() {
    let temp_dir = TempDir::new().unwrap();

    {
        let queue = create_queue(&temp_dir);
        queue.add("one".to_string());
        queue.add("two".to_string());
        queue.add("three".to_string());
    }

    let queue = create_queue(&temp_dir);
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.poll().as_deref(), Some("one"));
    assert_eq!(queue.poll().as_deref(), Some("two"));
    assert_eq!(queue.poll().as_deref(), Some("three"));
    assert!(queue.is_empty());
}

#[test]
fn test_recovery_after_partial_consume() {
    let temp_dir = TempDir::new().unwrap();

    {
        let queue = create_queue(&temp_dir);
        for i in 0..50 {
            queue.offer(format!("msg-{i}"));
        }
        for i in 0..20 {
            assert_eq!(queue.poll().unwrap(), format!("msg-{i}"));
        }
    }

    let queue = create_queue(&temp_dir);
    assert_eq!(queue.pointer(), 20);
    assert_eq!(queue.counter(), 50);
    assert_eq!(queue.len(), 30);

    assert_eq!(queue.offer("msg-50".to_string()), 51);
    for i in 20..=50 {
        assert_eq!(queue.poll().unwrap(), format!("msg-{i}"));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_recovery_with_missing_middle_file() {
    let temp_dir = TempDir::new().unwrap();

    {
        let queue = create_queue(&temp_dir);
        queue.add_all((0..5).map(|i| format!("msg-{i}")));
    }
    std::fs::remove_file(temp_dir.path().join("element_3.obj")).unwrap();

    let result = QueueBuilder::new(temp_dir.path())
        .gap_policy(GapPolicy::Reject)
        .build::<String>();
    assert!(matches!(
        result,
        Err(QueueError::NonContiguous {
            first: 1,
            last:  5,
            found: 4,
        })
    ));

    let queue = create_queue(&temp_dir);
    let drained: Vec<Option<String>> = (0..5).map(|_| queue.poll()).collect();
    assert_eq!(
        drained,
        vec![
            Some("msg-0".to_string()),
            Some("msg-1".to_string()),
            None,
            Some("msg-3".to_string()),
            Some("msg-4".to_string()),
        ]
    );
}

#[test]
fn test_clear_after_mixed_operations() {
    let temp_dir = TempDir::new().unwrap();
    let queue = create_queue(&temp_dir);

    queue.add_all(["one", "two", "three", "four"].map(String::from));
    queue.poll();
    queue.peek();

    queue.clear().unwrap();

    assert_eq!(queue.len(), 0);
    assert_eq!(element_files(&temp_dir), 0);

    drop(queue);
    let queue = create_queue(&temp_dir);
    assert!(queue.is_empty());
    assert_eq!(queue.counter(), 0);
}

#[test]
fn test_iterator_with_concurrent_consumer() {
    let temp_dir = TempDir::new().unwrap();
    let queue = create_queue(&temp_dir);
    queue.add_all(["one", "two", "three"].map(String::from));

    let mut iter = queue.iter();
    assert_eq!(iter.next().as_deref(), Some("three"));

    queue.poll();
    queue.poll();

    assert_eq!(iter.next(), None);
    assert_eq!(queue.len(), 1);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Task {
    id:       u64,
    name:     String,
    priority: u8,
}

#[test]
fn test_struct_elements_with_checksum() {
    let temp_dir = TempDir::new().unwrap();
    let tasks: Vec<Task> = (1..=3)
        .map(|id| Task {
            id,
            name: format!("task-{id}"),
            priority: (id % 2) as u8,
        })
        .collect();

    {
        let queue: PersistentQueue<Task> = QueueBuilder::new(temp_dir.path())
            .checksum(true)
            .sync_writes(true)
            .build()
            .unwrap();
        queue.add_all(tasks.clone());
    }

    let queue: PersistentQueue<Task> = QueueBuilder::new(temp_dir.path())
        .checksum(true)
        .build()
        .unwrap();
    let newest_first: Vec<Task> = queue.iter().collect();
    assert_eq!(newest_first, tasks.iter().rev().cloned().collect::<Vec<_>>());

    for task in &tasks {
        assert_eq!(&queue.remove().unwrap(), task);
    }
}

#[test]
fn test_json_codec_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let config: QueueConfig = serde_json::from_value(serde_json::json!({
        "base_path": temp_dir.path(),
        "filename_prefix": "audit",
    }))
    .unwrap();

    let queue: PersistentQueue<Task, JsonCodec> = QueueBuilder::from_config(config)
        .build_with_codec(JsonCodec)
        .unwrap();
    let task = Task {
        id:       9,
        name:     "rotate keys".to_string(),
        priority: 1,
    };
    queue.offer(task.clone());

    let raw = std::fs::read_to_string(temp_dir.path().join("audit_1.obj")).unwrap();
    assert_eq!(raw, r#"{"id":9,"name":"rotate keys","priority":1}"#);
    assert_eq!(queue.element().unwrap(), task);
}

#[test]
fn test_concurrent_produce_consume() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 250;
    const TOTAL: usize = PRODUCERS * PER_PRODUCER;

    let temp_dir = TempDir::new().unwrap();
    init_default_ut_logging();
    let queue: Arc<PersistentQueue<(usize, usize)>> =
        Arc::new(QueueBuilder::new(temp_dir.path()).build().unwrap());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.offer((producer, seq));
                }
            })
        })
        .collect();

    let (tx, rx) = unbounded();
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            thread::spawn(move || {
                let mut last_seen = [None::<usize>; PRODUCERS];
                loop {
                    match queue.poll() {
                        Some((producer, seq)) => {
                            if let Some(prev) = last_seen[producer] {
                                assert!(seq > prev, "producer {producer} went backwards");
                            }
                            last_seen[producer] = Some(seq);
                            tx.send((producer, seq)).unwrap();
                        }
                        None if queue.counter() as usize == TOTAL && queue.is_empty() => break,
                        None => thread::yield_now(),
                    }
                }
            })
        })
        .collect();
    drop(tx);

    for handle in producers {
        handle.join().unwrap();
    }
    for handle in consumers {
        handle.join().unwrap();
    }

    let consumed: Vec<(usize, usize)> = rx.iter().collect();
    assert_eq!(consumed.len(), TOTAL);

    let unique: HashSet<_> = consumed.iter().copied().collect();
    assert_eq!(unique.len(), TOTAL);
    for producer in 0..PRODUCERS {
        for seq in 0..PER_PRODUCER {
            assert!(unique.contains(&(producer, seq)));
        }
    }

    assert_eq!(queue.counter(), TOTAL as u64);
    assert_eq!(queue.pointer(), TOTAL as u64);
    assert_eq!(element_files(&temp_dir), 0);
}
