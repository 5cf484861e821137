//! Concurrent access to the shared caches.
//!
//! Each test counts constructions through a type that is used by that test
//! alone, so parallel tests do not disturb the counts.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

use masking::{
    Accessor, Algorithm, AlgorithmId, ConstructError, Mask, Maskable, MaskingEngine, Record,
    ScalarKind, ScalarValue, Shape, TypeMismatchError, ValueType,
};
use pretty_assertions::assert_eq;

const THREADS: usize = 100;

static SLOT_BINDS: AtomicUsize = AtomicUsize::new(0);

/// A text leaf that counts how often an accessor is bound to it.
struct CountedText(String);

impl Maskable for CountedText {
    fn shape(&self) -> Shape {
        Shape::Leaf
    }

    fn slot_type() -> Option<ValueType> {
        SLOT_BINDS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        Some(ValueType::new(ScalarKind::Text))
    }

    fn read_slot(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
        Ok(Some(ScalarValue::Text(self.0.clone())))
    }

    fn write_slot(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
        match value {
            Some(ScalarValue::Text(text)) => {
                self.0 = text;
                Ok(())
            }
            _ => Err(TypeMismatchError {
                field: "CountedText".into(),
                expected: "text".into(),
                found: "something else".into(),
            }),
        }
    }
}

#[derive(Mask)]
struct Badge {
    #[mask]
    holder: CountedText,
}

#[test]
fn test_accessor_is_bound_once_under_contention() {
    let engine = MaskingEngine::new();
    let barrier = Barrier::new(THREADS);

    let accessors: Vec<Arc<Accessor>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    engine.accessors().get_for::<Badge>("holder").unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(accessors.len(), THREADS);
    assert!(accessors
        .iter()
        .all(|accessor| Arc::ptr_eq(accessor, &accessors[0])));
    assert_eq!(SLOT_BINDS.load(Ordering::SeqCst), 1);

    let stats = engine.accessors().stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits + stats.misses, THREADS as u64);

    let mut badge = Badge {
        holder: CountedText("anyone".into()),
    };
    assert_eq!(
        accessors[0].get(&badge).unwrap(),
        Some(ScalarValue::Text("anyone".into()))
    );
    accessors[0].set_text(&mut badge, "someone").unwrap();
    assert_eq!(badge.holder.0, "someone");
}

static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

struct Slow;

impl Algorithm for Slow {
    fn mask(&self, content: &str) -> String {
        "#".repeat(content.chars().count())
    }

    fn construct() -> Result<Self, ConstructError> {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        Ok(Self)
    }
}

#[test]
fn test_algorithm_is_constructed_once_under_contention() {
    let engine = MaskingEngine::new();
    let barrier = Barrier::new(THREADS);

    let instances: Vec<Arc<dyn Algorithm>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    engine
                        .algorithms()
                        .resolve(AlgorithmId::of::<Slow>())
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(instances
        .iter()
        .all(|instance| Arc::ptr_eq(instance, &instances[0])));
    assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    assert_eq!(instances[0].mask("abc"), "###");
}

struct Hashes;

impl Algorithm for Hashes {
    fn mask(&self, content: &str) -> String {
        "#".repeat(content.chars().count())
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self)
    }
}

#[derive(Mask)]
struct Ticket {
    #[mask(Hashes)]
    code: String,
    seat: u32,
}

#[test]
fn test_parallel_redaction_with_shared_engine() {
    let engine = MaskingEngine::new();

    thread::scope(|scope| {
        for worker in 0..8u32 {
            let engine = &engine;
            scope.spawn(move || {
                let mut tickets: Vec<Ticket> = (0..50)
                    .map(|seat| Ticket {
                        code: format!("T{worker}-{seat}"),
                        seat,
                    })
                    .collect();
                engine.redact(&mut tickets).unwrap();
                for ticket in &tickets {
                    assert!(ticket.code.chars().all(|c| c == '#'));
                    assert!(ticket.seat < 50);
                }
            });
        }
    });

    assert_eq!(engine.accessors().len(), 1);
    assert!(Ticket::field_spec("code").is_some());
}
