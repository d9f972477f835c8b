use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

fn seeded() -> MemoryEngine {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    for (member, score) in [("a", 10.0), ("b", 20.0), ("c", 30.0), ("d", 40.0)] {
        tx.push(WriteOp::ZAdd {
            key: "scores".into(),
            score,
            member: member.into(),
        });
    }
    s.exec(tx).unwrap();
    engine
}

#[test]
fn zrange_rank_windows() {
    let engine = seeded();
    let mut s = engine.session();

    assert_eq!(s.zrange("scores", 0, -1, Order::Asc).unwrap(), ["a", "b", "c", "d"]);
    assert_eq!(s.zrange("scores", 0, 1, Order::Asc).unwrap(), ["a", "b"]);
    assert_eq!(s.zrange("scores", -2, -1, Order::Asc).unwrap(), ["c", "d"]);
    assert_eq!(s.zrange("scores", 0, 1, Order::Desc).unwrap(), ["d", "c"]);
    // Out-of-bounds indices clamp instead of erroring.
    assert_eq!(s.zrange("scores", 2, 100, Order::Asc).unwrap(), ["c", "d"]);
    assert!(s.zrange("scores", 5, 9, Order::Asc).unwrap().is_empty());
    assert!(s.zrange("missing", 0, -1, Order::Asc).unwrap().is_empty());
}

#[test]
fn zrange_ties_break_on_member() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    for member in ["x", "m", "a"] {
        tx.push(WriteOp::ZAdd {
            key: "flat".into(),
            score: 0.0,
            member: member.into(),
        });
    }
    s.exec(tx).unwrap();
    assert_eq!(s.zrange("flat", 0, -1, Order::Asc).unwrap(), ["a", "m", "x"]);
}

#[test]
fn zrange_by_score_bounds_and_limit() {
    let engine = seeded();
    let mut s = engine.session();

    assert_eq!(
        s.zrange_by_score("scores", Some(20), Some(30), None).unwrap(),
        ["b", "c"]
    );
    assert_eq!(
        s.zrange_by_score("scores", None, Some(20), None).unwrap(),
        ["a", "b"]
    );
    assert_eq!(
        s.zrange_by_score("scores", Some(20), None, None).unwrap(),
        ["b", "c", "d"]
    );
    assert_eq!(
        s.zrange_by_score("scores", None, None, Some(2)).unwrap(),
        ["a", "b"]
    );
}

#[test]
fn set_algebra() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    for m in ["1", "2", "3"] {
        tx.push(WriteOp::SAdd { key: "left".into(), member: m.into() });
    }
    for m in ["2", "3", "4"] {
        tx.push(WriteOp::SAdd { key: "right".into(), member: m.into() });
    }
    s.exec(tx).unwrap();

    let mut inter = s.sinter(&["left".into(), "right".into()]).unwrap();
    inter.sort();
    assert_eq!(inter, ["2", "3"]);

    let mut union = s.sunion(&["left".into(), "right".into()]).unwrap();
    union.sort();
    assert_eq!(union, ["1", "2", "3", "4"]);

    assert!(s.sinter(&["left".into(), "missing".into()]).unwrap().is_empty());
}

#[test]
fn guard_failure_applies_nothing() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    s.exec(Tx {
        guards: vec![],
        ops: vec![WriteOp::HSet {
            key: "names".into(),
            field: "taken".into(),
            value: "id-1".into(),
        }],
    })
    .unwrap();

    let mut tx = Tx::new();
    tx.guard(Guard::HashFieldAbsent {
        key: "names".into(),
        field: "taken".into(),
    });
    tx.push(WriteOp::Set { key: "id-2".into(), value: b"blob".to_vec() });
    tx.push(WriteOp::ZAdd {
        key: "primary".into(),
        score: 0.0,
        member: "id-2".into(),
    });

    match s.exec(tx) {
        Err(KvError::TxnAborted { guard: 0 }) => {}
        other => panic!("expected abort, got {other:?}"),
    }
    assert!(s.get("id-2").unwrap().is_none());
    assert!(!s.exists("primary").unwrap());
}

#[test]
fn failed_op_applies_nothing() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();

    // Second op targets the blob the first op wrote with a zset write.
    let mut tx = Tx::new();
    tx.push(WriteOp::Set { key: "k".into(), value: b"blob".to_vec() });
    tx.push(WriteOp::ZAdd { key: "k".into(), score: 1.0, member: "m".into() });

    assert!(s.exec(tx).is_err());
    assert!(s.get("k").unwrap().is_none());
    assert_eq!(engine.key_count(), 0);
}

#[test]
fn key_exists_guard() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    s.exec(Tx {
        guards: vec![],
        ops: vec![WriteOp::Set { key: "parent".into(), value: b"x".to_vec() }],
    })
    .unwrap();

    let mut ok = Tx::new();
    ok.guard(Guard::KeyExists { key: "parent".into() });
    ok.push(WriteOp::Set { key: "child".into(), value: b"y".to_vec() });
    s.exec(ok).unwrap();
    assert!(s.exists("child").unwrap());

    let mut bad = Tx::new();
    bad.guard(Guard::KeyExists { key: "ghost".into() });
    bad.push(WriteOp::Set { key: "orphan".into(), value: b"z".to_vec() });
    assert!(matches!(s.exec(bad), Err(KvError::TxnAborted { guard: 0 })));
    assert!(!s.exists("orphan").unwrap());
}

#[test]
fn empty_containers_vanish() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    tx.push(WriteOp::SAdd { key: "only".into(), member: "m".into() });
    s.exec(tx).unwrap();
    assert!(s.exists("only").unwrap());

    let mut rm = Tx::new();
    rm.push(WriteOp::SRem { key: "only".into(), member: "m".into() });
    s.exec(rm).unwrap();
    assert!(!s.exists("only").unwrap());
}

#[test]
fn range_filter_keeps_order_and_membership() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    for (i, id) in ["r1", "r2", "r3", "r4"].iter().enumerate() {
        tx.push(WriteOp::ZAdd {
            key: "ordering".into(),
            score: i as f64,
            member: (*id).into(),
        });
    }
    for id in ["r2", "r4"] {
        tx.push(WriteOp::ZAdd {
            key: "filter".into(),
            score: 0.0,
            member: id.into(),
        });
    }
    s.exec(tx).unwrap();

    let out = s
        .run(Script::RangeFilter {
            range_key: "ordering".into(),
            filter_key: "filter".into(),
            start: 0,
            stop: -1,
        })
        .unwrap();
    assert_eq!(out, ScriptOutput::Members(vec!["r2".into(), "r4".into()]));

    let out = s
        .run(Script::RangeFilter {
            range_key: "ordering".into(),
            filter_key: "missing".into(),
            start: 0,
            stop: -1,
        })
        .unwrap();
    assert_eq!(out, ScriptOutput::Members(vec![]));
}

#[test]
fn unlink_zset_members_removes_blobs_and_set() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    for id in ["e1", "e2", "e3"] {
        tx.push(WriteOp::Set { key: id.into(), value: b"blob".to_vec() });
        tx.push(WriteOp::ZAdd { key: "events".into(), score: 0.0, member: id.into() });
    }
    s.exec(tx).unwrap();

    let out = s.run(Script::UnlinkZsetMembers { key: "events".into() }).unwrap();
    assert_eq!(out, ScriptOutput::Unlinked(4));
    assert!(!s.exists("events").unwrap());
    assert!(s.get("e1").unwrap().is_none());
}

#[test]
fn unlink_matching_prefix() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    let mut tx = Tx::new();
    tx.push(WriteOp::Set { key: "events:created".into(), value: b"x".to_vec() });
    tx.push(WriteOp::Set { key: "events:device:d1".into(), value: b"x".to_vec() });
    tx.push(WriteOp::Set { key: "readings".into(), value: b"x".to_vec() });
    s.exec(tx).unwrap();

    let out = s.run(Script::UnlinkMatching { prefix: "events:".into() }).unwrap();
    assert_eq!(out, ScriptOutput::Unlinked(2));
    assert!(s.exists("readings").unwrap());
}

#[test]
fn wrong_shape_access_fails() {
    let engine = MemoryEngine::new();
    let mut s = engine.session();
    s.exec(Tx {
        guards: vec![],
        ops: vec![WriteOp::Set { key: "blob".into(), value: b"x".to_vec() }],
    })
    .unwrap();
    assert!(s.smembers("blob").is_err());
    assert!(s.zcard("blob").is_err());
    assert!(s.hget("blob", "f").is_err());
}

// ---------------------------------------------------------------------------
// Pool behavior
// ---------------------------------------------------------------------------

/// Counts dials so tests can observe redials.
struct CountingDialer {
    engine: MemoryEngine,
    dials: Arc<AtomicUsize>,
}

impl Dialer for CountingDialer {
    fn dial(&self) -> Result<Box<dyn Session>, KvError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.engine.session()))
    }
}

fn counting_pool(config: PoolConfig) -> (Pool, Arc<AtomicUsize>) {
    let dials = Arc::new(AtomicUsize::new(0));
    let dialer = CountingDialer {
        engine: MemoryEngine::new(),
        dials: Arc::clone(&dials),
    };
    (Pool::new(config, Box::new(dialer)), dials)
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_reuses_idle_sessions() {
    let (pool, dials) = counting_pool(PoolConfig::default());

    let first = pool.acquire().await.unwrap();
    drop(first);
    let second = pool.acquire().await.unwrap();
    drop(second);

    assert_eq!(dials.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_dials_lazily() {
    let (pool, dials) = counting_pool(PoolConfig::default());
    assert_eq!(dials.load(Ordering::SeqCst), 0);
    let _s = pool.acquire().await.unwrap();
    assert_eq!(dials.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_close_is_idempotent() {
    let (pool, _dials) = counting_pool(PoolConfig::default());
    let _ = pool.acquire().await.unwrap();
    pool.close();
    pool.close();
    assert!(pool.is_closed());
    assert!(matches!(pool.acquire().await, Err(KvError::Closed)));
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_times_out_when_exhausted() {
    let (pool, _dials) = counting_pool(PoolConfig {
        max_active: 1,
        acquire_timeout: Duration::from_millis(50),
        ..PoolConfig::default()
    });

    let held = pool.acquire().await.unwrap();
    assert!(matches!(pool.acquire().await, Err(KvError::Timeout)));
    drop(held);
    assert!(pool.acquire().await.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn pool_discards_surplus_idle() {
    let (pool, dials) = counting_pool(PoolConfig {
        max_idle: 1,
        ..PoolConfig::default()
    });

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    drop(a);
    drop(b);
    assert_eq!(dials.load(Ordering::SeqCst), 2);

    // One idle session retained, so a third acquire reuses it.
    let _c = pool.acquire().await.unwrap();
    assert_eq!(dials.load(Ordering::SeqCst), 2);
}
