use resmgr::concurrency::sync::{FutexLockOps, SpinLockOps};
use resmgr::resource::os::{shared_heap, HeapBlock};
use resmgr::{LockBox, Locked, ScopedLock};
use std::sync::Arc;
use std::thread;

#[test]
fn test_lock_box_guards_shared_heap_payload() {
    const THREADS: usize = 4;
    const ITERS: u64 = 1_000;

    let block = HeapBlock::calloc(core::mem::size_of::<u64>());
    assert!(!block.is_null());
    let memory = shared_heap(block).unwrap();
    let lock = Arc::new(LockBox::new(FutexLockOps));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let memory = memory.clone();
            let lock = lock.clone();
            thread::spawn(move || {
                for _ in 0..ITERS {
                    let _guard = ScopedLock::new(&lock);
                    let slot = memory.get().as_ptr().cast::<u64>();
                    // SAFETY: calloc'd for one u64; the lock serializes access.
                    unsafe { slot.write_unaligned(slot.read_unaligned() + 1) };
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(memory.ref_count(), 1);
    let _guard = lock.lock();
    let total = unsafe { memory.get().as_ptr().cast::<u64>().read_unaligned() };
    assert_eq!(total, THREADS as u64 * ITERS);
}

#[test]
fn test_locked_across_threads() {
    let log = Arc::new(Locked::new(SpinLockOps, Vec::new()));

    thread::scope(|s| {
        for id in 0..3 {
            let log = &log;
            s.spawn(move || {
                for n in 0..10 {
                    log.lock().push((id, n));
                }
            });
        }
    });

    let entries = log.lock();
    assert_eq!(entries.len(), 30);
    for id in 0..3 {
        // Each thread's entries stay in program order.
        let mine: Vec<_> = entries.iter().filter(|(t, _)| *t == id).map(|(_, n)| *n).collect();
        assert_eq!(mine, (0..10).collect::<Vec<_>>());
    }
}

#[test]
fn test_sequential_scopes_reacquire() {
    let lock = LockBox::<SpinLockOps>::default();
    for _ in 0..100 {
        let _guard = lock.lock();
    }
    lock.lock_raw();
    unsafe { lock.unlock_raw() };
    drop(lock.lock());
}

#[cfg(unix)]
#[test]
fn test_pthread_box_in_arc() {
    use resmgr::concurrency::sync::PthreadMutexOps;

    let counter = Arc::new(Locked::new(PthreadMutexOps, 0_u32));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    *counter.lock() += 1;
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*counter.lock(), 2_000);
}
