use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use crossbeam_utils::atomic::AtomicCell;
use resmgr::concurrency::sync::{FutexLockOps, SpinLockOps};
use resmgr::{CachePadded, LockBox, LockOps, RefCounter, Release, SharedResource};
use std::sync::atomic::AtomicUsize;
use std::thread;

const THREADS: usize = 4;
const OPS_PER_THREAD: usize = 1_000;

#[derive(Clone, Copy)]
struct Noop;

impl Release<usize> for Noop {
    #[inline]
    fn release(&mut self, handle: usize) {
        black_box(handle);
    }
}

fn clone_drop<C: RefCounter<usize>>(shared: &SharedResource<usize, Noop, C, usize>) {
    let copy = black_box(shared.clone());
    drop(copy);
}

fn bench_counter<C>(c: &mut Criterion, name: &str)
where
    C: RefCounter<usize> + Send + Sync,
{
    let shared: SharedResource<usize, Noop, C, usize> =
        SharedResource::new(1, 0, Noop).expect("counter allocation");

    let mut group = c.benchmark_group("clone_drop");
    group.bench_function(name, |b| b.iter(|| clone_drop(&shared)));
    group.finish();

    let mut group = c.benchmark_group("clone_drop_contended");
    group.throughput(Throughput::Elements((THREADS * OPS_PER_THREAD) as u64));
    group.bench_function(name, |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS_PER_THREAD {
                            clone_drop(&shared);
                        }
                    });
                }
            });
        })
    });
    group.finish();
}

fn bench_lock<L>(c: &mut Criterion, name: &str, ops: L)
where
    L: LockOps + Sync,
    L::Primitive: Sync,
{
    let lock = LockBox::new(ops);
    let mut counter = 0_u64;

    let mut group = c.benchmark_group("scoped_lock");
    group.bench_function(name, |b| {
        b.iter(|| {
            let _guard = lock.lock();
            counter = black_box(counter + 1);
        })
    });
    group.finish();

    let total = AtomicUsize::new(0);
    let mut group = c.benchmark_group("scoped_lock_contended");
    group.throughput(Throughput::Elements((THREADS * OPS_PER_THREAD) as u64));
    group.bench_function(name, |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS_PER_THREAD {
                            let _guard = lock.lock();
                            total.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    });
                }
            });
        })
    });
    group.finish();
}

fn counters(c: &mut Criterion) {
    bench_counter::<AtomicUsize>(c, "atomic_usize");
    bench_counter::<AtomicCell<usize>>(c, "atomic_cell");
    bench_counter::<CachePadded<AtomicUsize>>(c, "padded_atomic_usize");
}

fn locks(c: &mut Criterion) {
    bench_lock(c, "spin", SpinLockOps);
    bench_lock(c, "futex", FutexLockOps);
    #[cfg(unix)]
    bench_lock(c, "pthread", resmgr::concurrency::sync::PthreadMutexOps);
    #[cfg(windows)]
    bench_lock(c, "critical_section", resmgr::concurrency::sync::CriticalSectionOps::default());
    #[cfg(windows)]
    bench_lock(c, "win_mutex", resmgr::concurrency::sync::WinMutexOps);
}

criterion_group!(benches, counters, locks);
criterion_main!(benches);
