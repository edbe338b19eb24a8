use proptest::prelude::*;
use resmgr::{Release, ReleaseFn, UniqueResource};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const NONE: u32 = 0;
const SLOTS: usize = 4;

#[derive(Clone, Default)]
struct Ledger(Rc<RefCell<HashMap<u32, u32>>>);

impl Ledger {
    fn times_released(&self, handle: u32) -> u32 {
        self.0.borrow().get(&handle).copied().unwrap_or(0)
    }
}

impl Release<u32> for Ledger {
    fn release(&mut self, handle: u32) {
        *self.0.borrow_mut().entry(handle).or_default() += 1;
    }
}

type Handle = UniqueResource<u32, Ledger>;

#[derive(Debug, Clone)]
enum Operation {
    Acquire(usize),
    Take(usize, usize),
    Assign(usize, usize),
    Swap(usize, usize),
    Release(usize),
}

fn two_mut<T>(slots: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b);
    if a < b {
        let (lo, hi) = slots.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = slots.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

/// Routes the crate's `tracing` output to the test harness (`RUST_LOG=resmgr=trace`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn slot() -> impl Strategy<Value = usize> {
    0..SLOTS
}

proptest! {
    #[test]
    fn test_each_handle_released_exactly_once(ops in proptest::collection::vec(
        prop_oneof![
            slot().prop_map(Operation::Acquire),
            (slot(), slot()).prop_map(|(a, b)| Operation::Take(a, b)),
            (slot(), slot()).prop_map(|(a, b)| Operation::Assign(a, b)),
            (slot(), slot()).prop_map(|(a, b)| Operation::Swap(a, b)),
            slot().prop_map(Operation::Release),
        ],
        1..80
    )) {
        let ledger = Ledger::default();
        let mut next_handle = 1;
        let mut acquired = Vec::new();

        {
            let mut slots: Vec<Handle> =
                (0..SLOTS).map(|_| Handle::invalid(NONE, ledger.clone())).collect();

            for op in ops {
                match op {
                    Operation::Acquire(i) => {
                        slots[i].reset(next_handle);
                        acquired.push(next_handle);
                        next_handle += 1;
                    }
                    Operation::Take(from, to) => {
                        let moved = slots[from].take();
                        slots[to] = moved;
                    }
                    Operation::Assign(from, to) if from != to => {
                        let (src, dst) = two_mut(&mut slots, from, to);
                        dst.assign_from(src);
                        prop_assert!(!src.is_valid());
                    }
                    Operation::Swap(a, b) if a != b => {
                        let before = ledger.0.borrow().len();
                        let (x, y) = two_mut(&mut slots, a, b);
                        x.swap(y);
                        prop_assert_eq!(ledger.0.borrow().len(), before, "swap released a handle");
                    }
                    Operation::Assign(..) | Operation::Swap(..) => {}
                    Operation::Release(i) => slots[i].release(),
                }

                // No handle is owned by two live wrappers.
                let mut live: Vec<u32> =
                    slots.iter().filter(|s| s.is_valid()).map(Handle::get).collect();
                let count = live.len();
                live.sort_unstable();
                live.dedup();
                prop_assert_eq!(live.len(), count, "handle owned twice");

                // Released handles are no longer owned.
                for handle in &live {
                    prop_assert_eq!(ledger.times_released(*handle), 0);
                }
            }
        }

        for handle in acquired {
            prop_assert_eq!(ledger.times_released(handle), 1, "handle {}", handle);
        }
        prop_assert!(ledger.times_released(NONE) == 0, "sentinel was released");
    }
}

#[test]
fn test_sentinel_wrapper_is_inert() {
    let ledger = Ledger::default();
    {
        let mut empty = Handle::invalid(NONE, ledger.clone());
        assert!(!empty.is_valid());
        empty.release();
        empty.release();
        assert_eq!(empty.get(), NONE);
    }
    assert!(ledger.0.borrow().is_empty());
}

#[test]
fn test_moved_wrapper_releases_at_final_owner() {
    let ledger = Ledger::default();
    let outer = {
        let inner = Handle::new(9, NONE, ledger.clone());
        let boxed = Box::new(inner);
        *boxed
    };
    assert_eq!(ledger.times_released(9), 0);
    drop(outer);
    assert_eq!(ledger.times_released(9), 1);
}

#[test]
fn test_closure_capability() {
    let released = Rc::new(RefCell::new(Vec::new()));
    let sink = released.clone();
    let mut handle = UniqueResource::new(5_u64, u64::MAX, ReleaseFn(move |h: u64| sink.borrow_mut().push(h)));
    handle.reset(6);
    drop(handle);
    assert_eq!(*released.borrow(), [5, 6]);
}

#[test]
fn test_panicking_release_is_contained_in_drop() {
    init_tracing();
    let attempts = Rc::new(RefCell::new(0));
    let counter = attempts.clone();
    let handle = UniqueResource::new(
        4_u32,
        NONE,
        ReleaseFn(move |_h: u32| {
            *counter.borrow_mut() += 1;
            panic!("device refused to close");
        }),
    );
    drop(handle);
    assert_eq!(*attempts.borrow(), 1);
}

#[test]
fn test_into_raw_hands_back_ownership() {
    let ledger = Ledger::default();
    let handle = Handle::new(11, NONE, ledger.clone());
    let raw = handle.into_raw();
    assert_eq!(raw, 11);
    assert_eq!(ledger.times_released(11), 0);

    // Adopting it again restores RAII.
    drop(Handle::new(raw, NONE, ledger.clone()));
    assert_eq!(ledger.times_released(11), 1);
}

#[cfg(unix)]
mod fd {
    use resmgr::resource::os::{unique_fd, INVALID_FD};

    #[test]
    fn test_unique_fd_closes_pipe_end() {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let read_end = unique_fd(fds[0]);
        let write_end = unique_fd(fds[1]);

        drop(read_end);
        // With the reader gone a write must fail with EPIPE instead of blocking.
        unsafe { libc::signal(libc::SIGPIPE, libc::SIG_IGN) };
        let rc = unsafe { libc::write(write_end.get(), b"x".as_ptr().cast(), 1) };
        assert_eq!(rc, -1);
        assert_eq!(std::io::Error::last_os_error().raw_os_error(), Some(libc::EPIPE));
    }

    #[test]
    fn test_unique_fd_sentinel() {
        let fd = unique_fd(INVALID_FD);
        assert!(!fd.is_valid());
        assert_eq!(fd.into_raw(), INVALID_FD);
    }
}
