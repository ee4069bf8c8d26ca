//! The shared set of washing machines
//!
//! Allocation is greedy earliest-free-first: the machine with the smallest
//! `busy_until` is handed out if it is free now, otherwise the request is
//! refused and the caller retries later. There is no waiting queue, so a
//! student who has waited longest gets no priority over a newcomer.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A machine handed to a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub machine: usize,
    /// Time at which the machine becomes free again
    pub until: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePool {
    busy_until: Vec<usize>,
    grants: usize,
    denials: usize,
}

impl ResourcePool {
    /// `machines` idle machines
    pub fn new(machines: usize) -> Self {
        Self::from_busy_until(vec![0; machines])
    }

    /// Machines already occupied until the given times
    pub fn from_busy_until(busy_until: Vec<usize>) -> Self {
        ResourcePool {
            busy_until,
            grants: 0,
            denials: 0,
        }
    }

    pub fn machines(&self) -> usize {
        self.busy_until.len()
    }

    pub fn busy_until(&self) -> &[usize] {
        &self.busy_until
    }

    pub fn grants(&self) -> usize {
        self.grants
    }

    pub fn denials(&self) -> usize {
        self.denials
    }

    /// Earliest time any machine is free, with the lowest index among ties
    pub fn next_free(&self) -> Option<(usize, usize)> {
        self.busy_until
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, until)| until)
    }

    /// Machines still occupied at `t`
    pub fn busy_at(&self, t: usize) -> usize {
        self.busy_until.iter().filter(|&&until| until > t).count()
    }

    /// Occupy the earliest-free machine for `duration` if it is free at `now`
    pub fn try_acquire(&mut self, now: usize, duration: usize) -> Option<Grant> {
        match self.next_free() {
            Some((machine, until)) if until <= now => {
                let until = now + duration;
                self.busy_until[machine] = until;
                self.grants += 1;
                Some(Grant { machine, until })
            }
            _ => {
                self.denials += 1;
                None
            }
        }
    }
}

/// Cloneable handle to a pool shared between students
///
/// Every allocation runs under the lock, so two students can never observe
/// the same free machine.
#[derive(Debug, Clone)]
pub struct SharedPool {
    inner: Arc<Mutex<ResourcePool>>,
}

impl SharedPool {
    pub fn new(pool: ResourcePool) -> Self {
        SharedPool {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    pub fn try_acquire(&self, now: usize, duration: usize) -> Option<Grant> {
        self.lock().try_acquire(now, duration)
    }

    pub fn snapshot(&self) -> ResourcePool {
        self.lock().clone()
    }

    // a panicked holder cannot leave the pool half-updated
    fn lock(&self) -> MutexGuard<'_, ResourcePool> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_idle_pool_when_acquired_then_lowest_index_granted() {
        let mut pool = ResourcePool::new(3);

        let grant = pool.try_acquire(0, 4);

        assert_eq!(grant, Some(Grant { machine: 0, until: 4 }));
        assert_eq!(pool.busy_until(), &[4, 0, 0]);
        assert_eq!(pool.grants(), 1);
    }

    #[test]
    fn given_busy_pool_when_acquired_then_refused_without_change() {
        let mut pool = ResourcePool::from_busy_until(vec![5, 3]);

        assert_eq!(pool.try_acquire(2, 1), None);

        assert_eq!(pool.busy_until(), &[5, 3]);
        assert_eq!(pool.denials(), 1);
    }

    #[test]
    fn given_machine_freeing_now_when_acquired_then_granted() {
        let mut pool = ResourcePool::from_busy_until(vec![5, 3]);

        let grant = pool.try_acquire(3, 2);

        assert_eq!(grant, Some(Grant { machine: 1, until: 5 }));
    }

    #[test]
    fn earliest_free_machine_is_picked() {
        let mut pool = ResourcePool::from_busy_until(vec![4, 1, 2, 1]);

        let grant = pool.try_acquire(10, 3);

        assert_eq!(grant, Some(Grant { machine: 1, until: 13 }));
        assert_eq!(pool.next_free(), Some((3, 1)));
    }

    #[test]
    fn zero_duration_leaves_machine_free() {
        let mut pool = ResourcePool::new(1);

        assert!(pool.try_acquire(2, 0).is_some());
        assert!(pool.try_acquire(2, 1).is_some());
        assert!(pool.try_acquire(2, 1).is_none());
    }

    #[test]
    fn refused_request_reserves_nothing() {
        let mut pool = ResourcePool::from_busy_until(vec![5]);
        // long waiter refused just before the machine frees
        assert_eq!(pool.try_acquire(4, 2), None);

        // whoever asks first at t=5 gets it, however long the other waited
        let newcomer = pool.try_acquire(5, 3);
        let waiter = pool.try_acquire(5, 2);

        assert_eq!(newcomer, Some(Grant { machine: 0, until: 8 }));
        assert_eq!(waiter, None);
    }

    #[test]
    fn busy_at_counts_open_intervals() {
        let pool = ResourcePool::from_busy_until(vec![0, 3, 7]);

        assert_eq!(pool.busy_at(0), 2);
        assert_eq!(pool.busy_at(3), 1);
        assert_eq!(pool.busy_at(7), 0);
    }

    #[test]
    fn shared_pool_never_double_grants() {
        let pool = SharedPool::new(ResourcePool::new(4));

        let grants: Vec<Option<Grant>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let pool = pool.clone();
                    scope.spawn(move || pool.try_acquire(0, 10))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut machines: Vec<usize> = grants.iter().flatten().map(|g| g.machine).collect();
        machines.sort_unstable();
        assert_eq!(machines, vec![0, 1, 2, 3]);

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.grants(), 4);
        assert_eq!(snapshot.denials(), 12);
    }
}
