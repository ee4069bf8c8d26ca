//! Discrete event simulation core
//!
//! Events are `(time, data)` pairs kept in a min-queue. Each popped event is
//! broadcast to every agent; agents answer with new events and new agents.
//! Events sharing a timestamp are delivered in the order they were scheduled,
//! which keeps runs reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub mod parallel;

struct Event<T> {
    t: usize,
    seq: u64,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t && self.seq == other.seq
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    // reversed so BinaryHeap pops the earliest (t, seq) first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What an agent hands back after reacting to an event
pub struct Response<T, S> {
    pub events: Vec<(usize, T)>,
    pub agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> Response<T, S> {
    pub fn new() -> Response<T, S> {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
        }
    }

    pub fn event(t: usize, data: T) -> Response<T, S> {
        Response {
            events: vec![(t, data)],
            agents: Vec::new(),
        }
    }

    pub fn events(events: Vec<(usize, T)>) -> Response<T, S> {
        Response {
            events,
            agents: Vec::new(),
        }
    }
}

impl<T, S> Default for Response<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Agent<T, S> {
    fn act(&mut self, _current_t: usize, _data: &T) -> Response<T, S> {
        Response::new()
    }

    /// Observable state, collected once the loop has finished
    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    next_seq: u64,
    current_t: usize,
    processed: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(events: Vec<(usize, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            next_seq: 0,
            current_t: 0,
            processed: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.schedule(t, data);
        }
        event_loop
    }

    /// Queue an event. Events earlier than the current time are dropped.
    pub fn schedule(&mut self, t: usize, data: T) {
        if t < self.current_t {
            log::warn!(
                "dropping event scheduled in the past (t={}, now={})",
                t,
                self.current_t
            );
            return;
        }
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            data,
        });
        self.next_seq += 1;
    }

    pub fn current_t(&self) -> usize {
        self.current_t
    }

    pub fn processed_events(&self) -> usize {
        self.processed
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Deliver the next event to every agent. Returns false once the queue is empty.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        self.current_t = event.t;
        self.processed += 1;

        let mut new_events = Vec::new();
        let mut new_agents = Vec::new();
        for agent in &mut self.agents {
            let response = agent.act(self.current_t, &event.data);
            new_events.extend(response.events);
            new_agents.extend(response.agents);
        }
        self.agents.extend(new_agents);
        for (t, data) in new_events {
            self.schedule(t, data);
        }
        true
    }

    /// Process every event with `t <= until`
    pub fn run(&mut self, until: usize) {
        while let Some(next) = self.queue.peek() {
            if next.t > until {
                break;
            }
            self.step();
        }
        log::debug!(
            "event loop paused at t={} after {} events ({} pending)",
            self.current_t,
            self.processed,
            self.queue.len()
        );
    }

    /// Process events until none are left
    pub fn run_to_completion(&mut self) {
        while self.step() {}
        log::debug!(
            "event loop drained at t={} after {} events",
            self.current_t,
            self.processed
        );
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}
