//! Discrete-event engine.
//!
//! Agents react to broadcast events and answer with new events (scheduled at
//! absolute times) and newly spawned agents. Time is a continuous `f64` clock
//! in arbitrary units; events sharing a timestamp fire in insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use thiserror::Error;

pub mod parallel;

/// Simulated time.
pub type SimTime = f64;

/// Fatal engine faults. Both indicate a scheduling bug in an agent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesError {
    #[error("event at t={event_t} popped after the clock reached t={current_t}")]
    TimeTravel { event_t: SimTime, current_t: SimTime },

    #[error("invalid event time {0}")]
    InvalidTime(SimTime),
}

struct Event<T> {
    t: SimTime,
    seq: u64,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    // BinaryHeap is a max-heap: reverse so the earliest (then oldest) event is on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What an agent hands back after seeing an event.
pub struct Response<T, S> {
    pub events: Vec<(SimTime, T)>,
    pub agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> Default for Response<T, S> {
    fn default() -> Self {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
        }
    }
}

impl<T, S> Response<T, S> {
    pub fn new() -> Response<T, S> {
        Response::default()
    }

    pub fn event(t: SimTime, data: T) -> Response<T, S> {
        Response {
            events: vec![(t, data)],
            agents: Vec::new(),
        }
    }

    pub fn events(events: Vec<(SimTime, T)>) -> Response<T, S> {
        Response {
            events,
            agents: Vec::new(),
        }
    }

    /// Add a spawned agent. It joins after the current broadcast completes.
    pub fn with_agent(mut self, agent: Box<dyn Agent<T, S>>) -> Response<T, S> {
        self.agents.push(agent);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.agents.is_empty()
    }
}

pub trait Agent<T, S> {
    fn act(&mut self, _current_t: SimTime, _data: &T) -> Response<T, S> {
        Response::new()
    }

    fn stats(&self) -> S;

    /// Finished agents are dropped from the loop after the broadcast that
    /// finished them.
    fn is_finished(&self) -> bool {
        false
    }
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    current_t: SimTime,
    next_seq: u64,
    fired: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(events: Vec<(SimTime, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::with_capacity(events.len()),
            current_t: 0.0,
            next_seq: 0,
            fired: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.push(t, data);
        }
        event_loop
    }

    pub fn current_t(&self) -> SimTime {
        self.current_t
    }

    /// Events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Events fired so far.
    pub fn fired(&self) -> usize {
        self.fired
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Schedule an event from outside the loop.
    pub fn schedule(&mut self, t: SimTime, data: T) -> Result<(), DesError> {
        if !t.is_finite() || t < 0.0 {
            return Err(DesError::InvalidTime(t));
        }
        if t < self.current_t {
            return Err(DesError::TimeTravel {
                event_t: t,
                current_t: self.current_t,
            });
        }
        self.push(t, data);
        Ok(())
    }

    fn push(&mut self, t: SimTime, data: T) {
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            data,
        });
        self.next_seq += 1;
    }

    fn broadcast(&mut self, event: Event<T>) {
        let mut new_events = Vec::new();
        let mut new_agents = Vec::new();
        for agent in &mut self.agents {
            let response = agent.act(self.current_t, &event.data);
            new_events.extend(response.events);
            new_agents.extend(response.agents);
        }
        for (t, data) in new_events {
            self.push(t, data);
        }
        self.agents.retain(|agent| !agent.is_finished());
        self.agents.extend(new_agents);
    }

    /// Fire events until the queue drains or the next event is due at or
    /// after `until`. Events at exactly `until` are left unfired and the
    /// clock is parked at `until`.
    pub fn run(&mut self, until: SimTime) -> Result<(), DesError> {
        while let Some(next) = self.queue.peek() {
            if next.t >= until {
                self.current_t = self.current_t.max(until);
                break;
            }
            let Some(event) = self.queue.pop() else {
                break;
            };
            if !event.t.is_finite() {
                return Err(DesError::InvalidTime(event.t));
            }
            if event.t < self.current_t {
                return Err(DesError::TimeTravel {
                    event_t: event.t,
                    current_t: self.current_t,
                });
            }
            tracing::trace!(t = event.t, seq = event.seq, "firing event");
            self.current_t = event.t;
            self.fired += 1;
            self.broadcast(event);
        }
        tracing::debug!(
            now = self.current_t,
            fired = self.fired,
            pending = self.queue.len(),
            agents = self.agents.len(),
            "event loop stopped"
        );
        Ok(())
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}
