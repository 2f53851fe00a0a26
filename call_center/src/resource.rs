use std::collections::{HashMap, VecDeque};

use des::{Agent, Response, SimTime};

use crate::{Event, ResourceKind, Stats};

/// A unit granted by a [`Resource`] to one call.
///
/// Not `Clone`: the only way to give the unit back is [`Hold::release`], which
/// consumes the token, so every grant is released at most once and a dropped
/// token shows up as an unused `#[must_use]` value.
///
/// Only a call that has seen its grant can hold one:
///
/// ```compile_fail
/// use call_center::{Hold, ResourceKind};
///
/// let forged = Hold::granted(ResourceKind::Telemarketer, 1);
/// ```
#[must_use = "a held unit must be released"]
#[derive(Debug, PartialEq, Eq)]
pub struct Hold {
    kind: ResourceKind,
    customer_id: usize,
}

impl Hold {
    pub(crate) fn granted(kind: ResourceKind, customer_id: usize) -> Hold {
        Hold { kind, customer_id }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn release(self) -> Event {
        Event::ResourceReleased(self.kind, self.customer_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceStats {
    pub kind: ResourceKind,
    pub capacity: usize,
    pub in_use: usize,
    pub queue_length: usize,
    pub peak_in_use: usize,
    pub peak_queue_length: usize,
    pub total_requests: usize,
    pub total_granted: usize,
    pub total_released: usize,
    pub total_wait_time: SimTime,
    pub total_hold_time: SimTime,
}

impl ResourceStats {
    pub fn utilization(&self) -> f64 {
        self.in_use as f64 / self.capacity as f64
    }

    pub fn is_at_capacity(&self) -> bool {
        self.in_use >= self.capacity
    }

    pub fn has_queue(&self) -> bool {
        self.queue_length > 0
    }

    /// Mean time from request to grant over granted requests.
    pub fn avg_wait_time(&self) -> Option<f64> {
        if self.total_granted == 0 {
            return None;
        }
        Some(self.total_wait_time / self.total_granted as f64)
    }

    pub fn avg_hold_time(&self) -> Option<f64> {
        if self.total_released == 0 {
            return None;
        }
        Some(self.total_hold_time / self.total_released as f64)
    }
}

/// Counted-capacity pool granting units in request order.
pub struct Resource {
    kind: ResourceKind,
    capacity: usize,
    holders: HashMap<usize, SimTime>, // customer ID -> granted at
    wait_list: VecDeque<(usize, SimTime)>, // customer ID, requested at
    peak_in_use: usize,
    peak_queue_length: usize,
    total_requests: usize,
    total_granted: usize,
    total_released: usize,
    total_wait_time: SimTime,
    total_hold_time: SimTime,
}

impl Resource {
    pub fn new(kind: ResourceKind, capacity: usize) -> Resource {
        Resource {
            kind,
            capacity,
            holders: HashMap::new(),
            wait_list: VecDeque::new(),
            peak_in_use: 0,
            peak_queue_length: 0,
            total_requests: 0,
            total_granted: 0,
            total_released: 0,
            total_wait_time: 0.0,
            total_hold_time: 0.0,
        }
    }

    pub fn in_use(&self) -> usize {
        self.holders.len()
    }

    fn grant(&mut self, current_t: SimTime, customer_id: usize, requested_at: SimTime) -> Event {
        self.holders.insert(customer_id, current_t);
        self.peak_in_use = self.peak_in_use.max(self.holders.len());
        self.total_granted += 1;
        self.total_wait_time += current_t - requested_at;
        tracing::trace!(
            t = current_t,
            customer_id,
            resource = %self.kind,
            waited = current_t - requested_at,
            "acquired"
        );
        Event::ResourceAcquired(self.kind, customer_id)
    }

    fn request(&mut self, current_t: SimTime, customer_id: usize) -> Response<Event, Stats> {
        self.total_requests += 1;
        tracing::trace!(t = current_t, customer_id, resource = %self.kind, "requested");

        if self.holders.len() < self.capacity {
            let acquired = self.grant(current_t, customer_id, current_t);
            return Response::event(current_t, acquired);
        }

        // fully occupied: wait in line until a unit is released
        self.wait_list.push_back((customer_id, current_t));
        self.peak_queue_length = self.peak_queue_length.max(self.wait_list.len());
        Response::new()
    }

    fn release(&mut self, current_t: SimTime, customer_id: usize) -> Response<Event, Stats> {
        let Some(granted_at) = self.holders.remove(&customer_id) else {
            tracing::warn!(
                t = current_t,
                customer_id,
                resource = %self.kind,
                "release without a matching grant ignored"
            );
            return Response::new();
        };
        self.total_released += 1;
        self.total_hold_time += current_t - granted_at;
        tracing::trace!(t = current_t, customer_id, resource = %self.kind, "released");

        match self.wait_list.pop_front() {
            Some((next_id, requested_at)) => {
                let acquired = self.grant(current_t, next_id, requested_at);
                Response::event(current_t, acquired)
            }
            None => Response::new(),
        }
    }
}

impl Agent<Event, Stats> for Resource {
    fn act(&mut self, current_t: SimTime, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::ResourceRequested(kind, customer_id) if *kind == self.kind => {
                self.request(current_t, *customer_id)
            }
            Event::ResourceReleased(kind, customer_id) if *kind == self.kind => {
                self.release(current_t, *customer_id)
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Resource(ResourceStats {
            kind: self.kind,
            capacity: self.capacity,
            in_use: self.holders.len(),
            queue_length: self.wait_list.len(),
            peak_in_use: self.peak_in_use,
            peak_queue_length: self.peak_queue_length,
            total_requests: self.total_requests,
            total_granted: self.total_granted,
            total_released: self.total_released,
            total_wait_time: self.total_wait_time,
            total_hold_time: self.total_hold_time,
        })
    }
}
