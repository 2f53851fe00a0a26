//! Call center discrete-event model.
//!
//! Customers arrive from a [`Demand`] generator, spend a random time in the
//! IVR, take a queue slot for a one-second hand-off, then wait for a
//! telemarketer and are served. Queue slots and telemarketers are two
//! [`Resource`] pools granting units in strict FIFO order.
//!
//! Every run is seeded, so identical configurations produce identical call
//! logs. Calls still in flight when the horizon is reached are dropped from
//! the log without a warning.

use std::fmt;

use rand::distr::weighted::{Error as WeightError, WeightedIndex};
use serde::{Deserialize, Serialize};

pub mod call;
pub mod config;
pub mod demand;
pub mod error;
pub mod output;
pub mod resource;
pub mod simulation;

pub use call::{ASSIGN_DELAY, Call, CallPlan, CallProgress, Stage};
pub use config::{InterArrival, NUM_INTERCALL_MINUTES_HOUR, SimulationConfig};
pub use demand::{Demand, DemandStats};
pub use error::{ConfigError, OutputError, SimulationError};
pub use resource::{Hold, Resource, ResourceStats};
pub use simulation::{Simulation, SimulationReport, Summary, run_sweep};

pub use des::SimTime;

pub const MINUTES_PER_HOUR: f64 = 60.0;
pub const MINUTES_PER_DAY: f64 = 24.0 * MINUTES_PER_HOUR;

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    QueueSlot,
    Telemarketer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::QueueSlot => write!(f, "queue slot"),
            ResourceKind::Telemarketer => write!(f, "telemarketer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    /// Steady-stream wake-up for the demand generator.
    ArrivalDue,
    CallStarted { customer_id: usize },
    /// A call's timed stage is over.
    Timeout { customer_id: usize },
    ResourceRequested(ResourceKind, usize), // resource, customer ID
    ResourceAcquired(ResourceKind, usize),  // resource, customer ID
    ResourceReleased(ResourceKind, usize),  // resource, customer ID
    CallCompleted(CallRecord),
}

impl Event {
    /// The customer whose call process this event resumes, if any.
    pub fn customer_id(&self) -> Option<usize> {
        match self {
            Event::CallStarted { customer_id } | Event::Timeout { customer_id } => {
                Some(*customer_id)
            }
            Event::ResourceAcquired(_, customer_id) => Some(*customer_id),
            _ => None,
        }
    }
}

// ============================================================================
// Core Data Types
// ============================================================================

/// One completed call. Times are minutes from simulation start and are
/// non-decreasing in field order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: usize,
    pub start: SimTime,
    pub ivr: SimTime,
    pub queue: SimTime,
    pub ask: SimTime,
    pub end: SimTime,
}

impl CallRecord {
    pub fn total(&self) -> SimTime {
        self.end - self.start
    }

    pub fn ivr_time(&self) -> SimTime {
        self.ivr - self.start
    }

    /// Waiting for a queue slot plus the hand-off.
    pub fn queue_time(&self) -> SimTime {
        self.queue - self.ivr
    }

    pub fn telemarketer_wait(&self) -> SimTime {
        self.ask - self.queue
    }

    pub fn service_time(&self) -> SimTime {
        self.end - self.ask
    }

    /// Hour of day (0..24) the call started in.
    pub fn start_hour(&self) -> usize {
        (self.start / MINUTES_PER_HOUR).floor() as usize % 24
    }

    /// Day number, starting at 1.
    pub fn start_day(&self) -> usize {
        (self.start / MINUTES_PER_DAY).floor() as usize + 1
    }

    pub fn is_monotonic(&self) -> bool {
        self.start <= self.ivr && self.ivr <= self.queue && self.queue <= self.ask && self.ask <= self.end
    }
}

/// Request category drawn for each customer.
///
/// Nothing in the queueing or service logic reads it; it is carried on the
/// customer for downstream analysis only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::P1,
        Category::P2,
        Category::P3,
        Category::P4,
        Category::P5,
    ];

    pub fn weight(self) -> u32 {
        match self {
            Category::P1 => 5,
            Category::P2 => 10,
            Category::P3 => 20,
            Category::P4 => 30,
            Category::P5 => 35,
        }
    }

    /// Distribution over indices into [`Category::ALL`], by weight.
    pub fn weighted_index() -> Result<WeightedIndex<u32>, WeightError> {
        WeightedIndex::new(Category::ALL.map(Category::weight))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: usize,
    pub category: Category,
    pub calls: Vec<CallRecord>,
}

impl Customer {
    pub fn new(id: usize, category: Category) -> Customer {
        Customer {
            id,
            category,
            calls: Vec::new(),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone)]
pub enum Stats {
    Demand(DemandStats),
    Resource(ResourceStats),
    /// A call still in progress when stats were taken.
    Call(CallProgress),
}
