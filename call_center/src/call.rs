use des::{Agent, Response, SimTime};
use serde::Serialize;

use crate::resource::Hold;
use crate::{CallRecord, Event, ResourceKind, Stats};

/// Hand-off from queue slot to telemarketer: one second.
pub const ASSIGN_DELAY: SimTime = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Created,
    Ivr,
    QueueWait,
    Assign,
    TelemarketerWait,
    Service,
    Done,
}

/// Durations drawn for a call when its customer arrives, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPlan {
    pub ivr_minutes: u32,
    pub service_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallProgress {
    pub customer_id: usize,
    pub stage: Stage,
}

#[derive(Debug, Default, Clone, Copy)]
struct Marks {
    start: SimTime,
    ivr: SimTime,
    queue: SimTime,
    ask: SimTime,
}

/// One customer's journey through the call center.
///
/// Resumes only on events addressed to its customer and only when the event
/// is the one its current stage waits for.
pub struct Call {
    customer_id: usize,
    plan: CallPlan,
    stage: Stage,
    marks: Marks,
    queue_slot: Option<Hold>,
    telemarketer: Option<Hold>,
}

impl Call {
    pub fn new(customer_id: usize, plan: CallPlan) -> Call {
        Call {
            customer_id,
            plan,
            stage: Stage::Created,
            marks: Marks::default(),
            queue_slot: None,
            telemarketer: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, current_t: SimTime, stage: Stage) {
        tracing::trace!(t = current_t, customer_id = self.customer_id, ?stage, "call stage");
        self.stage = stage;
    }

    fn timeout_after(&self, current_t: SimTime, minutes: SimTime) -> (SimTime, Event) {
        (
            current_t + minutes,
            Event::Timeout {
                customer_id: self.customer_id,
            },
        )
    }
}

impl Agent<Event, Stats> for Call {
    fn act(&mut self, current_t: SimTime, data: &Event) -> Response<Event, Stats> {
        if data.customer_id() != Some(self.customer_id) {
            return Response::new();
        }

        match (self.stage, data) {
            (Stage::Created, Event::CallStarted { .. }) => {
                self.marks.start = current_t;
                self.enter(current_t, Stage::Ivr);
                let (t, wake) = self.timeout_after(current_t, self.plan.ivr_minutes as SimTime);
                Response::event(t, wake)
            }
            (Stage::Ivr, Event::Timeout { .. }) => {
                self.marks.ivr = current_t;
                self.enter(current_t, Stage::QueueWait);
                Response::event(
                    current_t,
                    Event::ResourceRequested(ResourceKind::QueueSlot, self.customer_id),
                )
            }
            (Stage::QueueWait, Event::ResourceAcquired(ResourceKind::QueueSlot, _)) => {
                self.queue_slot = Some(Hold::granted(ResourceKind::QueueSlot, self.customer_id));
                self.enter(current_t, Stage::Assign);
                let (t, wake) = self.timeout_after(current_t, ASSIGN_DELAY);
                Response::event(t, wake)
            }
            (Stage::Assign, Event::Timeout { .. }) => {
                // the slot goes back before the telemarketer is asked for
                let mut events = Vec::with_capacity(2);
                if let Some(slot) = self.queue_slot.take() {
                    events.push((current_t, slot.release()));
                }
                events.push((
                    current_t,
                    Event::ResourceRequested(ResourceKind::Telemarketer, self.customer_id),
                ));
                self.marks.queue = current_t;
                self.enter(current_t, Stage::TelemarketerWait);
                Response::events(events)
            }
            (Stage::TelemarketerWait, Event::ResourceAcquired(ResourceKind::Telemarketer, _)) => {
                self.telemarketer =
                    Some(Hold::granted(ResourceKind::Telemarketer, self.customer_id));
                self.marks.ask = current_t;
                self.enter(current_t, Stage::Service);
                let (t, wake) =
                    self.timeout_after(current_t, self.plan.service_minutes as SimTime);
                Response::event(t, wake)
            }
            (Stage::Service, Event::Timeout { .. }) => {
                let mut events = Vec::with_capacity(2);
                if let Some(telemarketer) = self.telemarketer.take() {
                    events.push((current_t, telemarketer.release()));
                }
                let record = CallRecord {
                    id: self.customer_id,
                    start: self.marks.start,
                    ivr: self.marks.ivr,
                    queue: self.marks.queue,
                    ask: self.marks.ask,
                    end: current_t,
                };
                events.push((current_t, Event::CallCompleted(record)));
                self.enter(current_t, Stage::Done);
                Response::events(events)
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Call(CallProgress {
            customer_id: self.customer_id,
            stage: self.stage,
        })
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}
