// Given-When-Then tests for the Resource pool agent.
// All assertions go through the public Stats interface.

use call_center::{Event, Resource, ResourceKind, ResourceStats, Stats};
use des::Agent;

const QS: ResourceKind = ResourceKind::QueueSlot;

fn resource_stats(resource: &Resource) -> ResourceStats {
    match resource.stats() {
        Stats::Resource(rs) => rs,
        other => panic!("Expected ResourceStats, got {:?}", other),
    }
}

#[test]
fn given_free_capacity_when_customer_requests_then_immediately_acquired() {
    // GIVEN: pool with capacity 2, nobody holding a unit
    let mut resource = Resource::new(QS, 2);
    let stats = resource_stats(&resource);
    assert_eq!(stats.in_use, 0);
    assert!(!stats.is_at_capacity());

    // WHEN: customer 42 requests at t=10
    let response = resource.act(10.0, &Event::ResourceRequested(QS, 42));

    // THEN: grant at the current time, no agents spawned
    assert_eq!(response.events, vec![(10.0, Event::ResourceAcquired(QS, 42))]);
    assert!(response.agents.is_empty());

    let stats = resource_stats(&resource);
    assert_eq!(stats.in_use, 1);
    assert_eq!(stats.queue_length, 0);
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.total_granted, 1);
    assert_eq!(stats.utilization(), 0.5);
}

#[test]
fn given_full_pool_when_customer_requests_then_queued_not_acquired() {
    // GIVEN: capacity 1, already held
    let mut resource = Resource::new(QS, 1);
    resource.act(10.0, &Event::ResourceRequested(QS, 1));
    assert!(resource_stats(&resource).is_at_capacity());

    // WHEN: a second customer requests
    let response = resource.act(15.0, &Event::ResourceRequested(QS, 2));

    // THEN: no grant, customer waits
    assert!(response.events.is_empty());
    let stats = resource_stats(&resource);
    assert_eq!(stats.in_use, 1);
    assert_eq!(stats.queue_length, 1);
    assert!(stats.has_queue());
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_granted, 1);
}

#[test]
fn given_queued_customers_when_released_then_head_of_line_acquires() {
    // GIVEN: capacity 1 held by customer 1, customers 2 and 3 waiting
    let mut resource = Resource::new(QS, 1);
    resource.act(10.0, &Event::ResourceRequested(QS, 1));
    resource.act(15.0, &Event::ResourceRequested(QS, 2));
    resource.act(17.0, &Event::ResourceRequested(QS, 3));

    // WHEN: customer 1 releases at t=25
    let response = resource.act(25.0, &Event::ResourceReleased(QS, 1));

    // THEN: customer 2 (first in line) gets the unit with zero extra delay
    assert_eq!(response.events, vec![(25.0, Event::ResourceAcquired(QS, 2))]);

    let stats = resource_stats(&resource);
    assert_eq!(stats.in_use, 1, "Still at capacity");
    assert_eq!(stats.queue_length, 1, "Customer 3 still waiting");
    assert_eq!(stats.total_wait_time, 10.0, "Customer 2 waited 15 -> 25");
    assert_eq!(stats.total_hold_time, 15.0, "Customer 1 held 10 -> 25");
}

#[test]
fn given_many_waiters_when_released_repeatedly_then_grants_follow_request_order() {
    // GIVEN: capacity 1 and four customers in line
    let mut resource = Resource::new(QS, 1);
    resource.act(0.0, &Event::ResourceRequested(QS, 10));
    for (t, cid) in [(1.0, 40), (2.0, 20), (3.0, 30), (4.0, 50)] {
        resource.act(t, &Event::ResourceRequested(QS, cid));
    }

    // WHEN: each holder releases in turn
    let mut holder = 10;
    let mut granted = Vec::new();
    for t in [5.0, 6.0, 7.0, 8.0] {
        let response = resource.act(t, &Event::ResourceReleased(QS, holder));
        match &response.events[..] {
            [(_, Event::ResourceAcquired(_, cid))] => {
                granted.push(*cid);
                holder = *cid;
            }
            other => panic!("Expected one ResourceAcquired, got {:?}", other),
        }
    }

    // THEN: strictly first come, first served
    assert_eq!(granted, vec![40, 20, 30, 50]);
}

#[test]
fn given_no_waiters_when_released_then_pool_goes_idle() {
    let mut resource = Resource::new(QS, 1);
    resource.act(10.0, &Event::ResourceRequested(QS, 1));

    let response = resource.act(40.0, &Event::ResourceReleased(QS, 1));

    assert!(response.events.is_empty());
    let stats = resource_stats(&resource);
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.utilization(), 0.0);
    assert_eq!(stats.total_released, 1);
    assert_eq!(stats.avg_hold_time(), Some(30.0));
    assert_eq!(stats.avg_wait_time(), Some(0.0));
}

#[test]
fn given_pool_for_other_kind_when_event_received_then_ignored() {
    let mut resource = Resource::new(QS, 1);

    let requested = resource.act(
        10.0,
        &Event::ResourceRequested(ResourceKind::Telemarketer, 42),
    );
    let released = resource.act(
        15.0,
        &Event::ResourceReleased(ResourceKind::Telemarketer, 42),
    );

    assert!(requested.events.is_empty());
    assert!(released.events.is_empty());
    let stats = resource_stats(&resource);
    assert_eq!(stats.total_requests, 0);
    assert_eq!(stats.in_use, 0);
}

#[test]
fn given_fresh_pool_then_averages_are_undefined() {
    let resource = Resource::new(QS, 3);
    let stats = resource_stats(&resource);
    assert_eq!(stats.avg_wait_time(), None);
    assert_eq!(stats.avg_hold_time(), None);
}

#[test]
fn peaks_track_the_busiest_moment() {
    let mut resource = Resource::new(QS, 2);

    resource.act(0.0, &Event::ResourceRequested(QS, 1));
    resource.act(1.0, &Event::ResourceRequested(QS, 2));
    resource.act(2.0, &Event::ResourceRequested(QS, 3));
    resource.act(3.0, &Event::ResourceRequested(QS, 4));
    resource.act(4.0, &Event::ResourceReleased(QS, 1));
    resource.act(5.0, &Event::ResourceReleased(QS, 2));
    resource.act(6.0, &Event::ResourceReleased(QS, 3));
    resource.act(7.0, &Event::ResourceReleased(QS, 4));

    let stats = resource_stats(&resource);
    assert_eq!(stats.peak_in_use, 2);
    assert_eq!(stats.peak_queue_length, 2);
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.total_granted, 4);
    assert_eq!(stats.total_released, 4);
    // customer 3 waited 2 -> 4, customer 4 waited 3 -> 5
    assert_eq!(stats.total_wait_time, 4.0);
}
