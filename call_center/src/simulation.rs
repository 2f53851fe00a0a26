use des::parallel::{ParallelRunner, simple_progress_reporter};
use des::{Agent, EventLoop};

use crate::demand::Demand;
use crate::resource::{Resource, ResourceStats};
use crate::{
    CallRecord, ConfigError, Customer, Event, ResourceKind, SimulationConfig, SimulationError,
    Stats,
};

/// Count, mean and sample standard deviation of per-call `end - start`.
///
/// The mean is 0 with no calls and the deviation is 0 with fewer than two.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Summary {
    pub customers: usize,
    pub total_avg: f64,
    pub total_std: f64,
}

impl Summary {
    pub fn from_calls(calls: &[CallRecord]) -> Summary {
        let n = calls.len();
        if n == 0 {
            return Summary {
                customers: 0,
                total_avg: 0.0,
                total_std: 0.0,
            };
        }

        let mean = calls.iter().map(|c| c.total()).sum::<f64>() / n as f64;
        let std = if n < 2 {
            0.0
        } else {
            let variance = calls
                .iter()
                .map(|c| (c.total() - mean).powi(2))
                .sum::<f64>()
                / (n - 1) as f64;
            variance.sqrt()
        };

        Summary {
            customers: n,
            total_avg: mean,
            total_std: std,
        }
    }
}

/// Everything a run hands to downstream analysis.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Completed calls ordered by customer ID.
    pub calls: Vec<CallRecord>,
    pub summary: Summary,
    pub customers: Vec<Customer>,
    pub resources: Vec<ResourceStats>,
    /// Calls cut off by the horizon.
    pub in_flight: usize,
}

impl SimulationReport {
    pub fn from_stats(all_stats: Vec<Stats>) -> SimulationReport {
        let mut customers = Vec::new();
        let mut resources = Vec::new();
        let mut in_flight = 0;

        for stats in all_stats {
            match stats {
                Stats::Demand(demand) => customers.extend(demand.customers),
                Stats::Resource(resource) => resources.push(resource),
                Stats::Call(_) => in_flight += 1,
            }
        }

        let calls: Vec<CallRecord> = customers
            .iter()
            .flat_map(|c| c.calls.iter().copied())
            .collect();

        SimulationReport {
            summary: Summary::from_calls(&calls),
            calls,
            customers,
            resources,
            in_flight,
        }
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceStats> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Calls started in each hour of the given day (1-based).
    pub fn hourly_calls(&self, day: usize) -> [usize; 24] {
        let mut counts = [0; 24];
        for call in self.calls.iter().filter(|c| c.start_day() == day) {
            counts[call.start_hour()] += 1;
        }
        counts
    }
}

/// The model's agents: demand first, then the two pools.
pub fn agents(
    config: &SimulationConfig,
) -> Result<Vec<Box<dyn Agent<Event, Stats>>>, ConfigError> {
    Ok(vec![
        Box::new(Demand::new(config)?),
        Box::new(Resource::new(
            ResourceKind::QueueSlot,
            config.num_queue_slots,
        )),
        Box::new(Resource::new(
            ResourceKind::Telemarketer,
            config.num_telemarketers,
        )),
    ])
}

pub fn build_event_loop(config: &SimulationConfig) -> Result<EventLoop<Event, Stats>, ConfigError> {
    Ok(EventLoop::new(vec![(0.0, Event::Start)], agents(config)?))
}

pub struct Simulation {
    config: SimulationConfig,
    event_loop: EventLoop<Event, Stats>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Simulation, ConfigError> {
        let event_loop = build_event_loop(&config)?;
        Ok(Simulation { config, event_loop })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run to the configured horizon and collect the call log.
    pub fn run(&mut self) -> Result<SimulationReport, SimulationError> {
        self.event_loop.run(self.config.simulation_time)?;
        let report = self.report();
        tracing::info!(
            telemarketers = self.config.num_telemarketers,
            minutes = self.config.simulation_time,
            calls = report.summary.customers,
            in_flight = report.in_flight,
            "simulation complete"
        );
        Ok(report)
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport::from_stats(self.event_loop.stats())
    }
}

/// Run `base` once per telemarketer count, in parallel. Reports come back in
/// the order of `telemarketers`.
pub fn run_sweep(
    base: &SimulationConfig,
    telemarketers: &[usize],
) -> Result<Vec<Result<SimulationReport, SimulationError>>, ConfigError> {
    let configs = telemarketers
        .iter()
        .map(|&num_telemarketers| {
            let config = SimulationConfig {
                num_telemarketers,
                ..base.clone()
            };
            config.validate().map(|()| config)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let results = ParallelRunner::new(configs.len(), |scenario| {
        build_event_loop(&configs[scenario])
    })
    .progress(simple_progress_reporter(1))
    .run(base.simulation_time);

    Ok(results
        .into_iter()
        .enumerate()
        .map(|(scenario, result)| {
            result
                .map(SimulationReport::from_stats)
                .map_err(|message| SimulationError::Scenario { scenario, message })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn call(id: usize, start: f64, end: f64) -> CallRecord {
        CallRecord {
            id,
            start,
            ivr: start,
            queue: start,
            ask: start,
            end,
        }
    }

    #[test]
    fn test_summary_matches_sample_statistics() {
        let calls = vec![call(1, 0.0, 2.0), call(2, 0.0, 4.0), call(3, 1.0, 7.0)];
        let summary = Summary::from_calls(&calls);

        assert_eq!(summary.customers, 3);
        assert_relative_eq!(summary.total_avg, 4.0);
        // totals 2, 4, 6: sample variance 4
        assert_relative_eq!(summary.total_std, 2.0);
    }

    #[test]
    fn test_summary_edge_cases() {
        assert_eq!(
            Summary::from_calls(&[]),
            Summary {
                customers: 0,
                total_avg: 0.0,
                total_std: 0.0
            }
        );
        let one = Summary::from_calls(&[call(1, 0.0, 3.0)]);
        assert_eq!(one.total_avg, 3.0);
        assert_eq!(one.total_std, 0.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig {
            intercall_minutes: vec![],
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::EmptySchedule)
        ));
    }

    #[test]
    fn test_agents_reject_invalid_config() {
        let empty_schedule = SimulationConfig {
            intercall_minutes: vec![],
            ..SimulationConfig::default()
        };
        assert!(matches!(
            agents(&empty_schedule),
            Err(ConfigError::EmptySchedule)
        ));

        let no_ivr = SimulationConfig {
            ivr_max_time: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(agents(&no_ivr), Err(ConfigError::ZeroIvrMax)));

        assert_eq!(agents(&SimulationConfig::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_hourly_calls_bucket_by_start() {
        let report = SimulationReport::from_stats(vec![Stats::Demand(crate::DemandStats {
            customers: vec![Customer {
                id: 1,
                category: crate::Category::P1,
                calls: vec![call(1, 5.0, 6.0), call(1, 65.0, 70.0), call(1, 1445.0, 1450.0)],
            }],
        })]);

        let day1 = report.hourly_calls(1);
        assert_eq!(day1[0], 1);
        assert_eq!(day1[1], 1);
        assert_eq!(day1.iter().sum::<usize>(), 2);
        assert_eq!(report.hourly_calls(2)[0], 1);
    }

    #[test]
    fn test_sweep_rejects_zero_telemarketers() {
        let result = run_sweep(&SimulationConfig::default(), &[1, 0]);
        assert!(matches!(
            result,
            Err(ConfigError::ZeroCapacity(ResourceKind::Telemarketer))
        ));
    }
}
