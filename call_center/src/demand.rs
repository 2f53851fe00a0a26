use des::{Agent, Response, SimTime};
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;

use crate::call::{Call, CallPlan};
use crate::{
    CallRecord, Category, ConfigError, Customer, Event, InterArrival, MINUTES_PER_HOUR, SimulationConfig, Stats,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DemandStats {
    pub customers: Vec<Customer>,
}

impl DemandStats {
    pub fn arrivals(&self) -> usize {
        self.customers.len()
    }

    /// Every completed call, in customer order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.customers
            .iter()
            .flat_map(|c| c.calls.iter().copied())
            .collect()
    }
}

/// Arrival generator. Owns the run's RNG, so every random draw in the model
/// comes from one seeded stream in a fixed order.
pub struct Demand {
    rng: StdRng,
    categories: WeightedIndex<u32>,
    schedule: Vec<SimTime>,
    inter_arrival: InterArrival,
    num_customers_start: usize,
    ivr_max_time: u32,
    telemarketer_max_time: u32,
    customers: Vec<Customer>,
}

impl Demand {
    /// Fails if `config` does not pass [`SimulationConfig::validate`].
    pub fn new(config: &SimulationConfig) -> Result<Demand, ConfigError> {
        config.validate()?;
        Ok(Demand {
            rng: StdRng::seed_from_u64(config.seed),
            categories: Category::weighted_index()?,
            schedule: config.intercall_minutes.clone(),
            inter_arrival: config.inter_arrival,
            num_customers_start: config.num_customers_start,
            ivr_max_time: config.ivr_max_time,
            telemarketer_max_time: config.telemarketer_max_time,
            customers: Vec::new(),
        })
    }

    /// Delay before the next arrival, from the schedule entry for the
    /// current hour of the day (cycling through the schedule).
    fn intercall_minutes(&mut self, current_t: SimTime) -> SimTime {
        let hour = (current_t / MINUTES_PER_HOUR).floor() as usize % self.schedule.len();
        let mean = self.schedule[hour];
        match self.inter_arrival {
            InterArrival::Fixed => mean,
            InterArrival::Exponential => {
                let unit: f64 = self.rng.sample(Exp1);
                unit * mean
            }
        }
    }

    /// Create the next customer and start its call now.
    fn launch(&mut self, current_t: SimTime, response: &mut Response<Event, Stats>) {
        let customer_id = self.customers.len() + 1;
        let category = Category::ALL[self.rng.sample(&self.categories)];
        let plan = CallPlan {
            ivr_minutes: self.rng.random_range(1..=self.ivr_max_time),
            service_minutes: self.rng.random_range(1..=self.telemarketer_max_time),
        };
        tracing::debug!(t = current_t, customer_id, ?category, "customer arrived");

        self.customers.push(Customer::new(customer_id, category));
        response
            .events
            .push((current_t, Event::CallStarted { customer_id }));
        response.agents.push(Box::new(Call::new(customer_id, plan)));
    }

    fn schedule_next_arrival(&mut self, current_t: SimTime, response: &mut Response<Event, Stats>) {
        let delay = self.intercall_minutes(current_t);
        response.events.push((current_t + delay, Event::ArrivalDue));
    }

    fn log_call(&mut self, record: &CallRecord) {
        match record
            .id
            .checked_sub(1)
            .and_then(|i| self.customers.get_mut(i))
        {
            Some(customer) => customer.calls.push(*record),
            None => tracing::warn!(customer_id = record.id, "call completed for unknown customer"),
        }
    }
}

impl Agent<Event, Stats> for Demand {
    fn act(&mut self, current_t: SimTime, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Start => {
                let mut response = Response::new();
                for _ in 0..self.num_customers_start {
                    self.launch(current_t, &mut response);
                }
                self.schedule_next_arrival(current_t, &mut response);
                response
            }
            Event::ArrivalDue => {
                let mut response = Response::new();
                self.launch(current_t, &mut response);
                self.schedule_next_arrival(current_t, &mut response);
                response
            }
            Event::CallCompleted(record) => {
                self.log_call(record);
                Response::new()
            }
            _ => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Demand(DemandStats {
            customers: self.customers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand(burst: usize, schedule: Vec<f64>) -> Demand {
        Demand::new(&SimulationConfig {
            num_customers_start: burst,
            intercall_minutes: schedule,
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    fn demand_stats(demand: &Demand) -> DemandStats {
        match demand.stats() {
            Stats::Demand(stats) => stats,
            other => panic!("Expected DemandStats, got {:?}", other),
        }
    }

    #[test]
    fn test_start_launches_burst_then_schedules_stream() {
        let mut demand = demand(3, vec![10.0]);

        let response = demand.act(0.0, &Event::Start);

        assert_eq!(response.agents.len(), 3);
        assert_eq!(
            response.events,
            vec![
                (0.0, Event::CallStarted { customer_id: 1 }),
                (0.0, Event::CallStarted { customer_id: 2 }),
                (0.0, Event::CallStarted { customer_id: 3 }),
                (10.0, Event::ArrivalDue),
            ]
        );
        let ids: Vec<usize> = demand_stats(&demand).customers.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_arrival_launches_next_id() {
        let mut demand = demand(2, vec![10.0]);
        demand.act(0.0, &Event::Start);

        let response = demand.act(10.0, &Event::ArrivalDue);

        assert_eq!(response.agents.len(), 1);
        assert_eq!(response.events[0], (10.0, Event::CallStarted { customer_id: 3 }));
        assert_eq!(response.events[1], (20.0, Event::ArrivalDue));
    }

    #[test]
    fn test_schedule_is_indexed_by_hour() {
        let mut demand = demand(0, vec![10.0, 20.0, 30.0]);

        assert_eq!(demand.intercall_minutes(0.0), 10.0);
        assert_eq!(demand.intercall_minutes(59.9), 10.0);
        assert_eq!(demand.intercall_minutes(60.0), 20.0);
        assert_eq!(demand.intercall_minutes(150.0), 30.0);
        // wraps around after the last entry
        assert_eq!(demand.intercall_minutes(180.0), 10.0);
    }

    #[test]
    fn test_exponential_delays_vary_around_mean() {
        let mut demand = Demand::new(&SimulationConfig {
            intercall_minutes: vec![10.0],
            inter_arrival: InterArrival::Exponential,
            ..SimulationConfig::default()
        })
        .unwrap();

        let draws: Vec<f64> = (0..5_000).map(|_| demand.intercall_minutes(0.0)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;

        assert!(draws.iter().all(|d| *d >= 0.0));
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
        assert!((mean - 10.0).abs() < 1.0, "mean was {}", mean);
    }

    #[test]
    fn test_completed_call_is_logged_on_customer() {
        let mut demand = demand(2, vec![10.0]);
        demand.act(0.0, &Event::Start);

        let record = CallRecord {
            id: 2,
            start: 0.0,
            ivr: 1.0,
            queue: 1.5,
            ask: 1.5,
            end: 4.0,
        };
        demand.act(4.0, &Event::CallCompleted(record));

        let stats = demand_stats(&demand);
        assert!(stats.customers[0].calls.is_empty());
        assert_eq!(stats.customers[1].calls, vec![record]);
        assert_eq!(stats.calls(), vec![record]);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = demand(5, vec![10.0]);
        let mut b = demand(5, vec![10.0]);
        a.act(0.0, &Event::Start);
        b.act(0.0, &Event::Start);

        assert_eq!(demand_stats(&a), demand_stats(&b));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_any_draw() {
        let empty = Demand::new(&SimulationConfig {
            intercall_minutes: vec![],
            ..SimulationConfig::default()
        });
        assert!(matches!(empty, Err(ConfigError::EmptySchedule)));

        let no_ivr = Demand::new(&SimulationConfig {
            ivr_max_time: 0,
            ..SimulationConfig::default()
        });
        assert!(matches!(no_ivr, Err(ConfigError::ZeroIvrMax)));

        let no_service = Demand::new(&SimulationConfig {
            telemarketer_max_time: 0,
            ..SimulationConfig::default()
        });
        assert!(matches!(no_service, Err(ConfigError::ZeroServiceMax)));
    }
}
