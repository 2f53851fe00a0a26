//! Call log and summary export for analysis outside the simulator.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::{CallRecord, OutputError, SimTime, SimulationConfig, SimulationReport, Summary};

/// One CSV row: the raw record plus the derived columns analysis groups by.
#[derive(Debug, Clone, Serialize)]
pub struct CallRow {
    pub id: usize,
    pub start: SimTime,
    pub ivr: SimTime,
    pub queue: SimTime,
    pub ask: SimTime,
    pub end: SimTime,
    pub total: SimTime,
    pub start_h: usize,
    pub start_d: usize,
}

impl From<&CallRecord> for CallRow {
    fn from(call: &CallRecord) -> Self {
        CallRow {
            id: call.id,
            start: call.start,
            ivr: call.ivr,
            queue: call.queue,
            ask: call.ask,
            end: call.end,
            total: call.total(),
            start_h: call.start_hour(),
            start_d: call.start_day(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub config: &'a SimulationConfig,
    pub summary: Summary,
    pub in_flight: usize,
}

pub fn write_calls_csv<W: Write>(writer: W, calls: &[CallRecord]) -> Result<(), OutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for call in calls {
        csv_writer.serialize(CallRow::from(call))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_calls_csv(path: impl AsRef<Path>, calls: &[CallRecord]) -> Result<(), OutputError> {
    write_calls_csv(File::create(path)?, calls)
}

pub fn save_summary_json(
    path: impl AsRef<Path>,
    config: &SimulationConfig,
    report: &SimulationReport,
) -> Result<(), OutputError> {
    let run = RunSummary {
        config,
        summary: report.summary,
        in_flight: report.in_flight,
    };
    let json = serde_json::to_string_pretty(&run)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// The headline block printed after a run.
pub fn format_summary(config: &SimulationConfig, summary: &Summary) -> String {
    format!(
        "[TM={} ({} min)]\n\
         Customers {}\n\
         Total time average {:.2} min\n\
         Total time standard deviation {:.2} min",
        config.num_telemarketers,
        config.simulation_time,
        summary.customers,
        summary.total_avg,
        summary.total_std
    )
}

/// First `n` call rows as a fixed-width table.
pub fn format_head(calls: &[CallRecord], n: usize) -> String {
    let header = format!(
        "{:>5} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7} {:>7} {:>7}",
        "id", "start", "ivr", "queue", "ask", "end", "total", "start_h", "start_d"
    );
    let rows = calls.iter().take(n).map(CallRow::from).map(|row| {
        format!(
            "{:>5} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>7.3} {:>7} {:>7}",
            row.id,
            row.start,
            row.ivr,
            row.queue,
            row.ask,
            row.end,
            row.total,
            row.start_h,
            row.start_d
        )
    });
    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Calls per start hour for one day. Hours without calls are left out.
pub fn format_hourly(report: &SimulationReport, day: usize) -> String {
    let header = format!("{:>7} {:>5}", "start_h", "count");
    let rows = report
        .hourly_calls(day)
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .map(|(hour, count)| format!("{:>7} {:>5}", hour, count));
    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}
