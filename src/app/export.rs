use std::path::PathBuf;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::ExportError;
use crate::metrics::{AggregateReport, RequestOutcome};

use super::summary::format_millis;

const CSV_HEADER: &[u8] = b"\"Status Code\",\"Duration (ms)\"\n";

/// Writes one quoted row per outcome, latency in milliseconds with two decimals.
pub(crate) async fn export_csv(path: &str, outcomes: &[RequestOutcome]) -> Result<(), ExportError> {
    write_csv(path, outcomes)
        .await
        .map_err(|err| ExportError::WriteCsv {
            path: PathBuf::from(path),
            source: err,
        })
}

async fn write_csv(path: &str, outcomes: &[RequestOutcome]) -> Result<(), std::io::Error> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(CSV_HEADER).await?;
    for outcome in outcomes {
        let line = format!(
            "\"{}\",\"{}\"\n",
            outcome.status_code,
            format_millis(outcome.latency)
        );
        writer.write_all(line.as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}

pub(crate) async fn export_json(
    path: &str,
    report: &AggregateReport,
    outcomes: &[RequestOutcome],
) -> Result<(), ExportError> {
    let payload = json_payload(report, outcomes);
    let json = serde_json::to_vec_pretty(&payload)
        .map_err(|err| ExportError::SerializeJson { source: err })?;
    write_bytes(path, &json)
        .await
        .map_err(|err| ExportError::WriteJson {
            path: PathBuf::from(path),
            source: err,
        })
}

async fn write_bytes(path: &str, bytes: &[u8]) -> Result<(), std::io::Error> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

pub(crate) fn json_payload(
    report: &AggregateReport,
    outcomes: &[RequestOutcome],
) -> serde_json::Value {
    let status_histogram: serde_json::Map<String, serde_json::Value> = report
        .status_histogram
        .iter()
        .map(|(code, count)| (code.to_string(), serde_json::json!(count)))
        .collect();

    let summary_json = serde_json::json!({
        "started_at": report.started_at.to_rfc3339(),
        "total_wall_time_ms": millis_f64(report.total_wall_time),
        "planned_requests": report.planned_requests,
        "total_requests": report.total_requests,
        "success_policy": report.success_policy.label(),
        "success_count": report.success_count,
        "failure_count": report.failure_count(),
        "transport_errors": report.transport_errors(),
        "status_histogram": status_histogram,
        "peak_in_flight": report.peak_in_flight,
        "interrupted": report.interrupted,
        "min_latency_ms": millis_f64(report.latency.min),
        "mean_latency_ms": millis_f64(report.latency.mean),
        "max_latency_ms": millis_f64(report.latency.max),
        "p50_latency_ms": millis_f64(report.latency.p50),
        "p90_latency_ms": millis_f64(report.latency.p90),
        "p99_latency_ms": millis_f64(report.latency.p99)
    });

    let records_json: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|outcome| {
            serde_json::json!({
                "status_code": outcome.status_code,
                "latency_ms": millis_f64(outcome.latency)
            })
        })
        .collect();

    serde_json::json!({
        "summary": summary_json,
        "records": records_json
    })
}

const fn millis_f64(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}
