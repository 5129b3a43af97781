use super::*;
use crate::args::{HttpMethod, TesterArgs};
use crate::metrics::TRANSPORT_ERROR_STATUS;
use crate::test_support::{ServerBehavior, spawn_server, unreachable_url};
use clap::Parser;
use reqwest::{Client, Method};
use std::future::Future;
use std::time::Duration;

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn test_client(timeout: &str) -> Result<Client, String> {
    let args = TesterArgs::try_parse_from(["volley", "--timeout", timeout])
        .map_err(|err| format!("parse failed: {}", err))?;
    build_client(&args).map_err(|err| format!("client failed: {}", err))
}

fn get_config(url: &str) -> Result<RequestConfig, String> {
    RequestConfig::new(url, Method::GET, &[], None).map_err(|err| err.to_string())
}

#[test]
fn rejects_invalid_targets() -> Result<(), String> {
    for url in ["", "   ", "not a url", "http://", "ftp://example.com/file"] {
        if RequestConfig::new(url, Method::GET, &[], None).is_ok() {
            return Err(format!("Expected error for url '{}'", url));
        }
    }
    Ok(())
}

#[test]
fn rejects_invalid_header_name() -> Result<(), String> {
    let headers = vec![("Bad Header".to_owned(), "value".to_owned())];
    if RequestConfig::new("http://localhost", Method::GET, &headers, None).is_ok() {
        return Err("Expected error for header name with space".to_owned());
    }
    Ok(())
}

#[test]
fn duplicate_headers_last_write_wins() -> Result<(), String> {
    let headers = vec![
        ("X-Id".to_owned(), "first".to_owned()),
        ("Accept".to_owned(), "text/plain".to_owned()),
        ("x-id".to_owned(), "second".to_owned()),
    ];
    let config = RequestConfig::new("http://localhost", Method::GET, &headers, None)
        .map_err(|err| err.to_string())?;
    let values: Vec<_> = config.headers().get_all("x-id").iter().collect();
    if values.len() != 1 || values.first().map(|value| value.as_bytes()) != Some(b"second".as_slice()) {
        return Err(format!("Unexpected x-id values: {:?}", values));
    }
    if config.headers().len() != 2 {
        return Err(format!("Unexpected header count: {}", config.headers().len()));
    }
    Ok(())
}

#[test]
fn from_args_requires_url() -> Result<(), String> {
    let args = TesterArgs::try_parse_from(["volley"]).map_err(|err| err.to_string())?;
    if RequestConfig::from_args(&args).is_ok() {
        return Err("Expected missing url error".to_owned());
    }
    Ok(())
}

#[test]
fn from_args_reads_body_file() -> Result<(), String> {
    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("body.json");
    std::fs::write(&path, "{\"id\":7}").map_err(|err| format!("write failed: {}", err))?;
    let path_arg = path.to_string_lossy().into_owned();
    let args = TesterArgs::try_parse_from([
        "volley",
        "-u",
        "http://localhost/items",
        "-X",
        "put",
        "-D",
        path_arg.as_str(),
    ])
    .map_err(|err| err.to_string())?;
    let config = RequestConfig::from_args(&args).map_err(|err| err.to_string())?;
    if config.body() != Some("{\"id\":7}") {
        return Err(format!("Unexpected body: {:?}", config.body()));
    }
    if *config.method() != Method::from(HttpMethod::Put) {
        return Err("Unexpected method".to_owned());
    }
    if config.url().path() != "/items" {
        return Err("Unexpected path".to_owned());
    }
    Ok(())
}

#[test]
fn from_args_missing_body_file_is_error() -> Result<(), String> {
    let args = TesterArgs::try_parse_from([
        "volley",
        "-u",
        "http://localhost",
        "-D",
        "/definitely/not/here.json",
    ])
    .map_err(|err| err.to_string())?;
    if RequestConfig::from_args(&args).is_ok() {
        return Err("Expected error for missing body file".to_owned());
    }
    Ok(())
}

#[test]
fn execute_records_status_and_sends_request_config() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_server(ServerBehavior::ok())?;
        let client = test_client("2s")?;
        let headers = vec![
            ("X-Run".to_owned(), "one".to_owned()),
            ("X-Run".to_owned(), "two".to_owned()),
        ];
        let config = RequestConfig::new(
            &server.url,
            Method::POST,
            &headers,
            Some("payload".to_owned()),
        )
        .map_err(|err| err.to_string())?;

        let outcome = execute_request(&client, &config).await;
        if outcome.status_code != 200 {
            return Err(format!("Unexpected status: {}", outcome.status_code));
        }
        let seen = server.stats.last_request();
        let checks = [
            (seen.starts_with("POST / "), "Expected POST request line"),
            (seen.contains("x-run: two"), "Expected last header value"),
            (!seen.contains("x-run: one"), "Unexpected overwritten header"),
            (seen.ends_with("payload"), "Expected request body"),
        ];
        for (ok, message) in checks {
            if !ok {
                return Err(format!("{}: {}", message, seen));
            }
        }
        Ok(())
    })
}

#[test]
fn execute_records_non_success_status() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_server(ServerBehavior {
            status: 404,
            ..ServerBehavior::ok()
        })?;
        let client = test_client("2s")?;
        let outcome = execute_request(&client, &get_config(&server.url)?).await;
        if outcome.status_code != 404 {
            return Err(format!("Unexpected status: {}", outcome.status_code));
        }
        Ok(())
    })
}

#[test]
fn connection_refused_is_transport_error() -> Result<(), String> {
    run_async_test(async {
        let client = test_client("2s")?;
        let outcome = execute_request(&client, &get_config(&unreachable_url()?)?).await;
        if outcome.status_code != TRANSPORT_ERROR_STATUS || !outcome.is_transport_error() {
            return Err(format!("Unexpected status: {}", outcome.status_code));
        }
        Ok(())
    })
}

#[test]
fn timeout_is_transport_error_with_elapsed_latency() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_server(ServerBehavior {
            delay: Duration::from_millis(800),
            ..ServerBehavior::ok()
        })?;
        let client = test_client("100ms")?;
        let outcome = execute_request(&client, &get_config(&server.url)?).await;
        if !outcome.is_transport_error() {
            return Err(format!("Expected timeout, got {}", outcome.status_code));
        }
        if outcome.latency < Duration::from_millis(90) || outcome.latency > Duration::from_millis(700)
        {
            return Err(format!("Unexpected latency: {:?}", outcome.latency));
        }
        Ok(())
    })
}

#[test]
fn dropped_connection_is_transport_error() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_server(ServerBehavior {
            drop_first: 1,
            ..ServerBehavior::ok()
        })?;
        let client = test_client("2s")?;
        let config = get_config(&server.url)?;
        let first = execute_request(&client, &config).await;
        let second = execute_request(&client, &config).await;
        if !first.is_transport_error() || second.status_code != 200 {
            return Err(format!(
                "Unexpected statuses: {} then {}",
                first.status_code, second.status_code
            ));
        }
        Ok(())
    })
}

#[test]
fn body_read_failure_keeps_received_status() -> Result<(), String> {
    run_async_test(async {
        let server = spawn_server(ServerBehavior {
            truncated_body: true,
            ..ServerBehavior::ok()
        })?;
        let client = test_client("2s")?;
        let outcome = execute_request(&client, &get_config(&server.url)?).await;
        if outcome.status_code != 200 {
            return Err(format!("Unexpected status: {}", outcome.status_code));
        }
        if outcome.latency > Duration::from_millis(1500) {
            return Err(format!("Unexpected latency: {:?}", outcome.latency));
        }
        Ok(())
    })
}
