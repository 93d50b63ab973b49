//! End-to-end tests over a real websocket.

use std::time::Duration;

use serde_json::{json, Value};

use sgo_playground::http::page::StatusReport;

mod common;

use common::{recv, send, send_raw, start_compile_backend, start_server, test_config, try_recv};

const COMPLETED: &str =
    r#"{"Errors":"","Events":[{"Delay":0,"Message":"hi\n","Kind":"stdout"}],"VetErrors":"","Status":0}"#;

#[tokio::test]
async fn test_format_and_translate_round_trip() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "format", "  package main  ").await;
    assert_eq!(recv(&mut client).await, json!({"type": "format", "value": "package main\n"}));

    send(&mut client, "translate", "package main").await;
    assert_eq!(recv(&mut client).await, json!({"type": "translate", "value": "PACKAGE MAIN"}));

    assert_eq!(backend.hits(), 0);
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_unformattable_source_yields_null() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "format", "unformattable {").await;
    assert_eq!(recv(&mut client).await, json!({"type": "format", "value": null}));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_translate_diagnostics_reported() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "translate", "syntax error here").await;
    let response = recv(&mut client).await;
    assert_eq!(response["type"], "translate");
    let text = response["value"].as_str().unwrap();
    assert_eq!(
        text,
        "prog.sgo:1:1: syntax error: unexpected newline\nprog.sgo:2:5: undefined: x"
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_execute_forwards_result_verbatim() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "execute", "hello").await;
    let response = recv(&mut client).await;
    let expected: Value = serde_json::from_str(COMPLETED).unwrap();
    assert_eq!(response, json!({"type": "execute", "value": expected}));

    let bodies = backend.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("version=2"));
    assert!(bodies[0].contains("body=HELLO"));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_execute_never_cached() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    for _ in 0..2 {
        send(&mut client, "execute", "same program").await;
        assert_eq!(recv(&mut client).await["type"], "execute");
    }
    assert_eq!(backend.hits(), 2);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_execute_stops_at_translation_failure() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "execute", "syntax error").await;
    let response = recv(&mut client).await;
    assert!(response["value"].as_str().unwrap().contains("syntax error: unexpected newline"));
    assert_eq!(backend.hits(), 0);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_execute_reports_remote_errors() {
    let backend =
        start_compile_backend(r#"{"Errors":"prog.go:3:2: undefined: fmt.Printn","Events":null}"#).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "execute", "package main").await;
    let response = recv(&mut client).await;
    assert_eq!(response["value"]["Errors"], "prog.go:3:2: undefined: fmt.Printn");
    assert_eq!(response["value"]["Events"], Value::Null);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_unrecognized_type_is_ignored() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send(&mut client, "share", "package main").await;
    send(&mut client, "format", "x").await;
    assert_eq!(recv(&mut client).await, json!({"type": "format", "value": "x\n"}));
    assert!(try_recv(&mut client, Duration::from_millis(200)).await.is_none());

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_null_type_keeps_connection_open() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send_raw(&mut client, r#"{"type":null,"value":"x"}"#).await;
    send(&mut client, "format", "after").await;
    assert_eq!(recv(&mut client).await, json!({"type": "format", "value": "after\n"}));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_non_string_value_reported() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send_raw(&mut client, r#"{"type":"translate","value":42}"#).await;
    let response = recv(&mut client).await;
    assert_eq!(response["type"], "translate");
    assert_eq!(
        response["value"],
        "request value must be a string of source text, got a number"
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_undecodable_frame_closes_connection() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let mut client = server.connect().await;

    send_raw(&mut client, "not json").await;
    assert!(try_recv(&mut client, Duration::from_secs(2)).await.is_none());

    let mut other = server.connect().await;
    send(&mut other, "format", "still serving").await;
    assert_eq!(recv(&mut other).await["value"], "still serving\n");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_interleaved_connections_receive_own_responses() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;

    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(server.connect().await);
    }
    for (i, client) in clients.iter_mut().enumerate() {
        send(client, "translate", &format!("conn {i}")).await;
        send(client, "format", &format!(" conn {i} ")).await;
    }
    for (i, client) in clients.iter_mut().enumerate() {
        assert_eq!(
            recv(client).await,
            json!({"type": "translate", "value": format!("CONN {i}")})
        );
        assert_eq!(
            recv(client).await,
            json!({"type": "format", "value": format!("conn {i}\n")})
        );
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_switches_execution_endpoint() {
    let first = start_compile_backend(COMPLETED).await;
    let second = start_compile_backend(COMPLETED).await;
    let config = test_config(&first.endpoint());
    let server = start_server(config.clone()).await;
    let mut client = server.connect().await;

    send(&mut client, "execute", "a").await;
    recv(&mut client).await;

    let mut reloaded = config;
    reloaded.execution.endpoint = second.endpoint();
    server.config_updates.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    send(&mut client, "execute", "b").await;
    recv(&mut client).await;

    assert_eq!(first.hits(), 1);
    assert_eq!(second.hits(), 1);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_status_and_index_pages() {
    let backend = start_compile_backend(COMPLETED).await;
    let server = start_server(test_config(&backend.endpoint())).await;
    let _client = server.connect().await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let report: StatusReport = client
        .get(server.http_url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report.status, "operational");
    assert_eq!(report.active_connections, 1);

    let page = client
        .get(server.http_url("/?gist=abc123"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(&format!("\"ws://{}/ws\"", server.addr)));
    assert!(page.contains(r#"var gist = "abc123";"#));

    server.shutdown.trigger();
}
