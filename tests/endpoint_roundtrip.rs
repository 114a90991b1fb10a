//! Wires two endpoints back to back over an in-memory duplex pipe — the same
//! Reader → Endpoint → Writer shape a real transport uses — to exercise the
//! crate's public API the way a host application would.

use std::sync::Arc;

use jsonrpc_endpoint::{
    frame::{FrameReader, FrameWriter},
    Endpoint, HandlerOutcome, MessageConsumer, MethodMap,
};
use serde_json::{json, Value};

fn wire_endpoint<R, W>(dispatcher: MethodMap, read_half: R, write_half: W) -> Endpoint
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let writer = Arc::new(FrameWriter::new(write_half));
    let consumer: Arc<dyn MessageConsumer> = {
        let writer = writer.clone();
        Arc::new(move |msg: Value| {
            let writer = writer.clone();
            async move { writer.write(&msg).await }
        })
    };

    let endpoint = Endpoint::new(Arc::new(dispatcher), consumer);

    let reader = FrameReader::new(tokio::io::BufReader::new(read_half));
    let reader_endpoint = endpoint.clone();
    tokio::spawn(reader.listen(move |msg| {
        let endpoint = reader_endpoint.clone();
        async move { endpoint.consume(msg).await }
    }));

    endpoint
}

#[tokio::test]
async fn request_flows_end_to_end_over_a_duplex_stream() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (server_read, server_write) = tokio::io::split(server_io);

    let server_dispatcher = MethodMap::new().register("add", |params: Option<Value>| {
        let params = params.unwrap_or(Value::Null);
        let a = params["a"].as_i64().unwrap_or(0);
        let b = params["b"].as_i64().unwrap_or(0);
        HandlerOutcome::ready_ok(json!(a + b))
    });

    let client = wire_endpoint(MethodMap::new(), client_read, client_write);
    let _server = wire_endpoint(server_dispatcher, server_read, server_write);

    let result = client
        .request("add", Some(json!({"a": 2, "b": 40})))
        .await
        .await
        .expect("response arrives");

    assert_eq!(result, json!(42));
}

#[tokio::test]
async fn unknown_method_over_the_wire_yields_method_not_found() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (server_read, server_write) = tokio::io::split(server_io);

    let client = wire_endpoint(MethodMap::new(), client_read, client_write);
    let _server = wire_endpoint(MethodMap::new(), server_read, server_write);

    let err = client
        .request("doesNotExist", None)
        .await
        .await
        .expect_err("server has no such method");

    assert_eq!(err.code(), -32601);
}

#[tokio::test]
async fn notification_over_the_wire_reaches_the_handler() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (server_read, server_write) = tokio::io::split(server_io);

    let seen = Arc::new(tokio::sync::Notify::new());
    let seen2 = seen.clone();
    let server_dispatcher = MethodMap::new().register("ping", move |_params: Option<Value>| {
        seen2.notify_waiters();
        HandlerOutcome::ready_ok(Value::Null)
    });

    let client = wire_endpoint(MethodMap::new(), client_read, client_write);
    let _server = wire_endpoint(server_dispatcher, server_read, server_write);

    client.notify("ping", None).await;

    tokio::time::timeout(std::time::Duration::from_secs(1), seen.notified())
        .await
        .expect("notification handler ran");
}
