//! Integration tests driving a [`Connection`] against an in-process mock
//! Bolt server.
//!
//! The mock plays the server half of the protocol over a real TCP socket:
//! it answers the handshake, authenticates the HELLO, then follows each
//! test's scripted exchange. Reading a whole pipeline batch in one burst
//! lets the tests assert how many network flushes the client performed.

use std::collections::HashMap;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Decoder, Encoder};

use graphbolt_driver::bolt::{
    AccessMode, AuthToken, BoltRequest, BoltResponse, BoltServerCodec, FailureMessage,
    PackStreamValue, RecordMessage, SuccessMessage, TransactionType, BOLT_MAGIC,
    HANDSHAKE_REQUEST_SIZE,
};
use graphbolt_driver::{
    Connection, ConnectionConfig, DriverError, SecurityPlan, ServerAddress, SessionState, Value,
};

struct MockServer {
    stream: TcpStream,
    codec: BoltServerCodec,
    buffer: BytesMut,
}

impl MockServer {
    /// Accept one connection, answer the handshake with Bolt 5.4 and
    /// authenticate the HELLO.
    async fn accept(listener: TcpListener) -> Self {
        let (stream, _) = listener.accept().await.unwrap();
        let mut server = Self {
            stream,
            codec: BoltServerCodec::new(),
            buffer: BytesMut::new(),
        };

        let mut handshake = [0u8; HANDSHAKE_REQUEST_SIZE];
        server.stream.read_exact(&mut handshake).await.unwrap();
        assert_eq!(&handshake[0..4], &BOLT_MAGIC);
        server.stream.write_all(&[0, 0, 4, 5]).await.unwrap();

        let hello = server.recv().await;
        let BoltRequest::Hello(hello) = hello else {
            panic!("expected HELLO, got {}", hello.name());
        };
        assert_eq!(hello.auth.scheme, "basic");

        let mut success = SuccessMessage::new();
        success.add("server", PackStreamValue::String("MockGraph/5.4".into()));
        success.add("connection_id", PackStreamValue::String("bolt-test".into()));
        server.send(BoltResponse::Success(success)).await;
        server
    }

    async fn recv(&mut self) -> BoltRequest {
        loop {
            if let Some(request) = self.codec.decode(&mut self.buffer).unwrap() {
                return request;
            }
            let n = self.stream.read_buf(&mut self.buffer).await.unwrap();
            assert!(n > 0, "client closed the connection unexpectedly");
        }
    }

    /// Read one network burst and decode every request it carried.
    /// Asserting on the returned length verifies the client coalesced a
    /// pipeline batch into a single flush.
    async fn recv_burst(&mut self, expected: usize) -> Vec<BoltRequest> {
        let n = self.stream.read_buf(&mut self.buffer).await.unwrap();
        assert!(n > 0, "client closed the connection unexpectedly");

        let mut requests = Vec::new();
        while let Some(request) = self.codec.decode(&mut self.buffer).unwrap() {
            requests.push(request);
        }
        assert_eq!(
            requests.len(),
            expected,
            "expected {} messages in a single network burst",
            expected
        );
        requests
    }

    async fn send(&mut self, response: BoltResponse) {
        let mut wire = BytesMut::new();
        self.codec.encode(response, &mut wire).unwrap();
        self.stream.write_all(&wire).await.unwrap();
    }

    async fn send_success(&mut self, success: SuccessMessage) {
        self.send(BoltResponse::Success(success)).await;
    }

    async fn send_record(&mut self, fields: Vec<PackStreamValue>) {
        self.send(BoltResponse::Record(RecordMessage::new(fields)))
            .await;
    }
}

async fn connect_pair() -> (Connection, MockServer) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(MockServer::accept(listener));

    let config = ConnectionConfig::new(
        ServerAddress::new("127.0.0.1", port),
        AuthToken::basic("neo", "secret"),
    );
    let connection = Connection::connect(&config, &SecurityPlan::insecure())
        .await
        .unwrap();
    (connection, server.await.unwrap())
}

fn stats_success(entries: &[(&str, i64)]) -> SuccessMessage {
    let mut stats = HashMap::new();
    for (key, count) in entries {
        stats.insert(key.to_string(), PackStreamValue::Integer(*count));
    }
    let mut success = SuccessMessage::new();
    success.add("stats", PackStreamValue::Map(stats));
    success
}

#[tokio::test]
async fn connect_reports_server_identity() {
    let (connection, _server) = connect_pair().await;

    assert_eq!(connection.server_agent(), Some("MockGraph/5.4"));
    assert_eq!(connection.connection_id(), Some("bolt-test"));
    assert_eq!(connection.protocol_version().to_string(), "5.4");
    assert_eq!(connection.state(), SessionState::Idle);
}

#[tokio::test]
async fn run_pull_share_a_single_round_trip() {
    let (mut connection, mut server) = connect_pair().await;

    let run = connection
        .run("RETURN 1", HashMap::new(), false)
        .await
        .unwrap();
    let pull = connection.pull(1000).await.unwrap();

    // Both messages must arrive in one flush.
    let burst = server.recv_burst(2).await;
    let BoltRequest::Run(run_msg) = &burst[0] else {
        panic!("expected RUN first");
    };
    assert_eq!(run_msg.query, "RETURN 1");
    let BoltRequest::Pull(pull_msg) = &burst[1] else {
        panic!("expected PULL second");
    };
    assert_eq!(pull_msg.n, 1000);

    server
        .send_success(SuccessMessage::run_success(vec!["1".into()], None))
        .await;
    server.send_record(vec![PackStreamValue::Integer(1)]).await;
    server
        .send_success(SuccessMessage::streaming_success(false, None))
        .await;

    let run = run.await.unwrap();
    assert_eq!(run.keys, vec!["1"]);

    let result = pull.await.unwrap();
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].get(0).unwrap().as_int().unwrap(), 1);
    assert!(!result.has_more);

    let summary = result.summary.unwrap();
    assert_eq!(summary.counters.total_count(), 0);
    assert!(!summary.counters.contains_updates());
}

#[tokio::test]
async fn pipelined_exchanges_resolve_in_submission_order() {
    let (mut connection, mut server) = connect_pair().await;

    let begin = connection
        .begin_transaction(
            vec![],
            HashMap::new(),
            AccessMode::Write,
            TransactionType::Default,
            false,
        )
        .await
        .unwrap();
    let run_a = connection
        .run("RETURN 'a'", HashMap::new(), false)
        .await
        .unwrap();
    let run_b = connection
        .run("RETURN 'b'", HashMap::new(), false)
        .await
        .unwrap();
    let pull = connection.pull(-1).await.unwrap();

    // One burst carries BEGIN + RUN + RUN + PULL.
    server.recv_burst(4).await;
    server.send_success(SuccessMessage::new()).await;
    server
        .send_success(SuccessMessage::run_success(vec!["a".into()], Some(0)))
        .await;
    server
        .send_success(SuccessMessage::run_success(vec!["b".into()], Some(1)))
        .await;
    server
        .send_record(vec![PackStreamValue::String("b".into())])
        .await;
    server
        .send_success(SuccessMessage::streaming_success(false, None))
        .await;

    // Later handles resolve only after earlier ones; awaiting the last
    // first still observes every earlier response already matched to the
    // exchange that submitted it.
    let result = pull.await.unwrap();
    assert_eq!(
        result.records[0].get(0).unwrap().as_string().unwrap(),
        "b"
    );

    begin.await.unwrap();
    assert_eq!(run_a.await.unwrap().keys, vec!["a"]);
    let b = run_b.await.unwrap();
    assert_eq!(b.keys, vec!["b"]);
    assert_eq!(b.query_id, Some(1));
}

#[tokio::test]
async fn multiple_open_result_streams_pull_by_query_id() {
    let (mut connection, mut server) = connect_pair().await;

    let begin = connection
        .begin_transaction(
            vec![],
            HashMap::new(),
            AccessMode::Read,
            TransactionType::Unconstrained,
            false,
        )
        .await
        .unwrap();
    let run_a = connection
        .run("MATCH (a) RETURN a", HashMap::new(), false)
        .await
        .unwrap();
    let run_b = connection
        .run("MATCH (b) RETURN b", HashMap::new(), true)
        .await
        .unwrap();

    let burst = server.recv_burst(3).await;
    let BoltRequest::Begin(begin_msg) = &burst[0] else {
        panic!("expected BEGIN first");
    };
    assert_eq!(begin_msg.mode, AccessMode::Read);

    server.send_success(SuccessMessage::new()).await;
    server
        .send_success(SuccessMessage::run_success(vec!["a".into()], Some(0)))
        .await;
    server
        .send_success(SuccessMessage::run_success(vec!["b".into()], Some(1)))
        .await;

    begin.await.unwrap();
    let a = run_a.await.unwrap();
    let b = run_b.await.unwrap();

    // Pull the second stream first; the qid disambiguates.
    let pull_b = connection.pull_query(&b, -1).await.unwrap();
    let BoltRequest::Pull(msg) = server.recv().await else {
        panic!("expected PULL");
    };
    assert_eq!(msg.qid, Some(1));
    server
        .send_record(vec![PackStreamValue::String("from-b".into())])
        .await;
    server
        .send_success(SuccessMessage::streaming_success(false, None))
        .await;
    let result_b = pull_b.await.unwrap();
    assert_eq!(
        result_b.records[0].get(0).unwrap().as_string().unwrap(),
        "from-b"
    );

    let pull_a = connection.pull_query(&a, -1).await.unwrap();
    let BoltRequest::Pull(msg) = server.recv().await else {
        panic!("expected PULL");
    };
    assert_eq!(msg.qid, Some(0));
    server
        .send_record(vec![PackStreamValue::String("from-a".into())])
        .await;
    server
        .send_success(SuccessMessage::streaming_success(false, None))
        .await;
    let result_a = pull_a.await.unwrap();
    assert_eq!(
        result_a.records[0].get(0).unwrap().as_string().unwrap(),
        "from-a"
    );
}

#[tokio::test]
async fn mid_stream_pull_carries_no_summary() {
    let (mut connection, mut server) = connect_pair().await;

    let run = connection
        .run("MATCH (n) RETURN n", HashMap::new(), false)
        .await
        .unwrap();
    let pull = connection.pull(2).await.unwrap();

    server.recv_burst(2).await;
    server
        .send_success(SuccessMessage::run_success(vec!["n".into()], None))
        .await;
    server.send_record(vec![PackStreamValue::Integer(1)]).await;
    server.send_record(vec![PackStreamValue::Integer(2)]).await;
    server
        .send_success(SuccessMessage::streaming_success(true, None))
        .await;

    run.await.unwrap();
    let result = pull.await.unwrap();
    assert_eq!(result.records.len(), 2);
    assert!(result.has_more);
    assert!(result.summary.is_none());
}

#[tokio::test]
async fn discard_all_reports_update_counters() {
    let (mut connection, mut server) = connect_pair().await;

    let run = connection
        .run("CREATE (n:Person) SET n.a = 1, n.b = 2", HashMap::new(), false)
        .await
        .unwrap();
    let discard = connection.discard(-1, true).await.unwrap();

    let burst = server.recv_burst(2).await;
    let BoltRequest::Discard(msg) = &burst[1] else {
        panic!("expected DISCARD second");
    };
    assert_eq!(msg.n, -1);

    server
        .send_success(SuccessMessage::run_success(vec![], None))
        .await;
    server
        .send_success(stats_success(&[
            ("nodes-created", 3),
            ("properties-set", 2),
        ]))
        .await;

    run.await.unwrap();
    let result = discard.await.unwrap();
    assert!(!result.has_more);

    let summary = result.summary.unwrap();
    assert_eq!(summary.counters.nodes_created, 3);
    assert_eq!(summary.counters.properties_set, 2);
    assert_eq!(summary.counters.total_count(), 5);
    assert!(summary.counters.contains_updates());
}

#[tokio::test]
async fn commit_returns_the_bookmark() {
    let (mut connection, mut server) = connect_pair().await;

    let begin = connection
        .begin_transaction(
            vec!["bm:before".to_string()],
            HashMap::new(),
            AccessMode::Write,
            TransactionType::Default,
            true,
        )
        .await
        .unwrap();
    assert_eq!(connection.state(), SessionState::TransactionOpen);

    let BoltRequest::Begin(msg) = server.recv().await else {
        panic!("expected BEGIN");
    };
    assert_eq!(msg.bookmarks, vec!["bm:before"]);
    server.send_success(SuccessMessage::new()).await;
    begin.await.unwrap();

    let commit = connection.commit().await.unwrap();
    assert_eq!(connection.state(), SessionState::Idle);

    let BoltRequest::Commit = server.recv().await else {
        panic!("expected COMMIT");
    };
    server
        .send_success(SuccessMessage::commit_success("bm:after".to_string()))
        .await;

    let response = commit.await.unwrap();
    assert_eq!(response.bookmark.as_deref(), Some("bm:after"));
}

#[tokio::test]
async fn server_failure_resolves_only_its_own_exchange() {
    let (mut connection, mut server) = connect_pair().await;

    let run = connection
        .run("RETURN syntax error", HashMap::new(), false)
        .await
        .unwrap();
    let pull = connection.pull(-1).await.unwrap();

    server.recv_burst(2).await;
    server
        .send(BoltResponse::Failure(FailureMessage::new(
            "Neo.ClientError.Statement.SyntaxError",
            "bad query",
        )))
        .await;
    server.send(BoltResponse::Ignored).await;

    // The failed RUN carries the server error; the pipelined PULL is
    // ignored, not failed with the same error.
    let err = run.await.unwrap_err();
    assert!(matches!(err, DriverError::Server { .. }));
    assert!(err.to_string().contains("SyntaxError"));
    assert!(matches!(pull.await.unwrap_err(), DriverError::Ignored));

    // RESET recovers the connection for further exchanges.
    let reset = connection.reset(true).await.unwrap();
    let BoltRequest::Reset = server.recv().await else {
        panic!("expected RESET");
    };
    server.send_success(SuccessMessage::new()).await;
    reset.await.unwrap();

    let run = connection
        .run("RETURN 1", HashMap::new(), true)
        .await
        .unwrap();
    let BoltRequest::Run(_) = server.recv().await else {
        panic!("expected RUN");
    };
    server
        .send_success(SuccessMessage::run_success(vec!["1".into()], None))
        .await;
    assert_eq!(run.await.unwrap().keys, vec!["1"]);
}

#[tokio::test]
async fn transport_failure_fails_every_pending_exchange() {
    let (mut connection, mut server) = connect_pair().await;

    let run = connection
        .run("RETURN 1", HashMap::new(), false)
        .await
        .unwrap();
    let pull = connection.pull(-1).await.unwrap();

    server.recv_burst(2).await;
    drop(server);

    assert!(matches!(run.await, Err(DriverError::Connection(_))));
    assert!(matches!(pull.await, Err(DriverError::Connection(_))));
}

#[tokio::test]
async fn parameters_cross_the_wire_as_packstream_values() {
    let (mut connection, mut server) = connect_pair().await;

    let mut parameters = HashMap::new();
    parameters.insert("name".to_string(), Value::from("Alice"));
    parameters.insert("age".to_string(), Value::from(30));

    let run = connection
        .run("CREATE (n {name: $name, age: $age})", parameters, true)
        .await
        .unwrap();

    let BoltRequest::Run(msg) = server.recv().await else {
        panic!("expected RUN");
    };
    assert_eq!(msg.parameters.get("name").unwrap().as_str(), Some("Alice"));
    assert_eq!(msg.parameters.get("age").unwrap().as_int(), Some(30));

    server
        .send_success(SuccessMessage::run_success(vec![], None))
        .await;
    run.await.unwrap();
}

#[tokio::test]
async fn invalid_submissions_fail_fast() {
    let (mut connection, mut server) = connect_pair().await;

    // COMMIT and ROLLBACK outside a transaction never reach the wire.
    assert!(matches!(
        connection.commit().await,
        Err(DriverError::InvalidState(_))
    ));
    assert!(matches!(
        connection.rollback().await,
        Err(DriverError::InvalidState(_))
    ));

    // A second BEGIN inside an open transaction is rejected.
    let begin = connection
        .begin_transaction(
            vec![],
            HashMap::new(),
            AccessMode::Write,
            TransactionType::Default,
            true,
        )
        .await
        .unwrap();
    server.recv().await;
    server.send_success(SuccessMessage::new()).await;
    begin.await.unwrap();

    assert!(matches!(
        connection
            .begin_transaction(
                vec![],
                HashMap::new(),
                AccessMode::Write,
                TransactionType::Default,
                true,
            )
            .await,
        Err(DriverError::InvalidState(_))
    ));

    // RESET is always allowed and returns the session to idle.
    let reset = connection.reset(true).await.unwrap();
    server.recv().await;
    server.send_success(SuccessMessage::new()).await;
    reset.await.unwrap();
    assert_eq!(connection.state(), SessionState::Idle);

    // Nothing may be submitted after close.
    connection.close().await.unwrap();
    assert_eq!(connection.state(), SessionState::Closed);
    assert!(matches!(
        connection.run("RETURN 1", HashMap::new(), true).await,
        Err(DriverError::InvalidState(_))
    ));
}

#[tokio::test]
async fn close_sends_goodbye() {
    let (mut connection, mut server) = connect_pair().await;

    connection.close().await.unwrap();

    let BoltRequest::Goodbye = server.recv().await else {
        panic!("expected GOODBYE");
    };
    // Closing twice is a no-op.
    connection.close().await.unwrap();
}

#[tokio::test]
async fn read_timeout_is_mutable_after_construction() {
    let (connection, _server) = connect_pair().await;

    assert_eq!(connection.read_timeout(), None);
    connection.set_read_timeout(Some(std::time::Duration::from_secs(5)));
    assert_eq!(
        connection.read_timeout(),
        Some(std::time::Duration::from_secs(5))
    );
    connection.set_read_timeout(None);
    assert_eq!(connection.read_timeout(), None);
}
