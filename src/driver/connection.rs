//! Asynchronous Bolt connection.
//!
//! A [`Connection`] drives one physical socket through the Bolt message
//! exchange. Every operation appends one message to an outbound buffer,
//! registers a pending exchange, and returns a [`ResponseHandle`]
//! immediately; a `flush` flag decides whether the buffer is written to
//! the socket now or coalesced with a later call, so RUN and PULL of a
//! query can share a single network round trip.
//!
//! A background reader task decodes inbound messages and resolves pending
//! exchanges strictly in submission order. A server FAILURE or IGNORED
//! resolves only its own exchange; a transport failure resolves the
//! current exchange and every queued one, after which the connection is
//! unusable.
//!
//! One logical session owns a connection: submission takes `&mut self`.
//! Handles are independent and may be awaited from anywhere.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace, warn};

use crate::bolt::handshake::{self, HANDSHAKE_RESPONSE_SIZE};
use crate::bolt::{
    AccessMode, BeginMessage, BoltClientCodec, BoltError, BoltRequest, BoltResponse, BoltVersion,
    DiscardMessage, HelloMessage, PullMessage, RecordMessage, RunMessage, SuccessMessage,
    TransactionType,
};

use super::adapter;
use super::agent::BoltAgent;
use super::config::ConnectionConfig;
use super::error::{DriverError, DriverResult};
use super::response::{
    CommitResponse, DiscardResponse, PullResponse, Record, ResultSummary, RunResponse,
};
use super::security::SecurityPlan;
use super::value::Value;

/// Session state of a connection, tracked at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No open transaction; RUN executes in auto-commit mode
    Idle,
    /// An explicit transaction is open
    TransactionOpen,
    /// Terminal; no further messages may be submitted
    Closed,
}

/// Pending resolution of a submitted exchange.
///
/// Resolves to the exchange's typed response once the server's reply is
/// decoded, or to an error if the exchange or the transport failed.
/// Dropping a handle never blocks the pipeline; the exchange still
/// completes on the wire.
#[derive(Debug)]
pub struct ResponseHandle<T> {
    rx: oneshot::Receiver<DriverResult<T>>,
}

impl<T> Future for ResponseHandle<T> {
    type Output = DriverResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(DriverError::connection(
                "connection closed before the exchange resolved",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn response_channel<T>() -> (ResponseHandle<T>, oneshot::Sender<DriverResult<T>>) {
    let (tx, rx) = oneshot::channel();
    (ResponseHandle { rx }, tx)
}

/// One registered exchange awaiting its summary message, in FIFO order.
enum PendingExchange {
    Hello(oneshot::Sender<DriverResult<SuccessMessage>>),
    Begin(oneshot::Sender<DriverResult<()>>),
    Run(oneshot::Sender<DriverResult<RunResponse>>),
    Pull(oneshot::Sender<DriverResult<PullResponse>>),
    Discard(oneshot::Sender<DriverResult<DiscardResponse>>),
    Commit(oneshot::Sender<DriverResult<CommitResponse>>),
    Rollback(oneshot::Sender<DriverResult<()>>),
    Reset(oneshot::Sender<DriverResult<()>>),
}

impl PendingExchange {
    fn name(&self) -> &'static str {
        match self {
            PendingExchange::Hello(_) => "HELLO",
            PendingExchange::Begin(_) => "BEGIN",
            PendingExchange::Run(_) => "RUN",
            PendingExchange::Pull(_) => "PULL",
            PendingExchange::Discard(_) => "DISCARD",
            PendingExchange::Commit(_) => "COMMIT",
            PendingExchange::Rollback(_) => "ROLLBACK",
            PendingExchange::Reset(_) => "RESET",
        }
    }

    fn fail(self, err: DriverError) {
        match self {
            PendingExchange::Hello(tx) => drop(tx.send(Err(err))),
            PendingExchange::Begin(tx) => drop(tx.send(Err(err))),
            PendingExchange::Run(tx) => drop(tx.send(Err(err))),
            PendingExchange::Pull(tx) => drop(tx.send(Err(err))),
            PendingExchange::Discard(tx) => drop(tx.send(Err(err))),
            PendingExchange::Commit(tx) => drop(tx.send(Err(err))),
            PendingExchange::Rollback(tx) => drop(tx.send(Err(err))),
            PendingExchange::Reset(tx) => drop(tx.send(Err(err))),
        }
    }
}

/// The socket under a connection, plain or TLS.
enum BoltSocket {
    Plain(TcpStream),
    Tls(Box<tokio_native_tls::TlsStream<TcpStream>>),
}

impl AsyncRead for BoltSocket {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            BoltSocket::Plain(s) => Pin::new(s).poll_read(cx, buf),
            BoltSocket::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for BoltSocket {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            BoltSocket::Plain(s) => Pin::new(s).poll_write(cx, buf),
            BoltSocket::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            BoltSocket::Plain(s) => Pin::new(s).poll_flush(cx),
            BoltSocket::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            BoltSocket::Plain(s) => Pin::new(s).poll_shutdown(cx),
            BoltSocket::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// An authenticated, pipelined Bolt connection.
pub struct Connection {
    write_half: WriteHalf<BoltSocket>,
    codec: BoltClientCodec,
    outbound: BytesMut,
    pending: mpsc::UnboundedSender<PendingExchange>,
    state: SessionState,
    tx_type: Option<TransactionType>,
    protocol_version: BoltVersion,
    server_agent: Option<String>,
    connection_id: Option<String>,
    database: Option<String>,
    read_timeout: Arc<Mutex<Option<Duration>>>,
}

impl Connection {
    /// Connect, secure, handshake and authenticate.
    ///
    /// Dials the configured address, upgrades to TLS when the plan
    /// requires it, negotiates the protocol version, spawns the reader
    /// task and completes the HELLO exchange.
    pub async fn connect(config: &ConnectionConfig, plan: &SecurityPlan) -> DriverResult<Self> {
        let address = config.address.to_socket_addr();
        let tcp = TcpStream::connect(&address).await.map_err(|e| {
            DriverError::connection(format!("failed to connect to {}: {}", address, e))
        })?;
        tcp.set_nodelay(true).ok();

        let mut socket = match plan.connector() {
            Some(connector) => {
                let connector = tokio_native_tls::TlsConnector::from(connector.clone());
                let tls = connector
                    .connect(&config.address.host, tcp)
                    .await
                    .map_err(|e| {
                        DriverError::connection(format!(
                            "TLS handshake with {} failed: {}",
                            address, e
                        ))
                    })?;
                BoltSocket::Tls(Box::new(tls))
            }
            None => BoltSocket::Plain(tcp),
        };

        let protocol_version = Self::handshake(&mut socket).await?;
        debug!(%address, version = %protocol_version, "bolt handshake complete");

        let (read_half, write_half) = tokio::io::split(socket);
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        let read_timeout = Arc::new(Mutex::new(config.read_timeout));

        tokio::spawn(
            Reader {
                read_half,
                codec: BoltClientCodec::new(),
                buffer: BytesMut::with_capacity(8192),
                pending: pending_rx,
                read_timeout: Arc::clone(&read_timeout),
            }
            .run(),
        );

        let mut connection = Self {
            write_half,
            codec: BoltClientCodec::new(),
            outbound: BytesMut::with_capacity(8192),
            pending: pending_tx,
            state: SessionState::Idle,
            tx_type: None,
            protocol_version,
            server_agent: None,
            connection_id: None,
            database: config.database.clone(),
            read_timeout,
        };

        let hello = HelloMessage::new(&config.user_agent, config.auth.clone())
            .with_bolt_agent(BoltAgent::default().to_map());
        let (handle, tx) = response_channel();
        connection
            .submit(BoltRequest::Hello(hello), PendingExchange::Hello(tx), true)
            .await?;
        let success = handle.await?;

        connection.server_agent = success.server().map(str::to_string);
        connection.connection_id = success.connection_id().map(str::to_string);
        debug!(
            server = connection.server_agent.as_deref().unwrap_or("unknown"),
            connection_id = connection.connection_id.as_deref().unwrap_or("unknown"),
            "connection authenticated"
        );

        Ok(connection)
    }

    async fn handshake(socket: &mut BoltSocket) -> DriverResult<BoltVersion> {
        socket
            .write_all(&handshake::proposal())
            .await
            .map_err(|e| DriverError::connection(format!("handshake write failed: {}", e)))?;

        let mut reply = [0u8; HANDSHAKE_RESPONSE_SIZE];
        socket
            .read_exact(&mut reply)
            .await
            .map_err(|e| DriverError::connection(format!("handshake read failed: {}", e)))?;

        let version = handshake::agreement(reply).map_err(BoltError::Handshake)?;
        Ok(version)
    }

    /// Open an explicit transaction.
    ///
    /// `flush = false` leaves BEGIN in the outbound buffer to be carried
    /// by the next flushing call, typically the first RUN of the
    /// transaction.
    pub async fn begin_transaction(
        &mut self,
        bookmarks: Vec<String>,
        tx_metadata: HashMap<String, Value>,
        access_mode: AccessMode,
        tx_type: TransactionType,
        flush: bool,
    ) -> DriverResult<ResponseHandle<()>> {
        self.ensure_open()?;
        if self.state == SessionState::TransactionOpen {
            return Err(DriverError::invalid_state("transaction already open"));
        }

        let mut begin = BeginMessage::new()
            .with_bookmarks(bookmarks)
            .with_mode(access_mode);
        if let Some(ref db) = self.database {
            begin = begin.with_database(db);
        }
        if !tx_metadata.is_empty() {
            begin = begin.with_metadata(adapter::map_to_wire(&tx_metadata)?);
        }

        let (handle, tx) = response_channel();
        self.submit(BoltRequest::Begin(begin), PendingExchange::Begin(tx), flush)
            .await?;
        self.state = SessionState::TransactionOpen;
        self.tx_type = Some(tx_type);
        Ok(handle)
    }

    /// Submit a query. The query text is forwarded verbatim; it is never
    /// parsed by the driver.
    pub async fn run(
        &mut self,
        query: &str,
        parameters: HashMap<String, Value>,
        flush: bool,
    ) -> DriverResult<ResponseHandle<RunResponse>> {
        self.ensure_open()?;

        let mut run = RunMessage::new(query).with_parameters(adapter::map_to_wire(&parameters)?);
        if self.state == SessionState::Idle {
            // auto-commit RUN carries its own target database; inside an
            // explicit transaction BEGIN already named it
            if let Some(ref db) = self.database {
                run = run.with_database(db);
            }
        }

        let (handle, tx) = response_channel();
        self.submit(BoltRequest::Run(run), PendingExchange::Run(tx), flush)
            .await?;
        Ok(handle)
    }

    /// Stream records of the most recent RUN. `request` of -1 asks for
    /// all remaining records; a non-negative value is an exact cap.
    /// Always flushes, carrying any buffered messages with it.
    pub async fn pull(&mut self, request: i64) -> DriverResult<ResponseHandle<PullResponse>> {
        self.pull_message(PullMessage::with_n(request)).await
    }

    /// Stream records of an explicit result stream, for transactions with
    /// several concurrently open results.
    pub async fn pull_query(
        &mut self,
        run: &RunResponse,
        request: i64,
    ) -> DriverResult<ResponseHandle<PullResponse>> {
        let mut message = PullMessage::with_n(request);
        if let Some(qid) = run.query_id {
            message = message.with_qid(qid);
        }
        self.pull_message(message).await
    }

    async fn pull_message(
        &mut self,
        message: PullMessage,
    ) -> DriverResult<ResponseHandle<PullResponse>> {
        self.ensure_open()?;
        let (handle, tx) = response_channel();
        self.submit(BoltRequest::Pull(message), PendingExchange::Pull(tx), true)
            .await?;
        Ok(handle)
    }

    /// Drop records of the most recent RUN without streaming them. Same
    /// count semantics as [`Connection::pull`].
    pub async fn discard(
        &mut self,
        count: i64,
        flush: bool,
    ) -> DriverResult<ResponseHandle<DiscardResponse>> {
        self.discard_message(DiscardMessage::with_n(count), flush)
            .await
    }

    /// Drop records of an explicit result stream.
    pub async fn discard_query(
        &mut self,
        run: &RunResponse,
        count: i64,
        flush: bool,
    ) -> DriverResult<ResponseHandle<DiscardResponse>> {
        let mut message = DiscardMessage::with_n(count);
        if let Some(qid) = run.query_id {
            message = message.with_qid(qid);
        }
        self.discard_message(message, flush).await
    }

    async fn discard_message(
        &mut self,
        message: DiscardMessage,
        flush: bool,
    ) -> DriverResult<ResponseHandle<DiscardResponse>> {
        self.ensure_open()?;
        let (handle, tx) = response_channel();
        self.submit(
            BoltRequest::Discard(message),
            PendingExchange::Discard(tx),
            flush,
        )
        .await?;
        Ok(handle)
    }

    /// Commit the open transaction. Always flushes.
    pub async fn commit(&mut self) -> DriverResult<ResponseHandle<CommitResponse>> {
        self.ensure_open()?;
        if self.state != SessionState::TransactionOpen {
            return Err(DriverError::invalid_state("no open transaction to commit"));
        }

        let (handle, tx) = response_channel();
        self.submit(BoltRequest::Commit, PendingExchange::Commit(tx), true)
            .await?;
        self.state = SessionState::Idle;
        self.tx_type = None;
        Ok(handle)
    }

    /// Roll back the open transaction. Always flushes.
    pub async fn rollback(&mut self) -> DriverResult<ResponseHandle<()>> {
        self.ensure_open()?;
        if self.state != SessionState::TransactionOpen {
            return Err(DriverError::invalid_state(
                "no open transaction to roll back",
            ));
        }

        let (handle, tx) = response_channel();
        self.submit(BoltRequest::Rollback, PendingExchange::Rollback(tx), true)
            .await?;
        self.state = SessionState::Idle;
        self.tx_type = None;
        Ok(handle)
    }

    /// Abandon any open transaction and open result streams, returning
    /// the connection to idle. Allowed in every state except closed.
    pub async fn reset(&mut self, flush: bool) -> DriverResult<ResponseHandle<()>> {
        self.ensure_open()?;

        let (handle, tx) = response_channel();
        self.submit(BoltRequest::Reset, PendingExchange::Reset(tx), flush)
            .await?;
        self.state = SessionState::Idle;
        self.tx_type = None;
        Ok(handle)
    }

    /// Close the connection gracefully: GOODBYE, flush and socket
    /// shutdown. GOODBYE has no reply; exchanges still pending when the
    /// server closes its side resolve with a connection error.
    pub async fn close(&mut self) -> DriverResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        self.codec.encode(BoltRequest::Goodbye, &mut self.outbound)?;
        self.flush().await?;
        self.state = SessionState::Closed;
        self.write_half.shutdown().await.ok();
        debug!("connection closed");
        Ok(())
    }

    async fn submit(
        &mut self,
        request: BoltRequest,
        pending: PendingExchange,
        flush: bool,
    ) -> DriverResult<()> {
        trace!(request = request.name(), flush, "submitting request");
        self.codec.encode(request, &mut self.outbound)?;
        self.pending
            .send(pending)
            .map_err(|_| DriverError::connection("connection reader has shut down"))?;
        if flush {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> DriverResult<()> {
        if self.outbound.is_empty() {
            return Ok(());
        }
        let buffer = self.outbound.split();
        self.write_half.write_all(&buffer).await?;
        self.write_half.flush().await?;
        trace!(bytes = buffer.len(), "flushed outbound buffer");
        Ok(())
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.state == SessionState::Closed {
            return Err(DriverError::invalid_state("connection is closed"));
        }
        Ok(())
    }

    /// The database this connection targets, when configured.
    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Session state as tracked at submission time.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Type of the open transaction, if one is open.
    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.tx_type
    }

    /// Negotiated protocol version.
    pub fn protocol_version(&self) -> BoltVersion {
        self.protocol_version
    }

    /// Server agent string reported in the HELLO exchange.
    pub fn server_agent(&self) -> Option<&str> {
        self.server_agent.as_deref()
    }

    /// Connection id assigned by the server.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Current per-response read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        *self.read_timeout.lock()
    }

    /// Change the per-response read timeout. Takes effect from the next
    /// socket read; a timed-out read fails the connection.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) {
        *self.read_timeout.lock() = timeout;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("protocol_version", &self.protocol_version)
            .field("server_agent", &self.server_agent)
            .field("connection_id", &self.connection_id)
            .field("database", &self.database)
            .finish()
    }
}

/// Background task decoding inbound messages and resolving pending
/// exchanges in FIFO order.
struct Reader<R> {
    read_half: R,
    codec: BoltClientCodec,
    buffer: BytesMut,
    pending: mpsc::UnboundedReceiver<PendingExchange>,
    read_timeout: Arc<Mutex<Option<Duration>>>,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    async fn run(mut self) {
        // Records stream ahead of the summary that ends their exchange;
        // they accumulate here until that summary arrives. A record that
        // fails value conversion poisons its exchange, not the connection.
        let mut records: Vec<Record> = Vec::new();
        let mut deferred: Option<DriverError> = None;

        loop {
            let response = match self.next_response().await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    self.fail_all(|| {
                        DriverError::connection("connection closed by server")
                    })
                    .await;
                    return;
                }
                Err(err) => {
                    let message = err.to_string();
                    let timed_out = matches!(err, DriverError::Timeout(_));
                    self.fail_all(|| {
                        if timed_out {
                            DriverError::timeout(message.clone())
                        } else {
                            DriverError::connection(message.clone())
                        }
                    })
                    .await;
                    return;
                }
            };

            match response {
                BoltResponse::Record(record) => match Self::decode_record(record) {
                    Ok(record) => records.push(record),
                    Err(err) => deferred = Some(err),
                },
                summary => {
                    if !self
                        .resolve(summary, &mut records, deferred.take())
                        .await
                    {
                        return;
                    }
                }
            }
        }
    }

    async fn next_response(&mut self) -> DriverResult<Option<BoltResponse>> {
        loop {
            if let Some(response) = self.codec.decode(&mut self.buffer)? {
                trace!(response = response.name(), "received response");
                return Ok(Some(response));
            }

            let timeout = *self.read_timeout.lock();
            let n = match timeout {
                Some(limit) => tokio::time::timeout(limit, self.read_half.read_buf(&mut self.buffer))
                    .await
                    .map_err(|_| {
                        DriverError::timeout(format!("no response within {:?}", limit))
                    })??,
                None => self.read_half.read_buf(&mut self.buffer).await?,
            };
            if n == 0 {
                return Ok(None);
            }
        }
    }

    fn decode_record(record: RecordMessage) -> DriverResult<Record> {
        let values = record
            .fields
            .into_iter()
            .map(adapter::from_wire)
            .collect::<DriverResult<Vec<Value>>>()?;
        Ok(Record::new(values))
    }

    /// Resolve the head pending exchange with a summary message. Returns
    /// false when no exchange is waiting (the connection side is gone).
    async fn resolve(
        &mut self,
        response: BoltResponse,
        records: &mut Vec<Record>,
        deferred: Option<DriverError>,
    ) -> bool {
        let Some(pending) = self.pending.recv().await else {
            return false;
        };

        match response {
            BoltResponse::Failure(failure) => {
                warn!(
                    exchange = pending.name(),
                    code = %failure.code,
                    "server reported failure"
                );
                records.clear();
                pending.fail(DriverError::server(failure.code, failure.message));
            }
            BoltResponse::Ignored => {
                records.clear();
                pending.fail(DriverError::Ignored);
            }
            BoltResponse::Success(success) => {
                if let Some(err) = deferred {
                    records.clear();
                    pending.fail(err);
                    return true;
                }
                Self::succeed(pending, success, records);
            }
            BoltResponse::Record(_) => unreachable!("records never reach resolve"),
        }
        true
    }

    fn succeed(pending: PendingExchange, success: SuccessMessage, records: &mut Vec<Record>) {
        // Only PULL exchanges consume streamed records; records in front
        // of any other summary violate the protocol.
        if !records.is_empty() && !matches!(pending, PendingExchange::Pull(_)) {
            let stray = records.len();
            records.clear();
            pending.fail(DriverError::protocol(format!(
                "{} unexpected records before a non-streaming summary",
                stray
            )));
            return;
        }

        match pending {
            PendingExchange::Hello(tx) => drop(tx.send(Ok(success))),
            PendingExchange::Begin(tx) => drop(tx.send(Ok(()))),
            PendingExchange::Run(tx) => {
                drop(tx.send(Ok(RunResponse::from_success(&success))));
            }
            PendingExchange::Pull(tx) => {
                let has_more = success.has_more();
                let summary = (!has_more).then(|| ResultSummary::from_success(&success));
                drop(tx.send(Ok(PullResponse {
                    records: mem::take(records),
                    summary,
                    has_more,
                })));
            }
            PendingExchange::Discard(tx) => {
                let has_more = success.has_more();
                let summary = (!has_more).then(|| ResultSummary::from_success(&success));
                drop(tx.send(Ok(DiscardResponse { summary, has_more })));
            }
            PendingExchange::Commit(tx) => {
                drop(tx.send(Ok(CommitResponse::from_success(&success))));
            }
            PendingExchange::Rollback(tx) => drop(tx.send(Ok(()))),
            PendingExchange::Reset(tx) => drop(tx.send(Ok(()))),
        }
    }

    /// Fail every pending exchange, current and queued. Called on
    /// transport failure, after which no further responses can arrive.
    async fn fail_all(&mut self, make_err: impl Fn() -> DriverError) {
        self.pending.close();
        while let Some(pending) = self.pending.recv().await {
            warn!(exchange = pending.name(), "failing exchange: transport lost");
            pending.fail(make_err());
        }
    }
}
