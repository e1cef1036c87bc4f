use std::sync::Arc;

use hashbrown::HashMap;

use crate::column::MySqlColumn;
use crate::connection::stream::Waiting;
use crate::connection::MySqlConnection;
use crate::error::{Error, Result};
use crate::io::MySqlBufExt;
use crate::protocol::response::{LocalInfileRequest, Status};
use crate::protocol::Capabilities;
use crate::protocol::statement::{BinaryRow, Execute, Prepare, PrepareOk, StmtClose};
use crate::protocol::text::{ColumnDefinition, Query, TextRow};
use crate::query_result::MySqlQueryResult;
use crate::row::MySqlRow;
use crate::statement::MySqlStatement;
use crate::value::{MySqlValue, MySqlValueFormat};

impl MySqlConnection {
    /// Execute a textual query and stream back its result rows.
    ///
    /// Statements without a result set (e.g. `INSERT`) produce a stream that
    /// ends immediately; the affected-row summary is available from
    /// [`MySqlRowStream::query_result`] after the stream is drained.
    pub async fn query<'c>(&'c mut self, sql: &str) -> Result<MySqlRowStream<'c>> {
        self.guard_closed()?;
        self.stream.wait_until_ready().await?;

        log::debug!("executing query: {sql}");

        self.stream.waiting.push_back(Waiting::Result);
        self.stream.send_packet(Query(sql)).await?;

        Ok(MySqlRowStream::new(self, MySqlValueFormat::Text))
    }

    /// Prepare a statement for later execution.
    ///
    /// Parameter placeholders are typeless until execution; their types are
    /// declared from the values passed to [`execute`][Self::execute].
    pub async fn prepare(&mut self, sql: &str) -> Result<MySqlStatement> {
        self.guard_closed()?;
        self.stream.wait_until_ready().await?;

        log::debug!("preparing statement: {sql}");

        self.stream.send_packet(Prepare { sql }).await?;

        let ok: PrepareOk = self.stream.recv().await?;

        if ok.warnings > 0 {
            log::warn!("statement prepared with {} warning(s)", ok.warnings);
        }

        // parameter definitions carry no reliable type information at this
        // point (the server has not seen any values); skip over them
        if ok.params > 0 {
            for _ in 0..ok.params {
                let _: ColumnDefinition = self.stream.recv().await?;
            }

            self.stream.maybe_recv_eof().await?;
        }

        let mut columns = Vec::with_capacity(usize::from(ok.columns));
        let mut column_names = HashMap::with_capacity(usize::from(ok.columns));

        if ok.columns > 0 {
            for ordinal in 0..usize::from(ok.columns) {
                let def: ColumnDefinition = self.stream.recv().await?;

                column_names.insert(def.display_name().into(), ordinal);

                columns.push(MySqlColumn {
                    ordinal,
                    name: def.display_name().to_owned(),
                    type_info: def.type_info(),
                });
            }

            self.stream.maybe_recv_eof().await?;
        }

        self.statements.insert(ok.statement_id, usize::from(ok.params));

        Ok(MySqlStatement {
            id: ok.statement_id,
            connection_id: self.connection_id,
            parameters: ok.params.into(),
            columns: Arc::new(columns),
            column_names: Arc::new(column_names),
        })
    }

    /// Execute a prepared statement with the given parameter values and
    /// stream back its result rows, in the binary protocol.
    pub async fn execute<'c>(
        &'c mut self,
        statement: &MySqlStatement,
        params: &[MySqlValue],
    ) -> Result<MySqlRowStream<'c>> {
        self.guard_closed()?;

        if statement.connection_id != self.connection_id
            || !self.statements.contains_key(&statement.id)
        {
            return Err(Error::Configuration(
                "prepared statement does not belong to this connection".into(),
            ));
        }

        if params.len() != statement.parameters {
            return Err(Error::Configuration(
                format!(
                    "statement takes {} parameters but {} were given",
                    statement.parameters,
                    params.len()
                )
                .into(),
            ));
        }

        self.stream.wait_until_ready().await?;

        log::debug!("executing statement {}", statement.id);

        self.stream.waiting.push_back(Waiting::Result);
        self.stream
            .send_packet(Execute { statement_id: statement.id, params })
            .await?;

        Ok(MySqlRowStream::new(self, MySqlValueFormat::Binary))
    }

    /// Deallocate a prepared statement on the server.
    ///
    /// The server sends no confirmation; errors here are transport errors.
    pub async fn close_statement(&mut self, statement: MySqlStatement) -> Result<()> {
        self.guard_closed()?;
        self.stream.wait_until_ready().await?;

        self.statements.remove(&statement.id);
        self.stream.send_packet(StmtClose { statement: statement.id }).await?;

        Ok(())
    }
}

/// A live, single-pass stream of rows borrowed from a connection.
///
/// No other command can run on the connection while the stream exists. A
/// stream dropped before the server finished leaves the remaining rows to
/// be read and discarded before the next command starts; call
/// [`cancel`][Self::cancel] to pay that cost eagerly.
#[derive(Debug)]
pub struct MySqlRowStream<'c> {
    conn: &'c mut MySqlConnection,
    format: MySqlValueFormat,
    columns: Arc<Vec<MySqlColumn>>,
    column_names: Arc<HashMap<Box<str>, usize>>,
    state: StreamState,
    result: Option<MySqlQueryResult>,
}

#[derive(Debug)]
enum StreamState {
    // expecting OK, a LOCAL INFILE request, or result-set metadata
    AwaitingResponse,

    // expecting rows or the result-set terminator
    Rows,

    Done,
}

impl<'c> MySqlRowStream<'c> {
    fn new(conn: &'c mut MySqlConnection, format: MySqlValueFormat) -> Self {
        Self {
            conn,
            format,
            columns: Arc::new(Vec::new()),
            column_names: Arc::new(HashMap::new()),
            state: StreamState::AwaitingResponse,
            result: None,
        }
    }

    /// Pull the next row, or `None` once the response is exhausted.
    ///
    /// Server errors end the stream but leave the connection usable; any
    /// other error closes the connection.
    pub async fn next(&mut self) -> Result<Option<MySqlRow>> {
        loop {
            match self.state {
                StreamState::Done => return Ok(None),

                StreamState::AwaitingResponse => {
                    let packet = match self.conn.stream.recv_packet().await {
                        Ok(packet) => packet,
                        Err(err) => return Err(self.end_on(err)),
                    };

                    match packet[0] {
                        // the whole response is a bare OK; no rows follow
                        0x00 => {
                            let capabilities = self.conn.stream.capabilities;
                            let ok = packet.ok(capabilities)?;

                            self.record_result(ok.affected_rows, ok.last_insert_id, ok.warnings);
                            self.conn.stream.status = ok.status;

                            if ok.status.contains(Status::MORE_RESULTS_EXISTS) {
                                continue;
                            }

                            return Ok(self.finish());
                        }

                        // LOCAL INFILE: this client refuses by answering
                        // with an empty payload, then the server concludes
                        // with OK or ERR
                        0xfb => {
                            let request: LocalInfileRequest = packet.decode_with(())?;
                            log::debug!(
                                "refusing LOCAL INFILE request for {:?}",
                                request.filename
                            );

                            self.conn.stream.write_packet(&[][..])?;
                            self.conn.stream.flush().await?;
                        }

                        // a length-encoded column count starts the
                        // result-set metadata
                        _ => {
                            self.read_result_metadata(packet.0).await?;
                            self.state = StreamState::Rows;
                        }
                    }
                }

                StreamState::Rows => {
                    let packet = match self.conn.stream.recv_packet().await {
                        Ok(packet) => packet,
                        Err(err) => return Err(self.end_on(err)),
                    };

                    // OK (or legacy EOF) ends this result set; a row never
                    // starts with 0xfe in a packet this short
                    if packet[0] == 0xfe && packet.len() < 9 {
                        let capabilities = self.conn.stream.capabilities;

                        // under DEPRECATE_EOF the terminator is a full OK
                        // packet and carries the command summary
                        let status = if capabilities.contains(Capabilities::DEPRECATE_EOF) {
                            let ok = packet.ok(capabilities)?;
                            self.record_result(ok.affected_rows, ok.last_insert_id, ok.warnings);
                            ok.status
                        } else {
                            let eof = packet.eof(capabilities)?;
                            self.record_result(0, 0, eof.warnings);
                            eof.status
                        };

                        self.conn.stream.status = status;

                        if status.contains(Status::MORE_RESULTS_EXISTS) {
                            // the next result set follows immediately
                            if let Some(front) = self.conn.stream.waiting.front_mut() {
                                *front = Waiting::Result;
                            }

                            self.state = StreamState::AwaitingResponse;
                            continue;
                        }

                        return Ok(self.finish());
                    }

                    let row = match self.format {
                        MySqlValueFormat::Text => {
                            packet.decode_with::<TextRow, _>(&self.columns[..])?.0
                        }
                        MySqlValueFormat::Binary => {
                            packet.decode_with::<BinaryRow, _>(&self.columns[..])?.0
                        }
                    };

                    return Ok(Some(MySqlRow {
                        row,
                        format: self.format,
                        columns: Arc::clone(&self.columns),
                        column_names: Arc::clone(&self.column_names),
                    }));
                }
            }
        }
    }

    /// Read and discard the remaining rows, returning the final command
    /// summary.
    pub async fn drain(mut self) -> Result<MySqlQueryResult> {
        while self.next().await?.is_some() {}

        Ok(self.result.unwrap_or_default())
    }

    /// Abandon the stream, discarding whatever the server has still to
    /// send, and return the connection to idle.
    pub async fn cancel(self) -> Result<()> {
        let Self { conn, .. } = self;

        conn.stream.wait_until_ready().await
    }

    /// The columns of the current result set; empty until the first call to
    /// [`next`][Self::next] has seen the result-set metadata.
    pub fn columns(&self) -> &[MySqlColumn] {
        &self.columns
    }

    /// The summary from the last completed result set, if any.
    pub fn query_result(&self) -> Option<&MySqlQueryResult> {
        self.result.as_ref()
    }

    async fn read_result_metadata(&mut self, packet: bytes::Bytes) -> Result<()> {
        let mut bytes = packet;
        let count = bytes.get_uint_lenenc()?;

        let count = usize::try_from(count)
            .map_err(|_| Error::Protocol(format!("column count out of range: {count}")))?;

        let mut columns = Vec::with_capacity(count);
        let mut column_names = HashMap::with_capacity(count);

        for ordinal in 0..count {
            let def: ColumnDefinition = self.conn.stream.recv().await?;

            column_names.insert(def.display_name().into(), ordinal);

            columns.push(MySqlColumn {
                ordinal,
                name: def.display_name().to_owned(),
                type_info: def.type_info(),
            });
        }

        self.conn.stream.maybe_recv_eof().await?;

        // rows are owed from here on; an abandoned stream drains as rows
        if let Some(front) = self.conn.stream.waiting.front_mut() {
            *front = Waiting::Row;
        }

        self.columns = Arc::new(columns);
        self.column_names = Arc::new(column_names);

        Ok(())
    }

    fn record_result(&mut self, rows_affected: u64, last_insert_id: u64, warnings: u16) {
        let result = MySqlQueryResult { rows_affected, last_insert_id, warnings };

        self.result = Some(result);
        self.conn.last_result = Some(result);
    }

    // the terminating OK was consumed: the connection is idle again
    fn finish(&mut self) -> Option<MySqlRow> {
        self.state = StreamState::Done;
        self.conn.stream.waiting.pop_front();
        self.conn.stream.sequence_id = 0;

        None
    }

    // a server error ends the response; anything else closed the connection
    fn end_on(&mut self, err: Error) -> Error {
        self.state = StreamState::Done;

        err
    }
}
