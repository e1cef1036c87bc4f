//! Whole-connection tests against a scripted server.
//!
//! Each test queues the byte-exact server side of a recorded MySQL 8.0
//! conversation and drives the public API over it.

use digest::Digest;
use futures::executor::block_on;
use sha1::Sha1;

use crate::mock::MockSocket;
use crate::net::{NoTls, Socket, TlsConfig, TlsUpgrade};
use crate::options::{MySqlConnectOptions, MySqlSslMode};
use crate::protocol::response::Status;
use crate::protocol::{Capabilities, MAX_PACKET_PAYLOAD};
use crate::value::MySqlValue;
use crate::{Error, MySqlConnection};

const SCRAMBLE: [u8; 20] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    0x0f, 0x10, 0x11, 0x12, 0x13,
];

// the capability set of scenario servers that speak the modern protocol
fn modern_server_capabilities() -> Capabilities {
    legacy_server_capabilities() | Capabilities::DEPRECATE_EOF
}

// a server without DEPRECATE_EOF, to exercise the legacy EOF paths
fn legacy_server_capabilities() -> Capabilities {
    Capabilities::LONG_PASSWORD
        | Capabilities::FOUND_ROWS
        | Capabilities::LONG_FLAG
        | Capabilities::CONNECT_WITH_DB
        | Capabilities::PROTOCOL_41
        | Capabilities::INTERACTIVE
        | Capabilities::TRANSACTIONS
        | Capabilities::SECURE_CONNECTION
        | Capabilities::MULTI_STATEMENTS
        | Capabilities::MULTI_RESULTS
        | Capabilities::PS_MULTI_RESULTS
        | Capabilities::PLUGIN_AUTH
        | Capabilities::SESSION_TRACK
}

fn handshake_payload(capabilities: Capabilities, plugin: &str) -> Vec<u8> {
    let bits = capabilities.bits() as u32;

    let mut payload = vec![0x0a];
    payload.extend_from_slice(b"8.0.30\0");
    payload.extend_from_slice(&156_u32.to_le_bytes());
    payload.extend_from_slice(&SCRAMBLE[..8]);
    payload.push(0);
    payload.extend_from_slice(&(bits as u16).to_le_bytes());
    payload.push(0x21);
    payload.extend_from_slice(&Status::AUTOCOMMIT.bits().to_le_bytes());
    payload.extend_from_slice(&((bits >> 16) as u16).to_le_bytes());
    payload.push(21);
    payload.extend_from_slice(&[0; 10]);
    payload.extend_from_slice(&SCRAMBLE[8..]);
    payload.push(0);
    payload.extend_from_slice(plugin.as_bytes());
    payload.push(0);

    payload
}

const OK_AUTOCOMMIT: &[u8] = &[0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];

fn column_def_payload(alias: &str, r#type: u8, flags: u16) -> Vec<u8> {
    let mut payload = Vec::new();

    for field in ["def", "", "", "", alias, ""] {
        payload.push(field.len() as u8);
        payload.extend_from_slice(field.as_bytes());
    }

    payload.push(0x0c);
    payload.extend_from_slice(&63_u16.to_le_bytes()); // collation: binary
    payload.extend_from_slice(&1_u32.to_le_bytes()); // max size
    payload.push(r#type);
    payload.extend_from_slice(&flags.to_le_bytes());
    payload.push(0); // decimals
    payload.extend_from_slice(&[0, 0]); // filler

    payload
}

fn options() -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .username("test_username")
        .password("test_password")
        .database("test_database")
        .ssl_mode(MySqlSslMode::Disabled)
}

fn connect(socket: &MockSocket, options: &MySqlConnectOptions) -> MySqlConnection {
    block_on(MySqlConnection::connect_with(socket.clone(), NoTls, options)).unwrap()
}

/// Establish a session against a native-password server and clear the
/// captured handshake, leaving the socket ready for a command scenario.
fn establish(capabilities: Capabilities) -> (MySqlConnection, MockSocket) {
    let socket = MockSocket::new();

    socket.push_frame(0, &handshake_payload(capabilities, "mysql_native_password"));
    socket.push_frame(2, OK_AUTOCOMMIT);

    let conn = connect(&socket, &options());
    socket.clear_written();

    (conn, socket)
}

fn scramble_sha1_expected(password: &str) -> Vec<u8> {
    let pw_hash = Sha1::digest(password);
    let stored = Sha1::digest(pw_hash);

    let mut mask = Sha1::new();
    mask.update(SCRAMBLE);
    mask.update(stored);
    let mask = mask.finalize();

    pw_hash.iter().zip(mask).map(|(a, b)| a ^ b).collect()
}

#[test]
fn native_password_login_sends_canonical_handshake_response() {
    let socket = MockSocket::new();

    socket.push_frame(0, &handshake_payload(legacy_server_capabilities(), "mysql_native_password"));
    socket.push_frame(2, OK_AUTOCOMMIT);

    let conn = connect(&socket, &options());

    let frames = socket.written_frames();
    assert_eq!(frames.len(), 1);

    let (sequence_id, payload) = &frames[0];
    assert_eq!(*sequence_id, 1);

    // effective capabilities: the full legacy intersection
    assert_eq!(&payload[..4], &[0x0f, 0xa6, 0x8f, 0x00]);

    // max packet size (16 MiB) and collation utf8_general_ci
    assert_eq!(&payload[4..8], &0x0100_0000_u32.to_le_bytes());
    assert_eq!(payload[8], 0x21);

    // 23 reserved bytes
    assert!(payload[9..32].iter().all(|&b| b == 0));

    assert_eq!(&payload[32..46], b"test_username\0");

    // 20-byte auth response, length-prefixed, matching the SHA1 chain
    assert_eq!(payload[46], 0x14);
    assert_eq!(&payload[47..67], &scramble_sha1_expected("test_password")[..]);

    assert_eq!(&payload[67..81], b"test_database\0");
    assert_eq!(&payload[81..], b"mysql_native_password\0");

    assert_eq!(conn.server_version(), (8, 0, 30));
    assert_eq!(conn.connection_id(), 156);
}

#[test]
fn caching_sha2_fast_path_reaches_command_phase() {
    let socket = MockSocket::new();

    socket.push_frame(0, &handshake_payload(modern_server_capabilities(), "caching_sha2_password"));

    // fast-auth success, then OK
    socket.push_frame(2, &[0x01, 0x03]);
    socket.push_frame(3, OK_AUTOCOMMIT);

    let conn = connect(&socket, &options());

    assert!(conn.status().contains(Status::AUTOCOMMIT));
    assert!(conn.stream.waiting.is_empty());
    assert_eq!(conn.stream.sequence_id, 0);
}

#[test]
fn caching_sha2_full_auth_requests_rsa_key_over_plaintext() {
    let socket = MockSocket::new();

    socket.push_frame(0, &handshake_payload(modern_server_capabilities(), "caching_sha2_password"));

    // full authentication required
    socket.push_frame(2, &[0x01, 0x04]);

    // the server's RSA public key (2048-bit, PEM) after the client asks
    let mut key_packet = vec![0x01];
    key_packet.extend_from_slice(TEST_RSA_PUBLIC_KEY.as_bytes());
    socket.push_frame(4, &key_packet);

    socket.push_frame(6, OK_AUTOCOMMIT);

    let conn = connect(&socket, &options());
    assert!(conn.status().contains(Status::AUTOCOMMIT));

    let frames = socket.written_frames();

    // handshake response, key request, encrypted password
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1].1, &[0x02]);
    assert_eq!(frames[2].1.len(), 256);
}

#[test]
fn auth_switch_recomputes_the_response() {
    let socket = MockSocket::new();

    socket.push_frame(0, &handshake_payload(modern_server_capabilities(), "caching_sha2_password"));

    // the server asks to redo authentication with native_password and a
    // fresh scramble
    let new_scramble: Vec<u8> = (0u8..20).map(|b| b.wrapping_add(0x40)).collect();
    let mut switch = b"\xfemysql_native_password\x00".to_vec();
    switch.extend_from_slice(&new_scramble);
    switch.push(0);
    socket.push_frame(2, &switch);

    socket.push_frame(4, OK_AUTOCOMMIT);

    let conn = connect(&socket, &options());
    assert!(conn.status().contains(Status::AUTOCOMMIT));

    let frames = socket.written_frames();
    assert_eq!(frames.len(), 2);

    // the switch response is a bare 20-byte native-password hash computed
    // over the new scramble
    let pw_hash = Sha1::digest("test_password");
    let stored = Sha1::digest(pw_hash);

    let mut mask = Sha1::new();
    mask.update(&new_scramble);
    mask.update(stored);
    let mask = mask.finalize();

    let expected: Vec<u8> = pw_hash.iter().zip(mask).map(|(a, b)| a ^ b).collect();

    assert_eq!(frames[1].0, 3);
    assert_eq!(frames[1].1, expected);
}

// pretends to wrap the socket in TLS while returning it unchanged, and
// scripts the server's post-upgrade half of the conversation
struct PassthroughTls {
    script: MockSocket,
}

impl TlsUpgrade for PassthroughTls {
    async fn upgrade(
        self,
        socket: Box<dyn Socket>,
        config: TlsConfig<'_>,
    ) -> crate::Result<Box<dyn Socket>> {
        assert_eq!(config.server_name, "localhost");

        // full authentication: over (pretend) TLS the password travels in
        // the clear rather than via RSA
        self.script.push_frame(3, &[0x01, 0x04]);
        self.script.push_frame(5, OK_AUTOCOMMIT);

        Ok(socket)
    }
}

#[test]
fn tls_upgrade_sends_ssl_request_before_credentials() {
    let socket = MockSocket::new();

    socket.push_frame(
        0,
        &handshake_payload(
            modern_server_capabilities() | Capabilities::SSL,
            "caching_sha2_password",
        ),
    );

    let tls = PassthroughTls { script: socket.clone() };

    let options = options().ssl_mode(MySqlSslMode::Required);
    let conn =
        block_on(MySqlConnection::connect_with(socket.clone(), tls, &options)).unwrap();

    assert!(conn.is_tls());

    let frames = socket.written_frames();
    assert_eq!(frames.len(), 3);

    // the SSLRequest is the bare 32-byte prefix, with the SSL bit set,
    // sent before any credentials
    let (sequence_id, ssl_request) = &frames[0];
    assert_eq!(*sequence_id, 1);
    assert_eq!(ssl_request.len(), 32);
    assert_ne!(ssl_request[1] & 0x08, 0); // SSL is 0x0800

    // the full handshake response follows on the upgraded channel
    assert_eq!(frames[1].0, 2);
    assert!(frames[1].1.len() > 32);

    // full auth sent the NUL-terminated password in the clear
    assert_eq!(frames[2].0, 4);
    assert_eq!(frames[2].1, b"test_password\0");
}

#[test]
fn simple_query_yields_one_text_row() {
    let (mut conn, socket) = establish(legacy_server_capabilities());

    socket.push_frame(1, &[0x01]); // one column
    socket.push_frame(2, &column_def_payload("1", 0x08, 0x0081)); // LONGLONG "1"
    socket.push_frame(3, &[0xfe, 0x00, 0x00, 0x02, 0x00]); // EOF after metadata
    socket.push_frame(4, b"\x011"); // row: "1"
    socket.push_frame(5, &[0xfe, 0x00, 0x00, 0x02, 0x00]); // EOF after rows

    let mut rows = block_on(conn.query("SELECT 1")).unwrap();

    let row = block_on(rows.next()).unwrap().unwrap();
    assert_eq!(row.len(), 1);
    assert_eq!(row.raw(0), Some(&b"1"[..]));
    assert_eq!(row.get(0).unwrap(), MySqlValue::Int64(1));
    assert_eq!(row.columns()[0].name(), "1");

    assert!(block_on(rows.next()).unwrap().is_none());
    drop(rows);

    // the query went out as COM_QUERY on a fresh sequence
    let frames = socket.written_frames();
    assert_eq!(frames[0].0, 0);
    assert_eq!(frames[0].1, b"\x03SELECT 1");

    // back in command phase with the counter reset
    assert!(conn.stream.waiting.is_empty());
    assert_eq!(conn.stream.sequence_id, 0);
}

#[test]
fn server_error_mid_query_leaves_connection_usable() {
    let (mut conn, socket) = establish(modern_server_capabilities());

    socket.push_frame(1, b"\xff\x24\x04#42000Access denied to table");

    let mut rows = block_on(conn.query("SELECT secret FROM vault")).unwrap();

    let err = block_on(rows.next()).unwrap_err();
    match err {
        Error::Database(err) => {
            assert_eq!(err.code(), 0x0424);
            assert_eq!(err.sql_state(), "42000");
            assert_eq!(err.message(), "Access denied to table");
        }

        other => panic!("expected a database error, got {other:?}"),
    }

    drop(rows);

    // the connection survives a server error: ping still works
    socket.push_frame(1, OK_AUTOCOMMIT);
    block_on(conn.ping()).unwrap();
}

#[test]
fn oversized_row_is_reassembled_from_split_frames() {
    let (mut conn, socket) = establish(modern_server_capabilities());

    socket.push_frame(1, &[0x01]);
    socket.push_frame(2, &column_def_payload("blob", 0xfc, 0x0090)); // BLOB, binary

    // a row whose payload is exactly 2^24 bytes: a full frame then a
    // 1-byte continuation
    let value_len = MAX_PACKET_PAYLOAD + 1 - 9;
    let mut row = Vec::with_capacity(MAX_PACKET_PAYLOAD + 1);
    row.push(0xfe);
    row.extend_from_slice(&(value_len as u64).to_le_bytes());
    row.extend((0..value_len).map(|i| (i % 251) as u8));
    assert_eq!(row.len(), MAX_PACKET_PAYLOAD + 1);

    socket.push_frame(3, &row[..MAX_PACKET_PAYLOAD]);
    socket.push_frame(4, &row[MAX_PACKET_PAYLOAD..]);
    socket.push_frame(5, &[0xfe, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]);

    let mut rows = block_on(conn.query("SELECT data FROM big")).unwrap();

    let row = block_on(rows.next()).unwrap().unwrap();
    let value = row.raw(0).unwrap();

    assert_eq!(value.len(), value_len);
    assert!(value.iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));

    assert!(block_on(rows.next()).unwrap().is_none());
}

#[test]
fn prepared_execute_binds_null_and_int() {
    let (mut conn, socket) = establish(modern_server_capabilities());

    // COM_STMT_PREPARE response: statement 1, 2 columns, 2 params
    socket.push_frame(1, &[0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00]);
    socket.push_frame(2, &column_def_payload("?", 0xfd, 0));
    socket.push_frame(3, &column_def_payload("?", 0xfd, 0));
    socket.push_frame(4, &column_def_payload("c0", 0x06, 0)); // NULL column
    socket.push_frame(5, &column_def_payload("c1", 0x03, 0)); // LONG column

    let statement = block_on(conn.prepare("SELECT ?, ?")).unwrap();
    assert_eq!(statement.parameters(), 2);
    socket.clear_written();

    // COM_STMT_EXECUTE response: metadata, one binary row, terminator
    socket.push_frame(1, &[0x02]);
    socket.push_frame(2, &column_def_payload("c0", 0x06, 0));
    socket.push_frame(3, &column_def_payload("c1", 0x03, 0));
    socket.push_frame(4, &[0x00, 0x04, 0x07, 0x00, 0x00, 0x00]);
    socket.push_frame(5, &[0xfe, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]);

    let params = [MySqlValue::Null, MySqlValue::Int32(7)];
    let mut rows = block_on(conn.execute(&statement, &params)).unwrap();

    let row = block_on(rows.next()).unwrap().unwrap();
    assert_eq!(row.get(0).unwrap(), MySqlValue::Null);
    assert_eq!(row.get(1).unwrap(), MySqlValue::Int32(7));

    assert!(block_on(rows.next()).unwrap().is_none());
    drop(rows);

    let frames = socket.written_frames();
    assert_eq!(
        frames[0].1,
        &[
            0x17, // COM_STMT_EXECUTE
            0x01, 0x00, 0x00, 0x00, // statement 1
            0x00, // no cursor
            0x01, 0x00, 0x00, 0x00, // iteration count
            0x01, // NULL bitmap: first parameter
            0x01, // new params bound
            0x06, 0x00, // NULL
            0x03, 0x00, // LONG
            0x07, 0x00, 0x00, 0x00, // int32(7)
        ]
    );

    assert!(conn.stream.waiting.is_empty());
    assert_eq!(conn.stream.sequence_id, 0);
}

#[test]
fn local_infile_request_is_refused_safely() {
    let (mut conn, socket) = establish(modern_server_capabilities());

    socket.push_frame(1, b"\xfb/etc/passwd");
    socket.push_frame(3, &[0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]); // OK, 1 row

    let rows = block_on(conn.query("LOAD DATA LOCAL INFILE '/etc/passwd' INTO TABLE t")).unwrap();
    let result = block_on(rows.drain()).unwrap();

    assert_eq!(result.rows_affected(), 1);

    // the client answered the request with an empty packet
    let frames = socket.written_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1], (2, Vec::new()));
}

#[test]
fn dropped_stream_is_drained_before_the_next_command() {
    let (mut conn, socket) = establish(legacy_server_capabilities());

    socket.push_frame(1, &[0x01]);
    socket.push_frame(2, &column_def_payload("n", 0x08, 0));
    socket.push_frame(3, &[0xfe, 0x00, 0x00, 0x02, 0x00]);
    socket.push_frame(4, b"\x011");
    socket.push_frame(5, b"\x012");
    socket.push_frame(6, b"\x013");
    socket.push_frame(7, &[0xfe, 0x00, 0x00, 0x02, 0x00]);

    let mut rows = block_on(conn.query("SELECT n FROM seq")).unwrap();

    // take one row of three, then abandon the stream
    let row = block_on(rows.next()).unwrap().unwrap();
    assert_eq!(row.get(0).unwrap(), MySqlValue::Int64(1));
    drop(rows);

    // ping drains the leftover rows before issuing its own command
    socket.push_frame(1, OK_AUTOCOMMIT);
    block_on(conn.ping()).unwrap();
}

#[test]
fn sequence_mismatch_is_fatal() {
    let (mut conn, socket) = establish(modern_server_capabilities());

    // the response arrives with the wrong sequence number
    socket.push_frame(9, OK_AUTOCOMMIT);

    let err = block_on(conn.ping()).unwrap_err();
    assert!(matches!(err, Error::Framing(_)));

    // every later operation reports the poisoned connection
    let err = block_on(conn.ping()).unwrap_err();
    assert!(matches!(err, Error::Closed));
}

#[test]
fn statements_are_bound_to_their_connection() {
    let (mut conn_a, socket_a) = establish(modern_server_capabilities());
    let (mut conn_b, _socket_b) = establish(modern_server_capabilities());

    socket_a.push_frame(1, &[0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    let statement = block_on(conn_a.prepare("SELECT 1")).unwrap();

    let err = block_on(conn_b.execute(&statement, &[])).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

// 2048-bit key generated for these tests only
const TEST_RSA_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAo9Q1h7TyP3OsV1qXZemN
6ZwZxsCD1YmH1YFa+7z/JxeTB/PBdhLJp060ziYUma1AhigwKFJWTyBG9AKvc2p4
4ZT8heVKlDF+6dTTOoX9DKeRSc+PJq7CWr1ywQbXYo9nu78y9onR1JqkofP0Epft
QOq7UVt1E6ZOpYKW4JhDJ9jOriEeHbOa09W8MH5QdvEZ1l6x1+VLiF/SqlYlCLUa
QxwXRuSEISDGCDOB11nKDWE3FQLpPXNYNNHiNxoiYBZCRhinutxE9vjI/qLv/lsJ
aIlAvzhTO5JODYlxF+C9wLkKFu3fA18q1DVH7Wwp33SZX1lwk0XXWAk5oX7Bv00o
0wIDAQAB
-----END PUBLIC KEY-----
";
