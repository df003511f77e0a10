use std::{
    net::TcpListener,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use minipar::{
    error::{Error, RuntimeError},
    interpreter::evaluator::core::Output,
    run_program, run_program_with_output,
};

/// Reserves a port that is free at probe time.
fn free_port() -> u16 {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind probe listener")
                                       .local_addr()
                                       .expect("probe local addr")
                                       .port()
}

fn run_capture_result(src: &str) -> Result<String, Error> {
    let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
    let out: Output = sink.clone();
    run_program_with_output(src, out)?;
    let bytes = sink.lock().unwrap().clone();
    Ok(String::from_utf8(bytes).expect("program output is UTF-8"))
}

/// Runs the client script until the server is accepting connections.
fn run_client_with_retry(src: &str) -> String {
    let mut last = None;
    for _ in 0..100 {
        match run_capture_result(src) {
            Ok(out) => return out,
            Err(e) => last = Some(e),
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("client never reached the server: {last:?}");
}

#[test]
fn channel_echo_round_trip() {
    let port = free_port();

    let server_src = format!(
        "s_channel s {{ \"127.0.0.1\", {port} }}\n\
         c = accept(s)\n\
         msg = recv(c)\n\
         send(c, msg)\n\
         close(c)\n\
         close(s)"
    );
    let server = thread::spawn(move || run_program(&server_src));

    let client_src = format!(
        "c_channel cc {{ \"127.0.0.1\", {port} }}\n\
         send(cc, \"hi\")\n\
         print(recv(cc))\n\
         close(cc)"
    );
    assert_eq!(run_client_with_retry(&client_src), "hi\n");

    server.join().expect("server thread panicked").expect("server script failed");
}

#[test]
fn channel_payloads_round_trip_verbatim() {
    let port = free_port();

    let server_src = format!(
        "s_channel s {{ \"127.0.0.1\", {port} }}\n\
         c = accept(s)\n\
         first = recv(c)\n\
         second = recv(c)\n\
         send(c, second + first)\n\
         close(c)\n\
         close(s)"
    );
    let server = thread::spawn(move || run_program(&server_src));

    let client_src = format!(
        "c_channel cc {{ \"127.0.0.1\", {port} }}\n\
         send(cc, \"ab c\")\n\
         send(cc, \"\")\n\
         print(length(recv(cc)))\n\
         close(cc)"
    );
    // "" + "ab c" comes back as "ab c": empty payloads frame correctly.
    assert_eq!(run_client_with_retry(&client_src), "4\n");

    server.join().expect("server thread panicked").expect("server script failed");
}

#[test]
fn send_after_close_is_an_error() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();
    let accepter = thread::spawn(move || listener.accept().map(|(stream, _)| stream));

    // close is idempotent, but send on a closed channel must fail.
    let src = format!(
        "c_channel cc {{ \"127.0.0.1\", {port} }}\n\
         close(cc)\n\
         close(cc)\n\
         send(cc, \"x\")"
    );
    match run_program(&src) {
        Err(Error::Runtime(RuntimeError::ChannelClosed { .. })) => {},
        other => panic!("expected a channel-closed error, got {other:?}"),
    }

    drop(accepter.join().expect("accept thread panicked"));
}

#[test]
fn recv_at_end_of_stream_yields_empty_string() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();
    let accepter = thread::spawn(move || {
        // Accept and immediately drop the connection.
        drop(listener.accept().map(|(stream, _)| stream));
    });

    let src = format!(
        "c_channel cc {{ \"127.0.0.1\", {port} }}\n\
         print(length(recv(cc)))\n\
         close(cc)"
    );
    let out = run_capture_result(&src).expect("client script failed");
    assert_eq!(out, "0\n");

    accepter.join().expect("accept thread panicked");
}

#[test]
fn channel_type_errors_are_parse_errors() {
    // recv on a server channel is rejected before anything runs.
    let src = "s_channel s { \"127.0.0.1\", 6000 }\nmsg = recv(s)";
    assert!(matches!(run_program(src),
                     Err(Error::Parse(minipar::error::ParseError::TypeMismatch { .. }))));

    // Port must be a number.
    let src = "c_channel cc { \"127.0.0.1\", \"80\" }";
    assert!(matches!(run_program(src),
                     Err(Error::Parse(minipar::error::ParseError::TypeMismatch { .. }))));
}
