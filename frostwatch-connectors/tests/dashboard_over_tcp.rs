//! Dashboard served from a file log over a real TCP socket

use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use frostwatch_connectors::http::{HttpConfig, TcpRequestListener};
use frostwatch_core::history::{HistoricalReader, HistoryQuery};
use frostwatch_core::service::{serve_one, RESPONSE_HEAD};
use frostwatch_core::store::{FileLogStore, LogAppender, LogStore};
use frostwatch_core::time::{MockTimeSource, MockWallClock};

#[test]
fn browser_receives_logged_series() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileLogStore::new(dir.path().join("data_log.txt"));
    store.mount().unwrap();
    let mut appender = store.open_append().unwrap();
    for minute in 0..6 {
        appender
            .append_line(&format!("2024-01-15 08:{:02}:00,-4.{},61.0,0.10,-67", minute, minute))
            .unwrap();
    }
    appender.close().unwrap();

    let mut listener = TcpRequestListener::bind(HttpConfig::new("127.0.0.1:0").read_timeout_ms(200)).unwrap();
    let addr = listener.local_addr().unwrap();

    let client = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"GET / HTTP/1.1\r\nHost: freezer\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    });

    let reader = HistoricalReader::new(HistoryQuery::default().with_skip_interval(2));
    let wall = MockWallClock::unsynced(MockTimeSource::new(0));

    let mut served = None;
    for _ in 0..400 {
        served = serve_one(&mut listener, &store, &reader, &wall).unwrap();
        if served.is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    let served = served.expect("peer never accepted");
    assert_eq!(served.series_lines, 3);

    let response = client.join().unwrap();
    assert!(response.starts_with(RESPONSE_HEAD));
    assert!(response.contains(
        "2024-01-15 08:00:00,-4.0,61.0,0.10,-67\\n2024-01-15 08:02:00,-4.2,61.0,0.10,-67\\n2024-01-15 08:04:00,-4.4,61.0,0.10,-67`"
    ));
    assert!(response.contains("Last Updated: Time Error!"));
    assert_eq!(listener.stats().connections_accepted, 1);
}

#[test]
fn idle_listener_serves_nothing() {
    let mut listener = TcpRequestListener::bind(HttpConfig::new("127.0.0.1:0")).unwrap();
    let store = FileLogStore::new(tempfile::tempdir().unwrap().path().join("data_log.txt"));
    let reader = HistoricalReader::default();
    let wall = MockWallClock::unsynced(MockTimeSource::new(0));

    assert!(serve_one(&mut listener, &store, &reader, &wall).unwrap().is_none());
}
