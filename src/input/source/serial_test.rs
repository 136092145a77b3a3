use std::{
    collections::VecDeque,
    error::Error,
    io::{self, Read, Write},
    sync::atomic::Ordering,
};

use crate::{
    constants::MAX_LINE_LENGTH,
    input::source::serial::{SerialListener, LINE_TOO_LONG},
};

/// Port that replays scripted reads and records everything written
#[derive(Debug, Default)]
struct ScriptedPort {
    reads: VecDeque<io::Result<Vec<u8>>>,
    written: Vec<u8>,
}

impl ScriptedPort {
    fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
        Self {
            reads: reads.into(),
            written: Vec::new(),
        }
    }

    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None => Ok(0),
            Some(Err(e)) => Err(e),
            Some(Ok(data)) => {
                let count = data.len().min(buf.len());
                buf[..count].copy_from_slice(&data[..count]);
                if count < data.len() {
                    self.reads.push_front(Ok(data[count..].to_vec()));
                }
                Ok(count)
            }
        }
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_listen_frames_lines() -> Result<(), Box<dyn Error>> {
    let port = ScriptedPort::new(vec![
        Ok(b"MOVE 1".to_vec()),
        Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
        Ok(b"00 200\n  \nRELEASE\r\nCLI".to_vec()),
        Ok(b"CK left\n".to_vec()),
    ]);
    let mut listener = SerialListener::new(port);

    let mut received = Vec::new();
    listener.listen(|line| {
        received.push(line.to_string());
        "OK".to_string()
    })?;

    assert_eq!(received, vec!["MOVE 100 200", "RELEASE", "CLICK left"]);
    let port = listener.into_inner();
    assert_eq!(port.lines(), vec!["OK", "OK", "OK"]);
    assert!(port.written.ends_with(b"\n"));

    Ok(())
}

#[test]
fn test_listen_rejects_invalid_utf8() -> Result<(), Box<dyn Error>> {
    let port = ScriptedPort::new(vec![Ok(vec![0xff, 0xfe, b'\n']), Ok(b"RELEASE\n".to_vec())]);
    let mut listener = SerialListener::new(port);

    let mut count = 0;
    listener.listen(|_| {
        count += 1;
        "OK".to_string()
    })?;

    assert_eq!(count, 1);
    assert_eq!(
        listener.into_inner().lines(),
        vec!["ERROR Invalid encoding", "OK"]
    );

    Ok(())
}

#[test]
fn test_listen_stops_on_request() -> Result<(), Box<dyn Error>> {
    let port = ScriptedPort::new(vec![Ok(b"RELEASE\nRELEASE\nRELEASE\n".to_vec())]);
    let mut listener = SerialListener::new(port);
    let running = listener.stop_handle();

    let mut count = 0;
    listener.listen(|_| {
        count += 1;
        running.store(false, Ordering::SeqCst);
        "OK".to_string()
    })?;

    // Remaining buffered lines are not handled once stopped
    assert_eq!(count, 1);
    assert_eq!(listener.into_inner().lines(), vec!["OK"]);

    Ok(())
}

#[test]
fn test_listen_discards_overlong_lines() -> Result<(), Box<dyn Error>> {
    let mut flood = vec![b'A'; 4000];
    flood.extend_from_slice(b"\nRELEASE\n");
    let longest = vec![b'B'; MAX_LINE_LENGTH];
    let port = ScriptedPort::new(vec![
        Ok(flood),
        Ok(longest),
        Ok(b"\n".to_vec()),
    ]);
    let mut listener = SerialListener::new(port);

    let mut received = Vec::new();
    listener.listen(|line| {
        received.push(line.len());
        "OK".to_string()
    })?;

    // A line at the limit is still accepted
    assert_eq!(received, vec!["RELEASE".len(), MAX_LINE_LENGTH]);
    assert_eq!(
        listener.into_inner().lines(),
        vec![format!("ERROR {LINE_TOO_LONG}"), "OK".into(), "OK".into()]
    );

    Ok(())
}
