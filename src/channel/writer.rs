//! Dedicated writer thread for the interpreter's stdin.
//!
//! Every payload goes through one FIFO and one thread, so the interpreter
//! receives commands in call order even when a caller stopped waiting before
//! its command was written. A write that blocks on a busy interpreter only
//! delays later writes; it never lets them overtake.

use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::collector::Completion;

pub(crate) enum WriteRequest {
    /// Text to write; a failed write is reported on `done` when present.
    Payload {
        text: String,
        done: Option<SyncSender<Completion>>,
    },
    Shutdown,
}

pub(crate) struct StdinWriter {
    request_tx: Sender<WriteRequest>,
    worker_handle: Option<thread::JoinHandle<()>>,
}

impl StdinWriter {
    pub fn spawn<W>(stdin: W) -> std::io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel();
        let worker_handle = thread::Builder::new()
            .name("octave-stdin".to_string())
            .spawn(move || writer_loop(stdin, request_rx))?;

        Ok(Self {
            request_tx,
            worker_handle: Some(worker_handle),
        })
    }

    /// Queue `text` behind every earlier payload.
    pub fn send(&self, text: String, done: Option<SyncSender<Completion>>) -> std::io::Result<()> {
        self.request_tx
            .send(WriteRequest::Payload { text, done })
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Octave stdin writer stopped")
            })
    }
}

impl Drop for StdinWriter {
    fn drop(&mut self) {
        // Queued behind any pending payloads, so those are still written.
        let _ = self.request_tx.send(WriteRequest::Shutdown);

        let Some(handle) = self.worker_handle.take() else {
            return;
        };
        for _ in 0..10 {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    warn!("stdin writer panicked: {:?}", e);
                }
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        debug!("Detaching stdin writer (blocked on the interpreter)");
    }
}

fn writer_loop<W: Write>(mut stdin: W, request_rx: Receiver<WriteRequest>) {
    while let Ok(request) = request_rx.recv() {
        let (text, done) = match request {
            WriteRequest::Shutdown => break,
            WriteRequest::Payload { text, done } => (text, done),
        };

        if let Err(e) = stdin.write_all(text.as_bytes()).and_then(|_| stdin.flush()) {
            match done {
                Some(done) => {
                    let _ = done.try_send(Completion::WriteFailed(e));
                }
                None => debug!("Failed to write to Octave: {}", e),
            }
        }
    }
    debug!("stdin writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_payloads_written_in_call_order() {
        let buffer = SharedBuffer::default();
        let writer = StdinWriter::spawn(buffer.clone()).unwrap();

        let expected: String = (0..200).map(|i| format!("a = {};\n", i)).collect();
        for i in 0..200 {
            writer.send(format!("a = {};\n", i), None).unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        while buffer.text().len() < expected.len() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(buffer.text(), expected);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let writer = StdinWriter::spawn(ClosedPipe).unwrap();
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        writer.send("x\n".to_string(), Some(done_tx)).unwrap();

        match done_rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Completion::WriteFailed(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("Expected WriteFailed, got: {:?}", other),
        }

        // Fire-and-forget writes only log.
        writer.send("exit\n".to_string(), None).unwrap();
    }

    #[test]
    fn test_drop_flushes_queue_and_stops() {
        let buffer = SharedBuffer::default();
        let writer = StdinWriter::spawn(buffer.clone()).unwrap();
        writer.send("exit\n".to_string(), None).unwrap();
        drop(writer);

        let deadline = Instant::now() + Duration::from_secs(1);
        while buffer.text().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(buffer.text(), "exit\n");
    }
}
