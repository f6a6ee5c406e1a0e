use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use splitlink_frame::{FrameError, Pending, Record, RecordReader};
use splitlink_transport::ByteSource;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Everything the reader thread hands to the consumer, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A decoded record or framing error.
    Record(Record),
    /// A read failed. The thread keeps polling unless the peer closed the
    /// link, in which case this is the last event before the channel
    /// disconnects.
    ReadError(String),
}

/// Pacing for the reader loop.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub idle_backoff: Duration,
    pub error_backoff: Duration,
}

/// Handle to the background reader thread.
///
/// The thread owns the [`RecordReader`] and with it all demultiplexer
/// state. The only state shared with the handle is the `running` flag.
pub struct Worker {
    running: Arc<AtomicBool>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start polling `reader`, sending every event to `events`.
    pub fn spawn<S>(
        reader: RecordReader<S>,
        events: Sender<LinkEvent>,
        pacing: Pacing,
    ) -> Result<Self>
    where
        S: ByteSource + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("splitlink-reader".to_string())
            .spawn(move || {
                read_loop(reader, &flag, &events, pacing);
                let _ = done_tx.send(());
            })
            .map_err(SessionError::Spawn)?;

        Ok(Self {
            running,
            done: done_rx,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the thread to stop and wait up to `timeout` for it to exit.
    ///
    /// Returns `false` if the thread was still inside a read when the timeout
    /// expired; it is then detached and exits on its own after that read.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return true;
        };

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("reader thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "reader thread did not stop in time; detaching");
                false
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

fn read_loop<S: ByteSource>(
    mut reader: RecordReader<S>,
    running: &AtomicBool,
    events: &Sender<LinkEvent>,
    pacing: Pacing,
) {
    let mut records = Vec::new();

    while running.load(Ordering::Acquire) {
        match reader.poll(&mut records) {
            Ok(0) => thread::sleep(pacing.idle_backoff),
            Ok(_) => {
                for record in records.drain(..) {
                    if events.send(LinkEvent::Record(record)).is_err() {
                        debug!("event receiver dropped; stopping reader");
                        running.store(false, Ordering::Release);
                        break;
                    }
                }
            }
            Err(err @ FrameError::LinkClosed) => {
                if running.load(Ordering::Acquire) {
                    warn!(error = %err, "link closed; stopping reader");
                    let _ = events.send(LinkEvent::ReadError(err.to_string()));
                }
                running.store(false, Ordering::Release);
            }
            Err(err) => {
                if running.load(Ordering::Acquire) {
                    warn!(error = %err, "link read failed");
                    let _ = events.send(LinkEvent::ReadError(err.to_string()));
                }
                thread::sleep(pacing.error_backoff);
            }
        }
    }

    let dropped = reader.discard_partial();
    if dropped != Pending::default() {
        debug!(
            frame_bytes = dropped.frame,
            chunk_bytes = dropped.chunk,
            "discarded partial records on shutdown"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use splitlink_frame::DecodedText;

    use super::*;

    const PACING: Pacing = Pacing {
        idle_backoff: Duration::from_millis(1),
        error_backoff: Duration::from_millis(1),
    };

    /// Shared byte queue standing in for a serial port.
    #[derive(Clone, Default)]
    struct QueueSource {
        queue: Arc<Mutex<Vec<io::Result<Vec<u8>>>>>,
    }

    impl QueueSource {
        fn push(&self, item: io::Result<Vec<u8>>) {
            self.queue.lock().unwrap().push(item);
        }
    }

    impl ByteSource for QueueSource {
        fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                return Ok(0);
            }
            match queue.remove(0) {
                Err(err) => Err(err),
                Ok(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
            }
        }
    }

    fn text(record: &LinkEvent) -> Option<&str> {
        match record {
            LinkEvent::Record(record) => record.text(),
            LinkEvent::ReadError(_) => None,
        }
    }

    #[test]
    fn events_arrive_in_emission_order() {
        let source = QueueSource::default();
        source.push(Ok(b"\x01A\x04xy\r".to_vec()));
        source.push(Ok(b"\n\x01B\x04\x04".to_vec()));

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = Worker::spawn(RecordReader::new(source), tx, PACING).unwrap();

        let received: Vec<_> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert!(worker.stop(Duration::from_secs(1)));

        assert_eq!(text(&received[0]), Some("A"));
        assert_eq!(text(&received[1]), Some("xy\r\n"));
        assert_eq!(text(&received[2]), Some("B"));
        assert_eq!(received[3], LinkEvent::Record(Record::FramingError));
    }

    #[test]
    fn read_errors_are_reported_and_polling_continues() {
        let source = QueueSource::default();
        source.push(Err(io::Error::other("usb hiccup")));
        source.push(Ok(b"\x01[info] back\x04".to_vec()));

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = Worker::spawn(RecordReader::new(source), tx, PACING).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(worker.stop(Duration::from_secs(1)));

        assert!(matches!(first, LinkEvent::ReadError(msg) if msg.contains("usb hiccup")));
        assert_eq!(
            second,
            LinkEvent::Record(Record::Frame(DecodedText {
                text: "[info] back".to_string(),
                replaced: 0,
            }))
        );
    }

    #[test]
    fn peer_hang_up_is_reported_once_and_ends_the_thread() {
        let source = QueueSource::default();
        source.push(Ok(b"\x01[info] bye\x04".to_vec()));
        source.push(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")));

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = Worker::spawn(RecordReader::new(source), tx, PACING).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(text(&first), Some("[info] bye"));
        assert_eq!(
            second,
            LinkEvent::ReadError("link closed by peer".to_string())
        );
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Err(RecvTimeoutError::Disconnected)
        ));
        assert!(!worker.is_running());
        assert!(worker.stop(Duration::from_secs(1)));
    }

    #[test]
    fn stop_discards_open_frame_silently() {
        let source = QueueSource::default();
        source.push(Ok(b"\x01[error] never fini".to_vec()));

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = Worker::spawn(RecordReader::new(source.clone()), tx, PACING).unwrap();

        // wait for the bytes to be consumed
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !source.queue.lock().unwrap().is_empty() {
            assert!(std::time::Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
        assert!(worker.stop(Duration::from_secs(1)));
        assert!(!worker.is_running());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_stops_the_thread() {
        let source = QueueSource::default();
        source.push(Ok(b"\x01a\x04".to_vec()));

        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut worker = Worker::spawn(RecordReader::new(source), tx, PACING).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while worker.is_running() {
            assert!(std::time::Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
        assert!(worker.stop(Duration::from_secs(1)));
    }

    #[test]
    fn stop_is_idempotent() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut worker =
            Worker::spawn(RecordReader::new(QueueSource::default()), tx, PACING).unwrap();
        assert!(worker.stop(Duration::from_secs(1)));
        assert!(worker.stop(Duration::from_secs(1)));
    }
}
