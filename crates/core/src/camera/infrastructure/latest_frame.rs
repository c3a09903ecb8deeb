use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::shared::frame::Frame;

/// Pulls one decoded frame. `Ok(None)` means the input has ended.
pub(crate) type FrameProducer = Box<dyn FnMut() -> Result<Option<Frame>, String> + Send>;

/// Decodes on a background thread and keeps only the newest frame, so a
/// snapshot shows the scene as it is now rather than whatever the device
/// queued seconds ago.
pub(crate) struct LatestFrameReader {
    latest: Receiver<Frame>,
    last: Option<Frame>,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LatestFrameReader {
    /// `pace` throttles producers that would otherwise run faster than real
    /// time, such as video files.
    pub(crate) fn spawn(name: &str, mut produce: FrameProducer, pace: Option<Duration>) -> Self {
        let (tx, rx) = crossbeam_channel::bounded::<Frame>(1);
        let drain = rx.clone();
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();
        let name = name.to_string();

        let handle = std::thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                match produce() {
                    Ok(Some(frame)) => {
                        // Only this thread sends, so the slot is free after draining
                        let _ = drain.try_recv();
                        if tx.try_send(frame).is_err() {
                            break;
                        }
                        if let Some(pace) = pace {
                            std::thread::sleep(pace);
                        }
                    }
                    Ok(None) => {
                        log::debug!("{name}: end of input");
                        break;
                    }
                    Err(e) => {
                        log::warn!("{name}: decoding stopped: {e}");
                        break;
                    }
                }
            }
        });

        Self {
            latest: rx,
            last: None,
            stopped,
            handle: Some(handle),
        }
    }

    /// The newest decoded frame. Waits up to `timeout` for the first one;
    /// after the input ends the final frame keeps being returned.
    pub(crate) fn latest(&mut self, timeout: Duration) -> Result<Frame, Box<dyn std::error::Error>> {
        if self.handle.is_none() {
            return Err("camera stream stopped".into());
        }
        while let Ok(frame) = self.latest.try_recv() {
            self.last = Some(frame);
        }
        if let Some(frame) = &self.last {
            return Ok(frame.clone());
        }
        match self.latest.recv_timeout(timeout) {
            Ok(frame) => {
                self.last = Some(frame.clone());
                Ok(frame)
            }
            Err(RecvTimeoutError::Timeout) => Err("camera produced no frame in time".into()),
            Err(RecvTimeoutError::Disconnected) => Err("camera produced no frames".into()),
        }
    }

    /// Stops and joins the decoding thread. Returns whether it was running.
    pub(crate) fn stop(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        self.stopped.store(true, Ordering::Relaxed);
        while self.latest.try_recv().is_ok() {}
        if handle.join().is_err() {
            log::warn!("Camera decoding thread panicked");
        }
        self.last = None;
        true
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for LatestFrameReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const WAIT: Duration = Duration::from_secs(2);

    fn numbered(index: usize) -> Frame {
        Frame::new(vec![index as u8; 3], 1, 1, 3, index)
    }

    /// Yields `count` frames, then reports the end of input on `done`.
    fn finite_producer(count: usize, done: crossbeam_channel::Sender<()>) -> FrameProducer {
        let mut next = 0;
        Box::new(move || {
            if next == count {
                let _ = done.send(());
                return Ok(None);
            }
            next += 1;
            Ok(Some(numbered(next - 1)))
        })
    }

    #[test]
    fn test_snapshot_skips_queued_frames_for_the_newest() {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let mut reader = LatestFrameReader::spawn("test", finite_producer(50, done_tx), None);

        done_rx.recv_timeout(WAIT).unwrap();
        let frame = reader.latest(WAIT).unwrap();
        assert_eq!(frame.index(), 49);
    }

    #[test]
    fn test_final_frame_repeats_after_input_ends() {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let mut reader = LatestFrameReader::spawn("test", finite_producer(3, done_tx), None);

        done_rx.recv_timeout(WAIT).unwrap();
        assert_eq!(reader.latest(WAIT).unwrap().index(), 2);
        assert_eq!(reader.latest(WAIT).unwrap().index(), 2);
    }

    #[test]
    fn test_later_snapshot_sees_newer_frame() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = produced.clone();
        let producer: FrameProducer = Box::new(move || {
            let i = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(numbered(i)))
        });
        let mut reader =
            LatestFrameReader::spawn("test", producer, Some(Duration::from_millis(1)));

        let first = reader.latest(WAIT).unwrap().index();
        let target = produced.load(Ordering::SeqCst) + 5;
        while produced.load(Ordering::SeqCst) < target {
            std::thread::sleep(Duration::from_millis(1));
        }
        let later = reader.latest(WAIT).unwrap().index();
        assert!(later > first, "later {later} should be newer than {first}");
        assert!(reader.stop());
    }

    #[test]
    fn test_producer_error_without_frames_is_reported() {
        let producer: FrameProducer = Box::new(|| Err("device unplugged".to_string()));
        let mut reader = LatestFrameReader::spawn("test", producer, None);
        assert!(reader.latest(WAIT).is_err());
    }

    #[test]
    fn test_stop_joins_once_and_rejects_snapshots() {
        let producer: FrameProducer = Box::new(|| Ok(Some(numbered(0))));
        let mut reader =
            LatestFrameReader::spawn("test", producer, Some(Duration::from_millis(1)));
        assert!(reader.is_running());

        assert!(reader.stop());
        assert!(!reader.stop());
        assert!(!reader.is_running());
        assert!(reader.latest(WAIT).is_err());
    }
}
