use crate::{Framer, ESCAPE_BYTE, START_BYTE, STOP_BYTE};
use core_types::Frame;

/// Start/stop/escape delimited decoder.
///
/// Bytes are queued with [`DelimitedFramer::extend`] and drained one message
/// at a time with [`DelimitedFramer::decode`]. Decoder state survives across
/// calls, so a frame split over several transport reads resumes where it
/// stopped.
pub struct DelimitedFramer {
    /// Received bytes not yet scanned.
    pending: Vec<u8>,
    /// Unescaped body of the frame being recorded.
    accumulator: Vec<u8>,
    recording: bool,
    escaped: bool,
    just_saw_start: bool,
    /// Any tag byte `>= command_count` right after START invalidates the frame.
    command_count: u8,
}

impl DelimitedFramer {
    pub fn new(command_count: u8) -> Self {
        Self {
            pending: Vec::with_capacity(256),
            accumulator: Vec::with_capacity(64),
            recording: false,
            escaped: false,
            just_saw_start: false,
            command_count,
        }
    }

    /// Queue bytes read from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Scan queued bytes until one frame completes.
    ///
    /// Returns at most one frame; call repeatedly until `None` to drain.
    /// Scanned bytes are dropped from the queue whether or not they produced
    /// a frame.
    pub fn decode(&mut self) -> Option<Frame> {
        let mut consumed = 0;
        let mut completed = None;

        loop {
            let Some(byte) = self.pending.get(consumed).copied() else {
                break;
            };
            consumed += 1;
            if let Some(body) = self.step(byte) {
                completed = Some(Frame::new(body));
                break;
            }
        }

        self.pending.drain(..consumed);
        completed
    }

    /// Bytes queued but not yet scanned.
    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True between a START and its STOP.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn step(&mut self, byte: u8) -> Option<Vec<u8>> {
        if !self.recording {
            // Junk before a start byte is dropped for good.
            if byte == START_BYTE {
                self.recording = true;
                self.just_saw_start = true;
                self.accumulator.clear();
            }
            return None;
        }

        let after_start = std::mem::replace(&mut self.just_saw_start, false);

        if self.escaped {
            self.accumulator.push(byte);
            self.escaped = false;
        } else if byte == ESCAPE_BYTE {
            self.escaped = true;
        } else if byte == STOP_BYTE {
            self.recording = false;
            return Some(std::mem::take(&mut self.accumulator));
        } else if after_start && byte >= self.command_count {
            log::warn!(
                "Framing: unknown command byte {:#04x} after start byte, dropping frame",
                byte
            );
            self.recording = false;
            self.accumulator.clear();
        } else {
            self.accumulator.push(byte);
        }
        None
    }
}

impl Framer for DelimitedFramer {
    fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.extend(bytes);
        let mut frames = Vec::new();
        while let Some(frame) = self.decode() {
            frames.push(frame);
        }
        frames
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.accumulator.clear();
        self.recording = false;
        self.escaped = false;
        self.just_saw_start = false;
    }

    fn name(&self) -> &'static str {
        "Delimited"
    }
}
