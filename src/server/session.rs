use std::collections::VecDeque;

/// Per-connection state: the read buffer accumulating partial lines, the
/// FIFO of already-encoded replies waiting to be flushed, and how much of
/// the queue's head has already been written (for partial `send`s).
#[derive(Debug)]
pub struct Session {
    pub peer_addr: String,
    read_buf: Vec<u8>,
    reply_queue: VecDeque<Vec<u8>>,
    sent_offset: usize,
    pub closing: bool,
}

impl Session {
    pub fn new(peer_addr: String) -> Session {
        Session {
            peer_addr,
            read_buf: Vec::new(),
            reply_queue: VecDeque::new(),
            sent_offset: 0,
            closing: false,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.read_buf.extend_from_slice(bytes);
    }

    /// Drains every complete `\n`-terminated line currently buffered,
    /// stripping an optional trailing `\r`. Any trailing partial line is
    /// left in the buffer for the next read.
    pub fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.read_buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.read_buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    pub fn enqueue_reply(&mut self, bytes: Vec<u8>) {
        self.reply_queue.push_back(bytes);
    }

    pub fn has_pending_replies(&self) -> bool {
        !self.reply_queue.is_empty()
    }

    /// The unsent tail of the head reply, or `None` if the queue is empty.
    pub fn pending_head(&self) -> Option<&[u8]> {
        self.reply_queue.front().map(|head| &head[self.sent_offset..])
    }

    /// Records that `n` more bytes of the head reply were written,
    /// dequeuing it once fully sent.
    pub fn advance_sent(&mut self, n: usize) {
        self.sent_offset += n;
        let fully_sent = self.reply_queue.front().is_some_and(|head| self.sent_offset >= head.len());
        if fully_sent {
            self.reply_queue.pop_front();
            self.sent_offset = 0;
        }
    }
}
