// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! An output which moves the actual I/O off the logging call site. Records
//! are sent over a bounded queue to a dedicated worker thread which writes
//! them to the wrapped output in the order they were sent.
//!
//! `flush` blocks until every record sent before it has been written. It, or
//! dropping the output, must happen before shutdown or queued records are
//! lost. A full queue blocks the caller rather than dropping records.

use crate::*;

use crossbeam_channel::{Receiver, Sender};
use std::io::{Error, ErrorKind};
use std::thread::JoinHandle;

enum Message {
    Write(Vec<u8>),
    Flush(Sender<Result<(), Error>>),
    Close(Sender<Result<(), Error>>),
    Shutdown,
}

pub struct Queued {
    sender: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl Queued {
    /// Wrap an output, spawning the worker thread which drains the queue.
    pub fn new(name: &str, output: Box<dyn Output>, queue_depth: usize) -> Result<Self, Error> {
        let (sender, receiver) = crossbeam_channel::bounded(queue_depth.max(1));
        let worker = std::thread::Builder::new()
            .name(format!("log-{}", name))
            .spawn(move || drain(output, receiver))?;
        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    fn send(&self, message: Message) -> Result<(), Error> {
        self.sender
            .send(message)
            .map_err(|_| Error::new(ErrorKind::BrokenPipe, "log worker has stopped"))
    }

    fn request(&self, message: fn(Sender<Result<(), Error>>) -> Message) -> Result<(), Error> {
        let (ack, done) = crossbeam_channel::bounded(1);
        self.send(message(ack))?;
        done.recv()
            .map_err(|_| Error::new(ErrorKind::BrokenPipe, "log worker has stopped"))?
    }
}

fn drain(output: Box<dyn Output>, receiver: Receiver<Message>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Write(buffer) => {
                // nobody is waiting on this write, so stderr is the last resort
                if let Err(e) = output.write(&buffer) {
                    eprintln!("log write failed: {}", e);
                }
            }
            Message::Flush(ack) => {
                let _ = ack.send(output.flush());
            }
            Message::Close(ack) => {
                let _ = ack.send(output.close());
            }
            Message::Shutdown => break,
        }
    }
    if let Err(e) = output.close() {
        eprintln!("log close failed: {}", e);
    }
}

impl Output for Queued {
    fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.send(Message::Write(buf.to_vec()))?;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<(), Error> {
        self.request(Message::Flush)
    }

    fn close(&self) -> Result<(), Error> {
        self.request(Message::Close)
    }
}

impl Drop for Queued {
    fn drop(&mut self) {
        // the worker drains everything queued ahead of the shutdown message
        let _ = self.sender.send(Message::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct Memory {
        bytes: Arc<Mutex<Vec<u8>>>,
        flushes: Arc<Mutex<usize>>,
    }

    impl Output for Memory {
        fn write(&self, buf: &[u8]) -> Result<usize, Error> {
            self.bytes.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&self) -> Result<(), Error> {
            *self.flushes.lock() += 1;
            Ok(())
        }
    }

    #[test]
    fn flush_waits_for_queued_records() {
        let memory = Memory::default();
        let queued = Queued::new("test", Box::new(memory.clone()), 4).unwrap();

        let mut expected = String::new();
        for i in 0..100 {
            let line = format!("line {}\n", i);
            assert_eq!(queued.write(line.as_bytes()).unwrap(), line.len());
            expected.push_str(&line);
        }
        queued.flush().unwrap();

        assert_eq!(String::from_utf8(memory.bytes.lock().clone()).unwrap(), expected);
        assert_eq!(*memory.flushes.lock(), 1);
    }

    #[test]
    fn drop_drains_the_queue() {
        let memory = Memory::default();
        {
            let queued = Queued::new("test", Box::new(memory.clone()), 16).unwrap();
            queued.write(b"one\n").unwrap();
            queued.write(b"two\n").unwrap();
        }
        assert_eq!(&memory.bytes.lock()[..], b"one\ntwo\n");
    }

    #[test]
    fn empty_write_is_not_queued() {
        let memory = Memory::default();
        let queued = Queued::new("test", Box::new(memory.clone()), 1).unwrap();
        assert_eq!(queued.write(b"").unwrap(), 0);
        queued.flush().unwrap();
        assert!(memory.bytes.lock().is_empty());
    }
}
