use std::io::{self, Write};

use tracing::Level;

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    Console(ConsoleWriter),
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new() -> Self {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        {
            DelegatingWriter {
                inner: DelegatingInner::Console(ConsoleWriter::default()),
            }
        }
        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        {
            DelegatingWriter {
                inner: DelegatingInner::Stderr(io::stderr()),
            }
        }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            #[cfg(all(feature = "web", target_arch = "wasm32"))]
            DelegatingInner::Console(w) => w.write(buf),
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            #[cfg(all(feature = "web", target_arch = "wasm32"))]
            DelegatingInner::Console(w) => w.flush(),
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

/// Buffers one formatted event and hands it to `console.log` as a single
/// line when flushed or dropped.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&line.trim_end().into());
        self.buf.clear();
        Ok(())
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize a tracing subscriber that writes to the browser console under
/// the `web` feature on wasm32, and to stderr everywhere else. Safe to call
/// multiple times; subsequent calls are no-ops for the global subscriber.
pub fn init_default(level: Level) {
    // No wall clock on wasm32, and the console renders escape codes verbatim.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(false)
        .without_time()
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_default(Level::DEBUG);
        init_default(Level::TRACE);
        tracing::debug!("subscriber installed");
    }
}
