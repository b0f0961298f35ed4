//! Terminal event source — crossterm stream plus a coarse UI tick.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;

/// Events the app loop consumes.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal gained/lost focus — drives poll visibility.
    Focus(bool),
    Resize,
    /// Coarse timer for toast expiry and stale re-evaluation.
    Tick,
}

/// Merges the crossterm event stream with a repeating UI tick.
pub struct EventReader {
    stream: EventStream,
    tick: tokio::time::Interval,
}

impl EventReader {
    pub fn new(tick: Duration) -> Self {
        Self {
            stream: EventStream::new(),
            tick: tokio::time::interval(tick),
        }
    }

    /// Next event, `None` once the terminal stream closes.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            tokio::select! {
                _ = self.tick.tick() => return Some(Event::Tick),
                maybe = self.stream.next() => {
                    match maybe? {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            return Some(Event::Key(key));
                        }
                        Ok(CrosstermEvent::Mouse(mouse)) => return Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::FocusGained) => return Some(Event::Focus(true)),
                        Ok(CrosstermEvent::FocusLost) => return Some(Event::Focus(false)),
                        Ok(CrosstermEvent::Resize(..)) => return Some(Event::Resize),
                        Ok(_) => {} // key releases, paste, …
                        Err(_) => return None,
                    }
                }
            }
        }
    }
}
