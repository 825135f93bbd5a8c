//! Cursor-following drag for the frameless main window.
//!
//! A [`DragSession`] owns the repositioning task. Ending the session, or
//! dropping it, aborts the task.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tauri::async_runtime::{self, JoinHandle};
use tauri::{PhysicalPosition, Position, Runtime, WebviewWindow};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Roughly one frame at 60 Hz.
pub const DRAG_TICK: Duration = Duration::from_millis(16);

/// What a drag needs from the platform: where the cursor is and how to move the window.
pub trait DragTarget: Send + Sync + 'static {
    fn cursor(&self) -> Option<(i32, i32)>;
    fn origin(&self) -> Option<(i32, i32)>;
    fn move_to(&self, x: i32, y: i32);
}

pub struct DragSession {
    offset: (i32, i32),
    last: Arc<Mutex<Option<(i32, i32)>>>,
    task: JoinHandle<()>,
}

impl DragSession {
    /// Record the cursor offset into the window and start following the cursor.
    ///
    /// Returns `None` when the window or cursor position cannot be read.
    pub fn start<T: DragTarget>(target: T) -> Option<Self> {
        let (wx, wy) = target.origin()?;
        let (cx, cy) = target.cursor()?;
        let offset = (cx - wx, cy - wy);
        let last = Arc::new(Mutex::new(None));

        let task_last = Arc::clone(&last);
        let task = async_runtime::spawn(async move {
            let mut ticker = tokio::time::interval(DRAG_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some((cx, cy)) = target.cursor() else {
                    continue;
                };
                let next = (cx - offset.0, cy - offset.1);
                let mut last = task_last.lock().unwrap_or_else(PoisonError::into_inner);
                if *last != Some(next) {
                    trace!(x = next.0, y = next.1, "Drag move");
                    target.move_to(next.0, next.1);
                    *last = Some(next);
                }
            }
        });

        debug!(dx = offset.0, dy = offset.1, "Drag session started");
        Some(Self { offset, last, task })
    }

    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Stop following the cursor. Returns the last position the window was moved to.
    pub fn finish(self) -> Option<(i32, i32)> {
        self.task.abort();
        let last = *self.last.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(?last, "Drag session finished");
        last
    }
}

impl Drop for DragSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drag target backed by a live webview window.
pub struct WindowDrag<R: Runtime>(pub WebviewWindow<R>);

impl<R: Runtime> DragTarget for WindowDrag<R> {
    fn cursor(&self) -> Option<(i32, i32)> {
        let point = self.0.cursor_position().ok()?;
        Some((point.x.round() as i32, point.y.round() as i32))
    }

    fn origin(&self) -> Option<(i32, i32)> {
        let position = self.0.outer_position().ok()?;
        Some((position.x, position.y))
    }

    fn move_to(&self, x: i32, y: i32) {
        let _ = self
            .0
            .set_position(Position::Physical(PhysicalPosition { x, y }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[derive(Clone, Default)]
    struct FakeTarget {
        cursor: Arc<Mutex<(i32, i32)>>,
        window: Arc<Mutex<(i32, i32)>>,
        moves: Arc<Mutex<usize>>,
    }

    impl DragTarget for FakeTarget {
        fn cursor(&self) -> Option<(i32, i32)> {
            Some(*self.cursor.lock().unwrap())
        }

        fn origin(&self) -> Option<(i32, i32)> {
            Some(*self.window.lock().unwrap())
        }

        fn move_to(&self, x: i32, y: i32) {
            *self.window.lock().unwrap() = (x, y);
            *self.moves.lock().unwrap() += 1;
        }
    }

    struct Detached;

    impl DragTarget for Detached {
        fn cursor(&self) -> Option<(i32, i32)> {
            Some((0, 0))
        }

        fn origin(&self) -> Option<(i32, i32)> {
            None
        }

        fn move_to(&self, _x: i32, _y: i32) {
            panic!("detached window must not move");
        }
    }

    fn settle() {
        sleep(DRAG_TICK * 8);
    }

    #[test]
    fn window_follows_cursor_keeping_offset() {
        let target = FakeTarget::default();
        *target.window.lock().unwrap() = (100, 200);
        *target.cursor.lock().unwrap() = (130, 210);

        let session = DragSession::start(target.clone()).expect("session");
        assert_eq!(session.offset(), (30, 10));

        *target.cursor.lock().unwrap() = (500, 400);
        settle();
        assert_eq!(*target.window.lock().unwrap(), (470, 390));

        assert_eq!(session.finish(), Some((470, 390)));
    }

    #[test]
    fn finished_session_stops_moving() {
        let target = FakeTarget::default();
        let session = DragSession::start(target.clone()).expect("session");
        *target.cursor.lock().unwrap() = (10, 10);
        settle();
        session.finish();

        let moves = *target.moves.lock().unwrap();
        *target.cursor.lock().unwrap() = (900, 900);
        settle();
        assert_eq!(*target.moves.lock().unwrap(), moves);
        assert_eq!(*target.window.lock().unwrap(), (10, 10));
    }

    #[test]
    fn dropping_session_cancels_timer() {
        let target = FakeTarget::default();
        let session = DragSession::start(target.clone()).expect("session");
        drop(session);

        settle();
        *target.cursor.lock().unwrap() = (50, 60);
        settle();
        assert_eq!(*target.window.lock().unwrap(), (0, 0));
    }

    #[test]
    fn missing_window_starts_nothing() {
        assert!(DragSession::start(Detached).is_none());
    }
}
