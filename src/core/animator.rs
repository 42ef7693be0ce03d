//! Typing animation over an already received answer.
//!
//! The animator reveals the answer one grapheme cluster per tick into a
//! `watch` channel. Starting a new animation supersedes the running one:
//! every write is checked against a generation counter while the channel
//! lock is held, so a superseded task can never write after `start` returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(5);
/// `tokio::time::interval` rejects a zero period.
pub const MIN_TYPING_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingFrame {
    pub text: String,
    pub done: bool,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    full_text: String,
}

pub struct TypingAnimator {
    interval: Duration,
    tx: watch::Sender<TypingFrame>,
    generation: Arc<AtomicU64>,
    running: Option<Running>,
}

impl Default for TypingAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_INTERVAL)
    }
}

impl TypingAnimator {
    pub fn new(interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(TypingFrame::default());
        Self {
            interval: interval.max(MIN_TYPING_INTERVAL),
            tx,
            generation: Arc::new(AtomicU64::new(0)),
            running: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TypingFrame> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> TypingFrame {
        self.tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Starts revealing `text`, cancelling any animation in progress.
    pub fn start(&mut self, text: impl Into<String>) {
        self.stop_task();
        let text = text.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(TypingFrame {
            text: String::new(),
            done: text.is_empty(),
        });

        let cancel = CancellationToken::new();
        let task = RevealTask {
            text: text.clone(),
            interval: self.interval,
            tx: self.tx.clone(),
            generation: self.generation.clone(),
            own_generation: generation,
            cancel: cancel.clone(),
        };
        debug!(generation, chars = text.len(), "typing animation started");
        self.running = Some(Running {
            cancel,
            handle: tokio::spawn(task.run()),
            full_text: text,
        });
    }

    /// Stops the animation, leaving the text revealed so far.
    pub fn cancel(&mut self) {
        self.stop_task();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Stops the animation and shows the whole text at once.
    pub fn finish(&mut self) {
        let full_text = self.running.as_ref().map(|r| r.full_text.clone());
        self.cancel();
        if let Some(text) = full_text {
            self.tx.send_replace(TypingFrame { text, done: true });
        }
    }

    fn stop_task(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }
}

impl Drop for TypingAnimator {
    fn drop(&mut self) {
        self.stop_task();
    }
}

struct RevealTask {
    text: String,
    interval: Duration,
    tx: watch::Sender<TypingFrame>,
    generation: Arc<AtomicU64>,
    own_generation: u64,
    cancel: CancellationToken,
}

impl RevealTask {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        for grapheme in self.text.graphemes(true) {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }
            if !self.write(|frame| frame.text.push_str(grapheme)) {
                return;
            }
        }
        self.write(|frame| frame.done = true);
    }

    /// Applies `update` unless this task has been superseded.
    fn write(&self, update: impl FnOnce(&mut TypingFrame)) -> bool {
        let mut current = true;
        self.tx.send_if_modified(|frame| {
            if self.generation.load(Ordering::SeqCst) != self.own_generation {
                current = false;
                return false;
            }
            update(frame);
            true
        });
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wait_done(rx: &mut watch::Receiver<TypingFrame>) -> TypingFrame {
        loop {
            if rx.borrow_and_update().done {
                return rx.borrow().clone();
            }
            rx.changed().await.expect("animator dropped");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_one_character_per_tick() {
        let mut animator = TypingAnimator::default();
        let mut rx = animator.subscribe();
        animator.start("abc");

        tokio::time::sleep(Duration::from_millis(6)).await;
        assert_eq!(animator.current().text, "a");
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(animator.current().text, "ab");

        let frame = wait_done(&mut rx).await;
        assert_eq!(frame.text, "abc");
        assert!(frame.done);
    }

    #[tokio::test(start_paused = true)]
    async fn observed_frames_are_prefixes_in_order() {
        let mut animator = TypingAnimator::default();
        let mut rx = animator.subscribe();
        let text = "## Title\n$x^2$ é 👍🏽";
        animator.start(text);

        let mut seen = Vec::new();
        loop {
            rx.changed().await.unwrap();
            let frame = rx.borrow_and_update().clone();
            assert!(text.starts_with(&frame.text));
            seen.push(frame.text.clone());
            if frame.done {
                break;
            }
        }
        assert_eq!(seen.last().unwrap(), text);
        assert!(seen.windows(2).all(|w| w[0].len() <= w[1].len()));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_again_supersedes_running_animation() {
        let mut animator = TypingAnimator::default();
        let mut rx = animator.subscribe();
        animator.start("first answer that is long");
        tokio::time::sleep(Duration::from_millis(21)).await;
        assert!(animator.current().text.starts_with("firs"));

        animator.start("second");
        assert_eq!(animator.current().text, "");

        let frame = wait_done(&mut rx).await;
        assert_eq!(frame.text, "second");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(animator.current().text, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn finish_jumps_to_full_text() {
        let mut animator = TypingAnimator::default();
        animator.start("hello world");
        tokio::time::sleep(Duration::from_millis(11)).await;
        animator.finish();
        assert_eq!(
            animator.current(),
            TypingFrame {
                text: "hello world".into(),
                done: true
            }
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(animator.current().text, "hello world");
        assert!(!animator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_freezes_partial_text() {
        let mut animator = TypingAnimator::default();
        animator.start("abcdef");
        tokio::time::sleep(Duration::from_millis(11)).await;
        animator.cancel();
        let frozen = animator.current();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(animator.current(), frozen);
        assert!(!frozen.done);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_still_completes() {
        let mut animator = TypingAnimator::new(Duration::ZERO);
        let mut rx = animator.subscribe();
        animator.start("abc");

        let frame = tokio::time::timeout(Duration::from_secs(2), wait_done(&mut rx))
            .await
            .expect("animation finished");
        assert_eq!(frame.text, "abc");
        assert!(frame.done);
    }

    #[tokio::test]
    async fn empty_text_is_done_immediately() {
        let mut animator = TypingAnimator::default();
        animator.start("");
        assert!(animator.current().done);
    }
}
