use std::{ops::ControlFlow, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// A cancellable repeating timer running on the tokio runtime.
///
/// The callback is invoked once per period, starting one period after
/// [`Ticker::start`], until it returns [`ControlFlow::Break`] or the ticker
/// is cancelled. Dropping the ticker cancels it.
#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(Instant) -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let now = interval.tick().await;
                if on_tick(now).is_break() {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnMut(Instant) -> ControlFlow<()> {
        let counter = counter.clone();
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let _ticker = Ticker::start(Duration::from_millis(100), counting(&counter));

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tickers_stay_silent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut ticker = Ticker::start(Duration::from_millis(100), counting(&counter));

        time::sleep(Duration::from_millis(250)).await;
        ticker.cancel();
        let seen = counter.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_the_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = counter.clone();
        let ticker = Ticker::start(Duration::from_millis(10), move |_| {
            if inner.fetch_add(1, Ordering::SeqCst) == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        drop(Ticker::start(Duration::from_millis(10), counting(&counter)));
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
