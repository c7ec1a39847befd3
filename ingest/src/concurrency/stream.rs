use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures::Stream;
use ingest_config::shared::BatchConfig;
use pin_project_lite::pin_project;
use tracing::info;

use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx, ShutdownSignal};

pin_project! {
    /// A stream adapter that groups items into bounded batches.
    ///
    /// Batches are emitted when they reach the configured maximum size, or when the
    /// underlying stream ends with items still buffered. A batch is therefore always
    /// either full or final, and never empty. A shutdown signal stops the stream at the
    /// next poll and surrenders the buffered items to the caller.
    #[must_use = "streams do nothing unless polled"]
    #[derive(Debug)]
    pub struct BatchStream<B, S: Stream<Item = B>> {
        #[pin]
        stream: S,
        shutdown: ShutdownSignal,
        items: Vec<S::Item>,
        batch_config: BatchConfig,
        inner_stream_ended: bool,
        stream_stopped: bool,
    }
}

impl<B, S: Stream<Item = B>> BatchStream<B, S> {
    /// Creates a new [`BatchStream`].
    pub fn wrap(stream: S, batch_config: BatchConfig, shutdown_rx: ShutdownRx) -> Self {
        BatchStream {
            stream,
            shutdown: ShutdownSignal::new(shutdown_rx),
            items: Vec::new(),
            batch_config,
            inner_stream_ended: false,
            stream_stopped: false,
        }
    }
}

impl<B, S: Stream<Item = B>> Stream for BatchStream<B, S> {
    type Item = ShutdownResult<Vec<S::Item>, Vec<S::Item>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.as_mut().project();

        // Fast path: if the inner stream has already ended, we're done.
        if *this.inner_stream_ended {
            return Poll::Ready(None);
        }

        loop {
            // Fast path: if we've been marked as stopped, terminate immediately.
            if *this.stream_stopped {
                return Poll::Ready(None);
            }

            // Shutdown handling takes priority over all other operations so the pipeline
            // stops at a batch boundary. The signal future is stored in the stream and
            // keeps this task registered for wakeup even while the inner stream is idle.
            if Pin::new(&mut *this.shutdown).poll(cx).is_ready() {
                info!("batch stream stopped due to shutdown signal");

                // Mark the stream as permanently stopped to prevent further polling.
                *this.stream_stopped = true;

                // Surrender buffered items (if any) with the shutdown indication. Even
                // empty batches are returned to signal that shutdown occurred.
                return Poll::Ready(Some(ShutdownResult::Shutdown(std::mem::take(this.items))));
            }

            // Pre-allocate batch capacity when starting a new batch. This avoids
            // reallocations while the batch fills.
            if this.items.is_empty() {
                this.items.reserve_exact(this.batch_config.max_size);
            }

            match this.stream.as_mut().poll_next(cx) {
                Poll::Pending => {
                    // A batch is only emitted full or at end-of-input, so there is
                    // nothing to do until more items arrive.
                    return Poll::Pending;
                }
                Poll::Ready(Some(item)) => {
                    this.items.push(item);

                    // SIZE-BASED EMISSION: if the batch is full, emit immediately.
                    if this.items.len() >= this.batch_config.max_size {
                        return Poll::Ready(Some(ShutdownResult::Ok(std::mem::take(this.items))));
                    }
                    // Continue the loop to collect more items.
                }
                Poll::Ready(None) => {
                    // STREAM END: return the final partial batch if there is one,
                    // otherwise signal completion.
                    let last = if this.items.is_empty() {
                        None
                    } else {
                        Some(ShutdownResult::Ok(std::mem::take(this.items)))
                    };

                    *this.inner_stream_ended = true;

                    return Poll::Ready(last);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use futures::StreamExt;
    use futures::future::poll_fn;

    struct TwoThenPending {
        emitted: usize,
    }

    impl TwoThenPending {
        fn new() -> Self {
            Self { emitted: 0 }
        }
    }

    impl Stream for TwoThenPending {
        type Item = i32;

        fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            match self.emitted {
                0 => {
                    self.emitted = 1;
                    Poll::Ready(Some(1))
                }
                1 => {
                    self.emitted = 2;
                    Poll::Ready(Some(2))
                }
                _ => Poll::Pending,
            }
        }
    }

    fn batch_config(max_size: usize) -> BatchConfig {
        BatchConfig { max_size }
    }

    #[tokio::test]
    async fn emits_full_batches_then_final_partial() {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let mut stream = Box::pin(BatchStream::wrap(
            futures::stream::iter(0..10),
            batch_config(4),
            shutdown_rx,
        ));

        assert_eq!(
            stream.next().await,
            Some(ShutdownResult::Ok(vec![0, 1, 2, 3]))
        );
        assert_eq!(
            stream.next().await,
            Some(ShutdownResult::Ok(vec![4, 5, 6, 7]))
        );
        assert_eq!(stream.next().await, Some(ShutdownResult::Ok(vec![8, 9])));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn exact_multiple_of_batch_size_emits_no_empty_batch() {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let mut stream = Box::pin(BatchStream::wrap(
            futures::stream::iter(0..4),
            batch_config(2),
            shutdown_rx,
        ));

        assert_eq!(stream.next().await, Some(ShutdownResult::Ok(vec![0, 1])));
        assert_eq!(stream.next().await, Some(ShutdownResult::Ok(vec![2, 3])));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn empty_stream_emits_nothing() {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let mut stream = Box::pin(BatchStream::wrap(
            futures::stream::iter(Vec::<i32>::new()),
            batch_config(2),
            shutdown_rx,
        ));

        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn partial_batch_is_held_while_inner_stream_is_pending() {
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let mut stream = Box::pin(BatchStream::wrap(
            TwoThenPending::new(),
            batch_config(10),
            shutdown_rx,
        ));

        // The stream yields 2 of the 10 items a batch needs and then suspends, so the
        // adapter must stay pending instead of emitting a short batch.
        poll_fn(|cx| match stream.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Ready(()),
            _ => panic!("expected pending"),
        })
        .await;
    }

    #[tokio::test]
    async fn shutdown_surrenders_buffered_items() {
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let mut stream = Box::pin(BatchStream::wrap(
            TwoThenPending::new(),
            batch_config(10),
            shutdown_rx,
        ));

        // Buffer the two available items first.
        poll_fn(|cx| match stream.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Ready(()),
            _ => panic!("expected pending"),
        })
        .await;

        shutdown_tx.shutdown().unwrap();

        let result = stream.next().await.unwrap();
        assert!(result.should_shutdown());
        assert_eq!(result, ShutdownResult::Shutdown(vec![1, 2]));
        assert_eq!(stream.next().await, None);
    }
}
