use alloy::primitives::Address;
use bigdecimal::ToPrimitive;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::alerts::Dispatcher;
use crate::config::ScannerConfig;
use crate::error::ChainError;
use crate::indexer::decoder;
use crate::indexer::mempool;
use crate::indexer::types::{ScanCursor, TickReport};
use crate::pipeline::{EventPipeline, TickContext};
use crate::rpc::ChainClient;

/// Polls the chain for new blocks and turns their logs into alerts.
pub struct Scanner<C> {
    chain: Arc<C>,
    pipeline: EventPipeline<C>,
    dispatcher: Arc<Dispatcher>,
    factory: Address,
    router: Address,
    batch_size: u64,
    poll_interval: Duration,
    mempool_watch: bool,
    cursor: ScanCursor,
}

impl<C: ChainClient> Scanner<C> {
    pub fn new(
        chain: Arc<C>,
        pipeline: EventPipeline<C>,
        dispatcher: Arc<Dispatcher>,
        factory: Address,
        router: Address,
        config: &ScannerConfig,
        cursor: ScanCursor,
    ) -> Self {
        Self {
            chain,
            pipeline,
            dispatcher,
            factory,
            router,
            batch_size: config.batch_size.max(1),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            mempool_watch: config.mempool_watch,
            cursor,
        }
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    /// Run one poll: scan `(cursor, head]` window by window, then check the
    /// pending block. On a transient error the cursor stays at the last
    /// fully dispatched window and the rest is retried next tick.
    pub async fn tick(&mut self) -> Result<TickReport, ChainError> {
        let head = self.chain.block_number().await?;
        let mut report = TickReport {
            from_block: self.cursor.block() + 1,
            to_block: self.cursor.block(),
            ..Default::default()
        };
        let mut ctx = TickContext::default();

        while self.cursor.block() < head {
            let from = self.cursor.block() + 1;
            let to = std::cmp::min(from + self.batch_size - 1, head);

            let watched = self.dispatcher.watched_wallets().await;
            let signatures = decoder::signatures(!watched.is_empty());
            ctx.set_watched(watched);

            let mut logs = self.chain.logs(from, to, &signatures).await?;
            logs.sort_by_key(|log| (log.block_number, log.log_index));

            tracing::debug!(from, to, logs = logs.len(), "Scanning block range");

            for log in &logs {
                let Some((decoded, meta)) = decoder::decode_log(log, self.factory) else {
                    continue;
                };
                report.logs += 1;

                let events = self.pipeline.classify(decoded, meta, &mut ctx).await?;
                for event in &events {
                    let outcome = self.dispatcher.dispatch(event).await;
                    report.events += 1;
                    report.delivered += outcome.delivered;
                    if outcome.suppressed {
                        report.suppressed += 1;
                    }
                }
            }

            self.cursor.advance_to(to);
            report.to_block = to;
        }

        if self.mempool_watch {
            report.mempool_alerts = self.watch_mempool(&mut ctx).await;
        }

        Ok(report)
    }

    /// Advisory whale-buy check on the pending block. Errors are logged only.
    async fn watch_mempool(&self, ctx: &mut TickContext) -> usize {
        let txs = match self.chain.pending_transactions().await {
            Ok(txs) => txs,
            Err(e) => {
                tracing::debug!(error = %e, "Pending block unavailable");
                return 0;
            }
        };

        let anchor_usd = self.pipeline.anchor_usd(ctx).await;
        let oracle = self.pipeline.oracle();
        let events = mempool::whale_buys(
            &txs,
            self.router,
            oracle.anchor_decimals(),
            anchor_usd.to_f64().unwrap_or(0.0),
            self.pipeline.thresholds().mempool_usd,
        );

        let mut alerted = 0;
        for event in &events {
            if !self.dispatcher.dispatch(event).await.suppressed {
                alerted += 1;
            }
        }
        alerted
    }

    /// Poll until cancelled. Tick errors are logged and the loop re-arms.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            cursor = self.cursor.block(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Scanner started"
        );

        loop {
            match self.tick().await {
                Ok(report) if report.logs > 0 || report.mempool_alerts > 0 => {
                    tracing::info!(
                        from = report.from_block,
                        to = report.to_block,
                        logs = report.logs,
                        events = report.events,
                        delivered = report.delivered,
                        suppressed = report.suppressed,
                        mempool_alerts = report.mempool_alerts,
                        "Processed blocks"
                    );
                }
                Ok(report) => {
                    tracing::debug!(cursor = report.to_block, "No new activity");
                }
                Err(e) => {
                    tracing::warn!(
                        cursor = self.cursor.block(),
                        error = %e,
                        "Scanner tick failed, retrying next interval"
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!(cursor = self.cursor.block(), "Shutdown received, stopping scanner");
                    break;
                }
            }
        }
    }
}

/// Resolve the starting cursor: `start_block - 1` when configured, otherwise
/// the current head. Waits with exponential backoff while the chain is
/// unreachable; returns `None` if cancelled first.
pub async fn initial_cursor<C: ChainClient + ?Sized>(
    chain: &C,
    start_block: Option<u64>,
    shutdown: &CancellationToken,
) -> Option<ScanCursor> {
    if let Some(start) = start_block {
        return Some(ScanCursor::new(start.saturating_sub(1)));
    }

    let mut delay = Duration::from_millis(500);
    let mut attempt = 0u32;
    loop {
        match chain.block_number().await {
            Ok(head) => return Some(ScanCursor::new(head)),
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Head block unavailable, retrying..."
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.cancelled() => return None,
        }
        delay = std::cmp::min(delay * 2, Duration::from_secs(30));
    }
}
