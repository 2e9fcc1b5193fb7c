//! The drain loop: the single consumer of an executor's queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{Instrument, debug, debug_span, info};

use super::item::WorkItem;
use crate::observability::Counters;

pub(crate) type QueueRx = mpsc::UnboundedReceiver<Box<dyn WorkItem>>;
pub(crate) type QueueTx = mpsc::UnboundedSender<Box<dyn WorkItem>>;

/// Run items one at a time, in queue order, until every sender is gone.
///
/// This future owns the only receiver of the queue, so there is exactly one
/// drain loop per executor and it cannot re-enter itself. Items appended
/// while an item runs are picked up by the next `recv`.
pub(crate) async fn drain_loop(
    name: Arc<str>,
    mut queue: QueueRx,
    timeout: Option<Duration>,
    counters: Arc<Counters>,
) {
    info!(executor = %name, ?timeout, "drain loop started");

    // 全 sender が drop されると recv が None を返してループを抜ける
    while let Some(item) = queue.recv().await {
        counters.dequeued();
        let seq = item.seq();
        debug!(executor = %name, seq, "dequeued work item");

        // 1件ずつ await する。次の item はこれが settle するまで取り出さない
        // (counters は run の中で handle より先に更新される)
        let span = debug_span!("work_item", executor = %name, seq);
        let settlement = item.run(timeout, &counters).instrument(span).await;
        debug!(executor = %name, seq, ?settlement, "work item settled");
    }

    info!(executor = %name, "drain loop stopped; all executor handles dropped");
}
