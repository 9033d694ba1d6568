//! Bounded export queue.
//!
//! Delivery is a single FIFO per exporter, shared by every producer and
//! drained by one worker. Records are kept in one lane per kind and stamped
//! with a sequence number; the worker always takes the lowest-numbered lane
//! head, so order across kinds is preserved. When the queue is full the
//! oldest queued record of the same kind is evicted (or the oldest record
//! overall if none of that kind is queued). Append, evict and pop are O(1).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::models::{Record, RecordKind};

/// Result of offering a record to the queue.
#[derive(Debug)]
pub(crate) enum PushOutcome {
    /// The queue is closed to new records
    Rejected,
    /// Appended without eviction
    Queued,
    /// Appended after evicting this record
    Evicted(Arc<Record>),
}

fn lane_of(kind: RecordKind) -> usize {
    match kind {
        RecordKind::CurrentData => 0,
        RecordKind::ArchiveData => 1,
        RecordKind::Event => 2,
    }
}

#[derive(Default)]
struct Lanes {
    lanes: [VecDeque<(u64, Arc<Record>)>; 3],
    next_seq: u64,
    len: usize,
}

impl Lanes {
    /// Lane whose head is the oldest queued record.
    fn oldest_lane(&self) -> Option<usize> {
        self.lanes
            .iter()
            .enumerate()
            .filter_map(|(i, lane)| lane.front().map(|(seq, _)| (*seq, i)))
            .min()
            .map(|(_, i)| i)
    }

    fn pop_lane(&mut self, lane: usize) -> Option<Arc<Record>> {
        let (_, record) = self.lanes[lane].pop_front()?;
        self.len -= 1;
        Some(record)
    }

    fn push(&mut self, record: Arc<Record>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.lanes[lane_of(record.kind())].push_back((seq, record));
        self.len += 1;
    }

    fn clear(&mut self) -> usize {
        let count = self.len;
        self.lanes.iter_mut().for_each(VecDeque::clear);
        self.len = 0;
        count
    }
}

pub(crate) struct ExportQueue {
    capacity: usize,
    records: Mutex<Lanes>,
    depth: AtomicUsize,
    notify: Notify,
}

impl ExportQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        ExportQueue {
            capacity: capacity.max(1),
            records: Mutex::new(Lanes::default()),
            depth: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lanes> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends `record` if `is_open()` holds.
    ///
    /// `is_open` is evaluated while the queue lock is held, so a record is
    /// never appended after a concurrent close has been observed by the worker.
    pub(crate) fn push(&self, record: Arc<Record>, is_open: impl FnOnce() -> bool) -> PushOutcome {
        let outcome = {
            let mut records = self.lock();
            if !is_open() {
                return PushOutcome::Rejected;
            }

            let evicted = if records.len >= self.capacity {
                let same_kind = lane_of(record.kind());
                if records.lanes[same_kind].is_empty() {
                    records.oldest_lane().and_then(|lane| records.pop_lane(lane))
                } else {
                    records.pop_lane(same_kind)
                }
            } else {
                None
            };

            records.push(record);
            self.depth.store(records.len, Ordering::SeqCst);

            match evicted {
                Some(old) => PushOutcome::Evicted(old),
                None => PushOutcome::Queued,
            }
        };

        self.notify.notify_one();
        outcome
    }

    pub(crate) fn pop(&self) -> Option<Arc<Record>> {
        let mut records = self.lock();
        let record = records
            .oldest_lane()
            .and_then(|lane| records.pop_lane(lane));
        self.depth.store(records.len, Ordering::SeqCst);
        record
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().len == 0
    }

    /// Discards every queued record and returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let count = self.lock().clear();
        self.depth.store(0, Ordering::SeqCst);
        count
    }

    /// Queue depth without taking the lock.
    pub(crate) fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Waits until a record is pushed or [`wake`](Self::wake) is called.
    ///
    /// A wakeup issued while nobody is waiting is kept for the next call.
    pub(crate) async fn wait(&self) {
        self.notify.notified().await;
    }

    pub(crate) fn wake(&self) {
        self.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelEntry, Event, Snapshot};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn current(channel_num: i32) -> Arc<Record> {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Arc::new(Record::CurrentSnapshot(Snapshot::new(
            ts,
            vec![ChannelEntry {
                channel_num,
                value: 0.0,
                status: 1,
            }],
        )))
    }

    fn event(channel_num: i32) -> Arc<Record> {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Arc::new(Record::Event(Event {
            timestamp: ts,
            object_num: 0,
            device_num: 0,
            parameter_id: 0,
            channel_num,
            old_value: 0.0,
            old_status: 0,
            new_value: 1.0,
            new_status: 1,
            acknowledged: false,
            user_id: 0,
            description: String::new(),
            data: Vec::new(),
        }))
    }

    fn channel_of(record: &Record) -> i32 {
        match record {
            Record::CurrentSnapshot(s) | Record::ArchivedSnapshot(s) => s.channels[0].channel_num,
            Record::Event(e) => e.channel_num,
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = ExportQueue::new(10);
        queue.push(current(1), || true);
        queue.push(event(2), || true);
        queue.push(current(3), || true);

        assert_eq!(queue.len(), 3);
        let order: Vec<i32> = std::iter::from_fn(|| queue.pop())
            .map(|r| channel_of(&r))
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_closed_queue_rejects() {
        let queue = ExportQueue::new(10);
        assert!(matches!(
            queue.push(current(1), || false),
            PushOutcome::Rejected
        ));
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_full_queue_evicts_oldest_of_same_kind() {
        let queue = ExportQueue::new(3);
        queue.push(event(1), || true);
        queue.push(current(2), || true);
        queue.push(current(3), || true);

        match queue.push(current(4), || true) {
            PushOutcome::Evicted(old) => assert_eq!(channel_of(&old), 2),
            other => panic!("expected eviction, got {:?}", other),
        }

        let order: Vec<i32> = std::iter::from_fn(|| queue.pop())
            .map(|r| channel_of(&r))
            .collect();
        assert_eq!(order, vec![1, 3, 4]);
    }

    #[test]
    fn test_full_queue_without_same_kind_evicts_head() {
        let queue = ExportQueue::new(2);
        queue.push(event(1), || true);
        queue.push(event(2), || true);

        match queue.push(current(3), || true) {
            PushOutcome::Evicted(old) => assert_eq!(channel_of(&old), 1),
            other => panic!("expected eviction, got {:?}", other),
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_eviction_keeps_cross_kind_order() {
        let queue = ExportQueue::new(4);
        queue.push(current(1), || true);
        queue.push(event(2), || true);
        queue.push(current(3), || true);
        queue.push(event(4), || true);

        // full: the new event pushes out event 2, the snapshots keep their places
        match queue.push(event(5), || true) {
            PushOutcome::Evicted(old) => assert_eq!(channel_of(&old), 2),
            other => panic!("expected eviction, got {:?}", other),
        }

        let order: Vec<i32> = std::iter::from_fn(|| queue.pop())
            .map(|r| channel_of(&r))
            .collect();
        assert_eq!(order, vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_repeated_eviction_from_tail_of_full_queue() {
        // the only snapshot sits at the tail of a full queue
        let capacity = 10_000;
        let queue = ExportQueue::new(capacity);
        for i in 0..capacity as i32 - 1 {
            queue.push(event(i), || true);
        }
        queue.push(current(-1), || true);

        for i in 0..2_000 {
            match queue.push(current(i), || true) {
                PushOutcome::Evicted(old) => assert!(matches!(*old, Record::CurrentSnapshot(_))),
                other => panic!("expected eviction, got {:?}", other),
            }
        }
        assert_eq!(queue.len(), capacity);

        let lanes = queue.lock();
        assert_eq!(lanes.lanes[lane_of(RecordKind::CurrentData)].len(), 1);
        assert_eq!(lanes.lanes[lane_of(RecordKind::Event)].len(), capacity - 1);
    }

    #[test]
    fn test_clear_reports_discarded() {
        let queue = ExportQueue::new(10);
        queue.push(current(1), || true);
        queue.push(current(2), || true);

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.len(), 0);
        assert!(queue.pop().is_none());
    }

    #[tokio::test]
    async fn test_wake_before_wait_is_not_lost() {
        let queue = ExportQueue::new(1);
        queue.wake();

        tokio::time::timeout(Duration::from_secs(1), queue.wait())
            .await
            .expect("stored wakeup should complete the wait");
    }
}
