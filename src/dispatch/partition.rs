use crate::args::PositiveUsize;

/// Number of requests one worker executes, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkQuota {
    pub worker_index: usize,
    pub request_count: u64,
}

/// Splits `total` requests across `workers` as evenly as possible.
///
/// Every worker gets `total / workers`; the first `total % workers` workers
/// get one more. Quotas always sum to `total` and differ by at most one.
/// Workers beyond `total` receive an empty quota but are still returned.
#[must_use]
pub fn partition(total: u64, workers: PositiveUsize) -> Vec<WorkQuota> {
    let worker_count = workers.get();
    let divisor = u64::try_from(worker_count).unwrap_or(u64::MAX);
    let base = total.checked_div(divisor).unwrap_or(0);
    let remainder = total.checked_rem(divisor).unwrap_or(0);

    (0..worker_count)
        .map(|worker_index| {
            let gets_extra = u64::try_from(worker_index).is_ok_and(|index| index < remainder);
            WorkQuota {
                worker_index,
                request_count: base.saturating_add(u64::from(gets_extra)),
            }
        })
        .collect()
}
