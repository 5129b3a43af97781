#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u64, u16)| {
    let (total, workers) = input;
    let quotas = volley::fuzzing::partition_input(total, usize::from(workers));
    let counts: Vec<u64> = quotas.iter().map(|quota| quota.request_count).collect();
    let sum = counts.iter().fold(0_u64, |acc, count| acc.saturating_add(*count));
    let max = counts.iter().copied().max().unwrap_or(0);
    let min = counts.iter().copied().min().unwrap_or(0);
    assert_eq!(quotas.len(), usize::from(workers.max(1)));
    assert_eq!(sum, total);
    assert!(max - min <= 1);
});
