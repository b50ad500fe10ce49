//! Suppression of isolated single-bin spikes.

use hepcube_core::Histogram1D;
use log::debug;

/// Flattens single-bin spikes inside the value range `[low, high]`.
///
/// A bin strictly between the first and last bin of the range whose content
/// exceeds `threshold` times both neighbours is set to
/// `biggest_neighbour * (1 + suppression_level)`. Errors are kept. Bins are
/// visited left to right, so a lowered bin is seen as the neighbour of the
/// next one.
pub fn suppress_single_bin_fluctuations(
    histogram: &mut Histogram1D,
    low: f64,
    high: f64,
    threshold: f64,
    suppression_level: f64,
) {
    let Some(range) = histogram.axis().bin_range_for_values(low, high) else {
        return;
    };
    for bin in range.low + 1..range.high {
        let previous = histogram.content(bin - 1);
        let current = histogram.content(bin);
        let next = histogram.content(bin + 1);
        if current > threshold * previous && current > threshold * next {
            let biggest = previous.max(next);
            debug!(
                "{}: suppressing bin {bin} from {current} to {}",
                histogram.name(),
                biggest * (1.0 + suppression_level)
            );
            if let Some(value) = histogram.bins_mut().get_mut(bin) {
                value.content = biggest * (1.0 + suppression_level);
            }
        }
    }
}
