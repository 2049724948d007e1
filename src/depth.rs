// Leaf depths say more about a tree's shape than the bare height, a
// single long spine and a full tree can share the same maximum.
const MAX_DEPTH: usize = 256;

/// Histogram over leaf-node depths, filled by `validate()` on either
/// engine. Reports minimum, maximum, mean and the 90..99 percentiles.
#[derive(Clone, Debug)]
pub struct Depth {
    samples: usize,
    total: usize,
    buckets: [u64; MAX_DEPTH],
}

impl Depth {
    pub(crate) fn new() -> Depth {
        Default::default()
    }

    pub(crate) fn sample(&mut self, depth: usize) {
        self.samples += 1;
        self.total += depth;
        self.buckets[depth] += 1;
    }

    /// Return number of leaf-nodes sampled.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Return the shallowest sampled depth.
    pub fn min(&self) -> usize {
        self.buckets
            .iter()
            .position(|&n| n > 0)
            .unwrap_or_default()
    }

    /// Return the deepest sampled depth.
    pub fn max(&self) -> usize {
        self.buckets
            .iter()
            .rposition(|&n| n > 0)
            .unwrap_or_default()
    }

    /// Return the mean depth across all sampled leaf-nodes.
    pub fn mean(&self) -> usize {
        self.total / self.samples
    }

    /// Return (percentile, depth) pairs for the 90th and above. Each
    /// percentile appears at most once, at the first depth crossing it.
    pub fn percentiles(&self) -> Vec<(u8, usize)> {
        let mut out: Vec<(u8, usize)> = vec![];
        let mut next = 90_u8;
        let mut seen = 0_u64;
        for (depth, &count) in self.buckets.iter().enumerate() {
            if count == 0 {
                continue;
            }
            seen += count;
            let pct = ((seen * 100) / (self.samples as u64)) as u8;
            if pct >= next {
                out.push((pct, depth));
                next = pct.saturating_add(1);
            }
        }
        out
    }

    /// Pretty print depth statistics in human readable format, useful
    /// in logs.
    pub fn pretty_print(&self, prefix: &str) {
        println!(
            "{}depth (min, mean, max): {:?}",
            prefix,
            (self.min(), self.mean(), self.max())
        );
        for (pct, depth) in self.percentiles().into_iter() {
            println!("{}  {} percentile = {}", prefix, pct, depth);
        }
    }
}

impl Default for Depth {
    fn default() -> Self {
        Depth {
            samples: 0,
            total: 0,
            buckets: [0; MAX_DEPTH],
        }
    }
}
