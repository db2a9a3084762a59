//! Progressive accumulation engine.
//!
//! The compositor drives one render pass per application tick. It cycles
//! through a pool of N sample targets; once the pool is full it merges the
//! N independently rendered noisy frames into one low-variance frame with
//! a binary pairwise reduction, and folds that frame into a persistent
//! accumulator with an incremental running mean. Camera movement
//! invalidates everything via [`Compositor::drop_results`].
//!
//! The engine itself owns no GPU resources; it issues operations against
//! the [`FramePasses`] trait, which the wgpu backend implements and which
//! the tests replace with a recording fake.

use anyhow::Result;

/// Names one of the compositor's color buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetId {
    /// One of the N pool targets.
    Pool(usize),
    /// The preview/scratch target.
    Preview,
    /// The persistent accumulator.
    Accumulator,
}

/// The pass-execution contract the compositor drives.
///
/// `blend` samples two source textures through the compositing program and
/// writes the combination to `dest`; with identical sources it degenerates
/// to a copy, which the compositor exploits as its only copy primitive.
/// `average` is the weighted variant taking the batch count as divisor.
/// The exact combination rules live in the shading programs; the only
/// guarantee the compositor relies on is that A = B produces a copy of A.
pub trait FramePasses {
    /// Clear a target to black.
    fn clear(&mut self, target: TargetId);

    /// Render one noisy sample of the scene into `dest`. `previous` is the
    /// previously filled pool target, bound for in-shader temporal
    /// blending.
    fn trace(&mut self, dest: TargetId, previous: TargetId);

    /// Blend `a` and `b` into `dest`.
    fn blend(&mut self, a: TargetId, b: TargetId, dest: TargetId);

    /// Running-average `a` (previous mean) and `b` (new batch) into
    /// `dest`, weighting the new batch by `1 / frame_count`.
    fn average(&mut self, a: TargetId, b: TargetId, dest: TargetId, frame_count: u32);

    /// Show `source` on screen.
    fn present(&mut self, source: TargetId) -> Result<()>;
}

/// Pool-cycling accumulation state machine.
pub struct Compositor {
    pool_size: usize,
    current_target_index: usize,
    accumulation_count: u32,
    finished_accumulation: bool,
}

impl Compositor {
    pub const DEFAULT_POOL_SIZE: usize = 16;

    /// `pool_size` must be a power of two so the pairwise reduction comes
    /// out even.
    pub fn new(pool_size: usize) -> Self {
        assert!(
            pool_size >= 2 && pool_size.is_power_of_two(),
            "pool size must be a power of two, got {pool_size}"
        );
        Self {
            pool_size,
            current_target_index: 0,
            accumulation_count: 1,
            finished_accumulation: false,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn current_target_index(&self) -> usize {
        self.current_target_index
    }

    /// Number of the batch currently being filled, starting at 1.
    pub fn accumulation_count(&self) -> u32 {
        self.accumulation_count
    }

    /// Whether a reduced result exists in the accumulator yet.
    pub fn finished_accumulation(&self) -> bool {
        self.finished_accumulation
    }

    /// Run one tick: consume a pending drop signal, render one sample into
    /// the current pool slot, present, and reduce the pool once it is
    /// full.
    ///
    /// The drop check runs first so a reset signaled mid-cycle can never
    /// leave stale partial results visible.
    pub fn render(&mut self, drop_signaled: bool, passes: &mut dyn FramePasses) -> Result<()> {
        if drop_signaled {
            self.drop_results(passes);
        }

        let current = self.current_target_index;
        let previous = (current + self.pool_size - 1) % self.pool_size;
        passes.trace(TargetId::Pool(current), TargetId::Pool(previous));

        // Until the first reduction completes there is nothing merged to
        // show, so present the sample that was just rendered. The
        // self-blend reuses the ordinary compositing path as a copy.
        let shown = if self.finished_accumulation {
            TargetId::Accumulator
        } else {
            TargetId::Pool(current)
        };
        passes.present(shown)?;

        self.current_target_index += 1;
        if self.current_target_index == self.pool_size {
            self.accumulate_targets(passes);
        }

        Ok(())
    }

    /// Invalidate all accumulated results: clear every pool buffer and the
    /// accumulator, restart at batch 1. Idempotent.
    pub fn drop_results(&mut self, passes: &mut dyn FramePasses) {
        for i in 0..self.pool_size {
            passes.clear(TargetId::Pool(i));
        }
        passes.clear(TargetId::Accumulator);

        self.current_target_index = 0;
        self.accumulation_count = 1;
        self.finished_accumulation = false;
    }

    /// Binary pairwise reduction of the full pool, merged into the
    /// persistent accumulator.
    fn accumulate_targets(&mut self, passes: &mut dyn FramePasses) {
        log::debug!("accumulating batch {}", self.accumulation_count);

        // Save the current accumulator before the pool reduction reuses it
        // as scratch.
        passes.blend(TargetId::Accumulator, TargetId::Accumulator, TargetId::Preview);

        let mut half = self.pool_size / 2;
        while half > 1 {
            let step = self.pool_size / half;
            for i in (0..self.pool_size).step_by(step) {
                let a = TargetId::Pool(i);
                let b = TargetId::Pool(i + step / 2);

                // Merge the pair in the scratch accumulator, then copy the
                // result back into the first member, keeping the reduction
                // inside the existing pool buffers.
                passes.blend(a, b, TargetId::Accumulator);
                passes.blend(TargetId::Accumulator, TargetId::Accumulator, a);
            }
            half /= 2;
        }

        // Fold the saved baseline back in next to the reduced batch.
        passes.blend(TargetId::Preview, TargetId::Preview, TargetId::Pool(1));

        if self.accumulation_count > 1 {
            // Incremental mean: the new batch gets 1/count weight, so each
            // batch of N samples counts equally in the long run.
            passes.average(
                TargetId::Pool(1),
                TargetId::Pool(0),
                TargetId::Accumulator,
                self.accumulation_count,
            );
        } else {
            // First batch: initialize the running mean with a straight
            // copy. Averaging here would divide by a count below 2.
            passes.blend(TargetId::Pool(0), TargetId::Pool(0), TargetId::Accumulator);
        }

        self.finished_accumulation = true;
        self.current_target_index = 0;
        self.accumulation_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Op {
        Clear(TargetId),
        Trace(TargetId, TargetId),
        Blend(TargetId, TargetId, TargetId),
        Average(TargetId, TargetId, TargetId, u32),
        Present(TargetId),
    }

    #[derive(Default)]
    struct RecordingPasses {
        ops: Vec<Op>,
    }

    impl FramePasses for RecordingPasses {
        fn clear(&mut self, target: TargetId) {
            self.ops.push(Op::Clear(target));
        }

        fn trace(&mut self, dest: TargetId, previous: TargetId) {
            self.ops.push(Op::Trace(dest, previous));
        }

        fn blend(&mut self, a: TargetId, b: TargetId, dest: TargetId) {
            self.ops.push(Op::Blend(a, b, dest));
        }

        fn average(&mut self, a: TargetId, b: TargetId, dest: TargetId, frame_count: u32) {
            self.ops.push(Op::Average(a, b, dest, frame_count));
        }

        fn present(&mut self, source: TargetId) -> Result<()> {
            self.ops.push(Op::Present(source));
            Ok(())
        }
    }

    fn run_ticks(compositor: &mut Compositor, passes: &mut RecordingPasses, n: usize) {
        for _ in 0..n {
            compositor.render(false, passes).unwrap();
        }
    }

    #[test]
    fn test_idle_fill_cycles_through_pool() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 3);

        let traces: Vec<_> = passes
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Trace(dest, prev) => Some((*dest, *prev)),
                _ => None,
            })
            .collect();
        assert_eq!(
            traces,
            vec![
                (TargetId::Pool(0), TargetId::Pool(3)),
                (TargetId::Pool(1), TargetId::Pool(0)),
                (TargetId::Pool(2), TargetId::Pool(1)),
            ]
        );
        assert_eq!(compositor.current_target_index(), 3);
        assert!(!compositor.finished_accumulation());
    }

    #[test]
    fn test_presents_current_sample_until_first_reduction() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 2);
        assert!(passes.ops.contains(&Op::Present(TargetId::Pool(0))));
        assert!(passes.ops.contains(&Op::Present(TargetId::Pool(1))));

        // Finish the batch; from now on the accumulator is shown.
        run_ticks(&mut compositor, &mut passes, 2);
        passes.ops.clear();
        run_ticks(&mut compositor, &mut passes, 1);
        assert!(passes.ops.contains(&Op::Present(TargetId::Accumulator)));
    }

    #[test]
    fn test_reduction_triggers_after_exactly_pool_size_ticks() {
        let mut compositor = Compositor::new(16);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 15);
        assert_eq!(compositor.accumulation_count(), 1);
        assert!(!compositor.finished_accumulation());

        run_ticks(&mut compositor, &mut passes, 1);
        assert_eq!(compositor.accumulation_count(), 2);
        assert!(compositor.finished_accumulation());
        assert_eq!(compositor.current_target_index(), 0);
    }

    #[test]
    fn test_first_reduction_copies_instead_of_averaging() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 4);

        assert!(!passes
            .ops
            .iter()
            .any(|op| matches!(op, Op::Average(_, _, _, _))));
        // The merge is a self-blend copy of pool[0] into the accumulator.
        assert_eq!(
            passes.ops.last(),
            Some(&Op::Blend(
                TargetId::Pool(0),
                TargetId::Pool(0),
                TargetId::Accumulator
            ))
        );
    }

    #[test]
    fn test_second_reduction_averages_with_batch_count() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 8);

        let averages: Vec<_> = passes
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Average(a, b, dest, count) => Some((*a, *b, *dest, *count)),
                _ => None,
            })
            .collect();
        assert_eq!(
            averages,
            vec![(
                TargetId::Pool(1),
                TargetId::Pool(0),
                TargetId::Accumulator,
                2
            )]
        );
    }

    #[test]
    fn test_average_divisor_is_never_below_two() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 40);

        for op in &passes.ops {
            if let Op::Average(_, _, _, count) = op {
                assert!(*count >= 2, "average invoked with divisor {count}");
            }
        }
    }

    #[test]
    fn test_reduction_pair_order() {
        let mut compositor = Compositor::new(8);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 8);

        let pairs: Vec<_> = passes
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Blend(TargetId::Pool(a), TargetId::Pool(b), TargetId::Accumulator)
                    if a != b =>
                {
                    Some((*a, *b))
                }
                _ => None,
            })
            .collect();
        // half = 4: step 2, pairs offset 1; half = 2: step 4, pairs offset 2.
        assert_eq!(pairs, vec![(0, 1), (2, 3), (4, 5), (6, 7), (0, 2), (4, 6)]);
    }

    #[test]
    fn test_reduction_seeds_and_folds_baseline() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 4);

        let blends: Vec<_> = passes
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Blend(..)))
            .cloned()
            .collect();
        assert_eq!(
            blends.first(),
            Some(&Op::Blend(
                TargetId::Accumulator,
                TargetId::Accumulator,
                TargetId::Preview
            ))
        );
        assert!(blends.contains(&Op::Blend(
            TargetId::Preview,
            TargetId::Preview,
            TargetId::Pool(1)
        )));
    }

    #[test]
    fn test_drop_results_is_idempotent() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 6);
        assert!(compositor.finished_accumulation());

        compositor.drop_results(&mut passes);
        let after_first = (
            compositor.current_target_index(),
            compositor.accumulation_count(),
            compositor.finished_accumulation(),
        );
        compositor.drop_results(&mut passes);
        let after_second = (
            compositor.current_target_index(),
            compositor.accumulation_count(),
            compositor.finished_accumulation(),
        );

        assert_eq!(after_first, (0, 1, false));
        assert_eq!(after_second, after_first);
    }

    #[test]
    fn test_drop_clears_pool_and_accumulator() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        compositor.drop_results(&mut passes);
        assert_eq!(
            passes.ops,
            vec![
                Op::Clear(TargetId::Pool(0)),
                Op::Clear(TargetId::Pool(1)),
                Op::Clear(TargetId::Pool(2)),
                Op::Clear(TargetId::Pool(3)),
                Op::Clear(TargetId::Accumulator),
            ]
        );
    }

    #[test]
    fn test_drop_signal_consumed_before_fill() {
        let mut compositor = Compositor::new(4);
        let mut passes = RecordingPasses::default();

        run_ticks(&mut compositor, &mut passes, 3);
        passes.ops.clear();

        compositor.render(true, &mut passes).unwrap();

        // The reset happens first, then the tick refills slot 0.
        assert_eq!(passes.ops[0], Op::Clear(TargetId::Pool(0)));
        assert!(passes
            .ops
            .contains(&Op::Trace(TargetId::Pool(0), TargetId::Pool(3))));
        assert_eq!(compositor.current_target_index(), 1);
        assert_eq!(compositor.accumulation_count(), 1);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_rejects_non_power_of_two_pool() {
        Compositor::new(6);
    }
}
