use nalgebra::Point3;

/// Atom positions of one snapshot, indexed by atom index.
pub type Frame = Vec<Point3<f64>>;

/// An ordered sequence of coordinate frames for a [`Structure`](super::structure::Structure).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

/// How a trajectory is subsampled: every `step`-th snapshot, `frame_count` in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampling {
    pub step: usize,
    pub frame_count: usize,
}

impl FrameSampling {
    /// Computes the sampling that keeps at most `limit` of `snapshots` frames.
    ///
    /// The step is 1 when everything fits, otherwise `ceil(snapshots / limit)`; the
    /// resulting frame count is `ceil(snapshots / step)`. A limit of zero disables
    /// reduction.
    pub fn new(snapshots: usize, limit: usize) -> Self {
        let step = if limit == 0 || snapshots <= limit {
            1
        } else {
            snapshots.div_ceil(limit)
        };
        Self {
            step,
            frame_count: snapshots.div_ceil(step),
        }
    }
}

impl Trajectory {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns a deterministic, frame-subsampled view of the first `snapshots` frames.
    pub fn reduced(&self, snapshots: usize, limit: usize) -> ReducedTrajectory<'_> {
        let snapshots = snapshots.min(self.frames.len());
        ReducedTrajectory {
            source: self,
            snapshots,
            sampling: FrameSampling::new(snapshots, limit),
        }
    }
}

/// A borrowed, subsampled view over a [`Trajectory`].
#[derive(Debug, Clone, Copy)]
pub struct ReducedTrajectory<'a> {
    source: &'a Trajectory,
    snapshots: usize,
    sampling: FrameSampling,
}

impl<'a> ReducedTrajectory<'a> {
    pub fn sampling(&self) -> FrameSampling {
        self.sampling
    }

    pub fn len(&self) -> usize {
        self.sampling.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.sampling.frame_count == 0
    }

    pub fn frames(&self) -> impl Iterator<Item = &'a Frame> + 'a {
        self.source
            .frames
            .iter()
            .take(self.snapshots)
            .step_by(self.sampling.step)
    }
}
