use rand::Rng;

/// Per-instance placement and tint.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InstanceRecord {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
    /// Straight RGBA in `[0, 1]`.
    pub color: [f32; 4],
}

impl InstanceRecord {
    pub const SCALE_RANGE: (f32, f32) = (0.2, 0.5);
    pub const OFFSET_RANGE: (f32, f32) = (-0.9, 0.9);

    /// Draws one record: a uniform scale in `[0.2, 0.5]`, an offset in
    /// `[-0.9, 0.9]²` and an opaque color.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let (smin, smax) = Self::SCALE_RANGE;
        let (omin, omax) = Self::OFFSET_RANGE;

        let s = rng.gen_range(smin..=smax);
        let offset = [rng.gen_range(omin..=omax), rng.gen_range(omin..=omax)];
        let color = [
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            1.0,
        ];

        Self { scale: [s, s], offset, color }
    }

    pub fn is_within_ranges(&self) -> bool {
        let (smin, smax) = Self::SCALE_RANGE;
        let (omin, omax) = Self::OFFSET_RANGE;
        self.scale.iter().all(|s| (smin..=smax).contains(s))
            && self.offset.iter().all(|o| (omin..=omax).contains(o))
            && self.color.iter().all(|c| (0.0..=1.0).contains(c))
    }
}
