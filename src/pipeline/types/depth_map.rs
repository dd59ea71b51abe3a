/// Row-major grid of normalized depth values in `[0, 1]`, larger meaning nearer.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl DepthMap {
    /// Wraps values that are already normalized. Returns `None` when the
    /// buffer does not match the dimensions.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || values.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    /// Min-max normalizes raw network output into `[0, 1]`. A flat map has no
    /// relative depth information and normalizes to all zeros.
    pub fn from_raw(width: usize, height: usize, raw: &[f32]) -> Option<Self> {
        let (min, max) = raw
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let span = max - min;
        let values = raw
            .iter()
            .map(|v| if span > f32::EPSILON { (v - min) / span } else { 0.0 })
            .collect();
        Self::new(width, height, values)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }

    /// Mean over the half-open pixel rectangle `[x0, x1) × [y0, y1)`.
    pub fn mean_in(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> Option<f32> {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        let mut sum = 0.0f64;
        for y in y0..y1 {
            let row = &self.values[y * self.width + x0..y * self.width + x1];
            sum += row.iter().map(|v| f64::from(*v)).sum::<f64>();
        }
        let count = ((x1 - x0) * (y1 - y0)) as f64;
        Some((sum / count) as f32)
    }
}
