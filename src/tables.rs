// LOG/EXP lookup tables: 32 curves each, 64 samples wide, antisymmetric through the origin.

const NUM_EXPONENTS: usize = 32;
const HALF_ENTRIES: usize = 32;

/// One family of 32 antisymmetric curves, each spanning `x ∈ [-1, 1]` in 64 samples.
pub struct LookupFamily {
    tables: Vec<Vec<f64>>,
}

impl LookupFamily {
    fn from_halves(halves: Vec<Vec<f64>>) -> Self {
        let tables = halves
            .into_iter()
            .map(|positive_half| {
                let negated_mirror: Vec<f64> =
                    positive_half.iter().rev().map(|&y| -y).collect();
                let mut full = negated_mirror;
                full.extend(positive_half);
                full
            })
            .collect();
        LookupFamily { tables }
    }

    pub fn log() -> Self {
        let halves = (0..NUM_EXPONENTS).map(log_half).collect();
        Self::from_halves(halves)
    }

    pub fn exp() -> Self {
        let halves = (0..NUM_EXPONENTS).map(exp_half).collect();
        Self::from_halves(halves)
    }

    pub fn table(&self, exponent: usize) -> Option<&[f64]> {
        self.tables.get(exponent).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// `x^(1/e)` for `x = i/(HALF_ENTRIES-1)`. `e = 0` is given an explicit flat curve
/// instead of leaning on `powf`'s behavior at an exponent it was never designed for.
fn log_half(exponent: usize) -> Vec<f64> {
    if exponent == 0 {
        return vec![0.0; HALF_ENTRIES];
    }
    let step = 1.0 / (HALF_ENTRIES - 1) as f64;
    (0..HALF_ENTRIES)
        .map(|i| (i as f64 * step).powf(1.0 / exponent as f64))
        .collect()
}

/// `x^e` for `x = i/(HALF_ENTRIES-1)`. `e = 0` yields the constant-1 curve, which is
/// well defined for `powf` at every sample including zero.
fn exp_half(exponent: usize) -> Vec<f64> {
    let step = 1.0 / (HALF_ENTRIES - 1) as f64;
    (0..HALF_ENTRIES)
        .map(|i| (i as f64 * step).powf(exponent as f64))
        .collect()
}

/// Linear interpolation of `x` within `[x_min, x_max]` against `table`.
pub fn interpolate(x: f64, table: &[f64], x_min: f64, x_max: f64) -> f64 {
    let step = (x_max - x_min) / (table.len() - 1) as f64;
    let index = (((x - x_min) / step) as isize).clamp(0, table.len() as isize - 2) as usize;
    let x1 = x_min + index as f64 * step;
    let y1 = table[index];
    let y2 = table[index + 1];
    (y2 - y1) / step * (x - x1) + y1
}
