//! # Coherent Noise Field
//!
//! 2D/3D simplex noise over a permutation table shuffled from a
//! [`SeededRng`] stream.
//!
//! ## Determinism guarantee
//!
//! Two fields built from the same stream position are bit-reproducible.
//! Values are continuous across integer lattice points, which is what keeps
//! terrain and resource thresholds seam-free at chunk boundaries: every
//! chunk samples the same field at absolute world coordinates.

use crate::rng::SeededRng;

/// 512-entry permutation table (256 entries doubled for overflow handling).
struct PermutationTable {
    perm: [u8; 512],
}

impl PermutationTable {
    /// Builds a table by Fisher-Yates shuffling with the given stream.
    fn new(rng: &mut SeededRng) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }
        for i in (1..256).rev() {
            let j = rng.next_below(i + 1);
            perm.swap(i, j);
        }
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }
        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }
}

/// 2D gradients: vertices of a 12-gon.
const GRAD2: [[i8; 2]; 12] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
    [1, 0],
    [0, 1],
    [-1, 0],
    [0, -1],
];

/// 3D gradients: the 12 edge midpoints of a cube.
const GRAD3: [[i8; 3]; 12] = [
    [1, 1, 0],
    [-1, 1, 0],
    [1, -1, 0],
    [-1, -1, 0],
    [1, 0, 1],
    [-1, 0, 1],
    [1, 0, -1],
    [-1, 0, -1],
    [0, 1, 1],
    [0, -1, 1],
    [0, 1, -1],
    [0, -1, -1],
];

/// Deterministic 2D/3D coherent noise function.
///
/// Output is approximately `[-1, 1]` and continuous everywhere.
pub struct NoiseField {
    table: PermutationTable,
}

impl NoiseField {
    /// Skewing factor for the 2D simplex grid: `(sqrt(3) - 1) / 2`.
    const F2: f64 = 0.366_025_403_784_439;
    /// Unskewing factor for the 2D simplex grid: `(3 - sqrt(3)) / 6`.
    const G2: f64 = 0.211_324_865_405_187;
    /// Skewing factor for the 3D simplex grid.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for the 3D simplex grid.
    const G3: f64 = 1.0 / 6.0;

    /// Builds a field, consuming values from the stream to shuffle the
    /// permutation table.
    #[must_use]
    pub fn new(rng: &mut SeededRng) -> Self {
        Self {
            table: PermutationTable::new(rng),
        }
    }

    /// Samples 2D noise at the given coordinates. Returns a value in
    /// approximately `[-1, 1]`.
    #[must_use]
    pub fn noise2(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Which triangle of the skewed cell are we in?
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let gi0 = self.table.get(ii + self.table.get(jj) as usize);
        let gi1 = self
            .table
            .get(ii + i1 as usize + self.table.get(jj + j1 as usize) as usize);
        let gi2 = self.table.get(ii + 1 + self.table.get(jj + 1) as usize);

        let n0 = corner2(x0, y0, gi0);
        let n1 = corner2(x1, y1, gi1);
        let n2 = corner2(x2, y2, gi2);

        // 70.0 normalizes the sum into [-1, 1]
        70.0 * (n0 + n1 + n2)
    }

    /// Samples 3D noise at the given coordinates. Returns a value in
    /// approximately `[-1, 1]`.
    #[must_use]
    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = f64::from(i + j + k) * Self::G3;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);
        let z0 = z - (f64::from(k) - unskew);

        // Rank the offsets to pick the simplex (tetrahedron) we fall in.
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - f64::from(i1) + Self::G3;
        let y1 = y0 - f64::from(j1) + Self::G3;
        let z1 = z0 - f64::from(k1) + Self::G3;
        let x2 = x0 - f64::from(i2) + 2.0 * Self::G3;
        let y2 = y0 - f64::from(j2) + 2.0 * Self::G3;
        let z2 = z0 - f64::from(k2) + 2.0 * Self::G3;
        let x3 = x0 - 1.0 + 3.0 * Self::G3;
        let y3 = y0 - 1.0 + 3.0 * Self::G3;
        let z3 = z0 - 1.0 + 3.0 * Self::G3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;

        let gi0 = self
            .table
            .get(ii + self.table.get(jj + self.table.get(kk) as usize) as usize);
        let gi1 = self.table.get(
            ii + i1 as usize
                + self
                    .table
                    .get(jj + j1 as usize + self.table.get(kk + k1 as usize) as usize)
                    as usize,
        );
        let gi2 = self.table.get(
            ii + i2 as usize
                + self
                    .table
                    .get(jj + j2 as usize + self.table.get(kk + k2 as usize) as usize)
                    as usize,
        );
        let gi3 = self
            .table
            .get(ii + 1 + self.table.get(jj + 1 + self.table.get(kk + 1) as usize) as usize);

        let n0 = corner3(x0, y0, z0, gi0);
        let n1 = corner3(x1, y1, z1, gi1);
        let n2 = corner3(x2, y2, z2, gi2);
        let n3 = corner3(x3, y3, z3, gi3);

        // 32.0 normalizes the sum into [-1, 1]
        32.0 * (n0 + n1 + n2 + n3)
    }
}

/// Contribution from one corner of a 2D simplex.
#[inline]
fn corner2(x: f64, y: f64, gradient_index: u8) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let grad = GRAD2[(gradient_index % 12) as usize];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
    }
}

/// Contribution from one corner of a 3D simplex.
#[inline]
fn corner3(x: f64, y: f64, z: f64, gradient_index: u8) -> f64 {
    let t = 0.6 - x * x - y * y - z * z;
    if t < 0.0 {
        0.0
    } else {
        let grad = GRAD3[(gradient_index % 12) as usize];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]) + z * f64::from(grad[2]))
    }
}

/// Fast floor, avoiding `f64::floor` in the hot sampling path.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}
