//! Saddle-point (KKT) system: factorize once per step, back-substitute per RHS.
//!
//! Layout, with `n3 = 3N`, `k` constraint rows and 3 gauge rows `G`:
//!
//! ```text
//! [ A_bar  Cᵀ  Gᵀ ]
//! [ C      0   0  ]
//! [ G      0   0  ]
//! ```
//!
//! `G` holds the per-axis vertex mean. `A_bar` vanishes on translations and the
//! length constraints do not see them, so without `G` the matrix is singular.

use nalgebra::{DMatrix, DVector, Dyn, LU};

use super::{SolveStage, StepError};
use crate::sobolev::SobolevGram;

pub(crate) struct SaddleSystem {
    lu: LU<f64, Dyn, Dyn>,
    n3: usize,
    k: usize,
}

impl SaddleSystem {
    pub(crate) fn assemble(gram: &SobolevGram, c: &DMatrix<f64>) -> Result<Self, StepError> {
        let n3 = gram.dim();
        let n = n3 / 3;
        let k = c.nrows();
        let size = n3 + k + 3;
        let mut left = DMatrix::zeros(size, size);
        gram.write_into(&mut left);
        for row in 0..k {
            for col in 0..n3 {
                let v = c[(row, col)];
                left[(n3 + row, col)] = v;
                left[(col, n3 + row)] = v;
            }
        }
        let mean = 1.0 / n as f64;
        for axis in 0..3 {
            let row = n3 + k + axis;
            for p in 0..n {
                left[(row, 3 * p + axis)] = mean;
                left[(3 * p + axis, row)] = mean;
            }
        }
        let lu = left.lu();
        if !lu.is_invertible() {
            return Err(StepError::SingularSystem {
                stage: SolveStage::Factorize,
            });
        }
        Ok(Self { lu, n3, k })
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.n3 + self.k + 3
    }

    /// Displacement part of `Left⁻¹ [deriv; 0; 0]` (the unnegated direction).
    pub(crate) fn solve_gradient(&self, deriv: &DVector<f64>) -> Result<DVector<f64>, StepError> {
        let mut rhs = DVector::zeros(self.size());
        rhs.rows_mut(0, self.n3).copy_from(deriv);
        self.solve(rhs, SolveStage::Direction)
    }

    /// Displacement part of `Left⁻¹ [0; -r; 0]` (one Newton projection round).
    pub(crate) fn solve_correction(&self, residual: &DVector<f64>) -> Result<DVector<f64>, StepError> {
        let mut rhs = DVector::zeros(self.size());
        rhs.rows_mut(self.n3, self.k).copy_from(&(-residual));
        self.solve(rhs, SolveStage::Projection)
    }

    fn solve(&self, rhs: DVector<f64>, stage: SolveStage) -> Result<DVector<f64>, StepError> {
        let x = self
            .lu
            .solve(&rhs)
            .filter(|x| x.iter().all(|v| v.is_finite()))
            .ok_or(StepError::SingularSystem { stage })?;
        Ok(x.rows(0, self.n3).into_owned())
    }
}
