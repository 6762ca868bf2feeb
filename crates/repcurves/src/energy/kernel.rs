//! Tangent-point kernel `k(d, T) = |T × d|^α / |d|^β` and its partial gradients.

use crate::curve::Vec3;

/// Shape parameters of the tangent-point energy (`alpha > 1`, `beta > alpha`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TangentPointKernel {
    pub alpha: f64,
    pub beta: f64,
}

impl TangentPointKernel {
    #[inline]
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Fractional Sobolev order `σ = (β - 1) / α` of the matching metric.
    #[inline]
    pub fn sobolev_order(&self) -> f64 {
        (self.beta - 1.0) / self.alpha
    }

    /// `|c|^(α-2)`, taken as 0 when `c = 0` so `|c|^(α-2) c` stays finite for `1 < α < 2`.
    #[inline]
    fn cross_pow(&self, c2: f64) -> f64 {
        if c2 > 0.0 {
            c2.powf(0.5 * (self.alpha - 2.0))
        } else {
            0.0
        }
    }

    /// Kernel value for the point difference `d = p - q` and tangent `t` at `p`.
    #[inline]
    pub fn value(&self, d: &Vec3, t: &Vec3) -> f64 {
        let c2 = t.cross(d).norm_squared();
        c2.powf(0.5 * self.alpha) * d.norm_squared().powf(-0.5 * self.beta)
    }

    /// Gradient with respect to `d`, `t` held fixed.
    ///
    /// `∇_d k = α|c|^(α-2)|d|^(-β) (c × t) - β|c|^α |d|^(-β-2) d`, with `c = t × d`.
    #[inline]
    pub fn grad_d(&self, d: &Vec3, t: &Vec3) -> Vec3 {
        let c = t.cross(d);
        let c2 = c.norm_squared();
        let d2 = d.norm_squared();
        let d_pow = d2.powf(-0.5 * self.beta);
        c.cross(t) * (self.alpha * self.cross_pow(c2) * d_pow)
            - d * (self.beta * c2.powf(0.5 * self.alpha) * d_pow / d2)
    }

    /// Gradient with respect to `t`, `d` held fixed: `α|c|^(α-2)|d|^(-β) (d × c)`.
    #[inline]
    pub fn grad_t(&self, d: &Vec3, t: &Vec3) -> Vec3 {
        let c = t.cross(d);
        let c2 = c.norm_squared();
        d.cross(&c) * (self.alpha * self.cross_pow(c2) * d.norm_squared().powf(-0.5 * self.beta))
    }
}
