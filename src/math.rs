use bevy::math::{Vec2, Vec3};

use crate::config::MAX_BLUR_RADIUS;

pub type Real = f32;

/// Taps in the widest blur kernel (radius 3 => 7 taps)
pub const MAX_BLUR_TAPS: usize = 2 * MAX_BLUR_RADIUS as usize + 1;

/// Radial brush falloff: 1 at the center, 0 at and beyond `radius`,
/// shaped as `(1 - d / radius)^falloff`.
#[inline(always)]
pub fn brush_weight(distance: Real, radius: Real, falloff: Real) -> Real {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    (1.0 - distance / radius).max(0.0).powf(falloff.max(0.0))
}

/// Normalized 1D Gaussian weights for offsets `-radius..=radius`.
///
/// Entry `k + radius` holds the weight of offset `k`; unused entries are 0.
pub fn gaussian_kernel(radius: u32, sigma: Real) -> [Real; MAX_BLUR_TAPS] {
    let radius = radius.min(MAX_BLUR_RADIUS) as i32;
    let sigma = sigma.max(crate::config::MIN_BLUR_SIGMA);
    let mut weights = [0.0; MAX_BLUR_TAPS];

    let mut sum = 0.0;
    for k in -radius..=radius {
        let w = (-((k * k) as Real) / (2.0 * sigma * sigma)).exp();
        weights[(k + radius) as usize] = w;
        sum += w;
    }
    for w in weights.iter_mut() {
        *w /= sum;
    }
    weights
}

/// Y-up surface normal from a height gradient (dh/dx, dh/dy) in grid space.
#[inline(always)]
pub fn normal_from_gradient(gradient: Vec2) -> Vec3 {
    Vec3::new(-gradient.x, 1.0, -gradient.y).normalize_or(Vec3::Y)
}
