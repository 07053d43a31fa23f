//! Externally owned input maps
//!
//! Boundary, bed depth, flow and external force are read-only inputs sampled
//! bilinearly in UV with clamp-to-edge addressing. Each is optional.

use std::ops::{Add, Mul};

use bevy::prelude::*;

use crate::config::WATER_THRESHOLD;
use crate::error::{Result, RippleError};

/// Texel types a [`SampledMap`] can interpolate.
pub trait MapTexel:
    Copy + Default + Send + Sync + Add<Output = Self> + Mul<f32, Output = Self>
{
}

impl<T> MapTexel for T where
    T: Copy + Default + Send + Sync + Add<Output = T> + Mul<f32, Output = T>
{
}

/// Row-major texel grid, texel (0, 0) at UV (0, 0)
#[derive(Clone, Debug, PartialEq)]
pub struct SampledMap<T: MapTexel> {
    width: u32,
    height: u32,
    texels: Vec<T>,
}

pub type ScalarMap = SampledMap<f32>;
pub type VectorMap = SampledMap<Vec2>;

impl<T: MapTexel> SampledMap<T> {
    pub fn new(width: u32, height: u32, texels: Vec<T>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RippleError::InvalidMapSize { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(RippleError::MapDataLength {
                width,
                height,
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Map with every texel set to `value`.
    pub fn uniform(width: u32, height: u32, value: T) -> Result<Self> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Build a map by evaluating `f` at every texel center UV.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(Vec2) -> T) -> Result<Self> {
        let size = Vec2::new(width as f32, height as f32);
        let texels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (Vec2::new(x as f32, y as f32) + 0.5) / size))
            .map(f)
            .collect();
        Self::new(width, height, texels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[T] {
        &self.texels
    }

    #[inline(always)]
    fn texel(&self, x: i32, y: i32) -> T {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.texels[y * self.width as usize + x]
    }

    /// Bilinear sample at `uv`, clamped to the edge texels.
    pub fn sample(&self, uv: Vec2) -> T {
        let position = uv * Vec2::new(self.width as f32, self.height as f32) - 0.5;
        let base = position.floor();
        let frac = position - base;
        let (x0, y0) = (base.x as i32, base.y as i32);

        let top = self.texel(x0, y0) * (1.0 - frac.x) + self.texel(x0 + 1, y0) * frac.x;
        let bottom = self.texel(x0, y0 + 1) * (1.0 - frac.x) + self.texel(x0 + 1, y0 + 1) * frac.x;
        top * (1.0 - frac.y) + bottom * frac.y
    }
}

/// Optional inputs consumed by the step kernel
#[derive(Clone, Debug, Default)]
pub struct AuxiliaryMaps {
    /// 1 = water, 0 = ground
    pub boundary: Option<ScalarMap>,
    /// Bed elevation in 0..1
    pub depth: Option<ScalarMap>,
    /// Advection vector per texel
    pub flow: Option<VectorMap>,
    /// Extra impulse added to brush force
    pub external_force: Option<ScalarMap>,
}

impl AuxiliaryMaps {
    /// All water when no boundary map is bound.
    #[inline]
    pub fn is_water(&self, uv: Vec2) -> bool {
        self.boundary
            .as_ref()
            .is_none_or(|map| map.sample(uv) >= WATER_THRESHOLD)
    }

    /// Flat bed (0) when no depth map is bound.
    #[inline]
    pub fn bed(&self, uv: Vec2) -> f32 {
        self.depth.as_ref().map_or(0.0, |map| map.sample(uv))
    }

    /// Zero flow when no flow map is bound.
    #[inline]
    pub fn flow(&self, uv: Vec2) -> Vec2 {
        self.flow.as_ref().map_or(Vec2::ZERO, |map| map.sample(uv))
    }

    #[inline]
    pub fn external_force(&self, uv: Vec2) -> f32 {
        self.external_force.as_ref().map_or(0.0, |map| map.sample(uv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_dimensions() {
        assert_eq!(
            ScalarMap::new(0, 4, Vec::new()),
            Err(RippleError::InvalidMapSize {
                width: 0,
                height: 4
            })
        );
        assert!(matches!(
            ScalarMap::new(2, 2, vec![0.0; 3]),
            Err(RippleError::MapDataLength {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_sample_hits_texel_centers() {
        let map = ScalarMap::new(2, 1, vec![0.0, 1.0]).unwrap();
        assert!((map.sample(Vec2::new(0.25, 0.5)) - 0.0).abs() < 1e-6);
        assert!((map.sample(Vec2::new(0.75, 0.5)) - 1.0).abs() < 1e-6);
        assert!((map.sample(Vec2::new(0.5, 0.5)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_clamps_outside() {
        let map = ScalarMap::new(2, 1, vec![0.25, 1.0]).unwrap();
        assert!((map.sample(Vec2::new(-3.0, 0.5)) - 0.25).abs() < 1e-6);
        assert!((map.sample(Vec2::new(4.0, 0.5)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_vector_map_interpolates() {
        let map = VectorMap::new(2, 1, vec![Vec2::ZERO, Vec2::new(2.0, -2.0)]).unwrap();
        let mid = map.sample(Vec2::new(0.5, 0.5));
        assert!((mid - Vec2::new(1.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_defaults_when_unbound() {
        let maps = AuxiliaryMaps::default();
        let uv = Vec2::splat(0.3);
        assert!(maps.is_water(uv));
        assert_eq!(maps.bed(uv), 0.0);
        assert_eq!(maps.flow(uv), Vec2::ZERO);
        assert_eq!(maps.external_force(uv), 0.0);
    }

    #[test]
    fn test_boundary_threshold() {
        let boundary = ScalarMap::from_fn(16, 16, |uv| if uv.x < 0.5 { 0.0 } else { 1.0 });
        let maps = AuxiliaryMaps {
            boundary: Some(boundary.unwrap()),
            ..Default::default()
        };
        assert!(!maps.is_water(Vec2::new(0.1, 0.5)));
        assert!(maps.is_water(Vec2::new(0.9, 0.5)));
    }
}
