//! Constant-velocity Kalman filter over image position.
//!
//! State `[x, y, vx, vy]`, measurement `[x, y]`. Process and measurement
//! noise are identity matrices scaled by the configured variances.

use crate::config::KalmanConfig;
use glam::{Mat2, Mat4, Vec2, Vec4};

#[derive(Debug, Clone)]
pub struct ConstantVelocityFilter {
    state: Vec4,
    covariance: Mat4,
    transition: Mat4,
    process_noise: f32,
    measurement_noise: f32,
    initial_covariance: f32,
}

impl ConstantVelocityFilter {
    pub fn new(config: &KalmanConfig) -> Self {
        // Column-major: x += vx, y += vy.
        let transition = Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::new(1.0, 0.0, 1.0, 0.0), Vec4::new(0.0, 1.0, 0.0, 1.0));
        Self {
            state: Vec4::ZERO,
            covariance: Mat4::IDENTITY * config.initial_covariance,
            transition,
            process_noise: config.process_noise,
            measurement_noise: config.measurement_noise,
            initial_covariance: config.initial_covariance,
        }
    }

    /// Restart at `position` with zero velocity.
    pub fn reset(&mut self, position: Vec2) {
        self.state = Vec4::new(position.x, position.y, 0.0, 0.0);
        self.covariance = Mat4::IDENTITY * self.initial_covariance;
    }

    /// Advance one frame. Returns the predicted position.
    pub fn predict(&mut self) -> Vec2 {
        self.state = self.transition * self.state;
        self.covariance = self.transition * self.covariance * self.transition.transpose()
            + Mat4::IDENTITY * self.process_noise;
        self.position()
    }

    /// Fold in a position measurement. Returns the corrected position.
    pub fn correct(&mut self, measurement: Vec2) -> Vec2 {
        let p = self.covariance;
        let innovation = measurement - self.position();
        // S = H P H^T + R, with H selecting the position rows.
        let s = Mat2::from_cols_array(&[
            p.col(0).x + self.measurement_noise,
            p.col(0).y,
            p.col(1).x,
            p.col(1).y + self.measurement_noise,
        ]);
        if s.determinant().abs() <= f32::EPSILON {
            return self.position();
        }
        let s_inv = s.inverse();
        // K = P H^T S^-1, a 4x2 matrix stored as two columns.
        let k0 = p.col(0) * s_inv.col(0).x + p.col(1) * s_inv.col(0).y;
        let k1 = p.col(0) * s_inv.col(1).x + p.col(1) * s_inv.col(1).y;

        self.state += k0 * innovation.x + k1 * innovation.y;
        let kh = Mat4::from_cols(k0, k1, Vec4::ZERO, Vec4::ZERO);
        self.covariance = (Mat4::IDENTITY - kh) * p;
        self.position()
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.state.x, self.state.y)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.state.z, self.state.w)
    }

    pub fn covariance(&self) -> &Mat4 {
        &self.covariance
    }
}
