//! Host-facing gain control.

use neurosat_core::AtomicFloat;

/// Normalized gain knob shared between the control and audio threads.
///
/// Always within `[0, 1]`; the processor rescales it once per block.
#[derive(Debug, Default)]
pub struct GainParameter {
    value: AtomicFloat,
}

impl GainParameter {
    pub fn new(normalized: f32) -> Self {
        Self {
            value: AtomicFloat::new(sanitize(normalized)),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.get()
    }

    /// Store a new value, clamped to `[0, 1]`. NaN is stored as 0.
    #[inline]
    pub fn set(&self, normalized: f32) {
        self.value.set(sanitize(normalized));
    }
}

#[inline]
fn sanitize(normalized: f32) -> f32 {
    if normalized.is_nan() {
        0.0
    } else {
        normalized.clamp(0.0, 1.0)
    }
}
