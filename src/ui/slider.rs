use rust_decimal::prelude::*;

/// Keyboard-driven threshold control. Every value it produces lies in `[0, max]`.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdSlider {
    steps: u32,
}

impl ThresholdSlider {
    pub fn new(steps: u32) -> Self {
        Self { steps: steps.max(1) }
    }

    pub fn step_size(&self, max: Decimal) -> Decimal {
        max / Decimal::from(self.steps)
    }

    /// Moves `current` by `steps` increments and pins the result to the control's range.
    pub fn nudge(&self, current: Decimal, max: Decimal, steps: i64) -> Decimal {
        let moved = current + self.step_size(max) * Decimal::from(steps);
        bound(moved, max)
    }

    pub fn minimum(&self) -> Decimal {
        Decimal::ZERO
    }

    pub fn maximum(&self, max: Decimal) -> Decimal {
        bound(max, max)
    }

    /// Fill fraction for the gauge widget, always within `[0, 1]`.
    pub fn ratio(&self, current: Decimal, max: Decimal) -> f64 {
        if max <= Decimal::ZERO {
            return 0.0;
        }
        (current / max).to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
    }
}

fn bound(value: Decimal, max: Decimal) -> Decimal {
    value.min(max).max(Decimal::ZERO)
}
