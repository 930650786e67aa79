//! Zoom gestures translated into rescale requests
//!
//! Capturing the gesture is the host's job; this maps what it captured to
//! the `(ratio, is_relative)` pair the rescale controller expects.

/// Multiplicative step for one zoom-out notch
pub const DEFAULT_SCALE_STEP: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomCommand {
    In,
    Out,
    /// Back to each page's default ratio
    Reset,
    /// Ctrl + wheel; positive `detail` zooms out
    Wheel { detail: i32 },
}

impl ZoomCommand {
    /// Key codes browsers report for ctrl/meta zoom shortcuts
    pub fn from_key_code(key_code: u32) -> Option<Self> {
        match key_code {
            // '=' / '+'
            61 | 107 | 187 => Some(Self::In),
            // '-'
            173 | 109 | 189 => Some(Self::Out),
            // '0'
            48 => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn rescale_args(self, scale_step: f64) -> (f64, bool) {
        match self {
            Self::In => (1.0 / scale_step, true),
            Self::Out => (scale_step, true),
            Self::Reset => (0.0, false),
            Self::Wheel { detail } => (scale_step.powi(detail), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_map_to_commands() {
        for code in [61, 107, 187] {
            assert_eq!(ZoomCommand::from_key_code(code), Some(ZoomCommand::In));
        }
        for code in [173, 109, 189] {
            assert_eq!(ZoomCommand::from_key_code(code), Some(ZoomCommand::Out));
        }
        assert_eq!(ZoomCommand::from_key_code(48), Some(ZoomCommand::Reset));
        assert_eq!(ZoomCommand::from_key_code(65), None);
    }

    #[test]
    fn rescale_args_follow_scale_step() {
        let (ratio, relative) = ZoomCommand::In.rescale_args(DEFAULT_SCALE_STEP);
        assert!((ratio - 1.0 / 0.9).abs() < 1e-12);
        assert!(relative);

        assert_eq!(ZoomCommand::Out.rescale_args(0.8), (0.8, true));
        assert_eq!(ZoomCommand::Reset.rescale_args(0.8), (0.0, false));

        let (wheel, relative) = ZoomCommand::Wheel { detail: 3 }.rescale_args(0.5);
        assert_eq!(wheel, 0.125);
        assert!(relative);

        let (wheel_in, _) = ZoomCommand::Wheel { detail: -2 }.rescale_args(0.5);
        assert_eq!(wheel_in, 4.0);
    }
}
