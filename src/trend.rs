use error_stack::{Report, bail};

use crate::error::AnalysisError;
use crate::model::{RefinedSwingPoint, SwingLabel, Trend};

pub const DEFAULT_REQUIRED_SETS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Accumulator for one classification pass.
#[derive(Debug, Default)]
struct TrendState {
    active_direction: Option<Direction>,
    consecutive_set_count: usize,
}

impl TrendState {
    fn push(&mut self, direction: Direction) {
        if self.active_direction == Some(direction) {
            self.consecutive_set_count += 1;
        } else {
            self.active_direction = Some(direction);
            self.consecutive_set_count = 1;
        }
    }
}

/// Classify a pair of adjacent swings. Both must be Higher (either kind) for an up
/// set, or both Lower for a down set; anything involving Initial is undefined.
fn classify_set(current: &RefinedSwingPoint, next: &RefinedSwingPoint) -> Option<Direction> {
    match (current.label, next.label) {
        (SwingLabel::Higher, SwingLabel::Higher) => Some(Direction::Up),
        (SwingLabel::Lower, SwingLabel::Lower) => Some(Direction::Down),
        _ => None,
    }
}

/// Confirms a trend once enough consecutive same-direction sets are seen.
///
/// The scan stops at the first confirmation, so later swings never override an earlier
/// confirmed trend.
#[derive(Debug, Clone)]
pub struct TrendClassifier {
    required_sets: usize,
}

impl TrendClassifier {
    pub fn new(required_sets: usize) -> Result<Self, Report<AnalysisError>> {
        if required_sets == 0 {
            bail!(AnalysisError::InvalidParameter {
                name: "required_sets must be > 0".into(),
            });
        }
        Ok(Self { required_sets })
    }

    pub fn classify(&self, swings: &[RefinedSwingPoint]) -> Trend {
        let mut state = TrendState::default();

        for pair in swings.windows(2) {
            let Some(direction) = classify_set(&pair[0], &pair[1]) else {
                continue;
            };
            state.push(direction);

            if state.consecutive_set_count >= self.required_sets {
                return match direction {
                    Direction::Up => Trend::Uptrend,
                    Direction::Down => Trend::Downtrend,
                };
            }
        }

        Trend::NoClearTrend
    }
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            required_sets: DEFAULT_REQUIRED_SETS,
        }
    }
}
