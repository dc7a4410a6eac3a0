use crate::model::{RefinedSwingPoint, SwingKind, SwingLabel, SwingPoint};

/// The most recent price seen for each swing kind.
///
/// The two trackers never interact: a High only moves `last_high`.
#[derive(Debug, Clone, Copy, Default)]
struct LastSeen {
    last_high: Option<f64>,
    last_low: Option<f64>,
}

impl LastSeen {
    fn tracker(&mut self, kind: SwingKind) -> &mut Option<f64> {
        match kind {
            SwingKind::High => &mut self.last_high,
            SwingKind::Low => &mut self.last_low,
        }
    }

    /// Label `price` against the tracker for `kind`, then record it.
    fn observe(&mut self, kind: SwingKind, price: f64) -> SwingLabel {
        let tracker = self.tracker(kind);
        let label = match *tracker {
            None => SwingLabel::Initial,
            Some(previous) if price > previous => SwingLabel::Higher,
            Some(_) => SwingLabel::Lower,
        };
        *tracker = Some(price);
        label
    }
}

/// Label each swing as Initial, Higher or Lower relative to the previous swing of the
/// same kind. Input must be in chronological order; output keeps that order.
pub fn refine<I>(swings: I) -> Vec<RefinedSwingPoint>
where
    I: IntoIterator<Item = SwingPoint>,
{
    let (_, refined) = swings.into_iter().fold(
        (LastSeen::default(), Vec::new()),
        |(mut seen, mut refined), swing| {
            let label = seen.observe(swing.kind, swing.price);
            refined.push(RefinedSwingPoint::from_swing(swing, label));
            (seen, refined)
        },
    );
    refined
}
