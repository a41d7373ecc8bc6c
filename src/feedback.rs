//! User-confirmed accuracy bookkeeping.
//!
//! The ratio reflects what the user reported, not a ground-truth check.

/// Answer to "was the prediction correct?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// Running counters for the current session; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccuracyTracker {
    total_predictions: u32,
    correct_predictions: u32,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_predictions(&self) -> u32 {
        self.total_predictions
    }

    pub fn correct_predictions(&self) -> u32 {
        self.correct_predictions
    }

    /// Count one answered prediction.
    pub fn record(&mut self, feedback: Feedback) {
        self.total_predictions = self.total_predictions.saturating_add(1);
        if feedback == Feedback::Correct {
            self.correct_predictions = self.correct_predictions.saturating_add(1);
        }
    }

    /// `correct / total * 100`, or `None` before the first answer.
    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.total_predictions == 0 {
            return None;
        }
        Some(f64::from(self.correct_predictions) / f64::from(self.total_predictions) * 100.0)
    }

    /// Two-decimal percentage, `N/A` before the first answer.
    pub fn accuracy_text(&self) -> String {
        match self.accuracy_percent() {
            Some(percent) => format!("{percent:.2}%"),
            None => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_before_first_answer() {
        let tracker = AccuracyTracker::new();
        assert_eq!(tracker.accuracy_percent(), None);
        assert_eq!(tracker.accuracy_text(), "N/A");
    }

    #[test]
    fn no_then_yes_gives_half() {
        let mut tracker = AccuracyTracker::new();
        tracker.record(Feedback::Incorrect);
        assert_eq!(tracker.total_predictions(), 1);
        assert_eq!(tracker.correct_predictions(), 0);
        assert_eq!(tracker.accuracy_text(), "0.00%");

        tracker.record(Feedback::Correct);
        assert_eq!(tracker.total_predictions(), 2);
        assert_eq!(tracker.correct_predictions(), 1);
        assert_eq!(tracker.accuracy_text(), "50.00%");
    }

    #[test]
    fn ratio_matches_counts() {
        for total in 1..=40u32 {
            for correct in 0..=total {
                let mut tracker = AccuracyTracker::new();
                for i in 0..total {
                    tracker.record(if i < correct {
                        Feedback::Correct
                    } else {
                        Feedback::Incorrect
                    });
                }
                let expected = f64::from(correct) / f64::from(total) * 100.0;
                assert_eq!(tracker.accuracy_percent(), Some(expected));
            }
        }
    }

    #[test]
    fn formats_two_decimals() {
        let mut tracker = AccuracyTracker::new();
        tracker.record(Feedback::Correct);
        tracker.record(Feedback::Incorrect);
        tracker.record(Feedback::Incorrect);
        assert_eq!(tracker.accuracy_text(), "33.33%");
    }
}
