use serde::{Deserialize, Serialize};

/// Closeness bucket of a ranked guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proximity {
    Perfect,
    VeryClose,
    Close,
    Far,
    VeryFar,
}

impl Proximity {
    /// Rank 0 is perfect, then under 25, under 50 and under 500
    pub fn from_rank(rank: u32) -> Self {
        match rank {
            0 => Proximity::Perfect,
            1..=24 => Proximity::VeryClose,
            25..=49 => Proximity::Close,
            50..=499 => Proximity::Far,
            _ => Proximity::VeryFar,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Proximity::Perfect => "Perfecte!",
            Proximity::VeryClose => "Molt a prop",
            Proximity::Close => "A prop",
            Proximity::Far => "Llunyà",
            Proximity::VeryFar => "Molt llunyà",
        }
    }

    /// Hex colour used when rendering the bucket
    pub fn colour(&self) -> &'static str {
        match self {
            Proximity::Perfect | Proximity::VeryClose => "#4caf50",
            Proximity::Close => "#ffc107",
            Proximity::Far => "#ff9800",
            Proximity::VeryFar => "#f44336",
        }
    }
}

/// Fraction of the progress bar to fill for a rank, on a logarithmic scale
/// so differences among the closest words stay visible.
pub fn progress_fraction(rank: u32, total_words: u32) -> f64 {
    if rank == 0 {
        return 1.0;
    }
    if total_words <= 1 {
        return 0.0;
    }

    let fraction = 1.0 - (f64::from(rank) + 1.0).ln() / f64::from(total_words).ln();
    fraction.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(Proximity::from_rank(0), Proximity::Perfect);
        assert_eq!(Proximity::from_rank(1), Proximity::VeryClose);
        assert_eq!(Proximity::from_rank(24), Proximity::VeryClose);
        assert_eq!(Proximity::from_rank(25), Proximity::Close);
        assert_eq!(Proximity::from_rank(49), Proximity::Close);
        assert_eq!(Proximity::from_rank(50), Proximity::Far);
        assert_eq!(Proximity::from_rank(499), Proximity::Far);
        assert_eq!(Proximity::from_rank(500), Proximity::VeryFar);
    }

    #[test]
    fn test_labels_and_colours() {
        assert_eq!(Proximity::from_rank(0).label(), "Perfecte!");
        assert_eq!(Proximity::from_rank(30).label(), "A prop");
        assert_eq!(Proximity::from_rank(30).colour(), "#ffc107");
        assert_eq!(Proximity::from_rank(9000).colour(), "#f44336");
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(0, 1000), 1.0);
        assert_eq!(progress_fraction(5, 1), 0.0);

        let close = progress_fraction(1, 1000);
        let far = progress_fraction(500, 1000);
        assert!(close > far);
        assert!(far > 0.0);

        // Ranks beyond the vocabulary clamp at zero
        assert_eq!(progress_fraction(5000, 1000), 0.0);
    }
}
