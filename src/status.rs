//! # Height Interpretation
//!
//! Maps a tide or wave height to a canned status via an ordered threshold
//! ladder. Every ladder is a list of `(upper_bound, status)` pairs plus a
//! `top` status: the first band with `height < upper_bound` wins, anything
//! at or above the last bound gets `top`. Bands are therefore half-open
//! `[previous, upper)` intervals and the mapping is total over the reals.
//!
//! ## Ladders
//!
//! | Ladder          | Bands (metres)                                      |
//! |-----------------|-----------------------------------------------------|
//! | [`SANDBAR`]     | `< 0.30` open · `< 0.70` passable · closed          |
//! | [`BEACH`]       | `< 0.80` wide · `< 1.20` narrow · closed            |
//! | [`SEA`]         | `< 0.50` calm · `< 1.00` light · `< 1.50` choppy · rough |

/// Ordered threshold bands for one landmark.
#[derive(Debug, Clone, Copy)]
pub struct Ladder<T: 'static> {
    /// `(upper_bound, status)` pairs in ascending bound order
    pub bands: &'static [(f64, T)],
    /// Status for heights at or above the last bound
    pub top: T,
}

impl<T: Copy + 'static> Ladder<T> {
    /// Classify a height; first matching band wins.
    ///
    /// NaN never compares below a bound and lands in `top`, the most
    /// conservative status on every ladder.
    pub fn classify(&self, height: f64) -> T {
        self.bands
            .iter()
            .find(|(upper, _)| height < *upper)
            .map(|(_, status)| *status)
            .unwrap_or(self.top)
    }

    /// True when bounds are strictly ascending and finite.
    pub fn is_ordered(&self) -> bool {
        self.bands.iter().all(|(upper, _)| upper.is_finite())
            && self.bands.windows(2).all(|w| w[0].0 < w[1].0)
    }
}

/// Tidal sandbar path between the islands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandbarStatus {
    Open,
    Passable,
    Closed,
}

/// Beach strip along the sandbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeachStatus {
    Wide,
    Narrow,
    Closed,
}

/// Open-sea wave conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeaState {
    Calm,
    Light,
    Choppy,
    Rough,
}

pub const SANDBAR: Ladder<SandbarStatus> = Ladder {
    bands: &[(0.30, SandbarStatus::Open), (0.70, SandbarStatus::Passable)],
    top: SandbarStatus::Closed,
};

pub const BEACH: Ladder<BeachStatus> = Ladder {
    bands: &[(0.80, BeachStatus::Wide), (1.20, BeachStatus::Narrow)],
    top: BeachStatus::Closed,
};

pub const SEA: Ladder<SeaState> = Ladder {
    bands: &[
        (0.50, SeaState::Calm),
        (1.00, SeaState::Light),
        (1.50, SeaState::Choppy),
    ],
    top: SeaState::Rough,
};

pub fn sandbar_status(height: f64) -> SandbarStatus {
    SANDBAR.classify(height)
}

pub fn beach_status(height: f64) -> BeachStatus {
    BEACH.classify(height)
}

pub fn sea_state(wave_height: f64) -> SeaState {
    SEA.classify(wave_height)
}

impl SandbarStatus {
    pub fn label(self) -> &'static str {
        match self {
            SandbarStatus::Open => "✅ Open, dry crossing",
            SandbarStatus::Passable => "⚠️ Passable, expect wet feet",
            SandbarStatus::Closed => "⛔ Closed, under water",
        }
    }
}

impl BeachStatus {
    pub fn label(self) -> &'static str {
        match self {
            BeachStatus::Wide => "🏖 Wide beach",
            BeachStatus::Narrow => "🌊 Narrow strip",
            BeachStatus::Closed => "⛔ Beach covered",
        }
    }
}

impl SeaState {
    pub fn label(self) -> &'static str {
        match self {
            SeaState::Calm => "😎 Calm",
            SeaState::Light => "🙂 Light chop",
            SeaState::Choppy => "😬 Choppy",
            SeaState::Rough => "🌪 Rough",
        }
    }
}
