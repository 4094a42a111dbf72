use serde::Serialize;

/// Temperature classes, in classification order.
///
/// Each band is bound to one material by the host; the core only needs a
/// stable, ordered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum TemperatureBand {
    Red = 0,
    LightBlue = 1,
    Green = 2,
    LightGreen = 3,
    Yellow = 4,
    Orange = 5,
    Blue = 6,
}

impl TemperatureBand {
    pub const COUNT: usize = 7;

    pub const ALL: [TemperatureBand; Self::COUNT] = [
        TemperatureBand::Red,
        TemperatureBand::LightBlue,
        TemperatureBand::Green,
        TemperatureBand::LightGreen,
        TemperatureBand::Yellow,
        TemperatureBand::Orange,
        TemperatureBand::Blue,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            TemperatureBand::Red => "Red",
            TemperatureBand::LightBlue => "LightBlue",
            TemperatureBand::Green => "Green",
            TemperatureBand::LightGreen => "LightGreen",
            TemperatureBand::Yellow => "Yellow",
            TemperatureBand::Orange => "Orange",
            TemperatureBand::Blue => "Blue",
        }
    }
}

impl std::fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a temperature to its band. Intervals are closed below, open above.
///
/// Total over `f32`: `-inf` lands in `Red`, `+inf` in `Blue`, and NaN fails
/// every comparison and falls through to the default `Blue`.
pub fn classify(temperature: f32) -> TemperatureBand {
    const UPPER_BOUNDS: [(f32, TemperatureBand); 6] = [
        (21.0, TemperatureBand::Red),
        (22.0, TemperatureBand::LightBlue),
        (23.0, TemperatureBand::Green),
        (24.0, TemperatureBand::LightGreen),
        (25.0, TemperatureBand::Yellow),
        (27.0, TemperatureBand::Orange),
    ];

    UPPER_BOUNDS
        .iter()
        .find(|(upper, _)| temperature < *upper)
        .map_or(TemperatureBand::Blue, |&(_, band)| band)
}
