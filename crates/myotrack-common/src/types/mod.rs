//! Common types used across Myotrack

use serde::{Deserialize, Serialize};

use crate::error::MyotrackError;

/// One field of a sample row.
///
/// The declaration order is the canonical column order used by the store,
/// the API series, and spreadsheet validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Timestamp,
    Emg1,
    Emg2,
    Emg3,
    Emg4,
    Angle,
}

impl Column {
    /// Every field of a sample, in canonical order
    pub const ALL: [Column; 6] = [
        Column::Timestamp,
        Column::Emg1,
        Column::Emg2,
        Column::Emg3,
        Column::Emg4,
        Column::Angle,
    ];

    /// The signal channels summarized by the report layer (everything except the timestamp)
    pub const CHANNELS: [Column; 5] = [
        Column::Emg1,
        Column::Emg2,
        Column::Emg3,
        Column::Emg4,
        Column::Angle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::Emg1 => "emg1",
            Column::Emg2 => "emg2",
            Column::Emg3 => "emg3",
            Column::Emg4 => "emg4",
            Column::Angle => "angle",
        }
    }

    /// Position of this column in [`Column::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Column {
    type Err = MyotrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| MyotrackError::UnknownColumn(s.to_string()))
    }
}

/// One timestamped observation: four EMG amplitudes and a joint angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: i64,
    pub emg1: i64,
    pub emg2: i64,
    pub emg3: i64,
    pub emg4: i64,
    pub angle: i64,
}

impl Sample {
    pub fn new(timestamp: i64, emg1: i64, emg2: i64, emg3: i64, emg4: i64, angle: i64) -> Self {
        Self {
            timestamp,
            emg1,
            emg2,
            emg3,
            emg4,
            angle,
        }
    }

    /// Build a sample from values laid out in [`Column::ALL`] order
    pub fn from_values(values: [i64; 6]) -> Self {
        let [timestamp, emg1, emg2, emg3, emg4, angle] = values;
        Self::new(timestamp, emg1, emg2, emg3, emg4, angle)
    }

    pub fn get(&self, column: Column) -> i64 {
        match column {
            Column::Timestamp => self.timestamp,
            Column::Emg1 => self.emg1,
            Column::Emg2 => self.emg2,
            Column::Emg3 => self.emg3,
            Column::Emg4 => self.emg4,
            Column::Angle => self.angle,
        }
    }
}

/// A value per signal channel, serialized as `{"emg1": .., ..., "angle": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelValues<T> {
    pub emg1: T,
    pub emg2: T,
    pub emg3: T,
    pub emg4: T,
    pub angle: T,
}

impl<T> ChannelValues<T> {
    /// Build channel values by evaluating `f` once per channel
    pub fn from_fn(mut f: impl FnMut(Column) -> T) -> Self {
        Self {
            emg1: f(Column::Emg1),
            emg2: f(Column::Emg2),
            emg3: f(Column::Emg3),
            emg4: f(Column::Emg4),
            angle: f(Column::Angle),
        }
    }

    /// Value for a channel; `None` for the timestamp column
    pub fn get(&self, column: Column) -> Option<&T> {
        match column {
            Column::Timestamp => None,
            Column::Emg1 => Some(&self.emg1),
            Column::Emg2 => Some(&self.emg2),
            Column::Emg3 => Some(&self.emg3),
            Column::Emg4 => Some(&self.emg4),
            Column::Angle => Some(&self.angle),
        }
    }
}
