use serde::{Deserialize, Serialize};
use std::{ops::RangeInclusive, time::Duration, time::Instant};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sensor not available: {0:?}")]
    ChannelUnavailable(Channel),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("no suitable backend available; tried: {tried:?}")]
    NoBackend { tried: Vec<Backend> },
}

/// Message shown once when `start` targets a sensor the device does not have.
pub const SENSOR_NOT_FOUND: &str = "Sensor not found";

// ===== Channels =====

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    Proximity,
    Gyroscope,
    RotationVector,
    Accelerometer,
}

impl Channel {
    /// Display order of the panel.
    pub const ALL: [Channel; 4] = [
        Channel::Proximity,
        Channel::Gyroscope,
        Channel::RotationVector,
        Channel::Accelerometer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Channel::Proximity => "Proximity Sensor",
            Channel::Gyroscope => "Gyro Scope",
            Channel::RotationVector => "Rotation Vector sensor",
            Channel::Accelerometer => "Accelerometer Sensor",
        }
    }

    /// Number of components a sample of this channel may carry.
    /// Gyroscopes may deliver all three axes; only the first is displayed.
    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            Channel::Proximity => 1..=1,
            Channel::Gyroscope => 1..=3,
            Channel::RotationVector => 4..=5,
            Channel::Accelerometer => 3..=3,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Channel::Proximity => 0,
            Channel::Gyroscope => 1,
            Channel::RotationVector => 2,
            Channel::Accelerometer => 3,
        }
    }
}

// ===== Samples =====

#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    pub channel: Channel,
    values: Vec<f32>,
    pub timestamp: Instant,
}

impl RawSample {
    /// Panics if `values` has the wrong length for `channel`; providers
    /// guarantee the shape per channel, so a mismatch is a bug.
    pub fn new(channel: Channel, values: impl Into<Vec<f32>>) -> Self {
        let values = values.into();
        assert!(
            channel.arity().contains(&values.len()),
            "{channel:?} sample must have {:?} components, got {}",
            channel.arity(),
            values.len()
        );
        Self {
            channel,
            values,
            timestamp: Instant::now(),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

// ===== Rates =====

/// Delivery rate hint handed to the provider on subscribe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SamplingRate {
    #[default]
    Normal,
    Ui,
    Game,
    /// As fast as the backend can deliver.
    Fastest,
    Every(Duration),
}

impl SamplingRate {
    /// Nominal delay between samples. `Fastest` has none.
    pub fn period(self) -> Duration {
        match self {
            SamplingRate::Normal => Duration::from_millis(200),
            SamplingRate::Ui => Duration::from_millis(60),
            SamplingRate::Game => Duration::from_millis(20),
            SamplingRate::Fastest => Duration::ZERO,
            SamplingRate::Every(d) => d,
        }
    }

    /// Period clamped to `floor`, for backends that have to poll.
    pub fn poll_period(self, floor: Duration) -> Duration {
        self.period().max(floor)
    }
}

// ===== Backends =====

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    LinuxIio,
    Windows,
    Mock,
}
