#![cfg(all(target_os = "windows", feature = "win_sensors"))]

use crate::{
    Backend, Channel, ChannelHandle, Error, ProviderInfo, RawSample, Result, SampleStream,
    SamplingRate, SensorProvider,
};
use futures_util::{StreamExt, stream};
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use windows::Devices::Sensors::{Accelerometer, Gyrometer, OrientationSensor};

const POLL_FLOOR: Duration = Duration::from_millis(16);
const STANDARD_GRAVITY: f64 = 9.80665;

/// WinRT default sensors. Proximity needs a device id lookup and is not
/// offered.
pub struct WinSensors {
    available: Vec<Channel>,
}

impl WinSensors {
    pub async fn open() -> Result<Self> {
        let available: Vec<Channel> = Channel::ALL
            .into_iter()
            .filter(|&c| WinSensor::default_for(c).is_some())
            .collect();
        if available.is_empty() {
            return Err(Error::Backend("win: no motion sensors".into()));
        }
        Ok(Self { available })
    }
}

enum WinSensor {
    Accel(Accelerometer),
    Gyro(Gyrometer),
    Orientation(OrientationSensor),
}

impl WinSensor {
    fn default_for(channel: Channel) -> Option<Self> {
        match channel {
            Channel::Accelerometer => Accelerometer::GetDefault().ok().map(WinSensor::Accel),
            Channel::Gyroscope => Gyrometer::GetDefault().ok().map(WinSensor::Gyro),
            Channel::RotationVector => OrientationSensor::GetDefault().ok().map(WinSensor::Orientation),
            Channel::Proximity => None,
        }
    }

    // Converted to SI units: m/s² and rad/s.
    fn read(&self) -> Option<RawSample> {
        match self {
            WinSensor::Accel(s) => {
                let r = s.GetCurrentReading().ok()?;
                let g = [r.AccelerationX().ok()?, r.AccelerationY().ok()?, r.AccelerationZ().ok()?];
                Some(RawSample::new(
                    Channel::Accelerometer,
                    g.map(|v| (v * STANDARD_GRAVITY) as f32),
                ))
            }
            WinSensor::Gyro(s) => {
                let r = s.GetCurrentReading().ok()?;
                let dps = [
                    r.AngularVelocityX().ok()?,
                    r.AngularVelocityY().ok()?,
                    r.AngularVelocityZ().ok()?,
                ];
                Some(RawSample::new(
                    Channel::Gyroscope,
                    dps.map(|v| v.to_radians() as f32),
                ))
            }
            WinSensor::Orientation(s) => {
                let q = s.GetCurrentReading().ok()?.Quaternion().ok()?;
                Some(RawSample::new(
                    Channel::RotationVector,
                    [q.X().ok()?, q.Y().ok()?, q.Z().ok()?, q.W().ok()?],
                ))
            }
        }
    }
}

impl SensorProvider for WinSensors {
    fn channel(&self, kind: Channel) -> Result<ChannelHandle> {
        if !self.available.contains(&kind) {
            return Err(Error::ChannelUnavailable(kind));
        }
        Ok(ChannelHandle {
            channel: kind,
            name: format!("Windows {}", kind.label()),
            id: "default".into(),
        })
    }

    fn subscribe(&self, handle: &ChannelHandle, rate: SamplingRate) -> SampleStream {
        let channel = handle.channel;
        let period = rate.poll_period(POLL_FLOOR);
        // Sensor and timer are acquired on first poll.
        stream::once(async move {
            let Some(sensor) = WinSensor::default_for(channel) else {
                log::warn!("win: {channel:?} disappeared");
                return stream::empty().boxed();
            };
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            IntervalStream::new(interval)
                .filter_map(move |_| {
                    let sample = sensor.read();
                    async move { sample }
                })
                .boxed()
        })
        .flatten()
        .boxed()
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            backend: Backend::Windows,
            note: "win_sensors",
        }
    }
}
