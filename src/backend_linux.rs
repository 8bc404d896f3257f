#![cfg(all(target_os = "linux", feature = "linux_iio_sys"))]

use crate::{
    Backend, Channel, ChannelHandle, Error, ProviderInfo, RawSample, Result, SampleStream,
    SamplingRate, SensorProvider,
};
use futures_util::{StreamExt, stream};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;

const IIO_DEVICES: &str = "/sys/bus/iio/devices/iio:device*";
const POLL_FLOOR: Duration = Duration::from_millis(10);

const PROXIMITY_VALUE: &[&str] = &[
    "in_proximity_raw",
    "in_proximity_input",
    "in_proximity0_raw",
    "in_proximity0_input",
];
const PROXIMITY_SCALE: &[&str] = &["in_proximity_scale", "in_proximity0_scale"];
const QUATERNION_VALUE: &[&str] = &["in_rot_quaternion_raw"];
const QUATERNION_SCALE: &[&str] = &["in_rot_quaternion_scale"];

/// Industrial I/O sensors read straight from sysfs. The first device that
/// exposes a channel wins.
pub struct LinuxIio {
    found: BTreeMap<Channel, ChannelHandle>,
}

impl LinuxIio {
    pub async fn open() -> Result<Self> {
        Self::scan(IIO_DEVICES)
    }

    fn scan(pattern: &str) -> Result<Self> {
        let devices = glob::glob(pattern).map_err(|e| Error::Backend(format!("linux: {e}")))?;
        let mut found = BTreeMap::new();
        for dev in devices.flatten() {
            for c in Channel::ALL {
                if found.contains_key(&c) || !has_channel(&dev, c) {
                    continue;
                }
                let handle = ChannelHandle {
                    channel: c,
                    name: device_name(&dev),
                    id: dev.display().to_string(),
                };
                log::debug!("linux iio: {c:?} on {} [{}]", handle.name, handle.id);
                found.insert(c, handle);
            }
        }
        if found.is_empty() {
            return Err(Error::Backend("linux: no iio sensors in /sys".into()));
        }
        Ok(Self { found })
    }
}

impl SensorProvider for LinuxIio {
    fn channel(&self, kind: Channel) -> Result<ChannelHandle> {
        self.found
            .get(&kind)
            .cloned()
            .ok_or(Error::ChannelUnavailable(kind))
    }

    fn subscribe(&self, handle: &ChannelHandle, rate: SamplingRate) -> SampleStream {
        let dev = PathBuf::from(&handle.id);
        let channel = handle.channel;
        let period = rate.poll_period(POLL_FLOOR);
        // Timer is built on first poll, so subscribing needs no runtime.
        stream::once(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            IntervalStream::new(interval)
        })
        .flatten()
        .filter_map(move |_| {
            // unreadable ticks are skipped
            let sample = read_sample(&dev, channel);
            async move { sample }
        })
        .boxed()
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            backend: Backend::LinuxIio,
            note: "linux_iio_sys",
        }
    }
}

// ==== helpers ====

fn has_channel(dev: &Path, channel: Channel) -> bool {
    match channel {
        Channel::Accelerometer => has_triplet(dev, "accel"),
        Channel::Gyroscope => has_triplet(dev, "anglvel"),
        Channel::Proximity => first_existing(dev, PROXIMITY_VALUE).is_some(),
        Channel::RotationVector => first_existing(dev, QUATERNION_VALUE).is_some(),
    }
}

fn read_sample(dev: &Path, channel: Channel) -> Option<RawSample> {
    let values = match channel {
        Channel::Accelerometer => read_triplet(dev, "accel")?.to_vec(),
        Channel::Gyroscope => read_triplet(dev, "anglvel")?.to_vec(),
        Channel::Proximity => vec![read_scaled(dev, PROXIMITY_VALUE, PROXIMITY_SCALE)?],
        Channel::RotationVector => read_quaternion(dev)?.to_vec(),
    };
    Some(RawSample::new(channel, values))
}

fn device_name(dev: &Path) -> String {
    fs::read_to_string(dev.join("name"))
        .map(|s| s.trim().to_owned())
        .unwrap_or_else(|_| "iio device".into())
}

fn first_existing<S: AsRef<str>>(base: &Path, names: &[S]) -> Option<PathBuf> {
    names
        .iter()
        .map(|n| base.join(n.as_ref()))
        .find(|p| p.exists())
}

fn read_f32(p: &Path) -> Option<f32> {
    fs::read_to_string(p).ok()?.trim().parse::<f32>().ok()
}

fn axis_names(kind: &str, axis: char) -> [String; 2] {
    [format!("in_{kind}_{axis}_raw"), format!("in_{kind}_{axis}_input")]
}

fn has_triplet(dev: &Path, kind: &str) -> bool {
    ['x', 'y', 'z']
        .into_iter()
        .all(|a| first_existing(dev, &axis_names(kind, a)).is_some())
}

// `*_input` files are already in SI units; only `*_raw` takes the scale.
fn read_scaled<S: AsRef<str>>(dev: &Path, value: &[S], scale: &[S]) -> Option<f32> {
    let p = first_existing(dev, value)?;
    let v = read_f32(&p)?;
    if p.to_string_lossy().ends_with("_input") {
        return Some(v);
    }
    // Some drivers expose no scale; default to 1.0 if absent.
    let s = first_existing(dev, scale).and_then(|p| read_f32(&p)).unwrap_or(1.0);
    Some(v * s)
}

fn read_triplet(dev: &Path, kind: &str) -> Option<[f32; 3]> {
    let mut out = [0.0f32; 3];
    for (slot, axis) in out.iter_mut().zip(['x', 'y', 'z']) {
        let scale = [format!("in_{kind}_scale"), format!("in_{kind}_{axis}_scale")];
        *slot = read_scaled(dev, &axis_names(kind, axis), &scale)?;
    }
    Some(out)
}

// hid-sensor-rotation packs "x y z w" into one file.
fn read_quaternion(dev: &Path) -> Option<[f32; 4]> {
    let p = first_existing(dev, QUATERNION_VALUE)?;
    let raw = fs::read_to_string(p).ok()?;
    let parts: Vec<f32> = raw
        .split_whitespace()
        .map(|t| t.parse::<f32>().ok())
        .collect::<Option<_>>()?;
    let [x, y, z, w] = <[f32; 4]>::try_from(parts).ok()?;
    let scale = first_existing(dev, QUATERNION_SCALE)
        .and_then(|p| read_f32(&p))
        .unwrap_or(1.0);
    let q = [x * scale, y * scale, z * scale, w * scale];
    let n = q.iter().map(|v| v * v).sum::<f32>().sqrt();
    if n < 1e-6 {
        return None;
    }
    Some(q.map(|v| v / n))
}
