//! Text slots mirrored from the latest sample of each channel.

use crate::orientation::rotation_degrees;
use crate::{Channel, RawSample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ===== Sink =====

/// Where formatted readings and user notifications go.
pub trait DisplaySink {
    /// Replace the text of `channel`'s slot.
    fn set_text(&mut self, channel: Channel, text: String);
    /// Show a transient message to the user.
    fn notify(&mut self, message: &str);
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    fn set_text(&mut self, channel: Channel, text: String) {
        (**self).set_text(channel, text)
    }
    fn notify(&mut self, message: &str) {
        (**self).notify(message)
    }
}

// ===== Formatting =====

/// Renders one sample the way its slot displays it.
pub fn format_sample(sample: &RawSample) -> String {
    let v = sample.values();
    match sample.channel {
        Channel::Proximity => format!("proxy value : {}", float_text(v[0])),
        Channel::Gyroscope => format!("gyro value : {}", float_text(v[0])),
        Channel::RotationVector => {
            format!(" rotation value : {}", float_text(rotation_degrees(v)))
        }
        Channel::Accelerometer => format!(
            "X : {}, Y : {}, Z : {}",
            float_text(v[0]),
            float_text(v[1]),
            float_text(v[2])
        ),
    }
}

/// Shortest text that reads back as `v`, always with a fractional digit.
/// Magnitudes outside [1e-3, 1e7) switch to `<mantissa>E<exponent>`, e.g.
/// `1.0E-5` or `1.5E8`.
pub fn float_text(v: f32) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    let a = v.abs();
    if a == 0.0 || (1e-3..1e7).contains(&a) {
        let mut s = v.to_string();
        if !s.contains('.') {
            s.push_str(".0");
        }
        return s;
    }
    let sci = format!("{v:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exp}")
    } else {
        format!("{mantissa}.0E{exp}")
    }
}

fn placeholder(channel: Channel) -> String {
    let zeros = match channel {
        Channel::RotationVector => vec![0.0, 0.0, 0.0, 1.0],
        c => vec![0.0; *c.arity().start()],
    };
    format_sample(&RawSample::new(channel, zeros))
}

// ===== State =====

/// Presentation-owned state: one slot per channel plus the notifications
/// shown so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    slots: BTreeMap<Channel, String>,
    notifications: Vec<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayState {
    pub fn new() -> Self {
        Self {
            slots: Channel::ALL.iter().map(|&c| (c, placeholder(c))).collect(),
            notifications: Vec::new(),
        }
    }

    pub fn text(&self, channel: Channel) -> &str {
        self.slots.get(&channel).map(String::as_str).unwrap_or_default()
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// Label and text of every channel, in panel order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for c in Channel::ALL {
            out.push_str(c.label());
            out.push_str("\n  ");
            out.push_str(self.text(c));
            out.push('\n');
        }
        out
    }
}

impl DisplaySink for DisplayState {
    fn set_text(&mut self, channel: Channel, text: String) {
        self.slots.insert(channel, text);
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_channel() {
        let s = RawSample::new(Channel::Accelerometer, [1.0, 2.0, 3.0]);
        assert_eq!(format_sample(&s), "X : 1.0, Y : 2.0, Z : 3.0");
        let s = RawSample::new(Channel::Proximity, [5.0]);
        assert_eq!(format_sample(&s), "proxy value : 5.0");
        let s = RawSample::new(Channel::Gyroscope, [0.25, 9.0, 9.0]);
        assert_eq!(format_sample(&s), "gyro value : 0.25");
        let s = RawSample::new(Channel::RotationVector, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(format_sample(&s), " rotation value : 0.0");
    }

    #[test]
    fn tiny_and_huge_values_use_exponent_form() {
        assert_eq!(float_text(5.0), "5.0");
        assert_eq!(float_text(0.001), "0.001");
        assert_eq!(float_text(1234567.0), "1234567.0");
        assert_eq!(float_text(-0.0), "-0.0");
        assert_eq!(float_text(1e-5), "1.0E-5");
        assert_eq!(float_text(1.5e-4), "1.5E-4");
        assert_eq!(float_text(1e8), "1.0E8");
        assert_eq!(float_text(-2.5e7), "-2.5E7");
        assert_eq!(float_text(f32::NAN), "NaN");
        assert_eq!(float_text(f32::NEG_INFINITY), "-Infinity");

        let s = RawSample::new(Channel::Gyroscope, [1e-5, 0.0, 0.0]);
        assert_eq!(format_sample(&s), "gyro value : 1.0E-5");
        let s = RawSample::new(Channel::Accelerometer, [1e8, 0.5, -9.81]);
        assert_eq!(format_sample(&s), "X : 1.0E8, Y : 0.5, Z : -9.81");
    }

    #[test]
    fn starts_with_zero_readings() {
        let d = DisplayState::new();
        assert_eq!(d.text(Channel::Proximity), "proxy value : 0.0");
        assert_eq!(d.text(Channel::Gyroscope), "gyro value : 0.0");
        assert_eq!(d.text(Channel::RotationVector), " rotation value : 0.0");
        assert_eq!(d.text(Channel::Accelerometer), "X : 0.0, Y : 0.0, Z : 0.0");
        assert!(d.notifications().is_empty());
    }

    #[test]
    fn set_text_only_touches_its_slot() {
        let mut d = DisplayState::new();
        let before = d.clone();
        d.set_text(Channel::Gyroscope, "gyro value : 1.5".into());
        assert_eq!(d.text(Channel::Gyroscope), "gyro value : 1.5");
        for c in [Channel::Proximity, Channel::RotationVector, Channel::Accelerometer] {
            assert_eq!(d.text(c), before.text(c));
        }
    }

    #[test]
    fn render_lists_channels_in_order() {
        let out = DisplayState::new().render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "Proximity Sensor");
        assert_eq!(lines[1], "  proxy value : 0.0");
        assert_eq!(lines[6], "Accelerometer Sensor");
    }

    #[test]
    fn snapshot_is_json() {
        let mut d = DisplayState::new();
        d.notify("Sensor not found");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["slots"]["Proximity"], "proxy value : 0.0");
        assert_eq!(json["notifications"][0], "Sensor not found");
        let back: DisplayState = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
