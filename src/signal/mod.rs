// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Biometric signal acquisition and telemetry shaping.

pub mod packet;

pub use packet::TelemetryPacket;

use std::collections::BTreeMap;

use rand::Rng;

/// Headset electrode sites, in packet order.
pub const CHANNELS: [&str; 4] = ["AF7", "AF8", "TP9", "TP10"];

/// Reading range in microvolts. Noise for denied packets is drawn from the
/// same range so denied and exposed packets share a shape.
pub const READING_MIN_UV: f64 = 10.0;
pub const READING_MAX_UV: f64 = 100.0;

pub const DEFAULT_DEVICE_ID: &str = "CORTEX-BCI-001";

/// Channel name → reading. Ordered so every packet serializes identically.
pub type ChannelValues = BTreeMap<String, f64>;

pub trait SignalSource: Send + Sync {
    fn sample(&self) -> ChannelValues;
    fn device_id(&self) -> &str;
}

/// Simulated four-channel headset producing uniform readings.
#[derive(Clone, Debug)]
pub struct SimulatedHeadset {
    device_id: String,
}

impl SimulatedHeadset {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self { device_id: device_id.into() }
    }
}

impl Default for SimulatedHeadset {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_ID)
    }
}

impl SignalSource for SimulatedHeadset {
    fn sample(&self) -> ChannelValues {
        let mut rng = rand::thread_rng();
        uniform_frame(&mut rng)
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// One reading per channel, uniform over the reading range, 2 decimals.
pub fn uniform_frame<R: Rng + ?Sized>(rng: &mut R) -> ChannelValues {
    CHANNELS
        .iter()
        .map(|ch| (ch.to_string(), round2(rng.gen_range(READING_MIN_UV..=READING_MAX_UV))))
        .collect()
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MentalState {
    Stressed,
    Relaxed,
    Focused,
}

impl MentalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentalState::Stressed => "STRESSED",
            MentalState::Relaxed => "RELAXED",
            MentalState::Focused => "FOCUSED",
        }
    }
}

/// Mean voltage above 75 µV reads as stress, below 30 µV as relaxation.
pub fn infer_state(values: &ChannelValues) -> MentalState {
    if values.is_empty() {
        return MentalState::Focused;
    }
    let mean = values.values().sum::<f64>() / values.len() as f64;
    if mean > 75.0 {
        MentalState::Stressed
    } else if mean < 30.0 {
        MentalState::Relaxed
    } else {
        MentalState::Focused
    }
}
