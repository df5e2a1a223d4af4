//! DeviceDirectory - concurrent device map
//!
//! Safe for simultaneous reads and writes from any number of callers. The
//! scheduler and processors only ever work on cloned snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::Device;
use dashmap::DashMap;

/// Concurrent directory of devices keyed by device code
#[derive(Clone, Default)]
pub struct DeviceDirectory {
    devices: Arc<DashMap<String, Device>>,
}

impl DeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory seeded with devices
    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let directory = Self::new();
        for device in devices {
            directory.add_or_update(device);
        }
        directory
    }

    /// Insert or replace a device, returning the previous record
    pub fn add_or_update(&self, device: Device) -> Option<Device> {
        self.devices.insert(device.code.clone(), device)
    }

    pub fn get(&self, code: &str) -> Option<Device> {
        self.devices.get(code).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, code: &str) -> Option<Device> {
        self.devices.remove(code).map(|(_, device)| device)
    }

    /// Point-in-time copy of all devices, ordered by code
    pub fn snapshot(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .devices
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        devices.sort_by(|a, b| a.code.cmp(&b.code));
        devices
    }

    /// Devices matching a predicate, ordered by code
    pub fn filter<F>(&self, predicate: F) -> Vec<Device>
    where
        F: Fn(&Device) -> bool,
    {
        let mut devices: Vec<Device> = self
            .devices
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        devices.sort_by(|a, b| a.code.cmp(&b.code));
        devices
    }

    /// Record a heartbeat: the device comes back online
    ///
    /// Returns `false` for an unknown device.
    pub fn touch_heartbeat(&self, code: &str, at: DateTime<Utc>) -> bool {
        match self.devices.get_mut(code) {
            Some(mut entry) => {
                entry.offline = false;
                entry.last_heartbeat = Some(at);
                true
            }
            None => false,
        }
    }

    /// Flag a device offline; returns `false` for an unknown device
    pub fn mark_offline(&self, code: &str) -> bool {
        match self.devices.get_mut(code) {
            Some(mut entry) => {
                entry.offline = true;
                true
            }
            None => false,
        }
    }

    /// Keep only devices matching a predicate
    pub fn retain<F>(&self, predicate: F)
    where
        F: Fn(&Device) -> bool,
    {
        self.devices.retain(|_, device| predicate(device));
    }

    pub fn contains(&self, code: &str) -> bool {
        self.devices.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn clear(&self) {
        self.devices.clear();
    }
}
