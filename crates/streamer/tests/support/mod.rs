//! Scripted USB bus for streamer tests
//!
//! Candidates and handles record everything done to them on a shared
//! [`MockBus`]; write failures are scripted by global write sequence number.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use streamer::usb::device::{
    DeviceIdentity, PANEL_DEVICE_CLASS, PANEL_PRODUCT_ID, PANEL_VENDOR_ID, UsbCandidate, UsbHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbEvent {
    Opened,
    Claimed(u8),
    Released(u8),
    Write {
        endpoint: u8,
        data: Vec<u8>,
        timeout: Duration,
        failed: bool,
    },
    Closed,
}

#[derive(Default)]
struct BusState {
    events: Vec<UsbEvent>,
    writes: usize,
    write_failures: HashMap<usize, rusb::Error>,
}

/// Event log shared by every handle opened from it
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the write with global sequence number `seq` (0-based)
    pub fn fail_write(&self, seq: usize, error: rusb::Error) {
        self.state.lock().unwrap().write_failures.insert(seq, error);
    }

    pub fn events(&self) -> Vec<UsbEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Every write attempt, including failed ones
    pub fn writes(&self) -> Vec<(Vec<u8>, bool)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UsbEvent::Write { data, failed, .. } => Some((data, failed)),
                _ => None,
            })
            .collect()
    }

    /// Timeout passed to every write attempt, in order
    pub fn write_timeouts(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UsbEvent::Write { timeout, .. } => Some(timeout),
                _ => None,
            })
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn count(&self, wanted: &UsbEvent) -> usize {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| *event == wanted)
            .count()
    }

    fn record(&self, event: UsbEvent) {
        self.state.lock().unwrap().events.push(event);
    }

    /// A candidate on this bus that looks like the panel
    pub fn panel(&self) -> MockCandidate {
        self.candidate(panel_identity(1, 4))
    }

    pub fn candidate(&self, identity: DeviceIdentity) -> MockCandidate {
        MockCandidate {
            bus: self.clone(),
            identity: Ok(identity),
            open_error: None,
            claim_error: None,
        }
    }
}

pub fn panel_identity(bus_number: u8, address: u8) -> DeviceIdentity {
    DeviceIdentity {
        vendor_id: PANEL_VENDOR_ID,
        product_id: PANEL_PRODUCT_ID,
        class_code: PANEL_DEVICE_CLASS,
        bus_number,
        address,
    }
}

pub struct MockCandidate {
    bus: MockBus,
    identity: Result<DeviceIdentity, rusb::Error>,
    open_error: Option<rusb::Error>,
    claim_error: Option<rusb::Error>,
}

impl MockCandidate {
    pub fn with_descriptor_error(mut self, error: rusb::Error) -> Self {
        self.identity = Err(error);
        self
    }

    pub fn with_open_error(mut self, error: rusb::Error) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn with_claim_error(mut self, error: rusb::Error) -> Self {
        self.claim_error = Some(error);
        self
    }
}

impl UsbCandidate for MockCandidate {
    type Handle = MockHandle;

    fn identity(&self) -> Result<DeviceIdentity, rusb::Error> {
        self.identity
    }

    fn open(&self) -> Result<MockHandle, rusb::Error> {
        if let Some(e) = self.open_error {
            return Err(e);
        }
        self.bus.record(UsbEvent::Opened);
        Ok(MockHandle {
            bus: self.bus.clone(),
            claim_error: self.claim_error,
        })
    }
}

pub struct MockHandle {
    bus: MockBus,
    claim_error: Option<rusb::Error>,
}

impl UsbHandle for MockHandle {
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        if let Some(e) = self.claim_error {
            return Err(e);
        }
        self.bus.record(UsbEvent::Claimed(interface));
        Ok(())
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.bus.record(UsbEvent::Released(interface));
        Ok(())
    }

    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> Result<usize, rusb::Error> {
        let mut state = self.bus.state.lock().unwrap();
        let seq = state.writes;
        state.writes += 1;
        let failure = state.write_failures.get(&seq).copied();
        state.events.push(UsbEvent::Write {
            endpoint,
            data: buf.to_vec(),
            timeout,
            failed: failure.is_some(),
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.bus.record(UsbEvent::Closed);
    }
}
