// src/session/sim.rs
//
// Simulated sensor for tests. Implements the transport, opener and registry
// seams over one shared state so a test can plug and unplug ports, script
// what the device says, and inspect everything the host wrote.
//
// Scripted lines model bytes that arrive after the host acts, so buffer
// resets are recorded but do not discard them.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::io::{LinkError, PortOpener, PortRegistry, Transport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    Open(String),
    Write(String, String),
    ResetInput(String),
    ResetOutput(String),
    Close(String),
}

#[derive(Default)]
struct SimState {
    present: BTreeSet<String>,
    inbound: HashMap<String, VecDeque<String>>,
    unopenable: HashSet<String>,
    stuck_buffers: HashSet<String>,
    events: Vec<SimEvent>,
    open: usize,
}

#[derive(Clone, Default)]
pub struct SimDevice {
    state: Arc<Mutex<SimState>>,
}

impl SimDevice {
    pub fn new(ports: &[&str]) -> Self {
        let device = Self::default();
        for port in ports {
            device.plug(port);
        }
        device
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn plug(&self, port: &str) {
        self.lock().present.insert(port.to_string());
    }

    /// Remove the port. Open transports on it start failing.
    pub fn unplug(&self, port: &str) {
        let mut state = self.lock();
        state.present.remove(port);
        state.inbound.remove(port);
    }

    /// Port shows up in the registry but refuses to open.
    pub fn refuse_open(&self, port: &str) {
        self.lock().unopenable.insert(port.to_string());
    }

    /// Buffer resets on `port` fail while reads and writes keep working.
    pub fn refuse_resets(&self, port: &str) {
        self.lock().stuck_buffers.insert(port.to_string());
    }

    /// Queue a line the device will send on `port`.
    pub fn say(&self, port: &str, line: &str) {
        self.lock()
            .inbound
            .entry(port.to_string())
            .or_default()
            .push_back(line.to_string());
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.lock().events.clone()
    }

    /// Lines the host wrote to `port`, without terminators.
    pub fn written(&self, port: &str) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Write(p, text) if p == port => Some(text.clone()),
                _ => None,
            })
            .flat_map(|text| {
                text.split_terminator('\n')
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    pub fn open_transports(&self) -> usize {
        self.lock().open
    }

    /// Open a transport without going through presence checks.
    pub fn transport(&self, port: &str) -> Box<dyn Transport> {
        let mut state = self.lock();
        state.open += 1;
        state.events.push(SimEvent::Open(port.to_string()));
        Box::new(SimTransport {
            port_id: port.to_string(),
            device: self.clone(),
        })
    }
}

impl PortOpener for SimDevice {
    fn open(&self, port: &str) -> Result<Box<dyn Transport>, LinkError> {
        {
            let state = self.lock();
            if !state.present.contains(port) {
                return Err(LinkError::connection(port, "no such device"));
            }
            if state.unopenable.contains(port) {
                return Err(LinkError::connection(port, "access denied"));
            }
        }
        Ok(self.transport(port))
    }
}

impl PortRegistry for SimDevice {
    fn candidates(&self) -> Result<Vec<String>, LinkError> {
        Ok(self.lock().present.iter().cloned().collect())
    }
}

struct SimTransport {
    port_id: String,
    device: SimDevice,
}

impl SimTransport {
    fn ensure_present(&self, state: &SimState) -> Result<(), LinkError> {
        if state.present.contains(&self.port_id) {
            Ok(())
        } else {
            Err(LinkError::read(&self.port_id, "device unplugged"))
        }
    }
}

impl Transport for SimTransport {
    fn port_id(&self) -> &str {
        &self.port_id
    }

    fn read_line(&mut self) -> Result<Option<String>, LinkError> {
        let mut state = self.device.lock();
        self.ensure_present(&state)?;
        Ok(state
            .inbound
            .get_mut(&self.port_id)
            .and_then(|lines| lines.pop_front()))
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut state = self.device.lock();
        if !state.present.contains(&self.port_id) {
            return Err(LinkError::write(&self.port_id, "device unplugged"));
        }
        let text = String::from_utf8_lossy(bytes).into_owned();
        state.events.push(SimEvent::Write(self.port_id.clone(), text));
        Ok(())
    }

    fn reset_input(&mut self) -> Result<(), LinkError> {
        let mut state = self.device.lock();
        self.ensure_present(&state)?;
        state.events.push(SimEvent::ResetInput(self.port_id.clone()));
        Ok(())
    }

    fn reset_output(&mut self) -> Result<(), LinkError> {
        let mut state = self.device.lock();
        self.ensure_present(&state)?;
        if state.stuck_buffers.contains(&self.port_id) {
            return Err(LinkError::write(&self.port_id, "buffer reset refused"));
        }
        state.events.push(SimEvent::ResetOutput(self.port_id.clone()));
        Ok(())
    }
}

impl Drop for SimTransport {
    fn drop(&mut self) {
        let mut state = self.device.lock();
        state.open = state.open.saturating_sub(1);
        state.events.push(SimEvent::Close(self.port_id.clone()));
    }
}
