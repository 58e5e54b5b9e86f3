// crates/canopen-rs/tests/bus/mod.rs
//! A loopback CAN bus and device harness shared by the integration tests.

use canopen_rs::od::utils::new_device_default;
use canopen_rs::{
    CanFrame, CanInterface, CanOpenError, Emcy, NodeId, ObjectDictionary, Service,
    ServiceEvent, SyncService,
};

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Default)]
struct BusState {
    inboxes: HashMap<u8, VecDeque<CanFrame>>,
    /// Every frame put on the bus, tagged with the sending node.
    history: Vec<(u8, CanFrame)>,
}

/// A broadcast bus: every frame reaches every attached node but its sender.
#[derive(Clone, Default)]
pub struct VirtualBus {
    state: Rc<RefCell<BusState>>,
}

impl VirtualBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, node_id: u8) -> SimulatedInterface {
        self.state.borrow_mut().inboxes.entry(node_id).or_default();
        SimulatedInterface {
            node_id,
            bus: self.clone(),
        }
    }

    pub fn history(&self) -> Vec<(u8, CanFrame)> {
        self.state.borrow().history.clone()
    }
}

pub struct SimulatedInterface {
    node_id: u8,
    bus: VirtualBus,
}

impl CanInterface for SimulatedInterface {
    fn send_frame(&mut self, frame: &CanFrame) -> Result<(), CanOpenError> {
        let mut state = self.bus.state.borrow_mut();
        state.history.push((self.node_id, frame.clone()));
        for (id, inbox) in state.inboxes.iter_mut() {
            if *id != self.node_id {
                inbox.push_back(frame.clone());
            }
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<CanFrame>, CanOpenError> {
        Ok(self
            .bus
            .state
            .borrow_mut()
            .inboxes
            .get_mut(&self.node_id)
            .and_then(VecDeque::pop_front))
    }
}

/// One device: a dictionary, its EMCY and SYNC services, and a bus port.
/// Outbound frames go to the bus, every other event is recorded.
pub struct DeviceHarness {
    pub od: ObjectDictionary,
    pub emcy: Emcy,
    pub sync: SyncService,
    pub interface: SimulatedInterface,
    pub events: Vec<ServiceEvent>,
}

impl DeviceHarness {
    pub fn new(bus: &VirtualBus, node_id: u8) -> Self {
        Self {
            od: new_device_default(NodeId(node_id)).unwrap(),
            emcy: Emcy::new(),
            sync: SyncService::new(),
            interface: bus.attach(node_id),
            events: Vec::new(),
        }
    }

    pub fn start(&mut self, now_us: u64) {
        self.emcy.start(&self.od, now_us);
        self.sync.start(&self.od, now_us);
    }

    /// Hands an event produced outside `run_cycle` (e.g. by `write`) to the bus.
    pub fn dispatch(&mut self, event: Option<ServiceEvent>) {
        match event {
            Some(ServiceEvent::Message(frame)) => self.interface.send_frame(&frame).unwrap(),
            Some(other) => self.events.push(other),
            None => {}
        }
    }

    /// Drains the inbox into both services, then advances their timers.
    pub fn run_cycle(&mut self, now_us: u64) {
        while let Some(frame) = self.interface.receive_frame().unwrap() {
            let received = [
                self.emcy.receive(&self.od, &frame),
                self.sync.receive(&self.od, &frame),
            ];
            for event in received {
                self.dispatch(event);
            }
        }
        let produced = [
            self.emcy.tick(&self.od, now_us),
            self.sync.tick(&self.od, now_us),
        ];
        for event in produced {
            self.dispatch(event);
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
