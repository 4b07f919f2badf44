//! Simulated device controller.
//!
//! Wires all four subsystem machines to in-process stand-ins for the real
//! hardware and network facilities, then drives the loop for a minute of
//! simulated ticks. A background thread plays the motion interrupt.
//!
//! ```text
//! RUST_LOG=info cargo run --example device
//! ```

use devloop::capability::{
    BrokerClient, CapabilityError, ClimateProbe, ClimateSample, Clock, Link, PulseSource,
    SystemClock,
};
use devloop::config::DeviceConfig;
use devloop::subsystems::bus::{self, BusCtx};
use devloop::subsystems::climate::{self, ClimateCtx, ClimateReadings};
use devloop::subsystems::motion::MotionGate;
use devloop::subsystems::network;
use devloop::subsystems::proximity::{self, ProximityCtx};
use devloop::Orchestrator;
use log::info;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Link that needs a couple of attempts before it sticks.
struct SimLink {
    attempts: u32,
    connected: bool,
}

impl Link for SimLink {
    fn connect(&mut self) -> Result<(), CapabilityError> {
        self.attempts += 1;
        if self.attempts >= 2 {
            self.connected = true;
            Ok(())
        } else {
            Err(CapabilityError::new("access point not found"))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

struct SimBroker {
    connected: bool,
    client_id: String,
}

impl BrokerClient for SimBroker {
    fn connect(&mut self) -> Result<(), CapabilityError> {
        self.connected = true;
        info!("broker session '{}' established", self.client_id);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CapabilityError> {
        println!("publish {topic} = {payload}");
        Ok(())
    }
}

/// Probe with a slow sine drift around room temperature.
struct SimProbe {
    reads: u32,
}

impl ClimateProbe for SimProbe {
    fn begin(&mut self) -> Result<(), CapabilityError> {
        Ok(())
    }

    fn read(&mut self) -> ClimateSample {
        self.reads += 1;
        let phase = self.reads as f32 / 5.0;
        ClimateSample {
            temperature: Some(22.0 + 2.0 * phase.sin()),
            humidity: Some(45.0 + 5.0 * phase.cos()),
        }
    }
}

struct SimIrq;

impl PulseSource for SimIrq {
    fn enable(&mut self) {
        info!("motion interrupt armed");
    }
    fn disable(&mut self) {
        info!("motion interrupt masked");
    }
}

fn main() {
    env_logger::init();

    let config = DeviceConfig::from_json(r#"{"client_id": "sim-device", "temperature_offset": 2}"#)
        .expect("config literal is valid");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let gate = Arc::new(MotionGate::new(clock));
    let presence = Rc::new(Cell::new(false));
    let readings = Rc::new(RefCell::new(ClimateReadings::default()));

    let network_cell = network::machine(SimLink {
        attempts: 0,
        connected: false,
    })
    .expect("network table is valid");

    let climate_cell = climate::machine(ClimateCtx {
        probe: SimProbe { reads: 0 },
        temperature_offset: config.temperature_offset,
        readings: Rc::clone(&readings),
    })
    .expect("climate table is valid");

    let proximity_cell = proximity::machine(ProximityCtx::new(
        SimIrq,
        Arc::clone(&gate),
        Rc::clone(&presence),
    ))
    .expect("proximity table is valid");

    let bus_cell = bus::machine(BusCtx {
        client: SimBroker {
            connected: false,
            client_id: config.client_id.clone(),
        },
        topics: config.topics.clone(),
        readings: Rc::clone(&readings),
        presence: Rc::clone(&presence),
        proximity: Some(proximity_cell.handle()),
    })
    .expect("bus table is valid");

    // The interrupt side: a person walks past every nine seconds.
    let producer_gate = Arc::clone(&gate);
    std::thread::spawn(move || loop {
        std::thread::sleep(Duration::from_secs(9));
        producer_gate.pulse();
        info!("motion pulse");
    });

    let mut orchestrator = Orchestrator::new();
    orchestrator.register(network_cell.handle());
    orchestrator.register(climate_cell.handle());
    orchestrator.register(proximity_cell.handle());
    orchestrator.register(bus_cell.handle());
    orchestrator
        .initialize_all()
        .expect("initial entry actions succeed");

    // A minute of real-time ticks, then report instead of running forever.
    for _ in 0..120 {
        std::thread::sleep(Duration::from_millis(500));
        orchestrator.step();
    }

    println!(
        "final: network={} climate={} proximity={} bus={} presence={}",
        network_cell.with(|m| m.current_state_name()),
        climate_cell.with(|m| m.current_state_name()),
        proximity_cell.with(|m| m.current_state_name()),
        bus_cell.with(|m| m.current_state_name()),
        presence.get(),
    );
}
