use std::time::{Duration, Instant};

use hl_app::{Config, Runtime, SimulatedClock};
use hl_bus::Broker;
use hl_bus::topics::{boiler, window};

fn fast_config() -> Config {
    Config {
        tick_period_ms: 5,
        seed: Some(5),
        ..Config::default()
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn loops_tick_independently_and_accept_commands() {
    let broker = Broker::new();
    let runtime = Runtime::start_with_clock(
        &fast_config(),
        broker.clone(),
        Box::new(SimulatedClock::new(12.0)),
    )
    .expect("runtime starts");

    assert!(wait_for(|| runtime.boiler_stats().ticks >= 3
        && runtime.thermal_stats().ticks >= 3));
    assert!(broker.retained(boiler::WATER_TEMP).is_some());

    runtime.inject(boiler::SETPOINT_COMMAND, "65").unwrap();
    runtime.inject(&window::state_topic("bedroom"), "on").unwrap();
    assert!(wait_for(|| runtime.boiler().setpoint == 65.0));
    assert!(wait_for(|| runtime.thermal().windows_open == 1));

    runtime.inject(boiler::SETPOINT_COMMAND, "abc").unwrap();
    assert!(wait_for(|| runtime.boiler_stats().rejected == 1));
    assert_eq!(runtime.boiler().setpoint, 65.0);

    runtime.shutdown().expect("clean shutdown");
}

#[test]
fn startup_waits_for_the_channel() {
    let broker = Broker::new();
    broker.set_available(false);
    let config = Config {
        bus: hl_app::BusConfig {
            connect_backoff_ms: 1,
            max_connect_attempts: Some(3),
        },
        ..fast_config()
    };
    let result = Runtime::start_with_clock(&config, broker, Box::new(SimulatedClock::new(0.0)));
    assert!(matches!(result, Err(hl_app::AppError::Bus(_))));
}
