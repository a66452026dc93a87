use hl_app::{Config, ScenarioEvent, Session};
use hl_bus::topics::{boiler, thermal, window};

fn config() -> Config {
    Config {
        seed: Some(11),
        start_hour: 6.0,
        ..Config::default()
    }
}

#[test]
fn malformed_setpoint_is_counted_as_rejected_and_keeps_setpoint() {
    let mut session = Session::new(&config()).unwrap();
    session.inject(boiler::SETPOINT_COMMAND, "55").unwrap();
    session.step();
    assert_eq!(session.boiler().snapshot().setpoint, 55.0);

    session.inject(boiler::SETPOINT_COMMAND, "abc").unwrap();
    let row = session.step();
    assert_eq!(row.boiler.setpoint, 55.0);
    // Every rejected payload is logged at warn by the runner.
    assert_eq!(session.boiler().stats().rejected, 1);
    assert_eq!(
        session.broker().retained(boiler::SETPOINT_STATE).as_deref(),
        Some("55.0")
    );
}

#[test]
fn repeated_setpoint_is_idempotent() {
    let mut once = Session::new(&config()).unwrap();
    let mut twice = Session::new(&config()).unwrap();
    once.inject(boiler::SETPOINT_COMMAND, "62").unwrap();
    twice.inject(boiler::SETPOINT_COMMAND, "62").unwrap();
    once.step();
    twice.step();
    twice.inject(boiler::SETPOINT_COMMAND, "62").unwrap();
    let a = once.step();
    let b = twice.step();
    assert_eq!(a.boiler.setpoint, b.boiler.setpoint);
    assert_eq!(a.boiler, b.boiler);
}

#[test]
fn boiler_sees_building_one_tick_late() {
    let mut session = Session::new(&config()).unwrap();
    let first = session.step();
    // The building has not published yet when the boiler runs its first tick.
    assert_eq!(first.boiler.heating_demand, 0.0);
    // The building ticks after the boiler and sees this tick's telemetry.
    assert_eq!(
        first.thermal.boiler_water,
        (first.boiler.boiler_temp * 10.0).round() / 10.0
    );

    let second = session.step();
    assert_eq!(second.boiler.heating_demand, first.thermal.heating_demand.trunc());
    assert_eq!(second.boiler.indoor_temp, (first.thermal.indoor_temp * 10.0).round() / 10.0);
}

#[test]
fn cold_house_is_heated_over_an_hour() {
    let mut session = Session::new(&config()).unwrap();
    let rows = session.run(3600);
    let start = &rows[0];
    let end = rows.last().unwrap();
    assert!(end.boiler.flame);
    assert!(end.boiler.boiler_temp > start.boiler.boiler_temp);
    assert!(end.thermal.indoor_temp > start.thermal.indoor_temp);
    for row in &rows {
        assert!((0.0..=100.0).contains(&row.boiler.modulation));
        assert!((20.0..=80.0).contains(&row.boiler.boiler_temp));
        assert!((0.5..=3.0).contains(&row.boiler.pressure));
        assert!(row.thermal.indoor_temp >= row.thermal.outdoor_temp - 2.0);
        assert!(row.thermal.indoor_temp <= 30.0);
    }
}

#[test]
fn scenario_events_fire_at_their_time() {
    let mut config = config();
    config.scenario = vec![
        ScenarioEvent {
            at_s: 5.0,
            topic: window::state_topic("kitchen"),
            payload: "on".to_string(),
        },
        ScenarioEvent {
            at_s: 2.0,
            topic: boiler::MODE_COMMAND.to_string(),
            payload: "off".to_string(),
        },
        ScenarioEvent {
            at_s: 3.0,
            topic: thermal::TARGET_COMMAND.to_string(),
            payload: "22".to_string(),
        },
    ];
    let mut session = Session::new(&config).unwrap();
    let rows = session.run(8);

    // Events published before tick n+1 take effect on that tick.
    assert!(rows[1].boiler.enabled);
    assert!(!rows[2].boiler.enabled);
    assert_eq!(rows[2].thermal.target_temp, 20.0);
    assert_eq!(rows[3].thermal.target_temp, 22.0);
    assert_eq!(rows[4].thermal.windows_open, 0);
    assert_eq!(rows[5].thermal.windows_open, 1);
    assert_eq!(
        session.broker().retained(thermal::WINDOWS_OPEN_COUNT).as_deref(),
        Some("1")
    );
    assert_eq!(
        session.broker().retained(boiler::MODE_STATE).as_deref(),
        Some("off")
    );
}

#[test]
fn open_window_loses_more_heat_than_closed() {
    let mut closed = Session::new(&config()).unwrap();
    let mut open = Session::new(&config()).unwrap();
    open.inject(&window::state_topic("living_room"), "open").unwrap();
    let closed_row = closed.step();
    let open_row = open.step();
    assert_eq!(open_row.thermal.windows_open, 1);
    assert!(open_row.thermal.heat_loss_kj > closed_row.thermal.heat_loss_kj);
}

#[test]
fn outage_keeps_loops_ticking_and_recovers() {
    let mut session = Session::new(&config()).unwrap();
    session.run(5);
    let published = session.boiler().stats().published;

    session.broker().set_available(false);
    let during = session.run(10);
    assert_eq!(during.len(), 10);
    assert_eq!(session.boiler().stats().ticks, 15);
    assert_eq!(session.boiler().stats().published, published);
    assert!(!session.boiler().is_connected());
    // Physics keeps integrating on stale inputs.
    assert!(during[9].boiler.boiler_temp != during[0].boiler.boiler_temp);

    session.broker().set_available(true);
    session.run(2);
    assert!(session.boiler().is_connected());
    assert!(session.thermal().is_connected());
    assert!(session.boiler().stats().published > published);
    assert_eq!(session.boiler().stats().reconnects, 1);
}

#[test]
fn scenario_events_survive_an_outage() {
    let mut config = config();
    config.scenario = vec![
        ScenarioEvent {
            at_s: 4.0,
            topic: boiler::SETPOINT_COMMAND.to_string(),
            payload: "60".to_string(),
        },
        ScenarioEvent {
            at_s: 10.0,
            topic: boiler::MODE_COMMAND.to_string(),
            payload: "off".to_string(),
        },
    ];
    let mut session = Session::new(&config).unwrap();
    session.run(3);

    session.broker().set_available(false);
    let during = session.run(2);
    assert!(during.iter().all(|row| row.boiler.setpoint == 45.0));

    session.broker().set_available(true);
    let after = session.run(8);
    // The loops reconnect on the first tick back; the held event follows.
    assert_eq!(after[0].boiler.setpoint, 45.0);
    assert_eq!(after[1].boiler.setpoint, 60.0);
    assert!(after[4].boiler.enabled);
    assert!(!after[5].boiler.enabled);

    session.inject(boiler::SETPOINT_COMMAND, "50").unwrap();
    assert_eq!(session.step().boiler.setpoint, 50.0);
}
