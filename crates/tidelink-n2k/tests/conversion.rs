//! End-to-end conversion scenarios.

use std::sync::Arc;

use serde_json::json;

use tidelink_core::Sample;
use tidelink_n2k::{ConversionEngine, EngineConfig, MemorySink, MessageKind};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .try_init();
}

fn config(extra: serde_json::Value) -> EngineConfig {
    let mut base = json!({
        "batteries": [{ "signalSourceId": "house", "instanceId": 0 }],
        "engines": [{ "signalSourceId": "port", "instanceId": 0 }]
    });
    base.as_object_mut()
        .unwrap()
        .extend(extra.as_object().unwrap().clone());
    EngineConfig::from_json(&base).unwrap()
}

async fn seed_battery(engine: &ConversionEngine) {
    for (path, value) in [
        ("electrical.batteries.house.voltage", 12.5),
        ("electrical.batteries.house.current", 23.1),
        ("electrical.batteries.house.temperature", 290.15),
        ("electrical.batteries.house.capacity.stateOfCharge", 0.93),
        ("electrical.batteries.house.capacity.timeRemaining", 12340.0),
        ("electrical.batteries.house.capacity.stateOfHealth", 0.6),
        ("electrical.batteries.house.ripple", 12.0),
    ] {
        engine.handle_update(path, &json!(value)).await;
    }
}

#[tokio::test]
async fn battery_end_to_end() {
    init_tracing();
    let engine = ConversionEngine::new(config(json!({}))).unwrap();
    seed_battery(&engine).await;

    let status = engine
        .tick_now(MessageKind::BatteryStatus, "house")
        .await
        .expect("battery status should compose");
    let status = status.render(tidelink_n2k::FieldConvention::Named);
    assert_eq!(status["pgn"], 127_508);
    assert_eq!(status["Battery Instance"], 0.0);
    assert_eq!(status["Voltage"], 12.5);
    assert_eq!(status["Current"], 23.1);
    assert_eq!(status["Temperature"], 290.2);

    let dc = engine
        .tick_now(MessageKind::DcDetailed, "house")
        .await
        .expect("dc detailed should compose");
    let dc = dc.render(tidelink_n2k::FieldConvention::Named);
    assert_eq!(dc["pgn"], 127_506);
    assert_eq!(dc["DC Type"], "Battery");
    assert_eq!(dc["State of Charge"], 93.0);
    assert_eq!(dc["State of Health"], 60.0);
    assert_eq!(dc["Time Remaining"], "PT3H25M40S");
    assert_eq!(dc["Ripple Voltage"], 12.0);
    // No amp-hours input: the field is omitted in the default policy.
    assert!(dc.get("Amp Hours").is_none());
}

#[tokio::test]
async fn engine_rapid_update() {
    let engine = ConversionEngine::new(config(json!({}))).unwrap();
    engine
        .handle_update("propulsion.port.revolutions", &json!(209.44))
        .await;

    let rapid = engine
        .tick_now(MessageKind::EngineRapid, "port")
        .await
        .expect("rapid should compose");
    let rapid = rapid.render(tidelink_n2k::FieldConvention::Named);
    assert_eq!(rapid["pgn"], 127_488);
    assert_eq!(rapid["Speed"], 2000.0);
}

#[tokio::test]
async fn wire_convention_emits_si_units() {
    let engine = ConversionEngine::new(config(json!({ "fieldConvention": "wire" }))).unwrap();
    seed_battery(&engine).await;

    let dc = engine
        .tick_now(MessageKind::DcDetailed, "house")
        .await
        .unwrap()
        .render(tidelink_n2k::FieldConvention::Wire);
    assert_eq!(dc["pgn"], 127_506);
    assert_eq!(dc["prio"], 6);
    assert_eq!(dc["dst"], 255);
    assert_eq!(dc["fields"]["stateOfCharge"], 0.93);
    assert_eq!(dc["fields"]["timeRemaining"], 12_340);
}

#[tokio::test]
async fn wrapped_values_and_alarms_flow_through() {
    let engine = ConversionEngine::new(config(json!({}))).unwrap();
    engine
        .handle_update(
            "propulsion.port.temperature",
            &json!({ "value": 360.0 }),
        )
        .await;
    engine
        .handle_update(
            "notifications.propulsion.port.lowOilPressure",
            &json!({ "state": "alarm" }),
        )
        .await;

    let dynamic = engine
        .tick_now(MessageKind::EngineDynamic, "port")
        .await
        .unwrap()
        .render(tidelink_n2k::FieldConvention::Named);
    assert_eq!(dynamic["Temperature"], 360.0);
    assert_eq!(dynamic["Discrete Status 1"], 1 << 2);
}

#[tokio::test]
async fn temperature_kind_uses_override_path() {
    let engine = ConversionEngine::new(
        EngineConfig::from_json(&json!({
            "batteries": [{
                "signalSourceId": "house",
                "instanceId": 2,
                "temperaturePath": "environment.inside.engineRoom.temperature"
            }]
        }))
        .unwrap(),
    )
    .unwrap();

    engine
        .handle_update("environment.inside.engineRoom.temperature", &json!(303.15))
        .await;

    let temp = engine
        .tick_now(MessageKind::Temperature, "house")
        .await
        .expect("temperature should compose from the override path")
        .render(tidelink_n2k::FieldConvention::Named);
    assert_eq!(temp["pgn"], 130_312);
    assert_eq!(temp["Instance"], 2.0);
    assert_eq!(temp["Source"], "Battery");
    assert_eq!(temp["Actual Temperature"], 303.2);
}

#[tokio::test]
async fn poll_style_delivery_feeds_the_same_pipeline() {
    let engine = ConversionEngine::new(config(json!({}))).unwrap();
    let subs = engine.poll_subscriptions().unwrap();
    let battery_sub = subs
        .iter()
        .find(|s| s.kind == tidelink_core::DeviceKind::Battery)
        .unwrap();

    // Positional values per the registered key order.
    let mut values = vec![Sample::Present(13.2)];
    values.resize(battery_sub.keys.len(), Sample::Absent);
    engine.apply_poll(battery_sub, &values).await;

    let status = engine
        .tick_now(MessageKind::BatteryStatus, "house")
        .await
        .unwrap()
        .render(tidelink_n2k::FieldConvention::Named);
    assert_eq!(status["Voltage"], 13.2);
}

#[tokio::test]
async fn scheduler_emits_periodically_and_stops_cleanly() {
    init_tracing();
    let engine = ConversionEngine::new(config(json!({
        "intervalsMs": {
            "batteryStatus": 50,
            "dcDetailed": 50,
            "temperature": 50,
            "engineRapid": 50,
            "engineDynamic": 50
        }
    })))
    .unwrap();
    seed_battery(&engine).await;

    let sink = Arc::new(MemorySink::new());
    engine.start(sink.clone()).await.unwrap();
    assert!(engine.start(sink.clone()).await.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(240)).await;
    engine.stop().await;

    let records = sink.records().await;
    let battery_count = records
        .iter()
        .filter(|(kind, _, _)| *kind == MessageKind::BatteryStatus)
        .count();
    assert!(
        (2..=5).contains(&battery_count),
        "expected 2..=5 battery records, got {battery_count}"
    );
    // No engine telemetry arrived, so no engine records.
    assert!(records
        .iter()
        .all(|(kind, _, _)| kind.device_kind() == tidelink_core::DeviceKind::Battery));

    // No further records after stop.
    let settled = sink.records().await.len();
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;
    assert_eq!(sink.records().await.len(), settled);
}
