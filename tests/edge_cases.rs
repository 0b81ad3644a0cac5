//! Edge case and boundary condition tests for the roaster controller

use rs_roaster::hal::{MockHeater, MockMotor, MockPosition, MockRtd};
use rs_roaster::traits::FixedPosition;
use rs_roaster::{
    ActuatorConfig, Config, ConfigError, ControlLoop, InputRange, LoopCommand, LoopConfig,
    LoopMode, PidConfig, PinConfig, SensorConfig, SetpointConfig,
};

type Roaster = ControlLoop<MockRtd, MockPosition, FixedPosition, MockHeater, MockMotor>;

fn build(config: &Config, position: i32, speed: i32) -> Result<Roaster, ConfigError> {
    let mut rtd = MockRtd::new();
    rtd.set_fahrenheit(300.0);
    ControlLoop::new(
        config,
        rtd,
        MockPosition::at(position),
        FixedPosition(speed),
        MockHeater::new(),
        MockMotor::new(),
    )
}

fn started(config: &Config, position: i32, speed: i32) -> Roaster {
    let mut roaster = build(config, position, speed).unwrap();
    roaster.submit(LoopCommand::Start).unwrap();
    roaster
}

// ============================================================================
// Configuration Rejection
// ============================================================================

#[test]
fn duplicate_pin_rejected() {
    let config = Config::default().with_pins(PinConfig::default().with_rtd_cs(5));
    assert_eq!(
        build(&config, 0, 0).err(),
        Some(ConfigError::DuplicatePin {
            pin: 5,
            first: "heater_ssr",
            second: "rtd_cs",
        })
    );
}

#[test]
fn pin_past_last_gpio_rejected() {
    let config = Config::default().with_pins(PinConfig::default().with_drum_motor(40));
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidPin {
            what: "drum_motor",
            pin: 40,
        })
    );
}

#[test]
fn missing_potentiometer_is_allowed() {
    let config = Config::default().with_pins(PinConfig::default().with_potentiometer(None));
    assert!(config.validate().is_ok());
}

#[test]
fn inverted_motor_range_rejected() {
    let config =
        Config::default().with_actuator(ActuatorConfig::default().with_motor_range(80, 20));
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvertedBounds {
            what: "motor speed",
            ..
        })
    ));
}

#[test]
fn duty_ceiling_above_full_rejected() {
    let config = Config::default().with_actuator(ActuatorConfig::default().with_max_safe_duty(101));
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            what: "max_safe_duty"
        })
    );
}

#[test]
fn nan_gain_rejected() {
    let config = Config::default().with_pid(PidConfig::default().with_gains(f32::NAN, 1.0, 0.0));
    assert!(matches!(
        build(&config, 0, 0),
        Err(ConfigError::InvalidGain { name: "kp", .. })
    ));
}

#[test]
fn negative_gain_rejected() {
    let config = Config::default().with_pid(PidConfig::default().with_gains(35.0, 1.0, -0.5));
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidGain {
            name: "kd",
            value: -0.5,
        })
    );
}

#[test]
fn inverted_output_range_rejected() {
    let config = Config::default().with_pid(PidConfig::default().with_output_range(100.0, 0.0));
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvertedBounds { .. })
    ));
}

#[test]
fn zero_tick_rejected() {
    let config = Config::default().with_control(LoopConfig::default().with_tick_ms(0));
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidValue { what: "tick_ms" })
    );
}

#[test]
fn infinite_setpoint_scale_rejected() {
    let config =
        Config::default().with_setpoint(SetpointConfig::default().with_scale(f32::INFINITY));
    assert!(config.validate().is_err());
}

#[test]
fn degenerate_input_range_rejected() {
    let config = Config::default()
        .with_sensor(SensorConfig::default().with_speed_input(InputRange::new(512, 512)));
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            what: "speed_input"
        })
    );
}

// ============================================================================
// Boundary Values
// ============================================================================

#[test]
fn encoder_clamped_high() {
    let mut roaster = started(&Config::default(), 10_000, 1023);
    let report = roaster.tick(0);
    assert_eq!(report.position.get(), 450);
    assert_eq!(report.setpoint_f, 450.0);
}

#[test]
fn encoder_clamped_low() {
    let mut roaster = started(&Config::default(), -5, 1023);
    let report = roaster.tick(0);
    assert_eq!(report.position.get(), 0);
    assert_eq!(report.setpoint_f, 0.0);
    // Beans above a zero setpoint: heater off
    assert_eq!(report.heater.percent(), 0);
}

#[test]
fn setpoint_offset_applied() {
    let config = Config::default().with_setpoint(
        SetpointConfig::default()
            .with_scale(0.5)
            .with_offset(100.0),
    );
    let mut roaster = started(&config, 300, 1023);
    assert_eq!(roaster.tick(0).setpoint_f, 250.0);
}

#[test]
fn drum_floor_with_speed_at_zero() {
    let mut roaster = started(&Config::default(), 400, 0);
    let report = roaster.tick(0);
    assert_eq!(report.motor.percent(), 30);
    assert_eq!(roaster.actuators().motor().speed, 30);
}

#[test]
fn speed_input_beyond_range_capped() {
    let mut roaster = started(&Config::default(), 400, 5000);
    assert_eq!(roaster.tick(0).motor.percent(), 100);
}

#[test]
fn zero_duty_ceiling_keeps_heater_off() {
    let config = Config::default().with_actuator(ActuatorConfig::default().with_max_safe_duty(0));
    let mut roaster = started(&config, 450, 1023);
    for n in 0..6 {
        let report = roaster.tick(n * 500);
        assert_eq!(report.pid.unwrap().output, 100.0);
        assert_eq!(report.heater.percent(), 0);
        assert_eq!(roaster.actuators().heater().duty, 0);
    }
}

#[test]
fn full_duty_ceiling_reaches_full_power() {
    let config = Config::default().with_actuator(
        ActuatorConfig::default()
            .with_max_safe_duty(100)
            .with_motor_range(0, 100),
    );
    let mut roaster = started(&config, 450, 1023);
    for n in 0..8 {
        assert_eq!(roaster.tick(n * 500).heater.percent(), 100);
        assert_eq!(roaster.actuators().heater().duty, 100);
    }
}

#[test]
fn single_bad_read_faults_with_threshold_one() {
    let config = Config::default().with_control(LoopConfig::default().with_fault_threshold(1));
    let mut roaster = started(&config, 400, 1023);
    roaster.sensors_mut().rtd_mut().bus_error = true;
    assert_eq!(roaster.tick(0).mode, LoopMode::Faulted);
}

#[test]
fn streak_does_not_count_while_idle() {
    let mut roaster = build(&Config::default(), 400, 1023).unwrap();
    roaster.sensors_mut().rtd_mut().bus_error = true;
    for n in 0..10 {
        assert_eq!(roaster.tick(n * 500).mode, LoopMode::Idle);
    }
    assert_eq!(roaster.invalid_streak(), 0);
}

#[test]
fn stop_while_idle_is_noop() {
    let mut roaster = build(&Config::default(), 400, 1023).unwrap();
    roaster.submit(LoopCommand::Stop).unwrap();
    roaster.submit(LoopCommand::Reset).unwrap();
    assert_eq!(roaster.tick(0).mode, LoopMode::Idle);
}

#[test]
fn start_then_stop_in_same_tick() {
    let mut roaster = build(&Config::default(), 400, 1023).unwrap();
    roaster.submit(LoopCommand::Start).unwrap();
    roaster.submit(LoopCommand::Stop).unwrap();
    let report = roaster.tick(0);
    assert_eq!(report.mode, LoopMode::Idle);
    assert_eq!(roaster.actuators().heater().duty, 0);
    assert_eq!(roaster.actuators().motor().speed, 0);
}

#[test]
fn clock_going_backwards_is_safe() {
    let mut roaster = started(&Config::default(), 400, 1023);
    roaster.tick(10_000);
    let step = roaster.tick(5_000).pid.unwrap();
    assert!(step.output.is_finite());
    assert_eq!(step.derivative, 0.0);
}

#[test]
fn idle_with_zero_encoder_stays_idle() {
    let mut roaster = build(&Config::default(), 0, 0).unwrap();
    let report = roaster.tick(0);
    assert_eq!(report.mode, LoopMode::Idle);
    assert_eq!(report.setpoint_f, 0.0);
}
