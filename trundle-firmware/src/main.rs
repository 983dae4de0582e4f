//! Trundle - Classroom Robot Firmware
//!
//! Main firmware binary for RP2040-based two-wheel robots. Drives
//! straight on two encoders, turns in place, lifts with an arm, and runs
//! the routine chosen in robot.toml every time the bump switch is pressed.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use {defmt_rtt as _, panic_probe as _};

use trundle_core::config::RobotConfig;
use trundle_core::control::{Drivetrain, LiftArm};
use trundle_core::scheduler::Robot;
use trundle_drivers::motor::{DcMotor, DcMotorConfig};
use trundle_drivers::sensor::{BumpSwitch, PotRotationSensor};

use crate::board::{AtomicEncoder, LatestSample, RttDisplay};
use crate::channels::{LEFT_COUNT, LIFT_COUNT, RIGHT_COUNT};
use crate::config::parse_config;

/// Embedded default configuration (compiled into firmware)
/// Edit robot.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../robot.toml");

/// PWM wrap value: 125 MHz / 6250 = 20 kHz, above hearing
const PWM_TOP: u16 = 6250;

/// Samples the bump switch must read pressed (one per tick)
const BUMP_DEBOUNCE_SAMPLES: u8 = 3;

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Trundle firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Configuration loaded: routine {}, correction {}",
        config.routine.name(),
        config.correction
    );

    // Drive and lift motors (TB6612: PWM + IN1/IN2 per channel)
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = PWM_TOP;
    pwm_config.compare_a = 0;

    let (right_pwm, _) = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config.clone()).split();
    let (left_pwm, _) = Pwm::new_output_a(p.PWM_SLICE1, p.PIN_18, pwm_config.clone()).split();
    let (lift_pwm, _) = Pwm::new_output_a(p.PWM_SLICE2, p.PIN_20, pwm_config).split();

    let drive_config = DcMotorConfig::default();
    let right = DcMotor::new(
        right_pwm.unwrap(),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        AtomicEncoder::new(&RIGHT_COUNT),
        drive_config,
    );
    // Left motor is mounted mirrored
    let left = DcMotor::new(
        left_pwm.unwrap(),
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
        AtomicEncoder::new(&LEFT_COUNT),
        DcMotorConfig {
            invert: true,
            ..drive_config
        },
    );
    let lift = DcMotor::new(
        lift_pwm.unwrap(),
        Output::new(p.PIN_21, Level::Low),
        Output::new(p.PIN_22, Level::Low),
        AtomicEncoder::new(&LIFT_COUNT),
        DcMotorConfig {
            hold_kp: 3.0,
            ..drive_config
        },
    );
    info!("Motors initialized");

    // Lift arm potentiometer on ADC0 (GPIO26)
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let pot_channel = Channel::new_pin(p.PIN_26, Pull::None);

    // Bump switch to ground on GPIO15
    let bump = BumpSwitch::new(Input::new(p.PIN_15, Pull::Up), true, BUMP_DEBOUNCE_SAMPLES);

    let robot = Robot::new(
        Drivetrain::new(left, right),
        LiftArm::new(lift, PotRotationSensor::new(LatestSample)),
        bump,
        RttDisplay::new(),
    );

    // Spawn tasks
    spawner
        .spawn(tasks::encoder_task(
            "right",
            Input::new(p.PIN_2, Pull::Up),
            Input::new(p.PIN_3, Pull::Up),
            false,
            &RIGHT_COUNT,
        ))
        .unwrap();
    spawner
        .spawn(tasks::encoder_task(
            "left",
            Input::new(p.PIN_4, Pull::Up),
            Input::new(p.PIN_5, Pull::Up),
            true,
            &LEFT_COUNT,
        ))
        .unwrap();
    spawner
        .spawn(tasks::encoder_task(
            "lift",
            Input::new(p.PIN_6, Pull::Up),
            Input::new(p.PIN_7, Pull::Up),
            false,
            &LIFT_COUNT,
        ))
        .unwrap();
    spawner.spawn(tasks::analog_task(adc, pot_channel)).unwrap();
    spawner.spawn(tasks::status_task()).unwrap();
    spawner.spawn(tasks::tick_task(config.timing.tick_ms)).unwrap();
    spawner.spawn(tasks::control_task(robot, config)).unwrap();

    info!("All tasks spawned, press the bump switch to start");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded configuration
///
/// Falls back to the built-in defaults if robot.toml does not parse.
fn load_config() -> RobotConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using built-in defaults");
            RobotConfig::default()
        }
    }
}
