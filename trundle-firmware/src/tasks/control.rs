//! Robot control task
//!
//! Sole owner of the motors. On every tick it advances the sequencer,
//! runs the hold servos and refreshes the status screen. Once a routine
//! completes or faults, the next bump switch press re-arms it.

use core::pin::pin;

use defmt::*;
use embassy_futures::select::{select, Either};

use trundle_core::config::RobotConfig;
use trundle_core::control::{Drivetrain, LiftArm};
use trundle_core::scheduler::{ExecutionPhase, Robot, Sequencer};
use trundle_core::traits::DeviceError;
use trundle_drivers::sensor::PotRotationSensor;

use crate::board::{BoardMotor, BoardRobot, LatestSample};
use crate::channels::EVENT_CHANNEL;
use crate::tasks::tick::TICK_SIGNAL;

type BoardDrive = Drivetrain<BoardMotor, BoardMotor>;
type BoardArm = LiftArm<BoardMotor, PotRotationSensor<LatestSample>>;

/// Control task - main coordination loop
#[embassy_executor::task]
pub async fn control_task(mut robot: BoardRobot, config: RobotConfig) {
    let mut sequencer = Sequencer::from_config(config);
    info!(
        "Control task started: routine {} ({} segments)",
        sequencer.routine().name,
        sequencer.routine().len()
    );

    loop {
        if matches!(sequencer.phase(), ExecutionPhase::Complete | ExecutionPhase::Fault(_)) {
            match wait_for_rearm(&mut robot).await {
                Ok(()) => {
                    info!("Re-arming routine");
                    sequencer.reset();
                }
                Err(e) => warn!("Bump switch error: {}", e),
            }
            continue;
        }

        let now_ms = TICK_SIGNAL.wait().await;
        if let Some(event) = sequencer.tick(&mut robot, now_ms) {
            if EVENT_CHANNEL.try_send(event).is_err() {
                trace!("Event channel full, dropping {}", event);
            }
        }

        update_servos(&mut robot.drive, &mut robot.arm);
        robot.display.flush(now_ms);
    }
}

/// Keep the hold servos ticking until the bump switch is pressed
///
/// One press future lives across all ticks, so an edge that lands
/// between two ticks is still seen.
async fn wait_for_rearm(robot: &mut BoardRobot) -> Result<(), DeviceError> {
    let Robot {
        drive,
        arm,
        bump,
        display,
    } = robot;
    let mut press = pin!(bump.wait_for_press());

    loop {
        match select(press.as_mut(), TICK_SIGNAL.wait()).await {
            Either::First(result) => return result,
            Either::Second(now_ms) => {
                update_servos(drive, arm);
                display.flush(now_ms);
            }
        }
    }
}

/// Run the hold servo of every motor that is holding position
fn update_servos(drive: &mut BoardDrive, arm: &mut BoardArm) {
    if let Err(e) = arm.motor.update() {
        warn!("Lift hold failed: {}", e);
        stop_all(drive, arm);
    }
    if let Err(e) = drive.left.update().and(drive.right.update()) {
        warn!("Drive hold failed: {}", e);
        stop_all(drive, arm);
    }
}

fn stop_all(drive: &mut BoardDrive, arm: &mut BoardArm) {
    let _ = drive.stop();
    let _ = arm.stop();
}
