use anyhow::Result;
use frcbot::config::params::RobotConfig;
use frcbot::core::drivetrain::DriveHardware;
use frcbot::domain::model::Side;
use frcbot::sim::{SimGamepad, SimMotor};
use frcbot::{Robot, RobotHardware, RobotState, TargetServer};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn build_robot() -> Robot {
    let hardware = RobotHardware {
        drive: DriveHardware {
            left_motor: Some(Box::new(SimMotor::new())),
            right_motor: Some(Box::new(SimMotor::new())),
            gyro: None,
            accelerometer: None,
        },
        feeder_left_wheel: None,
        feeder_right_wheel: None,
        lift_motor: None,
        driver_gamepad: Some(Box::new(SimGamepad::new())),
        scoring_gamepad: Some(Box::new(SimGamepad::new())),
        rangefinder_channel: None,
    };
    Robot::new(RobotConfig::default(), hardware, None)
}

async fn wait_for<F: Fn(&Robot) -> bool>(robot: &mut Robot, ready: F) -> bool {
    for _ in 0..100 {
        robot.teleop_periodic();
        if ready(robot) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

/// A driver station connection feeding targets all the way into the robot's
/// teleop loop.
#[tokio::test]
async fn test_robot_receives_targets_from_driver_station() -> Result<()> {
    let (server, receiver) = TargetServer::bind("127.0.0.1:0").await?;
    let address = server.local_addr()?;
    tokio::spawn(server.serve());

    let mut robot = build_robot();
    robot.attach_target_feed(receiver);
    robot.set_state(RobotState::Teleop);

    let mut stream = TcpStream::connect(address).await?;
    stream
        .write_all(b"[{\"side\":1,\"distance\":9.0,\"angle\":-3.5,\"is_hot\":true,\"confidence\":77.2}]\n")
        .await?;

    assert!(wait_for(&mut robot, |r| !r.targets().is_empty()).await);
    let target = &robot.targets()[0];
    assert_eq!(target.side, Side::Right);
    assert_eq!(target.distance, 9.0);
    assert_eq!(target.angle, -3.5);
    assert!(target.is_hot);
    Ok(())
}

#[tokio::test]
async fn test_no_targets_marker_clears_robot_targets() -> Result<()> {
    let (server, receiver) = TargetServer::bind("127.0.0.1:0").await?;
    let address = server.local_addr()?;
    tokio::spawn(server.serve());

    let mut robot = build_robot();
    robot.attach_target_feed(receiver);
    robot.set_state(RobotState::Teleop);

    let mut stream = TcpStream::connect(address).await?;
    stream.write_all(b"[{\"distance\":4.0}]\n").await?;
    assert!(wait_for(&mut robot, |r| !r.targets().is_empty()).await);

    stream.write_all(b"[{\"no_targets\":true}]\n").await?;
    assert!(wait_for(&mut robot, |r| r.targets().is_empty()).await);
    Ok(())
}
