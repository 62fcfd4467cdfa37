use clap::Parser;
use frcbot::config::params::RobotConfig;
use frcbot::core::autoscript::AutoScript;
use frcbot::core::drivetrain::DriveHardware;
use frcbot::domain::ports::{
    AccelerometerInput, AnalogInput, GamepadInput, GyroInput, MotorOutput,
};
use frcbot::sim::{SimAccelerometer, SimAnalog, SimGamepad, SimGyro, SimMotor};
use frcbot::utils::{datalog::DataLog, logger, validation::Validate};
use frcbot::{CliConfig, Robot, RobotHardware, RobotState, TargetServer};
use std::path::Path;
use std::time::Duration;

/// One control cycle at the standard 50 Hz robot loop rate.
const TICK: Duration = Duration::from_millis(20);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting frcbot simulation");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("Argument validation failed: {}", e);
        eprintln!("invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config = RobotConfig::load_or_default(&cli.params)?;
    if let Err(e) = config.validate() {
        tracing::error!("Parameter validation failed: {}", e);
        eprintln!("invalid parameters: {}", e);
        std::process::exit(1);
    }
    let targeting = config.targeting.clone();

    let drive_log = match cli.log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Some(DataLog::create(Path::new(dir).join("drivetrain.log"), true)?)
        }
        None => None,
    };

    let mut robot = Robot::new(config.clone(), build_sim_hardware(&config), drive_log);

    if targeting.enabled {
        let address = format!("{}:{}", targeting.bind_address, targeting.port);
        let (server, receiver) = TargetServer::bind(&address).await?;
        tracing::info!("Target server listening on {}", server.local_addr()?);
        robot.attach_target_feed(receiver);
        tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                tracing::error!("Target server stopped: {}", e);
            }
        });
    }

    match select_script(&cli)? {
        Some(script) => robot.load_script(script),
        None => tracing::warn!("No autonomous script, robot will sit idle"),
    }

    run_autonomous(&mut robot, cli.ticks).await;

    robot.set_state(RobotState::Disabled);
    robot.disabled_periodic();
    tracing::info!("Simulation complete");
    Ok(())
}

/// Picks the autonomous script: an explicit `--autoscript` wins, otherwise
/// the first script in the script directory.
fn select_script(cli: &CliConfig) -> frcbot::Result<Option<AutoScript>> {
    if let Some(path) = cli.autoscript.as_deref() {
        tracing::info!("Loading autonomous script {}", path);
        return Ok(Some(AutoScript::from_file(path)?));
    }

    let available = match AutoScript::available_scripts(&cli.autoscript_dir) {
        Ok(scripts) => scripts,
        Err(e) => {
            tracing::warn!("Cannot list scripts in {}: {}", cli.autoscript_dir, e);
            return Ok(None);
        }
    };
    for script in &available {
        tracing::debug!("Available script: {}", script.display());
    }
    match available.first() {
        Some(path) => {
            tracing::info!("Loading autonomous script {}", path.display());
            Ok(Some(AutoScript::from_file(path)?))
        }
        None => Ok(None),
    }
}

/// Connects simulated devices for every hardware channel the parameters
/// declare. Channels left at -1 stay disconnected and their subsystems come
/// up disabled.
fn build_sim_hardware(config: &RobotConfig) -> RobotHardware {
    fn motor(channel: i32) -> Option<Box<dyn MotorOutput>> {
        (channel > 0).then(|| Box::new(SimMotor::new()) as Box<dyn MotorOutput>)
    }
    fn gamepad(port: i32) -> Option<Box<dyn GamepadInput>> {
        (port >= 0).then(|| Box::new(SimGamepad::new()) as Box<dyn GamepadInput>)
    }

    let drivetrain = &config.drivetrain;
    let gyro = (drivetrain.gyro_channel > 0)
        .then(|| Box::new(SimGyro::new()) as Box<dyn GyroInput>);
    let accelerometer = (drivetrain.accelerometer_slot > 0)
        .then(|| Box::new(SimAccelerometer::new()) as Box<dyn AccelerometerInput>);
    let rangefinder = (config.rangefinder.channel > 0)
        .then(|| Box::new(SimAnalog::new()) as Box<dyn AnalogInput>);

    RobotHardware {
        drive: DriveHardware {
            left_motor: motor(drivetrain.left_motor_channel),
            right_motor: motor(drivetrain.right_motor_channel),
            gyro,
            accelerometer,
        },
        feeder_left_wheel: motor(config.feeder.left_arm.motor_channel),
        feeder_right_wheel: motor(config.feeder.right_arm.motor_channel),
        lift_motor: motor(config.lift.motor_channel),
        driver_gamepad: gamepad(config.userinterface.driver.port),
        scoring_gamepad: gamepad(config.userinterface.scoring.port),
        rangefinder_channel: rangefinder,
    }
}

/// Runs the autonomous period for at most `ticks` control cycles.
async fn run_autonomous(robot: &mut Robot, ticks: u64) {
    robot.set_state(RobotState::Autonomous);
    let mut interval = tokio::time::interval(TICK);
    for _ in 0..ticks {
        interval.tick().await;
        robot.autonomous_periodic();
        if robot.script_finished() {
            tracing::info!("Autonomous period finished");
            break;
        }
    }
}
