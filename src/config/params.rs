use crate::utils::error::{Result, RobotError};
use crate::utils::validation::{
    validate_ip_address, validate_non_negative, validate_range, validate_speed_ratio, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Robot parameters file.
///
/// One table per subsystem. Every field has a default matching the behavior
/// of an unconfigured robot, so a partial (or missing) file leaves the
/// remaining subsystems disabled rather than failing: a hardware channel of
/// -1 means the device is not installed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub drivetrain: DrivetrainConfig,
    pub feeder: FeederConfig,
    pub lift: LiftConfig,
    pub userinterface: UserInterfaceConfig,
    pub targeting: TargetingConfig,
    pub rangefinder: RangefinderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub left_motor_channel: i32,
    pub left_motor_inverted: bool,
    pub right_motor_channel: i32,
    pub right_motor_inverted: bool,
    pub gyro_channel: i32,
    pub gyro_sensitivity: f64,
    pub accelerometer_slot: i32,
    pub accelerometer_range: i32,
    pub accelerometer_axis: u8,

    pub forward_direction: f64,
    pub backward_direction: f64,
    pub left_direction: f64,
    pub right_direction: f64,

    pub normal_linear_speed_ratio: f64,
    pub alternate_linear_speed_ratio: f64,
    pub normal_turning_speed_ratio: f64,
    pub alternate_turning_speed_ratio: f64,
    pub auto_far_linear_speed_ratio: f64,
    pub auto_medium_linear_speed_ratio: f64,
    pub auto_near_linear_speed_ratio: f64,
    pub auto_far_turning_speed_ratio: f64,
    pub auto_medium_turning_speed_ratio: f64,
    pub auto_near_turning_speed_ratio: f64,

    pub distance_threshold: f64,
    pub auto_medium_distance_threshold: f64,
    pub auto_far_distance_threshold: f64,
    pub heading_threshold: f64,
    pub auto_medium_heading_threshold: f64,
    pub auto_far_heading_threshold: f64,
    pub time_threshold: f64,
    pub auto_medium_time_threshold: f64,
    pub auto_far_time_threshold: f64,

    pub maximum_linear_speed_change: f64,
    pub maximum_turn_speed_change: f64,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            left_motor_channel: -1,
            left_motor_inverted: false,
            right_motor_channel: -1,
            right_motor_inverted: false,
            gyro_channel: -1,
            gyro_sensitivity: 0.007,
            accelerometer_slot: -1,
            accelerometer_range: -1,
            accelerometer_axis: 0,
            forward_direction: 1.0,
            backward_direction: -1.0,
            left_direction: -1.0,
            right_direction: 1.0,
            normal_linear_speed_ratio: 1.0,
            alternate_linear_speed_ratio: 1.0,
            normal_turning_speed_ratio: 1.0,
            alternate_turning_speed_ratio: 1.0,
            auto_far_linear_speed_ratio: 1.0,
            auto_medium_linear_speed_ratio: 1.0,
            auto_near_linear_speed_ratio: 1.0,
            auto_far_turning_speed_ratio: 1.0,
            auto_medium_turning_speed_ratio: 1.0,
            auto_near_turning_speed_ratio: 1.0,
            distance_threshold: 0.5,
            auto_medium_distance_threshold: 2.0,
            auto_far_distance_threshold: 5.0,
            heading_threshold: 3.0,
            auto_medium_heading_threshold: 15.0,
            auto_far_heading_threshold: 25.0,
            time_threshold: 0.1,
            auto_medium_time_threshold: 0.5,
            auto_far_time_threshold: 1.0,
            maximum_linear_speed_change: 0.0,
            maximum_turn_speed_change: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederArmConfig {
    pub motor_channel: i32,
    pub time_threshold: f64,
    pub clockwise_direction: f64,
    pub counter_clockwise_direction: f64,
    pub clockwise_speed_ratio: f64,
    pub counter_clockwise_speed_ratio: f64,
}

impl Default for FeederArmConfig {
    fn default() -> Self {
        Self {
            motor_channel: -1,
            time_threshold: 0.1,
            clockwise_direction: 1.0,
            counter_clockwise_direction: -1.0,
            clockwise_speed_ratio: 1.0,
            counter_clockwise_speed_ratio: 1.0,
        }
    }
}

/// The feeder is a pair of arms; both must be present for it to operate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    pub left_arm: FeederArmConfig,
    pub right_arm: FeederArmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    pub motor_channel: i32,
    pub time_threshold: f64,
    pub up_direction: f64,
    pub down_direction: f64,
    pub up_speed_ratio: f64,
    pub down_speed_ratio: f64,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            motor_channel: -1,
            time_threshold: 0.1,
            up_direction: 1.0,
            down_direction: -1.0,
            up_speed_ratio: 1.0,
            down_speed_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub port: i32,
    pub buttons: usize,
    pub dead_band: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            port: -1,
            buttons: 10,
            dead_band: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInterfaceConfig {
    pub driver: ControllerConfig,
    pub scoring: ControllerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "0.0.0.0".to_string(),
            port: 1180,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangefinderConfig {
    pub channel: i32,
    pub volts_per_inch: f64,
}

impl Default for RangefinderConfig {
    fn default() -> Self {
        Self {
            channel: -1,
            volts_per_inch: 5.0 / 512.0,
        }
    }
}

impl RobotConfig {
    /// Loads parameters from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RobotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Loads parameters, falling back to the all-defaults configuration when
    /// the file does not exist (every subsystem then comes up disabled). A
    /// file that exists but fails to parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            tracing::info!("Loading parameters from {}", path.as_ref().display());
            Self::from_file(path)
        } else {
            tracing::warn!(
                "Parameters file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Parses parameters from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RobotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` references with environment variable values.
    /// Unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

impl Validate for RobotConfig {
    fn validate(&self) -> Result<()> {
        let dt = &self.drivetrain;
        validate_speed_ratio("drivetrain.normal_linear_speed_ratio", dt.normal_linear_speed_ratio)?;
        validate_speed_ratio(
            "drivetrain.alternate_linear_speed_ratio",
            dt.alternate_linear_speed_ratio,
        )?;
        validate_speed_ratio(
            "drivetrain.normal_turning_speed_ratio",
            dt.normal_turning_speed_ratio,
        )?;
        validate_speed_ratio(
            "drivetrain.alternate_turning_speed_ratio",
            dt.alternate_turning_speed_ratio,
        )?;
        for (name, value) in [
            ("drivetrain.auto_far_linear_speed_ratio", dt.auto_far_linear_speed_ratio),
            (
                "drivetrain.auto_medium_linear_speed_ratio",
                dt.auto_medium_linear_speed_ratio,
            ),
            ("drivetrain.auto_near_linear_speed_ratio", dt.auto_near_linear_speed_ratio),
            ("drivetrain.auto_far_turning_speed_ratio", dt.auto_far_turning_speed_ratio),
            (
                "drivetrain.auto_medium_turning_speed_ratio",
                dt.auto_medium_turning_speed_ratio,
            ),
            ("drivetrain.auto_near_turning_speed_ratio", dt.auto_near_turning_speed_ratio),
        ] {
            validate_speed_ratio(name, value)?;
        }
        validate_non_negative("drivetrain.distance_threshold", dt.distance_threshold)?;
        validate_non_negative("drivetrain.heading_threshold", dt.heading_threshold)?;
        validate_non_negative("drivetrain.time_threshold", dt.time_threshold)?;
        validate_non_negative(
            "drivetrain.maximum_linear_speed_change",
            dt.maximum_linear_speed_change,
        )?;
        validate_non_negative(
            "drivetrain.maximum_turn_speed_change",
            dt.maximum_turn_speed_change,
        )?;

        for (name, arm) in [
            ("feeder.left_arm", &self.feeder.left_arm),
            ("feeder.right_arm", &self.feeder.right_arm),
        ] {
            validate_speed_ratio(
                &format!("{}.clockwise_speed_ratio", name),
                arm.clockwise_speed_ratio,
            )?;
            validate_speed_ratio(
                &format!("{}.counter_clockwise_speed_ratio", name),
                arm.counter_clockwise_speed_ratio,
            )?;
            validate_non_negative(&format!("{}.time_threshold", name), arm.time_threshold)?;
        }

        validate_speed_ratio("lift.up_speed_ratio", self.lift.up_speed_ratio)?;
        validate_speed_ratio("lift.down_speed_ratio", self.lift.down_speed_ratio)?;
        validate_non_negative("lift.time_threshold", self.lift.time_threshold)?;

        validate_range(
            "userinterface.driver.dead_band",
            self.userinterface.driver.dead_band,
            0.0,
            0.5,
        )?;
        validate_range(
            "userinterface.scoring.dead_band",
            self.userinterface.scoring.dead_band,
            0.0,
            0.5,
        )?;

        if self.targeting.enabled {
            validate_ip_address("targeting.bind_address", &self.targeting.bind_address)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_leave_hardware_disabled() {
        let config = RobotConfig::default();
        assert_eq!(config.drivetrain.left_motor_channel, -1);
        assert_eq!(config.drivetrain.gyro_channel, -1);
        assert_eq!(config.feeder.left_arm.motor_channel, -1);
        assert_eq!(config.lift.motor_channel, -1);
        assert!(!config.targeting.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_content = r#"
[drivetrain]
left_motor_channel = 1
right_motor_channel = 2
right_motor_inverted = true
gyro_channel = 1
normal_linear_speed_ratio = 0.8

[lift]
motor_channel = 5
"#;

        let config = RobotConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.drivetrain.left_motor_channel, 1);
        assert!(config.drivetrain.right_motor_inverted);
        assert_eq!(config.drivetrain.normal_linear_speed_ratio, 0.8);
        // Unspecified fields keep their defaults
        assert_eq!(config.drivetrain.heading_threshold, 3.0);
        assert_eq!(config.lift.motor_channel, 5);
        assert_eq!(config.lift.up_speed_ratio, 1.0);
        assert_eq!(config.feeder.left_arm.motor_channel, -1);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_TARGETING_BIND", "127.0.0.1");

        let toml_content = r#"
[targeting]
enabled = true
bind_address = "${TEST_TARGETING_BIND}"
port = 1180
"#;

        let config = RobotConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.targeting.bind_address, "127.0.0.1");

        std::env::remove_var("TEST_TARGETING_BIND");
    }

    #[test]
    fn test_validation_rejects_bad_speed_ratio() {
        let toml_content = r#"
[drivetrain]
normal_linear_speed_ratio = 1.8
"#;

        let config = RobotConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_bind_address() {
        let toml_content = r#"
[targeting]
enabled = true
bind_address = "robot.local"
"#;

        let config = RobotConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[feeder.left_arm]
motor_channel = 3

[feeder.right_arm]
motor_channel = 4
counter_clockwise_speed_ratio = 0.5
"#;
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = RobotConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.feeder.left_arm.motor_channel, 3);
        assert_eq!(config.feeder.right_arm.counter_clockwise_speed_ratio, 0.5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(RobotConfig::from_file("/nonexistent/robot.toml").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = RobotConfig::load_or_default("/nonexistent/robot.toml").unwrap();
        assert_eq!(config.drivetrain.left_motor_channel, -1);
        assert_eq!(config.feeder.left_arm.motor_channel, -1);
        assert_eq!(config.lift.motor_channel, -1);
        assert!(!config.targeting.enabled);
    }

    #[test]
    fn test_unparseable_file_is_still_an_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"this is not toml [").unwrap();
        assert!(RobotConfig::load_or_default(temp_file.path()).is_err());
    }
}
