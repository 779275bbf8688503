use super::model::{Command, CommandType, ValidatedCommand};
use thiserror::Error;

/// 更新采样间隔的上限（秒）
pub const MAX_INTERVAL_SECS: i32 = 3600;

/// 指令校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("device id is empty")]
    EmptyDeviceId,

    #[error("unknown command type: {0}")]
    UnknownCommand(String),

    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("interval must be an integer in 1..=3600, got {0:?}")]
    InvalidInterval(String),
}

/// 校验指令并解析参数
pub fn validate(command: &Command) -> Result<ValidatedCommand, ValidationError> {
    if command.device_id.is_empty() {
        return Err(ValidationError::EmptyDeviceId);
    }

    let command_type = CommandType::parse(&command.command_type)
        .ok_or_else(|| ValidationError::UnknownCommand(command.command_type.clone()))?;

    match command_type {
        CommandType::Restart => Ok(ValidatedCommand::Restart),
        CommandType::Sleep => Ok(ValidatedCommand::Sleep),
        CommandType::Wake => Ok(ValidatedCommand::Wake),
        CommandType::Calibrate => {
            let sensor_type = require(command, "sensor_type")?;
            Ok(ValidatedCommand::Calibrate {
                sensor_type: sensor_type.to_string(),
            })
        }
        CommandType::UpdateInterval => {
            let raw = require(command, "interval")?;
            let interval = parse_interval(raw)?;
            Ok(ValidatedCommand::UpdateInterval {
                interval,
                raw: raw.to_string(),
            })
        }
        CommandType::SetConfig => {
            let key = require(command, "key")?;
            let value = require(command, "value")?;
            Ok(ValidatedCommand::SetConfig {
                key: key.to_string(),
                value: value.to_string(),
            })
        }
    }
}

fn require<'a>(command: &'a Command, name: &'static str) -> Result<&'a str, ValidationError> {
    command
        .param(name)
        .ok_or(ValidationError::MissingParameter(name))
}

fn parse_interval(raw: &str) -> Result<u32, ValidationError> {
    match raw.parse::<i32>() {
        Ok(value) if value > 0 && value <= MAX_INTERVAL_SECS => Ok(value as u32),
        _ => Err(ValidationError::InvalidInterval(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(value: &str) -> Command {
        Command::new("dev-001", "UPDATE_INTERVAL").with_param("interval", value)
    }

    #[test]
    fn test_empty_device_id() {
        let cmd = Command::new("", "RESTART");
        assert_eq!(validate(&cmd), Err(ValidationError::EmptyDeviceId));
    }

    #[test]
    fn test_unknown_command() {
        let cmd = Command::new("dev-001", "SELF_DESTRUCT");
        assert!(matches!(validate(&cmd), Err(ValidationError::UnknownCommand(_))));
    }

    #[test]
    fn test_no_param_commands() {
        for name in ["restart", "SLEEP", "Wake"] {
            assert!(validate(&Command::new("dev-001", name)).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_interval_bounds() {
        assert_eq!(
            validate(&interval("3600")),
            Ok(ValidatedCommand::UpdateInterval {
                interval: 3600,
                raw: "3600".to_string()
            })
        );
        assert_eq!(
            validate(&interval("1")),
            Ok(ValidatedCommand::UpdateInterval {
                interval: 1,
                raw: "1".to_string()
            })
        );
        assert!(validate(&interval("3601")).is_err());
        assert!(validate(&interval("0")).is_err());
        assert!(validate(&interval("-5")).is_err());
        assert!(validate(&interval("abc")).is_err());
        assert!(validate(&interval("")).is_err());
        assert!(validate(&interval("99999999999")).is_err());
    }

    #[test]
    fn test_interval_missing() {
        let cmd = Command::new("dev-001", "UPDATE_INTERVAL");
        assert_eq!(validate(&cmd), Err(ValidationError::MissingParameter("interval")));
    }

    #[test]
    fn test_calibrate_requires_sensor_type() {
        let cmd = Command::new("dev-001", "CALIBRATE");
        assert_eq!(validate(&cmd), Err(ValidationError::MissingParameter("sensor_type")));

        let cmd = cmd.with_param("sensor_type", "thermal");
        assert_eq!(
            validate(&cmd),
            Ok(ValidatedCommand::Calibrate {
                sensor_type: "thermal".to_string()
            })
        );
    }

    #[test]
    fn test_set_config_requires_key_and_value() {
        let cmd = Command::new("dev-001", "SET_CONFIG").with_param("key", "x");
        assert_eq!(validate(&cmd), Err(ValidationError::MissingParameter("value")));

        // 空字符串也可接受
        let cmd = cmd.with_param("value", "");
        assert!(validate(&cmd).is_ok());
    }
}
