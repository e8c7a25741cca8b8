//! `plasma-lab [scene] [--config path.json]`

use std::process::ExitCode;

use plasma_lab::config::LabConfig;
use plasma_lab::scenes::SceneKind;
use plasma_lab::{AppError, ConfigError};

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<LabConfig, AppError> {
    let mut scene: Option<SceneKind> = None;
    let mut config_path: Option<String> = None;

    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = Some(args.next().ok_or(ConfigError::MissingValue(arg))?);
        } else {
            scene = Some(arg.parse()?);
        }
    }

    let mut config = match config_path {
        Some(path) => {
            log::info!("loading config from {}", path);
            LabConfig::load(path)?
        }
        None => LabConfig::default(),
    };
    if let Some(scene) = scene {
        config.scene = scene;
    }
    Ok(config)
}

fn main() -> ExitCode {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let result = parse_args(std::env::args().skip(1)).and_then(plasma_lab::app::run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_scene_argument() {
        let config = parse_args(args(&["plasma-field"])).unwrap();
        assert_eq!(config.scene, SceneKind::PlasmaField);
    }

    #[test]
    fn test_no_arguments_use_defaults() {
        assert_eq!(parse_args(args(&[])).unwrap(), LabConfig::default());
    }

    #[test]
    fn test_config_flag_needs_path() {
        let err = parse_args(args(&["--config"])).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::MissingValue(_))));
    }

    #[test]
    fn test_unknown_scene_argument() {
        let err = parse_args(args(&["fireworks"])).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::UnknownScene(_))));
    }
}
