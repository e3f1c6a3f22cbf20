use crate::config::ViewerConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    width: Option<u32>,
    height: Option<u32>,
    vsync: Option<bool>,
    model: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // program name
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "vsync" => overrides.vsync = Some(parse_bool_flag("vsync", &value)?),
                "model" => overrides.model = Some(PathBuf::from(value)),
                "config" => overrides.config = Some(PathBuf::from(value)),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --width, --height, --vsync, --model, --config."
                ),
            }
        }
        Ok(overrides)
    }

    /// Config file requested with `--config`, if any.
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn into_config_overrides(self) -> ViewerConfigOverrides {
        ViewerConfigOverrides { width: self.width, height: self.height, vsync: self.vsync, model: self.model }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_flags_and_model() {
        let args = ["livery", "--width", "1600", "--height", "900", "--vsync", "off", "--model", "car.gltf"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.width, Some(1600));
        assert_eq!(overrides.height, Some(900));
        assert_eq!(overrides.vsync, Some(false));
        assert_eq!(overrides.model, Some(PathBuf::from("car.gltf")));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["livery", "--width", "800", "--width", "1920", "--vsync", "on", "--vsync", "off"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!((overrides.width, overrides.height, overrides.vsync), (Some(1920), None, Some(false)));
    }

    #[test]
    fn config_flag_is_kept_separately() {
        let overrides = CliOverrides::parse(["livery", "--config", "alt.json"]).expect("parse");
        assert_eq!(overrides.config_path(), Some(&PathBuf::from("alt.json")));
        assert!(overrides.into_config_overrides().is_empty());
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["livery", "--model"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_values() {
        let err = CliOverrides::parse(["livery", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"));
        let err = CliOverrides::parse(["livery", "--vsync", "maybe"]).unwrap_err();
        assert!(err.to_string().contains("Invalid vsync"));
    }
}
