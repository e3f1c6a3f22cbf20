use livery::app::run_with_config;
use livery::cli::CliOverrides;
use livery::config::DEFAULT_CONFIG_PATH;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(2);
        }
    };
    let config_path = cli.config_path().cloned().unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    if let Err(err) = pollster::block_on(run_with_config(config_path, cli.into_config_overrides())) {
        log::error!("Application error: {err:?}");
        std::process::exit(1);
    }
}
