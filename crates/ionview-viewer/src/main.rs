use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use winit::dpi::LogicalSize;

use ionview_engine::assets::GltfLoader;
use ionview_engine::device::GpuInit;
use ionview_engine::logging::{init_logging, LoggingConfig};
use ionview_engine::window::{Runtime, RuntimeConfig};
use ionview_engine::{Viewer, ViewerConfig};

const DEFAULT_CONFIG_PATH: &str = "ionview.toml";

fn cli() -> Command {
    Command::new("ionview")
        .about("Displays a glTF model with bloom and an orbit camera")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Viewer configuration (TOML); defaults are used if the file is missing")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("asset")
                .value_name("ASSET")
                .help("Model to display; overrides asset.path from the config"),
        )
        .arg(
            Arg::new("log")
                .short('l')
                .long("log")
                .value_name("FILTER")
                .help("Log filter, e.g. \"info\" or \"ionview_engine=debug\""),
        )
        .arg(
            Arg::new("dump-config")
                .long("dump-config")
                .action(ArgAction::SetTrue)
                .help("Print the effective configuration and exit"),
        )
}

fn load_config(matches: &ArgMatches) -> Result<ViewerConfig> {
    let path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = ViewerConfig::load_or_default(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    if let Some(asset) = matches.get_one::<String>("asset") {
        config.asset.path = PathBuf::from(asset);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let logging = match matches.get_one::<String>("log") {
        Some(filter) => LoggingConfig::with_filter(filter.as_str()),
        None => LoggingConfig::default(),
    };
    init_logging(logging);

    let config = load_config(&matches)?;

    if matches.get_flag("dump-config") {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    log::info!("ionview starting: asset {}", config.asset.path.display());

    let viewport = (config.window.width, config.window.height);
    let viewer = pollster::block_on(Viewer::load(&GltfLoader::new(), &config, viewport))
        .with_context(|| format!("failed to start viewer for {}", config.asset.path.display()))?;

    let runtime = RuntimeConfig {
        title: config.window.title.clone(),
        initial_size: LogicalSize::new(f64::from(config.window.width), f64::from(config.window.height)),
    };
    let gpu_init = GpuInit::default().with_vsync(config.window.vsync);

    Runtime::run(runtime, gpu_init, viewer)
}
