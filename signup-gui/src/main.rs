use std::{error::Error, io::Write, path::PathBuf, process};

use iced::Size;
use tracing::error;

use signup::{config::FormVariant, dir::DataDirectory, VERSION};

mod gui;
mod logger;
mod view;

use gui::{Config, Gui};

#[derive(Debug, PartialEq)]
enum Arg {
    DatadirPath(PathBuf),
    ConfigPath(PathBuf),
    Local,
}

fn parse_args(args: Vec<String>) -> Result<Vec<Arg>, Box<dyn Error>> {
    let mut res = Vec::new();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        eprintln!("{}", VERSION);
        process::exit(0);
    }

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        eprintln!(
            r#"
Usage: signup-gui [OPTIONS]

Options:
    --datadir <PATH>    Path of the data directory
    --conf <PATH>       Path of the configuration file
    --local             Run the registration-only form, submissions are not sent
    -v, --version       Display signup-gui version
    -h, --help          Print help
        "#
        );
        process::exit(0);
    }

    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--datadir" => match args.next() {
                Some(a) => res.push(Arg::DatadirPath(PathBuf::from(a))),
                None => return Err("missing arg to --datadir".into()),
            },
            "--conf" => match args.next() {
                Some(a) => res.push(Arg::ConfigPath(PathBuf::from(a))),
                None => return Err("missing arg to --conf".into()),
            },
            "--local" => res.push(Arg::Local),
            a => return Err(format!("unknown argument '{}'", a).into()),
        }
    }

    Ok(res)
}

fn load_config(args: Vec<Arg>) -> Result<Config, Box<dyn Error>> {
    let mut datadir = None;
    let mut config_path = None;
    let mut local = false;
    for arg in args {
        match arg {
            Arg::DatadirPath(p) => datadir = Some(DataDirectory::new(p)),
            Arg::ConfigPath(p) => config_path = Some(p),
            Arg::Local => local = true,
        }
    }

    let default_datadir = match datadir.clone() {
        Some(d) => d,
        None => DataDirectory::new_default()?,
    };
    let mut settings = signup::config::Config::load(config_path, &default_datadir)?;
    if local {
        settings.variant = FormVariant::Local;
    }

    // The command line wins over the configuration file.
    let datadir = datadir
        .or_else(|| settings.data_dir.clone().map(DataDirectory::new))
        .unwrap_or(default_datadir);
    if !datadir.exists() {
        datadir.init()?;
    }

    Ok(Config {
        datadir,
        settings,
        log_level: logger::parse_log_level()?,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args(std::env::args().collect())?;
    let config = load_config(args)?;

    setup_panic_hook();

    if let Err(e) = iced::application(Gui::title, Gui::update, Gui::view)
        .window_size(Size::new(520.0, 760.0))
        .run_with(move || Gui::new(config))
    {
        error!("{}", e);
        Err(format!("Failed to launch UI: {}", e).into())
    } else {
        Ok(())
    }
}

// A panic in any thread should stop the main thread, and print the panic.
fn setup_panic_hook() {
    std::panic::set_hook(Box::new(move |panic_info| {
        let file = panic_info
            .location()
            .map(|l| l.file())
            .unwrap_or_else(|| "'unknown'");
        let line = panic_info
            .location()
            .map(|l| l.line().to_string())
            .unwrap_or_else(|| "'unknown'".to_string());

        let bt = backtrace::Backtrace::new();
        let info = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned());
        error!(
            "panic occurred at line {} of file {}: {:?}\n{:?}",
            line, file, info, bt
        );

        std::io::stdout().flush().expect("Flushing stdout");
        std::process::exit(1);
    }));
}
