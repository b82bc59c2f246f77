use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podanchor_config::Config;
use std::path::Path;
use std::process::ExitCode;

pub fn run(path: Option<&Path>) -> Result<ExitCode> {
    let Some(path) = path.map(Path::to_path_buf).or_else(Config::default_path) else {
        exn::bail!(ErrorKind::Config);
    };
    match Config::write_template(&path).or_raise(|| ErrorKind::Config)? {
        true => println!("Wrote configuration to {}", path.display()),
        false => println!("Configuration already exists at {}; left untouched", path.display()),
    }
    Ok(ExitCode::SUCCESS)
}
