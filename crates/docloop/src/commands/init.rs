use libdocloop_core::config::CONFIG_FILE;
use libdocloop_core::{load_config, save_config, Config, DocloopError};
use serde::Serialize;

use crate::cli::Cli;
use crate::context::DocloopContext;
use crate::output::{emit, note};

#[derive(Serialize)]
struct InitOutput {
    data_dir: String,
    config: String,
    created: bool,
}

pub fn run(cli: &Cli, force: bool) -> Result<(), DocloopError> {
    let data_dir = DocloopContext::data_dir(cli)?;
    let config_path = data_dir.join(CONFIG_FILE);

    let created = force || load_config(&data_dir)?.is_none();
    if created {
        save_config(&data_dir, &Config::default())?;
    }

    emit(
        cli,
        InitOutput {
            data_dir: data_dir.to_string_lossy().to_string(),
            config: config_path.to_string_lossy().to_string(),
            created,
        },
    )?;
    if created {
        note(cli, &format!("Initialized docloop in {}", data_dir.display()));
    } else {
        note(
            cli,
            &format!("Already initialized: {} (use --force to reset)", config_path.display()),
        );
    }

    Ok(())
}
