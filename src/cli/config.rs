use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

fn describe(settings: &Settings) -> String {
    format!(
        "{}\n  data_file:  {}\n  export_dir: {}",
        settings_path().display().to_string().bold(),
        settings.data_file,
        settings.export_dir
    )
}

pub fn run(data_file: Option<String>, export_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    let changed = data_file.is_some() || export_dir.is_some();
    if let Some(f) = data_file {
        settings.data_file = f;
    }
    if let Some(d) = export_dir {
        settings.export_dir = d;
    }
    if changed {
        save_settings(&settings)?;
        println!("Settings saved.");
    }
    println!("{}", describe(&settings));
    Ok(())
}
