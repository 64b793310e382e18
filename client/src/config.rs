use bevy::prelude::*;
use shared::Settings;

/// How the client was launched: the display name to join with and the initial
/// settings.
#[derive(Resource, Clone, Debug)]
pub struct LaunchConfig {
    pub name: String,
    pub settings: Settings,
}

impl LaunchConfig {
    /// Supported:
    ///   --name <n> / --name=<n>, or SANDBOX_NAME
    ///   --settings <path> / --settings=<path>, or SANDBOX_SETTINGS
    pub fn from_cli_env() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let name = read_flag(&args, "name")
            .or_else(|| std::env::var("SANDBOX_NAME").ok())
            .unwrap_or_else(|| "Player".to_string());

        let settings = match read_flag(&args, "settings")
            .or_else(|| std::env::var("SANDBOX_SETTINGS").ok())
        {
            Some(path) => match Settings::load(&path) {
                Ok(settings) => {
                    info!("Loaded settings from {path}.");
                    settings
                }
                Err(err) => {
                    warn!("Could not load settings from {path}: {err}; using defaults.");
                    Settings::default()
                }
            },
            None => Settings::default(),
        };

        Self { name, settings }
    }
}

/// Value of `--<key> <value>` or `--<key>=<value>`. The first occurrence wins.
fn read_flag(args: &[String], key: &str) -> Option<String> {
    let flag = format!("--{key}");
    let prefix = format!("--{key}=");
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        if *arg == flag {
            return args.next().cloned();
        } else if let Some(val) = arg.strip_prefix(&prefix) {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_both_flag_forms() {
        let a = args(&["--name", "Ada", "--settings=prefs.json"]);
        assert_eq!(read_flag(&a, "name").as_deref(), Some("Ada"));
        assert_eq!(read_flag(&a, "settings").as_deref(), Some("prefs.json"));
    }

    #[test]
    fn missing_or_dangling_flag_is_none() {
        assert_eq!(read_flag(&args(&["--verbose"]), "name"), None);
        assert_eq!(read_flag(&args(&["--name"]), "name"), None);
        assert_eq!(read_flag(&args(&["--names=x"]), "name"), None);
    }
}
