//! Command-line arguments for veil-sim.

use std::path::PathBuf;
use std::time::Duration;

/// Parsed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub tabs: usize,
    /// Scope id, or `global`.
    pub scope: String,
    pub password: String,
    pub catalog: Option<PathBuf>,
    pub poll_interval: Option<Duration>,
    pub suppress_native: bool,
    pub help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            tabs: 3,
            scope: "global".to_string(),
            password: String::new(),
            catalog: None,
            poll_interval: None,
            suppress_native: false,
            help: false,
        }
    }
}

impl Args {
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--suppress-native" => parsed.suppress_native = true,
                "--tabs" => {
                    let value = value_of(&mut args, "--tabs")?;
                    parsed.tabs = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| format!("--tabs expects a positive number, got {:?}", value))?;
                }
                "--scope" => parsed.scope = value_of(&mut args, "--scope")?,
                "--password" => parsed.password = value_of(&mut args, "--password")?,
                "--catalog" => parsed.catalog = Some(PathBuf::from(value_of(&mut args, "--catalog")?)),
                "--poll-ms" => {
                    let value = value_of(&mut args, "--poll-ms")?;
                    let millis: u64 = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| format!("--poll-ms expects a positive number, got {:?}", value))?;
                    parsed.poll_interval = Some(Duration::from_millis(millis));
                }
                other => return Err(format!("unknown argument: {}", other)),
            }
        }

        Ok(parsed)
    }
}

fn value_of<I>(args: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or_else(|| format!("{} expects a value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        Args::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args, Args::default());
        assert_eq!(args.tabs, 3);
        assert_eq!(args.scope, "global");
    }

    #[test]
    fn full_command_line() {
        let args = parse(&[
            "--tabs", "5",
            "--scope", "iq-plugin",
            "--password", "open sesame",
            "--catalog", "site.json",
            "--poll-ms", "250",
            "--suppress-native",
        ])
        .unwrap();

        assert_eq!(args.tabs, 5);
        assert_eq!(args.scope, "iq-plugin");
        assert_eq!(args.password, "open sesame");
        assert_eq!(args.catalog, Some(PathBuf::from("site.json")));
        assert_eq!(args.poll_interval, Some(Duration::from_millis(250)));
        assert!(args.suppress_native);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["--tabs", "0"]).is_err());
        assert!(parse(&["--tabs", "many"]).is_err());
        assert!(parse(&["--poll-ms", "0"]).is_err());
        assert!(parse(&["--scope"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }
}
