use std::path::PathBuf;

use anyhow::{bail, Context};

/// What the viewer was asked to do, read from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub model: PathBuf,
    /// Frames of the scripted fly-through.
    pub frames: u32,
    /// Import with the recording device instead of a GPU.
    pub dry_run: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::new(),
            frames: 120,
            dry_run: false,
            width: 1024,
            height: 720,
        }
    }
}

pub const USAGE: &str = "usage: model-viewer <model.obj> [--frames N] [--dry-run]";

impl ViewerConfig {
    /// Parses the arguments following the program name.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let mut model = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--frames" => {
                    let value = args.next().context("--frames expects a number")?;
                    config.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count `{value}`"))?;
                }
                "--dry-run" => config.dry_run = true,
                flag if flag.starts_with("--") => bail!("unknown option `{flag}`\n{USAGE}"),
                _ if model.is_some() => bail!("only one model can be viewed\n{USAGE}"),
                _ => model = Some(PathBuf::from(arg)),
            }
        }

        config.model = model.with_context(|| format!("no model given\n{USAGE}"))?;
        Ok(config)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ViewerConfig> {
        ViewerConfig::from_args(args.iter().map(ToString::to_string))
    }

    #[test]
    fn test_model_only() {
        let config = parse(&["backpack.obj"]).unwrap();
        assert_eq!(config.model, PathBuf::from("backpack.obj"));
        assert_eq!(config.frames, 120);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_options() {
        let config = parse(&["--frames", "3", "scene.obj", "--dry-run"]).unwrap();
        assert_eq!(config.frames, 3);
        assert!(config.dry_run);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.obj", "b.obj"]).is_err());
        assert!(parse(&["a.obj", "--frames", "many"]).is_err());
        assert!(parse(&["a.obj", "--fast"]).is_err());
    }
}
