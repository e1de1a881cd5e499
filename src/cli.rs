use crate::frame::Termination;
use clap::{crate_version, Args, Command, FromArgMatches};
use std::{num::NonZeroU64, path::PathBuf};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct HeadlessArgs {
    pub out_file: PathBuf,
    pub frames: NonZeroU64,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Arguments {
    pub config: Option<PathBuf>,
    pub frames: Option<NonZeroU64>,
    pub headless: Option<HeadlessArgs>,
}

impl Arguments {
    pub fn termination(&self) -> Termination {
        self.frames
            .map_or(Termination::Never, Termination::AfterFrames)
    }
}

#[derive(Args, Debug)]
#[clap(version, long_about = None)]
struct SceneArgs {
    /// Scene configuration (TOML) to use instead of the built-in one
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Exit after rendering this many frames
    #[clap(long, short)]
    frames: Option<NonZeroU64>,
    /// Render without a window and write the last frame to --output
    #[clap(long, action, requires = "frames", requires = "output")]
    headless: bool,
    /// PNG file written by a headless run
    #[clap(long, short, requires = "headless")]
    output: Option<PathBuf>,
}

impl From<SceneArgs> for Arguments {
    fn from(args: SceneArgs) -> Self {
        let SceneArgs {
            config,
            frames,
            headless,
            output,
        } = args;

        let headless = match (headless, output, frames) {
            (true, Some(out_file), Some(frames)) => Some(HeadlessArgs { out_file, frames }),
            _ => None,
        };

        Self {
            config,
            frames,
            headless,
        }
    }
}

pub fn parse_cli(name: &str, description: Option<&str>) -> Arguments {
    let matches = command(name, description).get_matches();

    match SceneArgs::from_arg_matches(&matches) {
        Ok(args) => args.into(),
        Err(err) => err.exit(),
    }
}

pub fn command(name: &str, description: Option<&str>) -> Command {
    let name: &'static str = Box::leak(name.to_owned().into_boxed_str());

    let mut cmd = SceneArgs::augment_args(
        Command::new(name)
            .bin_name(name)
            .version(crate_version!()),
    );

    if let Some(description) = description {
        cmd = cmd.about(description.to_owned());
    }

    cmd
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Result<Arguments, clap::Error> {
        let matches = command("kitten", None).try_get_matches_from(args)?;
        SceneArgs::from_arg_matches(&matches).map(Into::into)
    }

    #[test]
    fn no_arguments() {
        let args = parse(&["kitten"]).unwrap();
        assert_eq!(Arguments::default(), args);
        assert_eq!(Termination::Never, args.termination());
    }

    #[test]
    fn frame_limit() {
        let args = parse(&["kitten", "--frames", "120"]).unwrap();
        assert_eq!(
            Termination::AfterFrames(NonZeroU64::new(120).unwrap()),
            args.termination()
        );
        assert_eq!(None, args.headless);
    }

    #[test]
    fn zero_frames_rejected() {
        assert!(parse(&["kitten", "--frames", "0"]).is_err());
    }

    #[test]
    fn headless() {
        let args = parse(&[
            "kitten",
            "--headless",
            "-f",
            "3",
            "-o",
            "out.png",
            "--config",
            "scene.toml",
        ])
        .unwrap();

        assert_eq!(Some(PathBuf::from("scene.toml")), args.config);
        assert_eq!(
            Some(HeadlessArgs {
                out_file: PathBuf::from("out.png"),
                frames: NonZeroU64::new(3).unwrap(),
            }),
            args.headless
        );
    }

    #[test]
    fn headless_requires_output() {
        assert!(parse(&["kitten", "--headless", "--frames", "3"]).is_err());
    }

    #[test]
    fn output_requires_headless() {
        assert!(parse(&["kitten", "--output", "out.png"]).is_err());
    }
}
