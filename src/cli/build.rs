//! `build` command: convert every diagram of the site.
//!
//! Phases:
//! - **Scan** - find diagrams under the asset directory
//! - **Convert** - parallel conversion, skipping up-to-date outputs
//! - **Report** - summary line, one error line per failed diagram

use crate::{
    cli::BuildArgs,
    config::Config,
    converter::BpmnConverter,
    core::is_shutdown,
    debug,
    freshness::{get_mtime, is_output_fresh},
    log,
    logger::ProgressLine,
    raster::RenderingBackend,
    scan::{DiagramRoute, scan_diagrams},
    utils::plural_count,
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{fmt, fs, path::PathBuf};

/// Counts of a finished build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub converted: usize,
    pub fresh: usize,
    /// Not attempted because of Ctrl+C.
    pub skipped: usize,
    /// Failed diagrams and why, in source order.
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted {}", plural_count(self.converted, "diagram"))?;
        if self.fresh > 0 {
            write!(f, ", {} up to date", self.fresh)?;
        }
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

enum Outcome {
    Converted,
    Fresh,
    Skipped,
    Failed(anyhow::Error),
}

/// Build with the renderer from `config`.
pub fn build_site(config: &Config, args: &BuildArgs) -> Result<BuildReport> {
    let converter = BpmnConverter::from_config(config);
    build_diagrams(config, &converter, args, &is_shutdown)
}

/// Convert every discovered diagram, failing if any conversion failed.
///
/// Once `interrupted` returns true no further conversion starts; the
/// remaining diagrams count as skipped and the build fails.
pub fn build_diagrams<B: RenderingBackend>(
    config: &Config,
    converter: &BpmnConverter<B>,
    args: &BuildArgs,
    interrupted: &(dyn Fn() -> bool + Sync),
) -> Result<BuildReport> {
    let routes = scan_diagrams(config, converter);
    if routes.is_empty() {
        log!("build"; "no diagrams in {}", config.root_relative(config.build.assets_dir()).display());
        return Ok(BuildReport::default());
    }

    let outcomes = run_parallel(args, || {
        let progress = ProgressLine::new("bpmn", routes.len());
        let outcomes: Vec<_> = routes
            .par_iter()
            .map(|route| {
                let outcome = convert_route(config, converter, route, args.force, interrupted);
                progress.inc();
                outcome
            })
            .collect();
        progress.finish();
        outcomes
    })?;

    let mut report = BuildReport::default();
    for (route, outcome) in routes.into_iter().zip(outcomes) {
        match outcome {
            Outcome::Converted => report.converted += 1,
            Outcome::Fresh => report.fresh += 1,
            Outcome::Skipped => report.skipped += 1,
            Outcome::Failed(err) => report.failed.push((route.source, err)),
        }
    }

    for (source, err) in &report.failed {
        log!("error"; "{}: {:#}", config.root_relative(source).display(), err);
    }
    log!("build"; "{}", report);

    if !report.failed.is_empty() {
        bail!("{} did not convert", plural_count(report.failed.len(), "diagram"));
    }
    if report.skipped > 0 {
        bail!("build interrupted");
    }
    Ok(report)
}

/// Run `op` on a dedicated pool when `--jobs` is given, else on the global one.
fn run_parallel<T: Send>(args: &BuildArgs, op: impl FnOnce() -> T + Send) -> Result<T> {
    match args.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs.get())
                .build()
                .context("Failed to start conversion threads")?;
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}

fn convert_route<B: RenderingBackend>(
    config: &Config,
    converter: &BpmnConverter<B>,
    route: &DiagramRoute,
    force: bool,
    interrupted: &(dyn Fn() -> bool + Sync),
) -> Outcome {
    if interrupted() {
        return Outcome::Skipped;
    }
    if !force && is_output_fresh(&route.output, get_mtime(&route.source)) {
        debug!("build"; "up to date: {}", route.dir.join(&route.name).display());
        return Outcome::Fresh;
    }
    match write_route(config, converter, route) {
        Ok(()) => Outcome::Converted,
        Err(err) => Outcome::Failed(err),
    }
}

fn write_route<B: RenderingBackend>(
    config: &Config,
    converter: &BpmnConverter<B>,
    route: &DiagramRoute,
) -> Result<()> {
    let content = fs::read(&route.source)
        .with_context(|| format!("Failed to read `{}`", route.source.display()))?;
    let svg = converter.convert(&content)?;

    if let Some(parent) = route.output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create `{}`", parent.display()))?;
    }
    fs::write(&route.output, svg)
        .with_context(|| format!("Failed to write `{}`", route.output.display()))?;

    debug!("build"; "{} -> {}", route.dir.join(&route.name).display(),
        config.root_relative(&route.output).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{DiagramRasterizer, ProcessResult, RenderError, ScratchSpace};
    use std::num::NonZeroUsize;
    use std::path::Path;

    /// Wraps the diagram in `<svg>`, failing on diagrams that say `broken`.
    struct WrapBackend;

    impl RenderingBackend for WrapBackend {
        fn render(&self, input: &Path, output: &Path) -> Result<ProcessResult, RenderError> {
            let text = fs::read_to_string(input).map_err(RenderError::Scratch)?;
            if text == "broken" {
                return Ok(ProcessResult {
                    exit_code: Some(1),
                    stderr: "unparsable diagram".into(),
                });
            }
            fs::write(output, format!("<svg>{text}</svg>")).map_err(RenderError::Scratch)?;
            Ok(ProcessResult::ok())
        }
    }

    struct Site {
        _dir: tempfile::TempDir,
        config: Config,
        scratch: PathBuf,
    }

    fn site(files: &[(&str, &str)]) -> Site {
        let dir = tempfile::tempdir().unwrap();
        let root = crate::utils::path::normalize_path(dir.path());
        for (file, content) in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let scratch = root.join("scratch");
        fs::create_dir(&scratch).unwrap();

        let mut config = Config {
            root: root.clone(),
            ..Default::default()
        };
        config.build.normalize(&root);
        Site {
            _dir: dir,
            config,
            scratch,
        }
    }

    fn converter(scratch: &Path) -> BpmnConverter<WrapBackend> {
        BpmnConverter::new(
            DiagramRasterizer::new(WrapBackend).scratch(ScratchSpace::new().in_dir(scratch)),
        )
    }

    fn running() -> bool {
        false
    }

    fn args(force: bool) -> BuildArgs {
        BuildArgs {
            source: None,
            output: None,
            force,
            jobs: NonZeroUsize::new(2),
        }
    }

    #[test]
    fn test_build_writes_svgs() {
        let site = site(&[
            ("assets/bpmn/order.bpmn", "order"),
            ("assets/bpmn/flows/refund.BPMN", "refund"),
            ("assets/bpmn/readme.md", "docs"),
        ]);
        let report = build_diagrams(&site.config, &converter(&site.scratch), &args(false), &running).unwrap();

        assert_eq!(report.converted, 2);
        let output = &site.config.build.output;
        assert_eq!(
            fs::read_to_string(output.join("assets/bpmn/order.svg")).unwrap(),
            "<svg>order</svg>"
        );
        assert_eq!(
            fs::read_to_string(output.join("assets/bpmn/flows/refund.svg")).unwrap(),
            "<svg>refund</svg>"
        );
        assert!(!output.join("assets/bpmn/readme.svg").exists());
        assert_eq!(fs::read_dir(&site.scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_second_build_is_fresh_unless_forced() {
        let site = site(&[("assets/bpmn/order.bpmn", "order")]);
        let converter = converter(&site.scratch);

        build_diagrams(&site.config, &converter, &args(false), &running).unwrap();
        let report = build_diagrams(&site.config, &converter, &args(false), &running).unwrap();
        assert_eq!((report.converted, report.fresh), (0, 1));

        let report = build_diagrams(&site.config, &converter, &args(true), &running).unwrap();
        assert_eq!((report.converted, report.fresh), (1, 0));
    }

    #[test]
    fn test_failure_does_not_stop_other_diagrams() {
        let site = site(&[
            ("assets/bpmn/a.bpmn", "broken"),
            ("assets/bpmn/b.bpmn", "fine"),
        ]);
        let err = build_diagrams(&site.config, &converter(&site.scratch), &args(false), &running)
            .unwrap_err();

        assert!(err.to_string().contains("1 diagram"));
        let output = site.config.build.output.join("assets/bpmn");
        assert!(!output.join("a.svg").exists());
        assert!(output.join("b.svg").exists());
        assert_eq!(fs::read_dir(&site.scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_interrupted_build_converts_nothing() {
        let site = site(&[
            ("assets/bpmn/a.bpmn", "a"),
            ("assets/bpmn/b.bpmn", "b"),
        ]);
        let err = build_diagrams(&site.config, &converter(&site.scratch), &args(true), &|| true)
            .unwrap_err();

        assert_eq!(err.to_string(), "build interrupted");
        assert!(!site.config.build.output.exists());
        assert_eq!(fs::read_dir(&site.scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_interrupted_routes_are_skipped() {
        let site = site(&[("assets/bpmn/a.bpmn", "a")]);
        let converter = converter(&site.scratch);
        let route = &scan_diagrams(&site.config, &converter)[0];

        let outcome = convert_route(&site.config, &converter, route, true, &|| true);
        assert!(matches!(outcome, Outcome::Skipped));
        assert!(!route.output.exists());
    }

    #[test]
    fn test_empty_site() {
        let site = site(&[("posts/hello.md", "hi")]);
        let report = build_diagrams(&site.config, &converter(&site.scratch), &args(false), &running).unwrap();
        assert_eq!(report.converted, 0);
        assert!(!site.config.build.output.exists());
    }

    #[test]
    fn test_report_display() {
        let report = BuildReport {
            converted: 1,
            fresh: 3,
            skipped: 0,
            failed: vec![(PathBuf::from("a.bpmn"), anyhow::anyhow!("boom"))],
        };
        assert_eq!(report.to_string(), "converted 1 diagram, 3 up to date, 1 failed");
    }
}
