use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use webtop_wm::address::Locator;
use webtop_wm::config::DesktopConfig;
use webtop_wm::drivers::{PointerInput, PressTarget};
use webtop_wm::error::FetchError;
use webtop_wm::headless::{self, HeadlessDesktop, HeadlessView, MemoryHistory};
use webtop_wm::history::SessionHistory;
use webtop_wm::layout::Point;
use webtop_wm::links::LinkAction;
use webtop_wm::window::{LoadState, WindowId, WindowManager};

const SCRIPT_HELP: &str = indoc::indoc! {r#"
    Script format (JSON):

      {
        "url": "/archives/",
        "config": { "baseTitle": "My Blog" },
        "steps": [
          { "op": "autoOpen" },
          { "op": "fail", "target": "/archives/", "status": 404 },
          { "op": "open", "path": "/about/", "at": [120, 40] },
          { "op": "load", "target": "/about/", "heading": "About me" },
          { "op": "drag", "target": "/about/", "dx": 300, "dy": -20 },
          { "op": "back" }
        ]
      }

    Targets are a content path or a window id. Other ops: image, focus,
    close, forward, resize, loadWithoutMain, viewport.
"#};

#[derive(Parser, Debug)]
#[command(
    name = "webtop-replay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay a scripted desktop session against the headless window manager",
    after_help = SCRIPT_HELP
)]
struct ReplayCli {
    /// Path to the JSON session script.
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Starting address; overrides the script's `url`.
    #[arg(short = 'u', long = "url", value_name = "URL")]
    url: Option<String>,

    /// Viewport size as WIDTHxHEIGHT.
    #[arg(long = "viewport", value_name = "WxH", default_value = "1280x800", value_parser = parse_viewport)]
    viewport: (f64, f64),

    /// Placement seed; fixed so replays are reproducible.
    #[arg(short = 's', long = "seed", default_value_t = 1)]
    seed: u64,

    /// Log level written to stderr.
    #[arg(short = 'l', long = "log-level", default_value = "warn")]
    log_level: String,

    /// Print the final state as JSON instead of a report.
    #[arg(long = "json")]
    json: bool,
}

fn parse_viewport(raw: &str) -> Result<(f64, f64), String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{raw}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad viewport dimension `{v}`: {e}"))
    };
    Ok((parse(w)?, parse(h)?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    config: serde_json::Value,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Step {
    AutoOpen,
    Open {
        path: String,
        title: Option<String>,
        at: Option<[f64; 2]>,
    },
    Image {
        src: String,
        title: Option<String>,
    },
    Load {
        target: String,
        heading: Option<String>,
        #[serde(default)]
        markup: String,
    },
    LoadWithoutMain {
        target: String,
    },
    Fail {
        target: String,
        status: u16,
    },
    Focus {
        target: String,
    },
    Close {
        target: String,
    },
    Back,
    Forward,
    Drag {
        target: String,
        dx: f64,
        dy: f64,
    },
    Resize {
        target: String,
        dx: f64,
        dy: f64,
    },
    Viewport {
        width: f64,
        height: f64,
    },
}

struct ReplayConfig {
    desktop: DesktopConfig,
    url: String,
    viewport: (f64, f64),
}

impl TryFrom<(&ReplayCli, &Script)> for ReplayConfig {
    type Error = String;

    fn try_from((cli, script): (&ReplayCli, &Script)) -> Result<Self, Self::Error> {
        let (width, height) = cli.viewport;
        if width <= 0.0 || height <= 0.0 {
            return Err("viewport dimensions must be positive".to_string());
        }
        let mut desktop =
            DesktopConfig::from_value(script.config.clone()).map_err(|e| e.to_string())?;
        desktop.placement_seed = Some(cli.seed);
        let url = cli
            .url
            .clone()
            .or_else(|| script.url.clone())
            .unwrap_or_else(|| "/".to_string());
        Ok(Self {
            desktop,
            url,
            viewport: cli.viewport,
        })
    }
}

fn main() -> io::Result<()> {
    let args = ReplayCli::parse();
    let raw = fs::read_to_string(&args.script)?;
    let script: Script = serde_json::from_str(&raw)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let config = ReplayConfig::try_from((&args, &script))
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let level = args.log_level.parse().unwrap_or(tracing::Level::WARN);
    webtop_wm::tracing_sub::init_default(level);

    let base_title = config
        .desktop
        .base_title
        .clone()
        .unwrap_or_else(|| "Home".to_string());
    let (width, height) = config.viewport;
    let mut wm: HeadlessDesktop = WindowManager::new(
        HeadlessView::new(width, height),
        MemoryHistory::new(&config.url, &base_title),
        config.desktop,
    );

    let mut log = Vec::with_capacity(script.steps.len());
    for (n, step) in script.steps.into_iter().enumerate() {
        tracing::debug!(step = n + 1, ?step, "replaying");
        let line = run_step(&mut wm, step)
            .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, format!("step {}: {msg}", n + 1)))?;
        // fetches are resolved by explicit load/fail steps
        let _ = wm.take_pending_loads();
        log.push(line);
    }

    let summary = Summary::capture(&wm);
    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(io::Error::other)?;
        println!("{json}");
    } else {
        for (n, line) in log.iter().enumerate() {
            println!("{:>3}. {line}", n + 1);
        }
        println!("{}", summary.report());
    }
    Ok(())
}

fn resolve(wm: &HeadlessDesktop, target: &str) -> Result<WindowId, String> {
    let by_id = WindowId::from_hint(target);
    if wm.window(&by_id).is_some() {
        return Ok(by_id);
    }
    let locator =
        Locator::normalize(target).ok_or_else(|| format!("`{target}` is not a content path"))?;
    wm.find_by_locator(&locator)
        .map(|w| w.id.clone())
        .ok_or_else(|| format!("no window open for {locator}"))
}

fn run_step(wm: &mut HeadlessDesktop, step: Step) -> Result<String, String> {
    match step {
        Step::AutoOpen => Ok(match wm.auto_open() {
            Some(id) => format!("auto-open -> {id}"),
            None => "auto-open: nothing to open".to_string(),
        }),
        Step::Open { path, title, at } => {
            let locator =
                Locator::normalize(&path).ok_or_else(|| format!("`{path}` is not a content path"))?;
            let title = title.unwrap_or_else(|| wm.routes().title_for(&locator));
            let point = at.map(|[x, y]| Point::new(x, y));
            let id = wm.open_link(LinkAction::OpenContent { locator, title }, point);
            Ok(format!("open {path} -> {id}"))
        }
        Step::Image { src, title } => {
            let title = title.unwrap_or_else(|| wm.config().messages.fallback_image_title.clone());
            let id = wm.open_link(LinkAction::OpenImage { src: src.clone(), title }, None);
            Ok(format!("image {src} -> {id}"))
        }
        Step::Load {
            target,
            heading,
            markup,
        } => {
            let id = resolve(wm, &target)?;
            wm.complete_load(&id, Ok(headless::page(heading.as_deref(), &markup)));
            Ok(format!("load {id} ok"))
        }
        Step::LoadWithoutMain { target } => {
            let id = resolve(wm, &target)?;
            wm.complete_load(&id, Ok(headless::page_without_main()));
            Ok(format!("load {id} without main content"))
        }
        Step::Fail { target, status } => {
            let id = resolve(wm, &target)?;
            wm.complete_load(&id, Err(FetchError::Http { status }));
            Ok(format!("load {id} failed with {status}"))
        }
        Step::Focus { target } => {
            let id = resolve(wm, &target)?;
            wm.press_window(&id).map_err(|e| e.to_string())?;
            Ok(format!("focus {id}"))
        }
        Step::Close { target } => {
            let id = resolve(wm, &target)?;
            wm.close(&id).map_err(|e| e.to_string())?;
            Ok(format!("close {id}"))
        }
        Step::Back => {
            let pop = wm
                .history_mut()
                .back()
                .ok_or_else(|| "no history entry to go back to".to_string())?;
            let address = pop.address.to_string();
            wm.on_pop_state(&pop);
            Ok(format!("back -> {address}"))
        }
        Step::Forward => {
            let pop = wm
                .history_mut()
                .forward()
                .ok_or_else(|| "no history entry to go forward to".to_string())?;
            let address = pop.address.to_string();
            wm.on_pop_state(&pop);
            Ok(format!("forward -> {address}"))
        }
        Step::Drag { target, dx, dy } => {
            let id = resolve(wm, &target)?;
            let moved = grab_and_move(wm, &id, PressTarget::TitleBar, dx, dy)?;
            Ok(format!("drag {id} to {:.0},{:.0}", moved.x, moved.y))
        }
        Step::Resize { target, dx, dy } => {
            let id = resolve(wm, &target)?;
            let size = grab_and_move(wm, &id, PressTarget::ResizeGrip, dx, dy)?;
            Ok(format!("resize {id} to {:.0}x{:.0}", size.x, size.y))
        }
        Step::Viewport { width, height } => {
            wm.view_mut().set_viewport(width, height);
            Ok(format!("viewport {width}x{height}"))
        }
    }
}

/// Press, move by `(dx, dy)` and release one pointer on a window handle.
/// Returns the new top-left corner for drags and the new size for resizes.
fn grab_and_move(
    wm: &mut HeadlessDesktop,
    id: &WindowId,
    handle: PressTarget,
    dx: f64,
    dy: f64,
) -> Result<Point, String> {
    let press = PointerInput::mouse(1, 0.0, 0.0);
    wm.press_window(id).map_err(|e| e.to_string())?;
    let grabbed = match handle {
        PressTarget::ResizeGrip => wm.begin_resize(id, &press, handle),
        _ => wm.begin_drag(id, &press, handle),
    };
    if !grabbed {
        return Err(format!("{id} is already held by another pointer"));
    }
    wm.pointer_move(&PointerInput::mouse(1, dx, dy));
    wm.pointer_up(&PointerInput::mouse(1, dx, dy));
    let g = wm
        .window(id)
        .map(|w| w.geometry)
        .ok_or_else(|| format!("{id} vanished mid-gesture"))?;
    Ok(match handle {
        PressTarget::ResizeGrip => Point::new(g.width, g.height),
        _ => Point::new(g.left, g.top),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowSummary {
    id: String,
    locator: Option<String>,
    title: String,
    z_order: u32,
    state: String,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistorySummary {
    url: String,
    title: String,
    window_id: Option<String>,
    current: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    document_title: String,
    addressed: Option<String>,
    windows: Vec<WindowSummary>,
    history: Vec<HistorySummary>,
}

impl Summary {
    fn capture(wm: &HeadlessDesktop) -> Self {
        let mut windows: Vec<WindowSummary> = wm
            .windows()
            .iter()
            .map(|w| WindowSummary {
                id: w.id.to_string(),
                locator: w.locator().map(ToString::to_string),
                title: w.title.clone(),
                z_order: w.z_order,
                state: match &w.load_state {
                    LoadState::Loading => "loading".to_string(),
                    LoadState::Loaded => "loaded".to_string(),
                    LoadState::Error(msg) => format!("error: {msg}"),
                },
                left: w.geometry.left,
                top: w.geometry.top,
                width: w.geometry.width,
                height: w.geometry.height,
            })
            .collect();
        windows.sort_by_key(|w| w.z_order);

        let position = wm.history().position();
        let history = wm
            .history()
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| HistorySummary {
                url: entry.url.clone(),
                title: entry.title.clone(),
                window_id: entry.state.as_ref().map(|s| s.window_id.clone()),
                current: i == position,
            })
            .collect();

        Self {
            document_title: wm.history().document_title(),
            addressed: wm.addressed().map(ToString::to_string),
            windows,
            history,
        }
    }

    fn report(&self) -> String {
        let windows = if self.windows.is_empty() {
            "  (none)".to_string()
        } else {
            self.windows
                .iter()
                .map(|w| {
                    format!(
                        "  z={:<4} {:<22} {:<20} {:?} [{}] {:.0}x{:.0}+{:.0}+{:.0}",
                        w.z_order,
                        w.id,
                        w.locator.as_deref().unwrap_or("(image)"),
                        w.title,
                        w.state,
                        w.width,
                        w.height,
                        w.left,
                        w.top,
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        let history = self
            .history
            .iter()
            .map(|h| {
                format!(
                    "{} {:<32} {:?} {}",
                    if h.current { ">" } else { " " },
                    h.url,
                    h.title,
                    h.window_id.as_deref().unwrap_or("-"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        indoc::formatdoc!(
            r#"
            Document title: {title}
            Addressed window: {addressed}
            Windows (bottom to top):
            {windows}
            History:
            {history}
            "#,
            title = self.document_title,
            addressed = self.addressed.as_deref().unwrap_or("none"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(script: &str) -> HeadlessDesktop {
        let script: Script = serde_json::from_str(script).expect("valid script");
        let config = DesktopConfig {
            placement_seed: Some(1),
            ..DesktopConfig::from_value(script.config).expect("valid config")
        };
        let mut wm = WindowManager::new(
            HeadlessView::new(1280.0, 800.0),
            MemoryHistory::new(script.url.as_deref().unwrap_or("/"), "Home"),
            config,
        );
        for step in script.steps {
            run_step(&mut wm, step).expect("step succeeds");
        }
        wm
    }

    #[test]
    fn viewport_argument_parses() {
        assert_eq!(parse_viewport("1280x800"), Ok((1280.0, 800.0)));
        assert_eq!(parse_viewport("375X667"), Ok((375.0, 667.0)));
        assert!(parse_viewport("wide").is_err());
        assert!(parse_viewport("10xtall").is_err());
    }

    #[test]
    fn archives_404_session() {
        let wm = replay(
            r#"{
                "url": "/archives/",
                "steps": [
                    { "op": "autoOpen" },
                    { "op": "fail", "target": "/archives/", "status": 404 },
                    { "op": "drag", "target": "/archives/", "dx": 15, "dy": 5 }
                ]
            }"#,
        );
        let summary = Summary::capture(&wm);
        assert_eq!(summary.windows.len(), 1);
        assert_eq!(summary.windows[0].title, "存档 (加载错误)");
        assert_eq!(summary.history.len(), 1);
        assert_eq!(summary.document_title, "存档 (加载错误)");
    }

    #[test]
    fn back_navigation_session() {
        let wm = replay(
            r#"{
                "steps": [
                    { "op": "open", "path": "/about/" },
                    { "op": "open", "path": "/links/", "at": [40, 40] },
                    { "op": "back" }
                ]
            }"#,
        );
        let summary = Summary::capture(&wm);
        let top = summary.windows.last().expect("windows open");
        assert_eq!(top.locator.as_deref(), Some("/about/"));
        assert!(summary.history[1].current);
        assert!(summary.report().contains("Addressed window: window-1-"));
    }

    #[test]
    fn unknown_target_is_reported() {
        let script: Script =
            serde_json::from_str(r#"{ "steps": [ { "op": "close", "target": "/nope/" } ] }"#)
                .unwrap();
        let mut wm = WindowManager::new(
            HeadlessView::new(800.0, 600.0),
            MemoryHistory::new("/", "Home"),
            DesktopConfig::default(),
        );
        let err = script
            .steps
            .into_iter()
            .map(|step| run_step(&mut wm, step))
            .find_map(Result::err)
            .expect("close of unknown window fails");
        assert!(err.contains("/nope/"));
    }
}
