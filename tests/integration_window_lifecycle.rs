use proptest::prelude::*;

use webtop_wm::address::Locator;
use webtop_wm::config::DesktopConfig;
use webtop_wm::error::FetchError;
use webtop_wm::headless::{self, HeadlessDesktop, HeadlessView, MemoryHistory};
use webtop_wm::layout::Point;
use webtop_wm::links::LinkAction;
use webtop_wm::window::{
    CreateOptions, LoadState, WindowBody, WindowId, WindowManager, WindowSource,
};

fn desktop_with(view: HeadlessView, url: &str) -> HeadlessDesktop {
    let config = DesktopConfig {
        placement_seed: Some(7),
        ..DesktopConfig::default()
    };
    WindowManager::new(view, MemoryHistory::new(url, "Home"), config)
}

fn desktop() -> HeadlessDesktop {
    desktop_with(HeadlessView::new(1280.0, 800.0), "/")
}

fn content(path: &str) -> WindowSource {
    WindowSource::Content(Locator::normalize(path).expect("content path"))
}

fn open(wm: &mut HeadlessDesktop, title: &str, path: &str) -> WindowId {
    wm.create_window(title, content(path), CreateOptions::default())
}

fn topmost_id(wm: &HeadlessDesktop) -> WindowId {
    wm.topmost().expect("some window").id.clone()
}

#[test]
fn opening_same_locator_twice_focuses_and_flashes() {
    let mut wm = desktop();
    let a = open(&mut wm, "关于我", "/about/");
    let b = open(&mut wm, "友情链接", "/links/");
    assert_eq!(topmost_id(&wm), b);

    let again = open(&mut wm, "About (again)", "/about");
    assert_eq!(again, a, "normalized locator must dedup");
    assert_eq!(wm.windows().len(), 2);
    assert_eq!(topmost_id(&wm), a);
    assert_eq!(wm.view().window(&a).unwrap().flashes, 1);
    // only the first open queued a fetch for /about/
    let loads = wm.take_pending_loads();
    assert_eq!(loads.len(), 2);
}

#[test]
fn first_window_gets_z_eleven_and_counter_only_grows() {
    let mut wm = desktop();
    let a = open(&mut wm, "A", "/a/");
    assert_eq!(wm.window(&a).unwrap().z_order, 11);
    let b = open(&mut wm, "B", "/b/");
    assert_eq!(wm.window(&b).unwrap().z_order, 12);
    wm.focus(&a).unwrap();
    assert_eq!(wm.window(&a).unwrap().z_order, 13);
    assert_eq!(wm.view().window(&a).unwrap().z_order, 13);
    assert_eq!(wm.allocate_z(), 14);
}

#[test]
fn focusing_topmost_changes_nothing() {
    let mut wm = desktop();
    let a = open(&mut wm, "A", "/a/");
    let z = wm.window(&a).unwrap().z_order;
    let pushes = wm.history().push_count();
    let replaces = wm.history().replace_count();

    wm.focus(&a).unwrap();
    wm.press_window(&a).unwrap();

    assert_eq!(wm.window(&a).unwrap().z_order, z);
    assert_eq!(wm.history().push_count(), pushes);
    assert_eq!(wm.history().replace_count(), replaces);
}

#[test]
fn widget_raised_above_windows_lets_press_reclaim_top() {
    let mut wm = desktop();
    let a = open(&mut wm, "A", "/a/");
    let widget_z = wm.allocate_z();
    wm.press_window(&a).unwrap();
    assert!(wm.window(&a).unwrap().z_order > widget_z);
}

#[test]
fn focusing_survivor_after_close_changes_nothing() {
    let mut wm = desktop();
    let about = LinkAction::OpenContent {
        locator: Locator::normalize("/about/").unwrap(),
        title: "关于我".into(),
    };
    let links = LinkAction::OpenContent {
        locator: Locator::normalize("/links/").unwrap(),
        title: "友情链接".into(),
    };
    let a = wm.open_link(about, None);
    let b = wm.open_link(links, None);
    wm.close(&b).unwrap();
    assert_eq!(topmost_id(&wm), a);

    let z = wm.window(&a).unwrap().z_order;
    let replaces = wm.history().replace_count();
    wm.focus(&a).unwrap();
    wm.press_window(&a).unwrap();
    assert_eq!(wm.window(&a).unwrap().z_order, z);
    assert_eq!(wm.view().window(&a).unwrap().z_order, z);
    assert_eq!(wm.history().replace_count(), replaces);
}

#[test]
fn reclaimed_top_is_not_raised_again() {
    let mut wm = desktop();
    let a = open(&mut wm, "A", "/a/");
    wm.allocate_z();
    wm.press_window(&a).unwrap();
    let z = wm.window(&a).unwrap().z_order;
    let replaces = wm.history().replace_count();
    wm.press_window(&a).unwrap();
    assert_eq!(wm.window(&a).unwrap().z_order, z);
    assert_eq!(wm.history().replace_count(), replaces);
}

#[test]
fn unknown_window_operations_report_not_found() {
    let mut wm = desktop();
    let ghost = WindowId::from_hint("window-404");
    assert!(wm.focus(&ghost).is_err());
    assert!(wm.close(&ghost).is_err());
}

#[test]
fn successful_load_takes_heading_and_binds_links() {
    let mut wm = desktop();
    let id = open(&mut wm, "加载中...", "/2024/hello/");
    let page = headless::page(Some("  Hello, world  "), "<p>body</p>");
    wm.complete_load(&id, Ok(page));

    let record = wm.window(&id).unwrap();
    assert_eq!(record.title, "Hello, world");
    assert_eq!(record.load_state, LoadState::Loaded);
    let view = wm.view().window(&id).unwrap();
    assert_eq!(view.title, "Hello, world");
    assert_eq!(view.body, WindowBody::Page("<p>body</p>".to_string()));
    assert_eq!(view.link_scans, 1);
    assert_eq!(wm.history().current().title, "Hello, world");
}

#[test]
fn blank_heading_keeps_caller_title() {
    let mut wm = desktop();
    let id = open(&mut wm, "友情链接", "/links/");
    wm.complete_load(&id, Ok(headless::page(Some("   "), "<ul></ul>")));
    assert_eq!(wm.window(&id).unwrap().title, "友情链接");
}

#[test]
fn archives_404_shows_error_and_stays_usable() {
    let mut wm = desktop_with(HeadlessView::new(1280.0, 800.0), "/archives/");
    let id = wm.auto_open().expect("archives auto-opens");
    wm.complete_load(&id, Err(FetchError::Http { status: 404 }));

    let record = wm.window(&id).unwrap();
    assert_eq!(record.title, "存档 (加载错误)");
    assert!(matches!(record.load_state, LoadState::Error(_)));
    let view = wm.view().window(&id).unwrap();
    assert_eq!(
        view.body,
        WindowBody::Error("加载内容出错: HTTP error, status: 404".to_string())
    );
    assert_eq!(wm.history().current().title, "存档 (加载错误)");

    // still draggable and closable
    let grab = webtop_wm::drivers::PointerInput::mouse(1, 300.0, 200.0);
    assert!(wm.begin_drag(&id, &grab, webtop_wm::drivers::PressTarget::TitleBar));
    assert!(wm.pointer_up(&grab));
    wm.close(&id).unwrap();
    assert!(wm.windows().is_empty());
}

#[test]
fn page_without_main_region_reports_missing_content() {
    let mut wm = desktop();
    let id = open(&mut wm, "关于我", "/about/");
    wm.complete_load(&id, Ok(headless::page_without_main()));
    let record = wm.window(&id).unwrap();
    assert_eq!(record.title, "关于我 (内容加载失败)");
    assert_eq!(
        wm.view().window(&id).unwrap().body,
        WindowBody::Error("错误：在获取的页面中未找到 #content-main 结构。".to_string())
    );
}

#[test]
fn error_suffix_is_not_stacked_on_retitled_window() {
    let mut wm = desktop();
    let id = open(&mut wm, "Post", "/p/");
    wm.complete_load(&id, Ok(headless::page(Some("Real title"), "")));
    wm.complete_load(&id, Err(FetchError::Network("offline".into())));
    assert_eq!(wm.window(&id).unwrap().title, "Post (加载错误)");
}

#[test]
fn completion_for_closed_window_is_dropped() {
    let mut wm = desktop();
    let id = open(&mut wm, "A", "/a/");
    let loads = wm.take_pending_loads();
    assert_eq!(loads.len(), 1);
    wm.close(&id).unwrap();
    wm.complete_load(&id, Ok(headless::page(Some("late"), "<p>late</p>")));
    assert!(wm.window(&id).is_none());
    assert!(wm.view().is_empty());
}

#[test]
fn closing_window_cancels_its_queued_fetch() {
    let mut wm = desktop();
    let a = open(&mut wm, "A", "/a/");
    let b = open(&mut wm, "B", "/b/");
    wm.close(&a).unwrap();
    let loads = wm.take_pending_loads();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].id, b);
    assert!(wm.take_pending_loads().is_empty());
}

#[test]
fn comment_placeholder_is_mounted_per_window() {
    let mut wm = desktop();
    let id = open(&mut wm, "留言板", "/guestbook/");
    wm.complete_load(
        &id,
        Ok(headless::page(Some("留言板"), r#"<div id="comments"></div>"#)),
    );
    let expected = format!("comments-{id}");
    assert_eq!(
        wm.view().window(&id).unwrap().comments_container.as_deref(),
        Some(expected.as_str())
    );
    assert_eq!(
        wm.view().comment_calls(),
        &[(expected, "/guestbook/".to_string())]
    );
}

#[test]
fn missing_comment_hook_shows_inline_text() {
    let view = HeadlessView::new(1280.0, 800.0).without_comments_hook();
    let mut wm = desktop_with(view, "/");
    let id = open(&mut wm, "留言板", "/guestbook/");
    wm.complete_load(
        &id,
        Ok(headless::page(None, r#"<div id="comments"></div>"#)),
    );
    let WindowBody::Page(markup) = &wm.view().window(&id).unwrap().body else {
        panic!("page body expected");
    };
    assert!(markup.ends_with("评论组件加载失败。"));
    assert_eq!(wm.window(&id).unwrap().load_state, LoadState::Loaded);
}

#[test]
fn image_windows_skip_dedup_fetch_and_history() {
    let mut wm = desktop();
    let action = LinkAction::OpenImage {
        src: "/img/cat.png".into(),
        title: "cat".into(),
    };
    let first = wm.open_link(action.clone(), Some(Point::new(10.0, 10.0)));
    let second = wm.open_link(action, None);
    assert_ne!(first, second);
    assert!(wm.take_pending_loads().is_empty());
    assert_eq!(wm.history().len(), 1);
    assert_eq!(wm.history().push_count(), 0);
    assert_eq!(
        wm.view().window(&first).unwrap().body,
        WindowBody::Image {
            src: "/img/cat.png".into(),
            alt: "cat".into()
        }
    );
}

#[test]
fn content_links_grow_out_of_the_click_point() {
    let mut wm = desktop();
    let action = LinkAction::OpenContent {
        locator: Locator::normalize("/about/").unwrap(),
        title: "关于我".into(),
    };
    let id = wm.open_link(action, Some(Point::new(100.0, 50.0)));
    let spawned = wm.view().window(&id).unwrap().spawned_from.expect("animated");
    assert_eq!((spawned.left, spawned.top, spawned.width), (95.0, 45.0, 10.0));
    assert_eq!(wm.history().push_count(), 1);
}

#[test]
fn placement_respects_mobile_preset_and_margins() {
    let mut wm = desktop_with(HeadlessView::new(375.0, 667.0), "/");
    let id = open(&mut wm, "A", "/a/");
    let g = wm.window(&id).unwrap().geometry;
    assert_eq!((g.width, g.height), (250.0, 350.0));
    assert!(g.left >= 10.0 && g.right() <= 365.0);
    assert!(g.top >= 10.0);
}

#[test]
fn reuse_hint_naming_live_window_focuses_it() {
    let mut wm = desktop();
    let a = open(&mut wm, "A", "/a/");
    let _b = open(&mut wm, "B", "/b/");
    let options = CreateOptions {
        reuse_id: Some(a.clone()),
        ..CreateOptions::default()
    };
    let got = wm.create_window("whatever", content("/zzz/"), options);
    assert_eq!(got, a);
    assert_eq!(wm.windows().len(), 2);
    assert_eq!(topmost_id(&wm), a);
}

proptest! {
    #[test]
    fn dedup_and_single_topmost_hold(ops in proptest::collection::vec((0usize..6, 0u8..3), 1..40)) {
        let paths = ["/a/", "/b/", "/c/", "/d/", "/e/", "/f/"];
        let mut wm = desktop();
        let mut live = std::collections::BTreeSet::new();
        for (idx, op) in ops {
            let path = paths[idx];
            let existing = wm
                .find_by_locator(&Locator::normalize(path).unwrap())
                .map(|w| w.id.clone());
            let expected_top = match (op, existing) {
                (2, Some(id)) => {
                    wm.close(&id).unwrap();
                    live.remove(path);
                    None
                }
                (1, Some(id)) => {
                    wm.focus(&id).unwrap();
                    Some(id)
                }
                _ => {
                    live.insert(path);
                    Some(open(&mut wm, path, path))
                }
            };
            prop_assert_eq!(wm.windows().len(), live.len());
            let Some(top) = wm.topmost().map(|w| w.id.clone()) else {
                continue;
            };
            if let Some(expected) = expected_top {
                prop_assert_eq!(&top, &expected);
            }
            let max = wm.window(&top).unwrap().z_order;
            let at_max = wm.windows().iter().filter(|w| w.z_order == max).count();
            prop_assert_eq!(at_max, 1);

            let pushes = wm.history().push_count();
            let replaces = wm.history().replace_count();
            wm.focus(&top).unwrap();
            prop_assert_eq!(wm.window(&top).unwrap().z_order, max);
            prop_assert_eq!(wm.history().push_count(), pushes);
            prop_assert_eq!(wm.history().replace_count(), replaces);
        }
    }
}
