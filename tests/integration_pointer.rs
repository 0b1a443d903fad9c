use webtop_wm::address::Locator;
use webtop_wm::config::DesktopConfig;
use webtop_wm::drivers::{Handle, PointerInput, PressTarget};
use webtop_wm::headless::{HeadlessDesktop, HeadlessView, MemoryHistory};
use webtop_wm::window::{CreateOptions, WindowId, WindowManager, WindowSource};

fn desktop() -> HeadlessDesktop {
    let config = DesktopConfig {
        placement_seed: Some(3),
        ..DesktopConfig::default()
    };
    WindowManager::new(
        HeadlessView::new(1000.0, 800.0),
        MemoryHistory::new("/", "Home"),
        config,
    )
}

fn open(wm: &mut HeadlessDesktop, path: &str) -> WindowId {
    let locator = Locator::normalize(path).unwrap();
    wm.create_window(path, WindowSource::Content(locator), CreateOptions::default())
}

#[test]
fn title_bar_drag_moves_window_and_view() {
    let mut wm = desktop();
    let id = open(&mut wm, "/a/");
    let start = wm.window(&id).unwrap().geometry;

    let press = PointerInput::mouse(1, 200.0, 20.0);
    assert!(wm.begin_drag(&id, &press, PressTarget::TitleBar));
    assert_eq!(
        wm.view().window(&id).unwrap().captured,
        Some((Handle::TitleBar, 1))
    );

    assert!(wm.pointer_move(&PointerInput::mouse(1, 230.0, 50.0)));
    let moved = wm.window(&id).unwrap().geometry;
    assert_eq!(moved.left, start.left + 30.0);
    assert_eq!(moved.top, start.top + 30.0);
    assert_eq!(wm.view().window(&id).unwrap().geometry, moved);

    assert!(wm.pointer_up(&PointerInput::mouse(1, 230.0, 50.0)));
    assert_eq!(wm.view().window(&id).unwrap().captured, None);
    assert!(!wm.pointer_move(&PointerInput::mouse(1, 900.0, 900.0)));
}

#[test]
fn drag_keeps_a_grabbable_sliver_on_screen() {
    let mut wm = desktop();
    let id = open(&mut wm, "/a/");
    let press = PointerInput::mouse(1, 0.0, 0.0);
    wm.begin_drag(&id, &press, PressTarget::TitleBar);

    wm.pointer_move(&PointerInput::mouse(1, 5000.0, 5000.0));
    let g = wm.window(&id).unwrap().geometry;
    assert_eq!(g.left, 1000.0 - 40.0);
    assert_eq!(g.top, 800.0 - 40.0);

    wm.pointer_move(&PointerInput::mouse(1, -5000.0, -5000.0));
    let g = wm.window(&id).unwrap().geometry;
    assert_eq!(g.right(), 40.0);
    assert_eq!(g.top, 0.0);
}

#[test]
fn resize_respects_floor_and_has_no_ceiling() {
    let mut wm = desktop();
    let id = open(&mut wm, "/a/");
    let start = wm.window(&id).unwrap().geometry;
    let press = PointerInput::touch(4, 500.0, 500.0);
    assert!(wm.begin_resize(&id, &press, PressTarget::ResizeGrip));
    assert_eq!(
        wm.view().window(&id).unwrap().captured,
        Some((Handle::ResizeGrip, 4))
    );

    wm.pointer_move(&PointerInput::touch(4, -500.0, -500.0));
    let g = wm.window(&id).unwrap().geometry;
    assert_eq!((g.width, g.height), (150.0, 100.0));
    assert_eq!((g.left, g.top), (start.left, start.top));

    wm.pointer_move(&PointerInput::touch(4, 3000.0, 3000.0));
    let g = wm.window(&id).unwrap().geometry;
    assert_eq!(g.width, start.width + 2500.0);
    assert!(g.right() > 1000.0);
    assert!(wm.pointer_up(&press));
}

#[test]
fn presses_on_wrong_handle_do_not_grab() {
    let mut wm = desktop();
    let id = open(&mut wm, "/a/");
    let press = PointerInput::mouse(1, 10.0, 10.0);
    assert!(!wm.begin_drag(&id, &press, PressTarget::ControlButton));
    assert!(!wm.begin_drag(&id, &press, PressTarget::Body));
    assert!(!wm.begin_resize(&id, &press, PressTarget::TitleBar));
    assert!(!wm.begin_drag(&id, &press.with_button(1), PressTarget::TitleBar));
    assert_eq!(wm.view().window(&id).unwrap().captured, None);
}

#[test]
fn second_pointer_cannot_steal_an_active_drag() {
    let mut wm = desktop();
    let id = open(&mut wm, "/a/");
    let first = PointerInput::touch(10, 100.0, 100.0);
    let second = PointerInput::touch(11, 400.0, 400.0);
    assert!(wm.begin_drag(&id, &first, PressTarget::TitleBar));
    assert!(!wm.begin_drag(&id, &second, PressTarget::TitleBar));

    let before = wm.window(&id).unwrap().geometry;
    assert!(!wm.pointer_move(&PointerInput::touch(11, 10.0, 10.0)));
    assert_eq!(wm.window(&id).unwrap().geometry, before);
    assert!(!wm.pointer_up(&second));
    assert!(wm.pointer_up(&first));
}

#[test]
fn two_windows_drag_with_two_pointers_independently() {
    let mut wm = desktop();
    let a = open(&mut wm, "/a/");
    let b = open(&mut wm, "/b/");
    let ga = wm.window(&a).unwrap().geometry;
    let gb = wm.window(&b).unwrap().geometry;

    wm.begin_drag(&a, &PointerInput::touch(1, 0.0, 0.0), PressTarget::TitleBar);
    wm.begin_drag(&b, &PointerInput::touch(2, 0.0, 0.0), PressTarget::TitleBar);
    wm.pointer_move(&PointerInput::touch(1, 10.0, 0.0));
    wm.pointer_move(&PointerInput::touch(2, 0.0, 20.0));

    assert_eq!(wm.window(&a).unwrap().geometry.left, ga.left + 10.0);
    assert_eq!(wm.window(&a).unwrap().geometry.top, ga.top);
    assert_eq!(wm.window(&b).unwrap().geometry.top, gb.top + 20.0);
    assert_eq!(wm.window(&b).unwrap().geometry.left, gb.left);
}

#[test]
fn closing_grabbed_window_drops_its_pointer() {
    let mut wm = desktop();
    let id = open(&mut wm, "/a/");
    let press = PointerInput::mouse(1, 0.0, 0.0);
    wm.begin_drag(&id, &press, PressTarget::TitleBar);
    wm.close(&id).unwrap();
    assert!(!wm.pointer_move(&PointerInput::mouse(1, 50.0, 50.0)));
    assert!(!wm.pointer_up(&press));
}
