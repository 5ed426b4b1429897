//! Browser shell: mounts a [`Game`] into the page, feeds it key presses and
//! animation-frame timestamps, and writes the rendered view into the root
//! element.
//!
//! Only one game is mounted per page. Mounting again unmounts the previous
//! game first, so its listener and frame loop never touch the new one.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, KeyboardEvent, Window, window};

use crate::clock::{Clock, PerformanceClock};
use crate::config::GameConfig;
use crate::game::{Game, GameEvent, Phase};
use crate::render::render_view;

struct Mounted {
    game: Game,
    root: Element,
    // Root element was created by us and is removed on unmount.
    owns_root: bool,
    last_markup: String,
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
    raf_id: Option<i32>,
}

const ROOT_STYLE: &str = "position:relative; width:100vw; height:100vh; overflow:hidden;";

thread_local! {
    static MOUNTED: RefCell<Option<Mounted>> = const { RefCell::new(None) };
    static FRAME: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

pub fn mount(config: GameConfig) -> Result<(), JsValue> {
    let game = Game::with_entropy(config)?;
    unmount();

    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Create / reuse the root element.
    let root_id = game.config().root_id.clone();
    let (root, owns_root) = if let Some(el) = doc.get_element_by_id(&root_id) {
        // Bubbles are placed in percent of the root, so it must be the
        // containing block even when the page supplied it.
        let style = el.get_attribute("style").unwrap_or_default();
        if let Some(positioned) = positioned_style(&style) {
            el.set_attribute("style", &positioned).ok();
        }
        (el, false)
    } else {
        let el = doc.create_element("div")?;
        el.set_id(&root_id);
        el.set_attribute("style", ROOT_STYLE).ok();
        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&el)?;
        (el, true)
    };

    let keydown = Closure::wrap(Box::new(move |evt: KeyboardEvent| {
        if evt.repeat() {
            return;
        }
        let code = evt.code();
        let now = PerformanceClock.now_ms();
        MOUNTED.with(|cell| {
            if let Some(m) = cell.borrow_mut().as_mut() {
                if code == m.game.config().activation_key {
                    // Keep the page from scrolling on Space.
                    evt.prevent_default();
                }
                let events = m.game.key_down(&code, now);
                log_events(&events);
                m.render();
            }
        });
    }) as Box<dyn FnMut(KeyboardEvent)>);
    win.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;

    let mut mounted = Mounted {
        game,
        root,
        owns_root,
        last_markup: String::new(),
        keydown,
        raf_id: None,
    };
    mounted.render();
    MOUNTED.with(|cell| cell.replace(Some(mounted)));

    start_frame_loop(&win);
    log::info!("game mounted");
    Ok(())
}

/// Stop the frame loop, remove the listener and the rendered view. Safe to
/// call when nothing is mounted.
pub fn unmount() {
    let Some(mut m) = MOUNTED.with(|cell| cell.borrow_mut().take()) else {
        return;
    };
    m.game.teardown();
    if let Some(win) = window() {
        if let Some(id) = m.raf_id.take() {
            let _ = win.cancel_animation_frame(id);
        }
        let _ = win.remove_event_listener_with_callback("keydown", m.keydown.as_ref().unchecked_ref());
    }
    if m.owns_root {
        m.root.remove();
    } else {
        m.root.set_inner_html("");
    }
    FRAME.with(|f| f.borrow_mut().take());
    log::info!("game unmounted");
}

/// Current phase of the mounted game, if any.
pub fn current_phase() -> Option<Phase> {
    MOUNTED.with(|cell| cell.borrow().as_ref().map(|m| m.game.phase()))
}

impl Mounted {
    // Only touch the DOM when the markup actually changed.
    fn render(&mut self) {
        let markup = render_view(&self.game.snapshot(), self.game.config());
        if markup != self.last_markup {
            self.root.set_inner_html(&markup);
            self.last_markup = markup;
        }
    }
}

fn start_frame_loop(win: &Window) {
    let frame = Closure::wrap(Box::new(move |ts: f64| {
        let still_mounted = MOUNTED.with(|cell| {
            let mut slot = cell.borrow_mut();
            let Some(m) = slot.as_mut() else { return false };
            let events = m.game.advance(ts);
            log_events(&events);
            m.render();
            true
        });
        if still_mounted {
            if let Some(w) = window() {
                let id = request_frame(&w);
                MOUNTED.with(|cell| {
                    if let Some(m) = cell.borrow_mut().as_mut() {
                        m.raf_id = id;
                    }
                });
            }
        }
    }) as Box<dyn FnMut(f64)>);
    FRAME.with(|f| f.replace(Some(frame)));
    let id = request_frame(win);
    MOUNTED.with(|cell| {
        if let Some(m) = cell.borrow_mut().as_mut() {
            m.raf_id = id;
        }
    });
}

fn request_frame(win: &Window) -> Option<i32> {
    FRAME.with(|f| {
        f.borrow()
            .as_ref()
            .and_then(|cb| win.request_animation_frame(cb.as_ref().unchecked_ref()).ok())
    })
}

// Inline style with `position:relative` appended, or None when the style
// already sets a position.
fn positioned_style(style: &str) -> Option<String> {
    if style.contains("position") {
        return None;
    }
    let base = style.trim_end();
    let sep = if base.is_empty() || base.ends_with(';') { "" } else { ";" };
    Some(format!("{}{}position:relative;", base, sep))
}

fn log_events(events: &[GameEvent]) {
    for e in events {
        match e {
            GameEvent::PhaseChanged { from, to, .. } => {
                log::info!("phase {} -> {}", from.as_str(), to.as_str())
            }
            GameEvent::Tick { remaining_secs, .. } => log::debug!("{}s left", remaining_secs),
            GameEvent::BubbleSpawned { .. } | GameEvent::BubbleCleared { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_supplied_root_gets_positioned() {
        assert_eq!(positioned_style("").as_deref(), Some("position:relative;"));
        assert_eq!(
            positioned_style("width:600px; height:400px").as_deref(),
            Some("width:600px; height:400px;position:relative;")
        );
        assert_eq!(
            positioned_style("height:50vh;").as_deref(),
            Some("height:50vh;position:relative;")
        );
        assert_eq!(positioned_style("position:absolute; top:0"), None);
    }
}
