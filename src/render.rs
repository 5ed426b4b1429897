//! Markup for the game view. Everything here is a pure function of its
//! inputs; the browser shell decides when to write the result into the DOM.

use crate::config::GameConfig;
use crate::game::{Phase, Snapshot};

/// Rendered bubble edge length in CSS pixels.
pub const BUBBLE_SIZE_PX: u32 = 96;

/// A single bubble: an absolutely positioned SVG disc with the number centered.
pub fn render_bubble(left_pct: f64, top_pct: f64, value: u16) -> String {
    format!(
        concat!(
            "<div class='bubble-appear' role='img' aria-label='Bulle {value}' ",
            "style='position:absolute; left:{left:.2}%; top:{top:.2}%; width:{size}px; height:{size}px;'>",
            "<svg viewBox='0 0 100 100' width='100%' height='100%' xmlns='http://www.w3.org/2000/svg'>",
            "<defs><linearGradient id='g' x1='0' x2='1'>",
            "<stop offset='0%' stop-color='#ffffff'/><stop offset='100%' stop-color='#dbeafe'/>",
            "</linearGradient></defs>",
            "<circle cx='50' cy='45' r='36' fill='url(#g)' stroke='#93c5fd' stroke-width='3'/>",
            "<circle cx='30' cy='30' r='8' fill='#ffffff' opacity='0.6'/>",
            "<text x='50' y='56' font-size='32' font-weight='700' text-anchor='middle' fill='#0f172a'>{value}</text>",
            "</svg></div>"
        ),
        value = value,
        left = left_pct,
        top = top_pct,
        size = BUBBLE_SIZE_PX,
    )
}

/// Whole game view for the given state.
pub fn render_view(snap: &Snapshot, config: &GameConfig) -> String {
    // The wrapper is the containing block for the bubble's percent offsets.
    let mut html = String::from(
        "<div class='game-root' style='position:relative; width:100%; height:100%; overflow:hidden;'>",
    );
    if let Some(url) = config.background_url.as_deref() {
        html.push_str(&format!(
            "<img src='{}' alt='background' class='bg-img'/>",
            escape_attr(url)
        ));
    }
    let key = escape_text(key_label(&config.activation_key));
    match snap.phase {
        Phase::Intro => {
            html.push_str("<div class='overlay intro'><div class='sprite-climb' aria-hidden='true'></div>");
            html.push_str(&format!(
                "<div class='panel'><h1>Prêt ?</h1><p>Appuie sur <strong>{}</strong> pour commencer</p></div></div>",
                key.to_uppercase()
            ));
        }
        Phase::Running => {
            if config.walk_sprite {
                html.push_str("<div class='sprite-walk' aria-hidden='true'></div>");
            }
            if let Some(b) = &snap.bubble {
                html.push_str(&render_bubble(b.left_pct, b.top_pct, b.value));
            }
            html.push_str(&render_progress(snap.progress_pct));
        }
        Phase::Finished => {
            html.push_str(&format!(
                "<div class='overlay finished'><div class='panel'><h2>Temps écoulé !</h2><p class='hint'>Appuie sur {} pour rejouer</p></div></div>",
                key
            ));
        }
    }
    html.push_str("</div>");
    html
}

fn render_progress(pct: f64) -> String {
    format!(
        "<div class='progress-bar'><div class='progress' style='width:{:.1}%'></div></div>",
        pct.clamp(0.0, 100.0)
    )
}

// Display name for a `KeyboardEvent.code`.
fn key_label(code: &str) -> &str {
    match code {
        "Space" => "Espace",
        "Enter" | "NumpadEnter" => "Entrée",
        other => other.strip_prefix("Key").unwrap_or(other),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('\'', "&#39;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::Bubble;

    fn snap(phase: Phase, remaining: u32, bubble: Option<Bubble>) -> Snapshot {
        Snapshot {
            phase,
            remaining_secs: remaining,
            round_secs: 30,
            bubble,
            progress_pct: remaining as f64 / 30.0 * 100.0,
        }
    }

    #[test]
    fn bubble_contains_number_and_position() {
        let html = render_bubble(12.5, 40.0, 417);
        assert!(html.contains("left:12.50%"));
        assert!(html.contains("top:40.00%"));
        assert!(html.contains(">417</text>"));
        assert!(html.contains("aria-label='Bulle 417'"));
        assert!(html.contains("width:96px"));
    }

    #[test]
    fn bubble_render_is_pure() {
        assert_eq!(render_bubble(5.0, 5.0, 0), render_bubble(5.0, 5.0, 0));
    }

    #[test]
    fn intro_view_prompts_for_key() {
        let html = render_view(&snap(Phase::Intro, 30, None), &GameConfig::polished());
        assert!(html.contains("Prêt ?"));
        assert!(html.contains("<strong>ESPACE</strong>"));
        assert!(html.contains("class='bg-img'"));
        assert!(!html.contains("progress-bar"));
    }

    #[test]
    fn running_view_shows_bubble_and_progress() {
        let b = Bubble { id: 1, value: 88, left_pct: 10.0, top_pct: 20.0 };
        let html = render_view(&snap(Phase::Running, 15, Some(b)), &GameConfig::polished());
        assert!(html.contains(">88</text>"));
        assert!(html.contains("width:50.0%"));
        assert!(!html.contains("Prêt"));
    }

    #[test]
    fn running_view_without_bubble_has_only_progress() {
        let html = render_view(&snap(Phase::Running, 30, None), &GameConfig::simple());
        assert!(!html.contains("bubble-appear"));
        assert!(html.contains("width:100.0%"));
        assert!(!html.contains("bg-img"));
    }

    #[test]
    fn finished_view_offers_restart() {
        let html = render_view(&snap(Phase::Finished, 0, None), &GameConfig::polished());
        assert!(html.contains("Temps écoulé !"));
        assert!(html.contains("Appuie sur Espace pour rejouer"));
    }

    #[test]
    fn view_root_is_the_positioning_context() {
        for phase in [Phase::Intro, Phase::Running, Phase::Finished] {
            let html = render_view(&snap(phase, 10, None), &GameConfig::polished());
            assert!(html.starts_with("<div class='game-root' style='position:relative;"));
        }
    }

    #[test]
    fn walk_sprite_only_while_running_and_when_enabled() {
        let simple = GameConfig::simple();
        assert!(render_view(&snap(Phase::Running, 30, None), &simple).contains("sprite-walk"));
        assert!(!render_view(&snap(Phase::Intro, 30, None), &simple).contains("sprite-walk"));
        assert!(!render_view(&snap(Phase::Finished, 0, None), &simple).contains("sprite-walk"));
        let polished = GameConfig::polished();
        assert!(!render_view(&snap(Phase::Running, 30, None), &polished).contains("sprite-walk"));
    }

    #[test]
    fn key_labels_and_escaping() {
        assert_eq!(key_label("Space"), "Espace");
        assert_eq!(key_label("KeyA"), "A");
        assert_eq!(key_label("ArrowUp"), "ArrowUp");
        assert_eq!(escape_attr("a'b<c>"), "a&#39;b&lt;c&gt;");
    }
}
