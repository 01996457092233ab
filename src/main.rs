//! Bomb Sort entry point
//!
//! Handles platform-specific initialization and drives the page: bombs are
//! absolutely positioned divs inside the #stage element, pointer events feed
//! the drag resolver, and a requestAnimationFrame loop steps the simulation
//! at its fixed cadence.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, KeyboardEvent, PointerEvent, StorageEvent};

    use bomb_sort::consts::*;
    use bomb_sort::settings::Settings;
    use bomb_sort::sim::{
        self, Bomb, Field, GameEvent, GameOverReason, GameState, LossCause, Rect,
    };
    use bomb_sort::skin::{WarningCue, provider_for};

    /// Reason string shown on the game-over overlay
    fn reason_text(reason: GameOverReason) -> String {
        let color = reason.kind.as_str();
        match reason.cause {
            LossCause::Timeout => {
                format!("A {color} bomb was left too long and exploded.")
            }
            LossCause::WrongGoal => {
                format!("A {color} bomb went into the wrong goal and exploded.")
            }
        }
    }

    /// Game instance holding simulation and view state
    struct Game {
        state: GameState,
        settings: Settings,
        document: Document,
        stage: Element,
        /// id -> bomb element currently on stage
        sprites: HashMap<u32, HtmlElement>,
        /// Active holds: pointer id -> bomb id
        drags: HashMap<i32, u32>,
        accumulator: f64,
        last_time: f64,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, document: Document, stage: Element) -> Self {
            Self {
                state: GameState::new(seed, Field::new(FIELD_WIDTH, FIELD_HEIGHT)),
                settings,
                document,
                stage,
                sprites: HashMap::new(),
                drags: HashMap::new(),
                accumulator: 0.0,
                last_time: 0.0,
            }
        }

        /// Measure the stage and goal elements into the simulation's field
        fn sync_field(&mut self) {
            let stage_rect = self.stage.get_bounding_client_rect();
            self.state
                .field
                .resize(stage_rect.width() as f32, stage_rect.height() as f32);

            let rel = |el: &Element| {
                let r = el.get_bounding_client_rect();
                Rect::new(
                    (r.left() - stage_rect.left()) as f32,
                    (r.top() - stage_rect.top()) as f32,
                    r.width() as f32,
                    r.height() as f32,
                )
            };
            if let (Some(red), Some(black)) = (
                self.document.get_element_by_id("goalRed"),
                self.document.get_element_by_id("goalBlack"),
            ) {
                self.state.field.set_goal_rects(rel(&red), rel(&black));
            }
        }

        /// Run simulation ticks for the elapsed frame time
        fn update(&mut self, time: f64) {
            if self.last_time > 0.0 {
                // Cap huge gaps (tab was hidden) so we don't spiral
                self.accumulator += (time - self.last_time).min(100.0);
            } else {
                self.accumulator = TICK_MS;
            }
            self.last_time = time;

            while self.accumulator >= TICK_MS {
                sim::tick(&mut self.state);
                self.accumulator -= TICK_MS;
            }
        }

        /// Pointer position in stage coordinates
        fn pointer_pos(&self, event: &PointerEvent) -> Vec2 {
            let rect = self.stage.get_bounding_client_rect();
            Vec2::new(
                event.client_x() as f32 - rect.left() as f32,
                event.client_y() as f32 - rect.top() as f32,
            )
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn update_hud(&self) {
            self.set_text("score", &self.state.score.to_string());
            self.set_text("spawnMs", &(self.state.spawn_interval_ms.round()).to_string());
        }

        /// Apply the current skin (and warning cue, if crossed) to a sprite
        fn apply_skin(&self, el: &HtmlElement, bomb: &Bomb) {
            let provider = provider_for(self.settings.skin, &self.settings.version);
            let assets = provider.resolve(bomb.kind);
            let _ = el
                .style()
                .set_property("background-image", &format!("url('{}')", assets.normal));

            if bomb.warned {
                match assets.warning_cue() {
                    WarningCue::SwapTo(url) => {
                        let _ = el.class_list().remove_1("blink");
                        let _ = el
                            .style()
                            .set_property("background-image", &format!("url('{url}')"));
                    }
                    WarningCue::CssPulse => {
                        let _ = el.class_list().add_1("blink");
                    }
                }
            } else {
                let _ = el.class_list().remove_1("blink");
            }
        }

        /// Re-resolve every active bomb's visuals after a preference change.
        /// Simulation state is untouched.
        fn restyle_sprites(&self) {
            for bomb in &self.state.bombs {
                if let Some(el) = self.sprites.get(&bomb.id) {
                    self.apply_skin(el, bomb);
                }
            }
        }

        fn spawn_sprite(&mut self, bomb: &Bomb) {
            let Ok(el) = self.document.create_element("div") else {
                return;
            };
            el.set_class_name(&format!("bomb {}", bomb.kind.as_str()));
            let _ = el.set_attribute("data-id", &bomb.id.to_string());
            let _ = el.set_attribute("aria-label", &format!("{} bomb", bomb.kind.as_str()));
            let Ok(el) = el.dyn_into::<HtmlElement>() else {
                return;
            };
            let _ = el.style().set_property("left", &format!("{}px", bomb.pos.x));
            let _ = el.style().set_property("top", &format!("{}px", bomb.pos.y));
            self.apply_skin(&el, bomb);
            let _ = self.stage.append_child(&el);
            self.sprites.insert(bomb.id, el);
        }

        /// Push per-tick positions to the DOM
        fn sync_positions(&self) {
            for bomb in &self.state.bombs {
                if let Some(el) = self.sprites.get(&bomb.id) {
                    let _ = el.style().set_property("left", &format!("{}px", bomb.pos.x));
                    let _ = el.style().set_property("top", &format!("{}px", bomb.pos.y));
                }
            }
        }

        /// Apply pending lifecycle cues from the simulation
        fn drain_events(&mut self) {
            for event in self.state.take_events() {
                match event {
                    GameEvent::Spawned { id, .. } => {
                        if let Some(bomb) = self.state.bomb(id).cloned() {
                            self.spawn_sprite(&bomb);
                        }
                    }
                    GameEvent::WarningStarted { id } => {
                        if let Some(bomb) = self.state.bomb(id).cloned() {
                            if let Some(el) = self.sprites.get(&id) {
                                self.apply_skin(el, &bomb);
                            }
                        }
                    }
                    GameEvent::Resolved { id, .. } => {
                        if let Some(el) = self.sprites.remove(&id) {
                            let _ = el.class_list().remove_1("blink");
                            let _ = el.class_list().add_1("explode");
                            remove_later(el, RESOLVE_LINGER_MS);
                        }
                    }
                    GameEvent::ScoreChanged { score } => {
                        self.set_text("score", &score.to_string());
                    }
                    GameEvent::SpawnIntervalChanged { interval_ms } => {
                        self.set_text("spawnMs", &interval_ms.round().to_string());
                    }
                    GameEvent::GameOver { reason, score } => {
                        // Leftover bombs stay visible but stop taking input
                        for el in self.sprites.values() {
                            let _ = el.style().set_property("pointer-events", "none");
                        }
                        self.set_text("overReason", &reason_text(reason));
                        self.set_text("finalScore", &score.to_string());
                        if let Some(overlay) = self.document.get_element_by_id("overlay") {
                            let _ = overlay.class_list().remove_1("hidden");
                        }
                    }
                }
            }
        }

        /// Restart the run: clear the stage, reinitialize the simulation,
        /// hide the overlay
        fn reset(&mut self) {
            for (_, el) in self.sprites.drain() {
                el.remove();
            }
            self.drags.clear();
            self.state.reset();
            if let Some(overlay) = self.document.get_element_by_id("overlay") {
                let _ = overlay.class_list().add_1("hidden");
            }
            self.update_hud();
        }
    }

    /// Remove an element from the DOM after a delay
    fn remove_later(el: HtmlElement, delay_ms: f64) {
        let cb = Closure::once_into_js(move || {
            el.remove();
        });
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.unchecked_ref(),
                delay_ms as i32,
            );
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("failed to init logger");

        log::info!("Bomb Sort starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let stage = document.get_element_by_id("stage").expect("no #stage");

        let seed = js_sys::Date::now() as u64;
        let settings = Settings::load();
        let game = Rc::new(RefCell::new(Game::new(seed, settings, document, stage)));
        game.borrow_mut().sync_field();
        game.borrow_mut().update_hud();
        log::info!("game initialized with seed: {seed}");

        setup_pointer_handlers(game.clone());
        setup_keyboard(game.clone());
        setup_buttons(game.clone());
        setup_skin_watch(game.clone());
        setup_resize(game.clone());

        request_animation_frame(game);
        log::info!("Bomb Sort running!");
    }

    fn setup_pointer_handlers(game: Rc<RefCell<Game>>) {
        let stage = game.borrow().stage.clone();

        // Pointer down: pick up the bomb under the pointer
        {
            let game = game.clone();
            let stage_el = stage.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                if g.state.is_over() {
                    return;
                }
                let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok())
                else {
                    return;
                };
                let Ok(Some(bomb_el)) = target.closest(".bomb") else {
                    return;
                };
                let Some(id) = bomb_el
                    .get_attribute("data-id")
                    .and_then(|s| s.parse::<u32>().ok())
                else {
                    return;
                };
                let pointer = g.pointer_pos(&event);
                if sim::begin_drag(&mut g.state, id, pointer) {
                    g.drags.insert(event.pointer_id(), id);
                    let _ = stage_el.set_pointer_capture(event.pointer_id());
                }
            });
            let _ = stage
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer move: follow while held
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let Some(&id) = g.drags.get(&event.pointer_id()) else {
                    return;
                };
                let pointer = g.pointer_pos(&event);
                sim::drag_to(&mut g.state, id, pointer);
                g.sync_positions();
            });
            let _ = stage
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer up / cancel: resolve the drop
        for event_name in ["pointerup", "pointercancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let Some(id) = g.drags.remove(&event.pointer_id()) else {
                    return;
                };
                let verdict = sim::release(&mut g.state, id);
                log::debug!("drop verdict for bomb {id}: {verdict:?}");
                g.drain_events();
            });
            let _ = stage
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let key = event.key();
            if key == "Enter" || key.eq_ignore_ascii_case("r") {
                game.borrow_mut().reset();
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        for btn_id in ["btnRestart", "btnRestart2"] {
            if let Some(btn) = document.get_element_by_id(btn_id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    game.borrow_mut().reset();
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        // Back to the landing page
        if let Some(btn) = document.get_element_by_id("backBtn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href("index.html");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Re-resolve skins when another tab rewrites the preference
    fn setup_skin_watch(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: StorageEvent| {
            if event.key().as_deref() != Some(Settings::STORAGE_KEY) {
                return;
            }
            let mut g = game.borrow_mut();
            g.settings = Settings::load();
            g.restyle_sprites();
            log::info!("skin preference changed externally; re-resolved active bombs");
        });
        let _ = window.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().sync_field();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.drain_events();
            g.sync_positions();
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bomb Sort (native) starting...");

    // Headless smoke run: with nobody sorting, the first fuse ends the run
    use bomb_sort::consts::{FIELD_HEIGHT, FIELD_WIDTH};
    use bomb_sort::sim::{Field, GameState, tick};

    let mut state = GameState::new(0xB04B, Field::new(FIELD_WIDTH, FIELD_HEIGHT));
    while !state.is_over() && state.clock_ms < 120_000.0 {
        tick(&mut state);
    }
    match state.over {
        Some(reason) => println!(
            "run ended after {:.1}s: {} {:?}",
            state.clock_ms / 1000.0,
            reason.kind.as_str(),
            reason.cause
        ),
        None => println!("run still alive after {:.1}s", state.clock_ms / 1000.0),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
