//! Nav Restore entry point
//!
//! On web: installs the coordinator on the page, wires scroll/unload/popstate
//! listeners, and exposes the lifecycle calls to JS. On native: replays the
//! gallery and news scenarios against the simulated platform.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_host {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use nav_restore::persistence::WebSessionStore;
    use nav_restore::platform::{WebRouter, WebViewport};
    use nav_restore::{
        BackOptions, CoordinatorConfig, MemoryStore, NavigateOptions, NavigationCoordinator,
        Router, SessionStore,
    };

    type WebCoordinator = NavigationCoordinator<Box<dyn SessionStore>, WebViewport, WebRouter>;

    /// Coordinator plus the host timer bookkeeping
    struct Host {
        coordinator: WebCoordinator,
        /// Deadline the pending `setTimeout` was armed for
        armed_for: Option<u64>,
    }

    thread_local! {
        static HOST: RefCell<Option<Rc<RefCell<Host>>>> = const { RefCell::new(None) };
    }

    fn now_ms() -> u64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() as u64)
            .unwrap_or(0)
    }

    /// Bring the coordinator up to date, run `f`, then re-arm the host timer
    pub fn with_host<T>(f: impl FnOnce(&mut WebCoordinator) -> T) -> Option<T> {
        let host = HOST.with(|h| h.borrow().clone())?;
        let result = {
            let Ok(mut h) = host.try_borrow_mut() else {
                log::warn!("Ignoring re-entrant navigation call");
                return None;
            };
            h.coordinator.advance_to(now_ms());
            f(&mut h.coordinator)
        };
        arm(&host);
        Some(result)
    }

    /// Arm one `setTimeout` for the next deadline; due tasks then run in the
    /// following animation frame.
    fn arm(host: &Rc<RefCell<Host>>) {
        let Some(deadline) = host.borrow().coordinator.next_deadline() else {
            return;
        };
        {
            let mut h = host.borrow_mut();
            if h.armed_for.is_some_and(|armed| armed <= deadline) {
                return;
            }
            h.armed_for = Some(deadline);
        }

        let Some(window) = web_sys::window() else {
            return;
        };
        let delay = deadline.saturating_sub(now_ms()).min(i32::MAX as u64) as i32;
        let host = host.clone();
        let closure = Closure::once(move || request_animation_frame(host));
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay,
        );
        closure.forget();
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            {
                let mut h = host.borrow_mut();
                h.armed_for = None;
                h.coordinator.advance_to(now_ms());
            }
            arm(&host);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Nav Restore starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window, navigation state disabled");
            return;
        };

        // The coordinator owns scroll restoration from here on
        if let Ok(history) = window.history() {
            let _ = history.set_scroll_restoration(web_sys::ScrollRestoration::Manual);
        }

        let store: Box<dyn SessionStore> = match WebSessionStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}; state will not survive reloads", e);
                Box::new(MemoryStore::new())
            }
        };
        let config = CoordinatorConfig::load();
        let coordinator = NavigationCoordinator::new(store, WebViewport, WebRouter, config);

        let host = Rc::new(RefCell::new(Host {
            coordinator,
            armed_for: None,
        }));
        HOST.with(|h| *h.borrow_mut() = Some(host));

        setup_listeners(&window);

        with_host(|c| {
            let path = c.router().current_path();
            c.mount(&path)
        });

        log::info!("Nav Restore running!");
    }

    fn setup_listeners(window: &web_sys::Window) {
        // Scroll - debounced save
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                with_host(|c| c.on_scroll());
            });
            let _ = window
                .add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Unload - immediate save
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                with_host(|c| c.on_unload());
            });
            let _ = window
                .add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Back/forward - the new route is mounted, restore it
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                with_host(|c| {
                    let path = c.router().current_path();
                    c.mount(&path)
                });
            });
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    // === JS API ===

    #[wasm_bindgen(js_name = saveNavigationState)]
    pub fn save_navigation_state() -> bool {
        with_host(|c| c.save_current()).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = restoreNavigationState)]
    pub fn restore_navigation_state(path: Option<String>) -> bool {
        with_host(|c| c.restore(path.as_deref())).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = mountRoute)]
    pub fn mount_route(path: &str) -> bool {
        with_host(|c| c.mount(path)).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = navigateWithSave)]
    pub fn navigate_with_save(path: &str, replace: bool, preserve_scroll: bool) -> bool {
        let options = NavigateOptions {
            replace,
            preserve_scroll,
        };
        with_host(|c| c.navigate_with_save(path, options)).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = navigateBackWithState)]
    pub fn navigate_back_with_state(
        fallback: Option<String>,
        preserve_scroll: bool,
        reset_state: bool,
    ) -> bool {
        let options = BackOptions {
            preserve_scroll,
            reset_state,
        };
        with_host(|c| c.navigate_back_with_state(fallback.as_deref(), options)).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = handleInternalStateChange)]
    pub fn handle_internal_state_change(reset: Option<js_sys::Function>) {
        with_host(|c| {
            c.handle_internal_state_change(|_viewport| {
                if let Some(reset) = reset {
                    if let Err(e) = reset.call0(&JsValue::NULL) {
                        log::warn!("State reset callback failed: {:?}", e);
                    }
                }
            })
        });
    }

    #[wasm_bindgen(js_name = forgetNavigationState)]
    pub fn forget_navigation_state(path: &str) -> bool {
        with_host(|c| c.forget(path)).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = purgeNavigationState)]
    pub fn purge_navigation_state() -> u32 {
        with_host(|c| c.purge_all() as u32).unwrap_or(0)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_host::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Nav Restore (native) starting...");
    log::info!("Native mode runs against a simulated page - build for wasm32 to use a browser");

    println!("\nRunning restoration scenarios...");
    run_scenarios();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn run_scenarios() {
    use nav_restore::{
        CoordinatorConfig, MemoryRouter, MemoryStore, NavigationCoordinator, NavigationState,
        SessionStore, SimulatedViewport,
    };

    // Content grows after the user returns
    let mut nav = NavigationCoordinator::new(
        MemoryStore::new(),
        SimulatedViewport::new(800, 4000),
        MemoryRouter::new("/gallery"),
        CoordinatorConfig::default(),
    );
    nav.viewport_mut().user_scroll(1200);
    nav.save("/gallery");
    nav.viewport_mut().user_scroll(0);
    nav.viewport_mut().set_document_height(5000);
    nav.restore(Some("/gallery"));
    nav.run_until_idle();
    println!("/gallery: saved 1200, restored {}", nav.viewport().offset());

    // Content shrank since the record was written
    let mut nav = NavigationCoordinator::new(
        MemoryStore::new(),
        SimulatedViewport::new(800, 1000),
        MemoryRouter::new("/news"),
        CoordinatorConfig::default(),
    );
    let record = NavigationState::new("/news", 3000, 800, 3200, 0);
    match serde_json::to_string(&record) {
        Ok(json) => {
            let _ = nav.store_mut().set("pageState_/news", &json);
        }
        Err(e) => log::error!("Cannot encode record: {}", e),
    }
    nav.restore(Some("/news"));
    nav.run_until_idle();
    println!("/news: saved 3000, restored {} (clamped)", nav.viewport().offset());
}
