use anyhow::Result;
use linelab_core::{Judgment, SessionPhase, TrialRecord};
use linelab_data::{load_playable, write_results_archive, write_session_json};
use linelab_experiment::{CounterbalanceGroup, Session, SessionConfig, SeriesSummary};
use linelab_render::render_trial;
use linelab_store::{CARD_ASPECT, Calibration, SettingsStore};
use linelab_timing::MonotonicClock;
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};
use tracing::{info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

const SETTINGS_FILE: &str = "settings.json";
const RESULTS_DIR: &str = "results";
const MIN_CARD_WIDTH_PX: f64 = 200.0;
const MAX_CARD_WIDTH_PX: f64 = 600.0;
const CARD_WIDTH_STEP_PX: f64 = 10.0;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    session: Session<MonotonicClock, ThreadRng>,
    store: SettingsStore,
    calibration: Calibration,
    data_dir: PathBuf,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    exported: bool,
    should_exit: bool,
}

impl App {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        let store = SettingsStore::load(SETTINGS_FILE)?;
        let calibration = Calibration::from_store(&store);
        let session = Session::new(
            SessionConfig::default(),
            MonotonicClock::new(),
            rand::rng(),
        );

        Ok(Self {
            window: None,
            pixels: None,
            session,
            store,
            calibration,
            data_dir,
            current_size: None,
            scale_factor: 1.0,
            exported: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("No monitor available"))?;

        let window_attributes = Window::default_attributes()
            .with_title("Linelab")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale = self.scale_factor,
            "display configured"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let Some(size) = self.current_size else {
            return Ok(());
        };
        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(());
        };

        let mut pixmap = Pixmap::new(size.width, size.height)
            .ok_or_else(|| anyhow::anyhow!("Failed to create pixmap"))?;
        pixmap.fill(Color::WHITE);

        match self.session.phase() {
            SessionPhase::Setup | SessionPhase::Calibration => {
                draw_setup_screen(&mut pixmap, &self.calibration, self.session.series_count())
            }
            SessionPhase::Running => {
                if let (Some(trial), Some(kind)) =
                    (self.session.current_trial().copied(), self.session.current_kind())
                {
                    if self.session.stimuli_visible() {
                        render_trial(
                            &mut pixmap,
                            &trial,
                            kind,
                            self.calibration.pixels_per_inch as f32,
                        )?;
                    }
                }
                if let Some((position, total)) = self.session.progress() {
                    draw_progress_bar(&mut pixmap, position, total, self.session.is_practice());
                }
            }
            SessionPhase::PracticeComplete | SessionPhase::SeriesComplete => {
                draw_interstitial(&mut pixmap, Color::from_rgba8(120, 120, 120, 255))
            }
            SessionPhase::Complete => {
                draw_interstitial(&mut pixmap, Color::from_rgba8(60, 160, 60, 255))
            }
        }

        pixels.frame_mut().copy_from_slice(pixmap.data());
        pixels.render()?;
        Ok(())
    }

    fn update(&mut self) {
        self.session.tick();
    }

    fn select_group(&mut self, group: CounterbalanceGroup) {
        if self.session.phase() != SessionPhase::Setup {
            return;
        }
        // The group is chosen once, before any data loads, and stays fixed
        // for the session.
        if self.session.config.counterbalance.is_some() {
            println!("Counterbalance group is already set for this session.");
            return;
        }
        let order = group.series_order();
        let playable = load_playable(&self.data_dir, &order);

        self.session.config = SessionConfig::counterbalanced(group);
        if let Err(err) = self.session.load_series(playable) {
            warn!(%err, "could not load series");
            return;
        }

        println!(
            "Group {group:?} selected: {} of {} series available ({}).",
            self.session.series_count(),
            order.len(),
            order.join(" -> "),
        );
        if self.session.series_count() == 0 {
            println!("No series data found under {}.", self.data_dir.display());
        }
    }

    fn adjust_card_width(&mut self, delta: f64) {
        if !matches!(
            self.session.phase(),
            SessionPhase::Setup | SessionPhase::Calibration
        ) {
            return;
        }
        let width = (self.calibration.card_width_px + delta)
            .clamp(MIN_CARD_WIDTH_PX, MAX_CARD_WIDTH_PX);
        self.calibration.set_card_width(width);
        self.calibration.write_to(&mut self.store);
        if let Err(err) = self.store.save() {
            eprintln!("Failed to save calibration: {err}");
        }
        println!(
            "Calibration box: {:.0} px ({:.2} in at {:.1} ppi)",
            self.calibration.card_width_px,
            self.calibration.card_width_px / self.calibration.pixels_per_inch,
            self.calibration.pixels_per_inch,
        );
    }

    fn advance(&mut self) {
        match self.session.phase() {
            SessionPhase::Setup | SessionPhase::Calibration => match self.session.begin() {
                Ok(()) => self.announce_run(),
                Err(err) => println!("Not ready to start: {err}"),
            },
            SessionPhase::PracticeComplete => {
                if self.session.continue_to_main().is_ok() {
                    self.announce_run();
                }
            }
            SessionPhase::SeriesComplete => {
                if self.session.advance_series().is_ok() {
                    self.announce_run();
                }
            }
            SessionPhase::Running | SessionPhase::Complete => {}
        }
    }

    fn announce_run(&self) {
        let Some(series) = self.session.current_series() else {
            return;
        };
        let (_, total) = self.session.progress().unwrap_or((0, 0));
        if self.session.is_practice() {
            println!("Practice for {}: {} trials.", series.name, total);
        } else {
            println!("{}: {} trials.", series.name, total);
        }
    }

    fn respond(&mut self, judgment: Judgment) {
        let phase = match self.session.respond(judgment) {
            Ok(phase) => phase,
            Err(err) => {
                println!("Response ignored: {err}");
                return;
            }
        };
        match phase {
            SessionPhase::PracticeComplete => {
                println!("\nPractice completed.");
                print_summary("Practice", SeriesSummary::from_records(self.session.records()));
                println!("Press SPACE to start the series proper.");
            }
            SessionPhase::SeriesComplete => {
                self.print_last_series_summary();
                if let Some(next) = self.session.next_series() {
                    println!("Press SPACE to continue to {}.", next.name);
                }
            }
            SessionPhase::Complete => {
                self.print_last_series_summary();
                self.print_overall_summary();
                if let Err(err) = self.export_results() {
                    eprintln!("Export failed: {err}");
                }
                println!("Press R to restart or ESC to exit.");
            }
            _ => {}
        }
    }

    fn print_last_series_summary(&self) {
        if let Some(last) = self.session.finished_series().last() {
            println!("\n{} completed.", last.name);
            print_summary(&last.name, SeriesSummary::from_records(&last.records));
        }
    }

    fn print_overall_summary(&self) {
        let combined: Vec<TrialRecord> = self
            .session
            .finished_series()
            .iter()
            .flat_map(|s| s.records.iter().cloned())
            .collect();
        println!(
            "\nAll series completed ({} series).",
            self.session.finished_series().len()
        );
        print_summary("Overall", SeriesSummary::from_records(&combined));
    }

    fn export_results(&mut self) -> Result<()> {
        let finished = self.session.finished_series();
        if finished.is_empty() {
            println!("Nothing to export yet.");
            return Ok(());
        }

        fs::create_dir_all(RESULTS_DIR)?;
        let zip_path = Path::new(RESULTS_DIR).join("experiment_results.zip");
        write_results_archive(fs::File::create(&zip_path)?, finished)?;
        let json_path = Path::new(RESULTS_DIR).join("experiment_results.json");
        write_session_json(fs::File::create(&json_path)?, finished)?;

        self.exported = true;
        println!(
            "Results written to {} and {}.",
            zip_path.display(),
            json_path.display()
        );
        Ok(())
    }

    fn restart(&mut self) {
        self.session.restart();
        self.exported = false;
        println!("Session restarted; all results discarded.");
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Digit1 => self.select_group(CounterbalanceGroup::A),
            KeyCode::Digit2 => self.select_group(CounterbalanceGroup::B),
            KeyCode::Digit3 => self.select_group(CounterbalanceGroup::C),
            KeyCode::Digit4 => self.select_group(CounterbalanceGroup::D),
            KeyCode::ArrowUp => self.adjust_card_width(CARD_WIDTH_STEP_PX),
            KeyCode::ArrowDown => self.adjust_card_width(-CARD_WIDTH_STEP_PX),
            KeyCode::KeyC => {
                // Toggle the explicit calibration phase.
                let _ = match self.session.phase() {
                    SessionPhase::Setup => self.session.start_calibration(),
                    SessionPhase::Calibration => self.session.finish_calibration(),
                    _ => Ok(()),
                };
            }
            KeyCode::Space => self.advance(),
            KeyCode::KeyS => self.respond(Judgment::Same),
            KeyCode::KeyD => self.respond(Judgment::Different),
            KeyCode::KeyE => {
                if self.session.phase() == SessionPhase::Complete {
                    if let Err(err) = self.export_results() {
                        eprintln!("Export failed: {err}");
                    }
                }
            }
            KeyCode::KeyR => self.restart(),
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                eprintln!("Failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                eprintln!("Failed to resize buffer: {e}");
            }
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.phase() == SessionPhase::Complete && !self.exported {
            if let Err(err) = self.export_results() {
                eprintln!("Export on exit failed: {err}");
            }
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        println!("\nGoodbye.");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                eprintln!("Failed to create window and surface: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    eprintln!("Render error: {e}");
                }
                self.update();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

fn print_summary(label: &str, summary: Option<SeriesSummary>) {
    match summary {
        Some(s) => println!(
            "{label}: {} trials, accuracy {:.0}%, mean response time {:.0} ms",
            s.trials, s.accuracy_pct, s.mean_response_ms
        ),
        None => println!("{label}: n/a"),
    }
}

fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Color) {
    let mut paint = Paint::default();
    paint.set_color(color);
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }
}

/// Calibration box (credit-card overlay) plus a readiness strip along the
/// bottom: green once at least one series is playable, amber otherwise.
fn draw_setup_screen(pixmap: &mut Pixmap, calibration: &Calibration, series_count: usize) {
    let card_w = calibration.card_width_px as f32;
    let card_h = (calibration.card_width_px * CARD_ASPECT) as f32;
    let border = 4.0;

    fill_rect(
        pixmap,
        40.0 - border,
        40.0 - border,
        card_w + border * 2.0,
        card_h + border * 2.0,
        Color::from_rgba8(37, 99, 235, 255),
    );
    fill_rect(
        pixmap,
        40.0,
        40.0,
        card_w,
        card_h,
        Color::from_rgba8(219, 234, 254, 255),
    );

    let ready = series_count > 0;
    let strip = if ready {
        Color::from_rgba8(60, 160, 60, 255)
    } else {
        Color::from_rgba8(217, 119, 6, 255)
    };
    let h = pixmap.height() as f32;
    fill_rect(pixmap, 0.0, h - 16.0, pixmap.width() as f32, 16.0, strip);
}

/// Thin bar along the top showing position within the active set; an amber
/// strip underneath marks a practice block.
fn draw_progress_bar(pixmap: &mut Pixmap, position: usize, total: usize, practice: bool) {
    let w = pixmap.width() as f32;
    fill_rect(pixmap, 0.0, 0.0, w, 10.0, Color::from_rgba8(229, 229, 229, 255));
    let frac = position as f32 / total.max(1) as f32;
    fill_rect(pixmap, 0.0, 0.0, w * frac, 10.0, Color::from_rgba8(37, 99, 235, 255));
    if practice {
        fill_rect(pixmap, 0.0, 10.0, w, 6.0, Color::from_rgba8(217, 119, 6, 255));
    }
}

/// Blank transition screen with a centered marker bar; details go to
/// stdout.
fn draw_interstitial(pixmap: &mut Pixmap, color: Color) {
    let w = pixmap.width() as f32;
    let h = pixmap.height() as f32;
    fill_rect(pixmap, w * 0.25, h / 2.0 - 4.0, w * 0.5, 8.0, color);
}
