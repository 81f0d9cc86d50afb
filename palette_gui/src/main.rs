use anyhow::Context;
use eframe::egui;
use palette_core::{Config, Method, PaletteStore, SavedPalette, Session, Swatch};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Swatchbox",
        options,
        Box::new(move |_cc| Ok(Box::new(PaletteApp::new(config_path)?))),
    )
}

struct PaletteApp {
    store_label: String,
    session: Session,
    saved: Vec<SavedPalette>,

    // UI state
    save_name: String,
    load_code: String,
    status: Option<String>,
    last_error: Option<String>,
}

impl PaletteApp {
    fn new(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = Config::load_or_default(config_path.as_deref())
            .context("load palette config")?;
        let store: Arc<dyn PaletteStore> = Arc::new(config.open_store());

        let mut app = Self {
            store_label: config.store_path.display().to_string(),
            session: Session::new(store, config.default_method),
            saved: Vec::new(),
            save_name: String::new(),
            load_code: String::new(),
            status: None,
            last_error: None,
        };
        app.refresh_saved();
        Ok(app)
    }

    fn refresh_saved(&mut self) {
        match self.session.saved_palettes() {
            Ok(saved) => self.saved = saved,
            Err(e) => self.last_error = Some(format!("{e}")),
        }
    }

    fn regenerate(&mut self) {
        self.session.regenerate();
        self.status = None;
    }

    fn safe_toggle_lock(&mut self, index: usize) {
        if let Err(e) = self.session.toggle_lock(index as i64) {
            self.last_error = Some(format!("{e}"));
        }
    }

    fn safe_save(&mut self) {
        match self.session.save(&self.save_name) {
            Ok(saved) => {
                self.status = Some(format!("Saved '{}' as {}  {}", saved.name, saved.code, saved.link));
                self.last_error = None;
                self.refresh_saved();
            }
            Err(e) => self.last_error = Some(format!("{e}")),
        }
    }

    fn safe_load_code(&mut self) {
        match self.session.load_code(&self.load_code) {
            Ok(Some(saved)) => {
                self.status = Some(format!("Loaded '{}'", saved.name));
                self.last_error = None;
            }
            Ok(None) => self.status = Some(format!("No palette with code '{}'", self.load_code.trim())),
            Err(e) => self.last_error = Some(format!("{e}")),
        }
    }

    fn safe_open(&mut self, name: &str) {
        match self.session.open_name(name) {
            Ok(Some(saved)) => {
                self.save_name = saved.name.clone();
                self.status = Some(format!("Opened '{}' ({})", saved.name, saved.code));
                self.last_error = None;
            }
            Ok(None) => {
                warn!(name, "saved palette disappeared");
                self.refresh_saved();
            }
            Err(e) => self.last_error = Some(format!("{e}")),
        }
    }

    fn safe_toggle_like(&mut self, name: &str) {
        match self.session.toggle_like(name) {
            Ok(_) => self.refresh_saved(),
            Err(e) => self.last_error = Some(format!("{e}")),
        }
    }
}

/// Dark text on light swatches, light text on dark ones.
fn text_color_for(swatch: &Swatch) -> egui::Color32 {
    if swatch.color.to_lab().l > 60.0 {
        egui::Color32::BLACK
    } else {
        egui::Color32::WHITE
    }
}

impl eframe::App for PaletteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Space regenerates unless a text field has focus
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.regenerate();
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Swatchbox");
                ui.separator();
                ui.label(format!("Store: {}", self.store_label));
            });

            ui.horizontal(|ui| {
                ui.label("Method:");
                let mut method = self.session.method;
                egui::ComboBox::from_id_source("method")
                    .selected_text(method.to_string())
                    .show_ui(ui, |ui| {
                        for m in Method::ALL {
                            ui.selectable_value(&mut method, m, m.as_str());
                        }
                    });
                self.session.method = method;

                if ui.button("Regenerate (Space)").clicked() {
                    self.regenerate();
                }

                ui.separator();

                ui.label("Name:");
                ui.text_edit_singleline(&mut self.save_name);
                if ui.button("Save").clicked() {
                    self.safe_save();
                }

                ui.separator();

                ui.label("Code:");
                ui.add(egui::TextEdit::singleline(&mut self.load_code).desired_width(80.0));
                if ui.button("Load").clicked() {
                    self.safe_load_code();
                }
            });

            if let Some(status) = &self.status {
                ui.label(status);
            }
            if let Some(err) = &self.last_error {
                ui.colored_label(egui::Color32::RED, format!("Error: {err}"));
            }
        });

        let mut open = None;
        let mut like = None;
        egui::SidePanel::right("saved").show(ctx, |ui| {
            ui.heading("Saved");
            ui.separator();

            if self.saved.is_empty() {
                ui.label("(none yet)");
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::Grid::new("saved_grid")
                    .striped(true)
                    .num_columns(3)
                    .show(ui, |ui| {
                        for p in &self.saved {
                            if ui.link(&p.name).clicked() {
                                open = Some(p.name.clone());
                            }
                            ui.monospace(&p.code);
                            let heart = if p.liked { "♥" } else { "♡" };
                            if ui.button(heart).clicked() {
                                like = Some(p.name.clone());
                            }
                            ui.end_row();
                        }
                    });
            });
        });
        if let Some(name) = open {
            self.safe_open(&name);
        }
        if let Some(name) = like {
            self.safe_toggle_like(&name);
        }

        let mut toggle = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            let palette = *self.session.palette();
            let height = ui.available_height();

            ui.columns(palette.swatches().len(), |cols| {
                for (i, (col, swatch)) in cols.iter_mut().zip(palette.iter()).enumerate() {
                    let fg = text_color_for(swatch);
                    let (r, g, b) = swatch.color.rgb();

                    egui::Frame::none()
                        .fill(egui::Color32::from_rgb(r, g, b))
                        .inner_margin(12.0)
                        .show(col, |ui| {
                            ui.set_min_height(height - 24.0);
                            ui.vertical_centered(|ui| {
                                ui.add_space(height / 3.0);
                                ui.label(
                                    egui::RichText::new(swatch.color.to_hex())
                                        .size(22.0)
                                        .strong()
                                        .color(fg),
                                );
                                ui.label(egui::RichText::new(swatch.rgb()).color(fg));
                                ui.label(egui::RichText::new(swatch.hsl()).color(fg));
                                ui.add_space(8.0);

                                if ui.button("Copy").clicked() {
                                    let hex = swatch.color.to_hex();
                                    ui.output_mut(|o| o.copied_text = hex);
                                }
                                let lock = if swatch.locked { "Locked" } else { "Lock" };
                                if ui.selectable_label(swatch.locked, lock).clicked() {
                                    toggle = Some(i);
                                }
                            });
                        });
                }
            });
        });
        if let Some(i) = toggle {
            self.safe_toggle_lock(i);
        }
    }
}
