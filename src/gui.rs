use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::{debug, warn};

use crate::catalog::Decision;
use crate::config::{AppContext, HomeConfig, RoleKind, ViewerOverrides};
use crate::map::host::{FixedLocation, HostPlatform};
use crate::map::{MapController, MapEvent};
use crate::model::{CATEGORIES, CategoryFilter, Role};
use crate::state::{AppState, InputIntent, Tab};

pub mod dashboard;
pub mod detail;
pub mod map_view;
pub mod register;
pub mod search_bar;

use detail::{DetailAction, status_color};
use map_view::WalkersSurface;
use register::RegisterForm;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

/// Opens directions and `tel:` links through the OS
struct EguiHost<'a>(&'a egui::Context);

impl HostPlatform for EguiHost<'_> {
    fn open_url(&mut self, url: &str) {
        debug!("Opening {}", url);
        self.0.open_url(egui::OpenUrl::new_tab(url));
    }
}

pub struct GuiApp {
    state: AppState,
    ctx: AppContext,
    map: MapController<WalkersSurface>,
    suggestions: Vec<String>,
    home: Option<HomeConfig>,
    register_form: RegisterForm,
    register_error: Option<String>,
    review_note: String,

    initial_scale_applied: bool,
    status_set_time: Option<Instant>,
    // Track window size and panel width for saving on exit
    last_window_size: Option<(u32, u32)>,
    panel_width: f32,
}

impl GuiApp {
    pub fn new(ctx: AppContext, state: AppState) -> Self {
        let map_cfg = &ctx.map_config;
        let surface = WalkersSurface::new(
            map_cfg.initial_center(),
            map_cfg.zoom,
            map_cfg.min_zoom,
            map_cfg.max_zoom,
        );
        let map = MapController::mount(surface, map_cfg.camera, Box::new(FixedLocation(ctx.home_point())));
        let panel_width = ctx.gui_config.panel_width.unwrap_or(380.0);
        debug!("Loaded gui config: {:?}", ctx.gui_config);
        Self {
            state,
            map,
            suggestions: ctx.search_config.suggestions.clone(),
            home: ctx.home.clone(),
            register_form: RegisterForm::default(),
            register_error: None,
            review_note: String::new(),
            initial_scale_applied: false,
            status_set_time: None,
            last_window_size: None,
            panel_width,
            ctx,
        }
    }

    pub fn run(self) -> Result<(), eframe::Error> {
        let width = self.ctx.gui_config.width.unwrap_or(1280) as f32;
        let height = self.ctx.gui_config.height.unwrap_or(800) as f32;

        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([width, height])
                .with_title(self.get_title_string()),
            ..Default::default()
        };

        let gui_config = self.ctx.gui_config.clone();

        eframe::run_native("pucmap", options, Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let mut fonts = egui::FontDefinitions::default();

            if let Some(name) = &gui_config.font_ui {
                match fs::read(name) {
                    Ok(data) => {
                        fonts.font_data.insert(name.to_owned(), Arc::new(egui::FontData::from_owned(data)));
                        fonts.families.entry(egui::FontFamily::Proportional).or_default().insert(0, name.to_owned());
                    }
                    Err(e) => warn!("Cannot load font {}: {}", name, e),
                }
            }

            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(self))
        }))
    }

    fn get_title_string(&self) -> String {
        format!(
            "{} v{} | {} vùng trồng",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.state.catalog.products().len()
        )
    }

    fn switch_role(&self, role: RoleKind) -> InputIntent {
        let overrides = ViewerOverrides { role: Some(role), ..Default::default() };
        InputIntent::ChangeViewer(self.ctx.viewer(&overrides))
    }

    fn top_bar(&self, ui: &mut egui::Ui, intents: &mut Vec<InputIntent>) {
        ui.horizontal(|ui| {
            for tab in Tab::for_viewer(&self.state.viewer) {
                if ui.selectable_label(self.state.current_tab == tab, tab.label()).clicked() {
                    intents.push(InputIntent::SwitchTab(tab));
                }
            }
            ui.separator();

            egui::ComboBox::from_id_salt("category_filter")
                .selected_text(self.state.category.label())
                .show_ui(ui, |ui| {
                    if ui.selectable_label(self.state.category == CategoryFilter::All, "Tất cả").clicked() {
                        intents.push(InputIntent::SetCategory(CategoryFilter::All));
                    }
                    for c in CATEGORIES {
                        let selected = self.state.category == CategoryFilter::Only(c.to_string());
                        if ui.selectable_label(selected, c).clicked() {
                            intents.push(InputIntent::SetCategory(CategoryFilter::Only(c.to_string())));
                        }
                    }
                });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let role = match &self.state.viewer.role {
                    Role::Farmer { .. } => "Nông hộ".to_string(),
                    Role::Buyer => "Người mua".to_string(),
                    Role::Admin { level, assigned_area, .. } => format!("{} · {}", level.label(), assigned_area),
                };
                ui.menu_button(format!("👤 {} ({})", self.state.viewer.name, role), |ui| {
                    for (kind, label) in [
                        (RoleKind::Buyer, "Người mua"),
                        (RoleKind::Farmer, "Nông hộ"),
                        (RoleKind::Admin, "Cán bộ quản lý"),
                    ] {
                        if ui.button(label).clicked() {
                            intents.push(self.switch_role(kind));
                            ui.close();
                        }
                    }
                });
            });
        });
    }

    fn list_view(&self, ui: &mut egui::Ui, show_on_map: &mut Option<String>) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("product_list").num_columns(6).striped(true).show(ui, |ui| {
                for header in ["Tên", "Mã PUC", "Nông hộ", "Địa chỉ", "Trạng thái", ""] {
                    ui.label(egui::RichText::new(header).strong());
                }
                ui.end_row();
                for p in &self.state.filtered {
                    ui.label(&p.name);
                    ui.label(&p.region_code);
                    ui.label(&p.farmer_name);
                    ui.label(&p.location.address);
                    ui.colored_label(status_color(p.status), p.status.label());
                    if ui.button("🗺").on_hover_text("Xem trên bản đồ").clicked() {
                        *show_on_map = Some(p.id.clone());
                    }
                    ui.end_row();
                }
            });
        });
    }
}

impl eframe::App for GuiApp {
    // eframe 0.34 requires `ui`; all drawing happens in `update`, which eframe still calls.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.initial_scale_applied {
            let user_scale = self.ctx.gui_config.font_scale.unwrap_or(1.0);
            ctx.set_pixels_per_point(ctx.pixels_per_point() * user_scale);
            self.initial_scale_applied = true;
        }

        match (&self.state.status_message, self.status_set_time) {
            (Some(_), None) => self.status_set_time = Some(Instant::now()),
            (Some(_), Some(set_time)) if set_time.elapsed() > STATUS_TIMEOUT => {
                self.state.status_message = None;
                self.status_set_time = None;
            }
            (None, Some(_)) => self.status_set_time = None,
            _ => {}
        }

        let mut intents: Vec<InputIntent> = Vec::new();
        let mut events: Vec<MapEvent> = Vec::new();
        let mut detail_action = None;
        let mut clicked_marker = None;
        let mut show_on_map: Option<String> = None;

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| self.top_bar(ui, &mut intents));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            if let Some((msg, is_error)) = &self.state.status_message {
                ui.colored_label(if *is_error { egui::Color32::RED } else { egui::Color32::GREEN }, msg);
            } else {
                let query = &self.state.applied_query;
                let mut text = format!("{} vùng trồng", self.state.filtered.len());
                if !query.is_empty() {
                    text.push_str(&format!(" | \"{}\"", query));
                }
                ui.label(text);
            }
        });

        if let Some(decision) = &self.state.pending_decision {
            let target = self.state.review_target().map(|p| p.name.clone()).unwrap_or_default();
            let verb = match decision {
                Decision::Approve { .. } => "Duyệt",
                Decision::Reject { .. } => "Từ chối",
            };
            egui::Window::new("Xác nhận")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("{} hồ sơ \"{}\"?", verb, target));
                    ui.horizontal(|ui| {
                        if ui.button("Đồng ý").clicked() {
                            intents.push(InputIntent::ConfirmReview);
                        }
                        if ui.button("Hủy").clicked() {
                            intents.push(InputIntent::Cancel);
                        }
                    });
                });
        }

        match self.state.current_tab {
            Tab::Map => {
                let selected_handle = self.map.selection().id().and_then(|id| self.map.marker_for(id));
                let panel = egui::SidePanel::left("map_panel")
                    .default_width(self.panel_width)
                    .resizable(true)
                    .show(ctx, |ui| {
                        search_bar::show(ui, self.map.search_mut(), &self.suggestions, &mut events);
                        if ui.button("📍 Vị trí của tôi").clicked() {
                            events.push(MapEvent::LocateMe);
                        }
                        ui.separator();
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            if let Some(p) = self.map.selected() {
                                let saved = self.map.selection().saved();
                                detail_action = detail::show(ui, p, saved, self.home.as_ref(), self.state.today);
                            } else {
                                for p in self.map.visible() {
                                    let label = format!("{}\n{}", p.name, p.location.address);
                                    if ui.selectable_label(false, label).clicked() {
                                        show_on_map = Some(p.id.clone());
                                    }
                                }
                            }
                        });
                    });
                self.panel_width = panel.response.rect.width();

                egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
                    clicked_marker = self.map.surface_mut().show(ui, selected_handle);
                });
            }
            Tab::List => {
                egui::CentralPanel::default().show(ctx, |ui| self.list_view(ui, &mut show_on_map));
                if show_on_map.is_some() {
                    intents.push(InputIntent::SwitchTab(Tab::Map));
                }
            }
            Tab::MyFarms => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        let mine = self.state.my_products();
                        register::show(ui, &mut self.register_form, &mine, &mut intents, &mut self.register_error);
                    });
                });
            }
            Tab::Dashboard => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    dashboard::show(ui, &self.state, &mut self.review_note, &mut intents);
                });
            }
        }

        // --- Map events ---
        if let Some(handle) = clicked_marker {
            events.push(MapEvent::MarkerClicked(handle));
        }
        if let Some(handle) = show_on_map.and_then(|id| self.map.marker_for(&id)) {
            events.push(MapEvent::MarkerClicked(handle));
        }
        match detail_action {
            Some(DetailAction::Close) => events.push(MapEvent::CloseDetail),
            Some(DetailAction::ToggleSaved) => events.push(MapEvent::ToggleSaved),
            Some(DetailAction::Directions) => {
                self.map.open_directions(&mut EguiHost(ctx));
            }
            Some(DetailAction::Call) => {
                if !self.map.call_selected(&mut EguiHost(ctx)) {
                    self.state.set_status("Không có số liên hệ.".to_string(), true);
                }
            }
            None => {}
        }
        for event in events {
            if let Some(applied) = self.map.handle(event) {
                intents.push(InputIntent::ApplySearch(applied));
            }
        }

        // --- App intents ---
        let review_done = intents.iter().any(|i| matches!(i, InputIntent::ConfirmReview));
        for intent in intents {
            self.state.handle_input(intent);
        }
        if review_done {
            self.review_note.clear();
        }

        if self.map.show(&self.state.filtered, &self.state.applied_query).is_some() {
            ctx.request_repaint();
        }

        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            let size = (rect.width() as u32, rect.height() as u32);
            if size.0 > 100 && size.1 > 100 {
                self.last_window_size = Some(size);
            }
        }
    }

    fn on_exit(&mut self) {
        // Save window size and panel width to config
        let mut gui_config = self.ctx.gui_config.clone();
        if let Some((w, h)) = self.last_window_size {
            gui_config.width = Some(w);
            gui_config.height = Some(h);
        } else {
            debug!("No window size captured");
        }
        gui_config.panel_width = Some(self.panel_width);
        if let Err(e) = self.ctx.save_gui_config(&gui_config) {
            warn!("Error saving config: {:#}", e);
        }
    }
}
