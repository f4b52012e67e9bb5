use crate::{
    camera::Camera2D,
    categories,
    color::{cluster_color32, contrast_color, CLUSTER_PALETTE, SUMMARY_ROW_FILL},
    data::{self, DataError, DatasetCache, RawDataset, DATA_URL},
    demo,
    features::build_features,
    plot::{
        PlotState, PlotUpdate, EMPTY_SELECTION_TITLE, FETCH_ERROR_TITLE, GENERIC_ERROR_TITLE,
        TOO_FEW_COUNTRIES_TITLE,
    },
    projection,
    selection::SelectionSet,
    table::{format_value, RowKind, TableView},
};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, thread, time::Duration};

const APP_TITLE: &str = "Visualising the Clustering of Countries Based on Similarity of \
Hospital Discharge Diagnoses Using Unsupervised Machine Learning";

const TABLE_HINT: &str = "To view more details about a country including numerical data - \
click on any of the points above to toggle selection.";

const DATA_SOURCE_URL: &str = "https://stats.oecd.org/index.aspx?DataSetCode=HEALTH_proc";

const POINT_RADIUS_PX: f32 = 6.0;
const HIGHLIGHT_RADIUS_PX: f32 = 11.0;
const CLICK_RADIUS_PX: f32 = 10.0;
const DEFAULT_CLUSTERS: usize = 3;

const PREFS_KEY: &str = "ui_prefs";

/// UI settings worth keeping across sessions.
#[derive(Serialize, Deserialize)]
struct UiPrefs {
    enabled_categories: Vec<bool>,
    num_clusters: usize,
    show_categories: bool,
}

pub struct OecdApp {
    cache: Arc<DatasetCache>,
    fetch_handle: Option<thread::JoinHandle<Result<Arc<RawDataset>, DataError>>>,
    data: Option<Arc<RawDataset>>,
    last_error: Option<String>,

    enabled_categories: Vec<bool>,
    num_clusters: usize,
    selection: SelectionSet,
    plot: Option<PlotState>,
    country_colors: HashMap<String, egui::Color32>,
    table: Option<TableView>,
    collapsed_rows: Vec<bool>,

    camera: Camera2D,
    camera_fitted: bool,
    show_categories: bool,
    show_info: bool,
}

impl OecdApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let prefs = cc
            .storage
            .and_then(|s| s.get_string(PREFS_KEY))
            .and_then(|s| serde_json::from_str::<UiPrefs>(&s).ok());

        let mut enabled_categories = vec![true; categories::CATEGORIES.len()];
        let mut num_clusters = DEFAULT_CLUSTERS;
        let mut show_categories = true;
        if let Some(prefs) = prefs {
            if prefs.enabled_categories.len() == enabled_categories.len() {
                enabled_categories = prefs.enabled_categories;
            }
            num_clusters = prefs.num_clusters.clamp(1, CLUSTER_PALETTE.len());
            show_categories = prefs.show_categories;
        }

        let mut app = Self {
            cache: Arc::new(DatasetCache::new()),
            fetch_handle: None,
            data: None,
            last_error: None,
            enabled_categories,
            num_clusters,
            selection: SelectionSet::new(),
            plot: None,
            country_colors: HashMap::new(),
            table: None,
            collapsed_rows: Vec::new(),
            camera: Camera2D::default(),
            camera_fitted: false,
            show_categories,
            show_info: false,
        };
        app.start_fetch();
        app
    }

    fn start_fetch(&mut self) {
        if self.fetch_handle.is_some() {
            return;
        }
        info!("fetching dataset from {DATA_URL}");
        self.last_error = None;
        let cache = self.cache.clone();
        self.fetch_handle = Some(thread::spawn(move || {
            cache.get_or_load_with(|| data::fetch_csv(DATA_URL))
        }));
    }

    fn poll_fetch_job(&mut self, now: f64) {
        let Some(handle) = self.fetch_handle.as_ref() else {
            return;
        };
        if !handle.is_finished() {
            return;
        }
        let handle = self.fetch_handle.take().unwrap();
        match handle.join() {
            Ok(Ok(dataset)) => {
                info!(
                    "dataset ready: {} rows, {} columns",
                    dataset.rows.len(),
                    dataset.columns.len()
                );
                self.install_dataset(dataset, now);
            }
            Ok(Err(e)) => {
                error!("dataset fetch failed: {e}");
                self.last_error = Some(e.to_string());
                self.show_plot_error(FETCH_ERROR_TITLE);
            }
            Err(_) => {
                error!("dataset fetch thread panicked");
                self.last_error = Some("Fetch thread panicked.".to_string());
                self.show_plot_error(FETCH_ERROR_TITLE);
            }
        }
    }

    fn install_dataset(&mut self, dataset: Arc<RawDataset>, now: f64) {
        match TableView::build(&dataset) {
            Ok(view) => {
                self.collapsed_rows = vec![false; view.rows.len()];
                self.table = Some(view);
            }
            Err(e) => {
                warn!("detail table unavailable: {e}");
                self.table = None;
                self.collapsed_rows.clear();
            }
        }
        self.data = Some(dataset);
        self.last_error = None;
        self.recompute_plot(now);
    }

    fn load_demo_dataset(&mut self, now: f64) {
        info!("loading offline demo dataset");
        let dataset = Arc::new(demo::synthetic_dataset(demo::DEMO_SEED));
        // Deliberately not stored in the cache, so a later retry still
        // fetches the real data.
        self.install_dataset(dataset, now);
    }

    /// Puts the plot into the titled empty state, creating a point-less
    /// plot first if none exists yet.
    fn show_plot_error(&mut self, title: &str) {
        let plot = self.plot.get_or_insert_with(|| {
            PlotState::build(PlotUpdate {
                countries: Vec::new(),
                positions: Vec::new(),
                colors: Vec::new(),
            })
        });
        plot.set_empty_state(title);
    }

    /// Full re-run of the feature and projection pipeline. Every category
    /// or cluster-count change lands here; nothing is debounced.
    fn recompute_plot(&mut self, now: f64) {
        let Some(dataset) = self.data.clone() else {
            return;
        };
        let selected = categories::selected_names(&self.enabled_categories);
        if selected.is_empty() {
            self.show_plot_error(EMPTY_SELECTION_TITLE);
            return;
        }

        let features = match build_features(&dataset, &selected, false, true) {
            Ok(ft) => ft,
            Err(e) => {
                error!("feature pipeline failed: {e}");
                self.last_error = Some(e.to_string());
                self.show_plot_error(GENERIC_ERROR_TITLE);
                return;
            }
        };

        match projection::project(&features.matrix, self.num_clusters) {
            Ok(proj) => {
                let update = PlotUpdate {
                    positions: proj
                        .positions
                        .iter()
                        .map(|p| [p[0] as f32, p[1] as f32])
                        .collect(),
                    colors: proj.labels.iter().map(|&l| cluster_color32(l)).collect(),
                    countries: features.countries,
                };
                self.country_colors = update
                    .countries
                    .iter()
                    .cloned()
                    .zip(update.colors.iter().copied())
                    .collect();
                match self.plot.as_mut() {
                    Some(plot) => plot.apply(update, &self.selection, now),
                    None => {
                        let mut plot = PlotState::build(update);
                        plot.refresh_highlight(&self.selection);
                        self.plot = Some(plot);
                        self.camera_fitted = false;
                    }
                }
            }
            Err(e) => {
                warn!("projection unavailable: {e}");
                self.show_plot_error(TOO_FEW_COUNTRIES_TITLE);
            }
        }
    }

    fn ui_controls(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.heading("oecdviz");
        ui.add_space(4.0);

        if let Some(err) = self.last_error.clone() {
            ui.colored_label(egui::Color32::from_rgb(220, 90, 90), &err);
            ui.horizontal(|ui| {
                let retry = ui.add_enabled(
                    self.fetch_handle.is_none(),
                    egui::Button::new("Retry Fetch"),
                );
                if retry.clicked() {
                    self.start_fetch();
                }
                if ui.button("Use Offline Demo Data").clicked() {
                    self.load_demo_dataset(now);
                }
            });
            ui.separator();
        }

        let toggle_label = if self.show_categories {
            "Categories ⏶"
        } else {
            "Categories ⏷"
        };
        if ui.button(toggle_label).clicked() {
            self.show_categories = !self.show_categories;
        }

        if self.show_categories {
            ui.add_space(4.0);
            ui.label("Hospital Discharge Diagnosis Category Selection");
            let split = categories::CATEGORIES.len() / 2;
            let mut selection_changed = false;
            ui.columns(2, |cols| {
                for (i, cat) in categories::CATEGORIES.iter().enumerate() {
                    let col = if i < split { &mut cols[0] } else { &mut cols[1] };
                    if col
                        .checkbox(&mut self.enabled_categories[i], cat.name)
                        .changed()
                    {
                        selection_changed = true;
                    }
                }
            });
            ui.horizontal(|ui| {
                if ui.button("Select All").clicked() {
                    self.enabled_categories.fill(true);
                    selection_changed = true;
                }
                if ui.button("Remove Selections").clicked() {
                    self.enabled_categories.fill(false);
                    selection_changed = true;
                }
            });
            if selection_changed {
                self.recompute_plot(now);
            }
        }

        ui.separator();
        let slider = ui.add(
            egui::Slider::new(&mut self.num_clusters, 1..=CLUSTER_PALETTE.len())
                .text("Number of Clusters"),
        );
        if slider.changed() {
            self.recompute_plot(now);
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.button("Toggle Labels").clicked() {
                if let Some(plot) = self.plot.as_mut() {
                    plot.toggle_labels();
                }
            }
            if ui.button("Clear Selected Countries").clicked() {
                self.selection.clear();
                if let Some(plot) = self.plot.as_mut() {
                    plot.refresh_highlight(&self.selection);
                }
            }
        });

        ui.separator();
        if ui.button("ℹ Instructions and Methodology").clicked() {
            self.show_info = true;
        }
        ui.add_space(8.0);
        ui.horizontal_wrapped(|ui| {
            ui.label("Data Source: OECD Health Care Utilisation Dataset");
            ui.hyperlink_to("(Link)", DATA_SOURCE_URL);
        });
    }

    fn ui_plot(&mut self, ui: &mut egui::Ui, now: f64) {
        let desired = egui::vec2(
            ui.available_width(),
            (ui.available_height() * 0.55).max(300.0),
        );
        let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let background = ui.visuals().extreme_bg_color;
        painter.rect_filled(rect, 4.0, background);

        if response.dragged() {
            let delta = response.drag_delta();
            self.camera.pan_by_pixels([delta.x, delta.y]);
        }
        if response.hovered() {
            let scroll = ui.ctx().input(|i| i.smooth_scroll_delta.y);
            if scroll.abs() > 0.0 {
                let zoom_factor = (1.0 + scroll * 0.0015).clamp(0.8, 1.25);
                let mouse = ui
                    .ctx()
                    .input(|i| i.pointer.hover_pos())
                    .unwrap_or(rect.center());
                let local = mouse - rect.min;
                self.camera.zoom_at_viewport_pixel(
                    [local.x, local.y],
                    [rect.width(), rect.height()],
                    zoom_factor,
                );
            }
        }

        if self.plot.is_none() && self.fetch_handle.is_some() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Fetching data...",
                egui::FontId::proportional(15.0),
                ui.visuals().text_color(),
            );
            return;
        }

        let viewport = [rect.width(), rect.height()];
        if !self.camera_fitted {
            if let Some(bbox) = self.plot.as_ref().and_then(PlotState::bbox) {
                self.camera.fit_bbox(bbox, viewport, 0.8);
                self.camera_fitted = true;
            }
        }

        let mut clicked_country: Option<String> = None;
        if let Some(plot) = self.plot.as_ref() {
            let displayed = plot.positions_at(now);
            let text_color = ui.visuals().text_color();

            for (i, pos) in displayed.iter().enumerate() {
                let opacity = plot.primary.opacities[i];
                if opacity <= 0.0 {
                    continue;
                }
                let s = self.camera.world_to_screen(*pos, viewport);
                let center = rect.min + egui::vec2(s[0], s[1]);
                if !rect.expand(40.0).contains(center) {
                    continue;
                }
                painter.circle_filled(
                    center,
                    POINT_RADIUS_PX,
                    plot.primary.colors[i].gamma_multiply(opacity),
                );
                if plot.display_names {
                    painter.text(
                        center - egui::vec2(0.0, POINT_RADIUS_PX + 2.0),
                        egui::Align2::CENTER_BOTTOM,
                        &plot.primary.countries[i],
                        egui::FontId::proportional(11.0),
                        text_color,
                    );
                }
            }

            if plot.highlight.opacity > 0.0 {
                let ring = egui::Stroke::new(2.0, contrast_color(background));
                for pos in plot.highlight_positions_at(now) {
                    let s = self.camera.world_to_screen(pos, viewport);
                    let center = rect.min + egui::vec2(s[0], s[1]);
                    painter.circle_stroke(center, HIGHLIGHT_RADIUS_PX, ring);
                }
            }

            if !plot.title.is_empty() {
                painter.text(
                    rect.center_top() + egui::vec2(0.0, 28.0),
                    egui::Align2::CENTER_CENTER,
                    &plot.title,
                    egui::FontId::proportional(16.0),
                    text_color,
                );
            }

            let hover_idx = response.hover_pos().and_then(|mouse| {
                let local = mouse - rect.min;
                let world = self
                    .camera
                    .screen_to_world([local.x, local.y], viewport);
                let max_dist = CLICK_RADIUS_PX / self.camera.pixels_per_unit;
                plot.hit_test(world, max_dist, now)
            });
            if let Some(i) = hover_idx {
                let name = plot.primary.countries[i].clone();
                response
                    .clone()
                    .on_hover_ui_at_pointer(|ui| {
                        ui.label(name);
                    });
                if response.clicked() {
                    clicked_country = Some(plot.primary.countries[i].clone());
                }
            }

            if plot.animating(now) {
                ui.ctx().request_repaint();
            }
        }

        if let Some(country) = clicked_country {
            self.selection.toggle(&country);
            if let Some(plot) = self.plot.as_mut() {
                plot.refresh_highlight(&self.selection);
            }
        }
    }

    fn ui_table(&mut self, ui: &mut egui::Ui) {
        let Some(table) = self.table.as_ref() else {
            return;
        };
        let selected = categories::selected_names(&self.enabled_categories);
        if selected.is_empty() || self.selection.is_empty() {
            return;
        }
        let shown_countries: Vec<(String, usize)> = self
            .selection
            .iter()
            .filter_map(|c| table.country_index(c).map(|i| (c.to_string(), i)))
            .collect();
        if shown_countries.is_empty() {
            return;
        }
        let visible = table.visible_rows(&selected, &self.collapsed_rows);
        let collapsed = &mut self.collapsed_rows;
        let country_colors = &self.country_colors;

        let mut clicked_summary: Option<usize> = None;
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(280.0))
            .columns(Column::auto().at_least(110.0), shown_countries.len())
            .header(30.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Diagnosis");
                });
                for (name, _) in &shown_countries {
                    header.col(|ui| {
                        ui.vertical(|ui| {
                            let color = country_colors
                                .get(name)
                                .copied()
                                .unwrap_or(egui::Color32::GRAY);
                            let (stripe, _) = ui.allocate_exact_size(
                                egui::vec2(ui.available_width(), 4.0),
                                egui::Sense::hover(),
                            );
                            ui.painter().rect_filled(stripe, 2.0, color);
                            ui.strong(name);
                        });
                    });
                }
            })
            .body(|mut body| {
                for &row_idx in &visible {
                    let row = &table.rows[row_idx];
                    body.row(22.0, |mut table_row| {
                        table_row.col(|ui| match row.kind {
                            RowKind::Summary => {
                                let text = egui::RichText::new(&row.display_name)
                                    .color(egui::Color32::BLACK)
                                    .strong();
                                let button = egui::Button::new(text)
                                    .fill(SUMMARY_ROW_FILL)
                                    .small();
                                if ui
                                    .add(button)
                                    .on_hover_text("Click to collapse or expand this chapter")
                                    .clicked()
                                {
                                    clicked_summary = Some(row_idx);
                                }
                            }
                            RowKind::Normal => {
                                ui.label(&row.display_name);
                            }
                        });
                        for (_, country_idx) in &shown_countries {
                            table_row.col(|ui| {
                                ui.label(format_value(row.values[*country_idx]));
                            });
                        }
                    });
                }
            });

        if let Some(summary_idx) = clicked_summary {
            let chapter = table.chapter_rows(summary_idx);
            let any_visible = chapter.iter().any(|&i| !collapsed[i]);
            for i in chapter {
                collapsed[i] = any_visible;
            }
        }
    }

    fn ui_info_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_info;
        egui::Window::new("Instructions and Methodology")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .max_width(520.0)
            .show(ctx, |ui| {
                ui.strong("How the Dashboard works");
                ui.label(
                    "This dashboard visualises a subset of OECD member countries based on \
                     how similar or dissimilar they are in terms of diagnoses made on \
                     hospital discharge (per 100,000 population or female/male population). \
                     Categories of diagnoses can be filtered, and the number of clusters to \
                     group the countries may be adjusted. Reducing the dataset onto two axes \
                     and learning the groups are both unsupervised machine learning steps.",
                );
                ui.add_space(6.0);
                ui.label(
                    "To view the underlying numerical data and compare countries, click on \
                     any point in the plot. This builds a table with the selected countries \
                     and diagnostic categories. Click a chapter row to collapse or show its \
                     sub-categories.",
                );
                ui.separator();
                ui.strong("Methodology");
                ui.label(
                    "The latest discharge diagnosis numbers for each country are taken from \
                     the OECD Health Care Utilisation dataset. After removing countries with \
                     insufficient coverage, the selected numerical columns are normalised \
                     and reduced to two dimensions with Spectral Embedding over a \
                     nearest-neighbour graph. The countries are then grouped on those two \
                     axes with average-linkage Agglomerative Clustering. Both steps re-run \
                     reactively on every change of the selections.",
                );
            });
        self.show_info = open;
    }
}

impl eframe::App for OecdApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.poll_fetch_job(now);

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(380.0)
            .max_width(520.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        self.ui_controls(ui, now);
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(egui::RichText::new(APP_TITLE).heading().size(17.0));
            ui.add_space(4.0);
            self.ui_plot(ui, now);
            ui.add_space(4.0);
            ui.label(egui::RichText::new(TABLE_HINT).weak());
            ui.add_space(4.0);
            egui::ScrollArea::both()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    self.ui_table(ui);
                });
        });

        self.ui_info_window(ctx);

        if self.fetch_handle.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let prefs = UiPrefs {
            enabled_categories: self.enabled_categories.clone(),
            num_clusters: self.num_clusters,
            show_categories: self.show_categories,
        };
        match serde_json::to_string(&prefs) {
            Ok(json) => storage.set_string(PREFS_KEY, json),
            Err(e) => warn!("failed to serialize ui prefs: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_prefs_round_trip_through_json() {
        let prefs = UiPrefs {
            enabled_categories: vec![true, false, true],
            num_clusters: 5,
            show_categories: false,
        };
        let json = serde_json::to_string(&prefs).unwrap();
        let back: UiPrefs = serde_json::from_str(&json).unwrap();
        assert_eq!(back.enabled_categories, vec![true, false, true]);
        assert_eq!(back.num_clusters, 5);
        assert!(!back.show_categories);
    }
}
