mod app;
mod camera;
mod categories;
mod color;
mod data;
mod demo;
mod features;
mod plot;
mod projection;
mod selection;
mod table;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("oecdviz")
            .with_inner_size([1300.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "oecdviz",
        native_options,
        Box::new(|cc| Ok(Box::new(app::OecdApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("run ui: {e}"))
}
