mod app;
mod data;
mod util;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    #[value(name = "2d")]
    TwoD,
    #[value(name = "3d")]
    ThreeD,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON dataset with entities and relationships.
    dataset: PathBuf,

    /// Initial layout space; falls back to 2D without GL support.
    #[arg(long, value_enum, default_value = "2d")]
    view: ViewArg,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let space = match args.view {
        ViewArg::TwoD => app::LayoutSpace::TwoD,
        ViewArg::ThreeD => app::LayoutSpace::ThreeD,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "chronica",
        options,
        Box::new(move |cc| Ok(Box::new(app::ChronicaApp::new(cc, args.dataset.clone(), space)))),
    )
}
