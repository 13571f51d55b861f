use opdraw::{App, Demo, DemoConfig};

fn run() -> opdraw::Result<()> {
    let demo = Demo::load(DemoConfig::default())?;
    App::new(demo).with_title("opdraw").with_size(800, 600).run()
}

fn main() {
    opdraw::init_logging();
    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
