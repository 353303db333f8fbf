use lattice_viewer::AppConfig;

fn main() -> Result<(), eframe::Error> {
    // RUST_LOG controls verbosity; generated sources are logged at debug
    env_logger::init();

    lattice_viewer::run_app(AppConfig::from_env())
}
