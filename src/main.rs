use eframe::egui;
use teams_scheduler::app::SchedulerApp;

fn main() -> Result<(), eframe::Error> {
    // --- Load .env file at the very beginning ---
    match dotenvy::dotenv() {
        Ok(path) => println!("Loaded .env file from: {:?}", path),
        Err(_) => println!("Note: .env file not found or failed to load. Relying on config file and existing environment variables."),
    }

    env_logger::init();

    // yup-oauth2 and the Graph client share one TLS backend
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        log::warn!("A rustls crypto provider was already installed");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 480.0])
            .with_min_inner_size([520.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Teams Meeting Scheduler",
        options,
        Box::new(|cc| Ok(Box::new(SchedulerApp::new(cc)))),
    )
}
