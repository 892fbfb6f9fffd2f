//! Preemption walkthrough.
//!
//! Two fields share the default context: a boolean settings sheet and an
//! optional item picker. Opening the picker while the settings sheet is up
//! forces the sheet closed, waits out the close delay, then presents the
//! picker. Run with `cargo run --example preempt` to see the registry's
//! log output alongside the observed values.

use modalkit::{Context, MODAL_CLOSE_DELAY, ModalRegistry, ModalState};
use simplelog::{Config, LevelFilter, SimpleLogger};

#[tokio::main]
async fn main() {
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());

    let registry = ModalRegistry::new();
    let settings = ModalState::new(&registry, false);
    let picker = ModalState::new(&registry, None::<String>);

    settings.set(true);
    println!("settings sheet visible: {}", settings.get());

    picker.set(Some("wallpaper".to_string()));
    println!("settings sheet after preemption: {}", settings.get());
    println!("picker granted yet: {}", picker.get().is_some());

    tokio::time::sleep(MODAL_CLOSE_DELAY * 2).await;
    println!("picker after close delay: {:?}", picker.get());

    picker.set(None);
    println!(
        "shared slot empty: {}",
        registry.presented(&Context::shared()).is_none()
    );
}
